//! Lenient parse results.
//!
//! Malformed fragments never abort parsing. They are skipped or defaulted and
//! recorded here so callers (and tests) can see exactly what was dropped.

use std::fmt;

/// Where a degraded fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentSource {
    /// URL query string pair.
    Query,
    /// URL-encoded body pair.
    Body,
    /// Multipart part or framing.
    Multipart,
    /// Accept-Language segment.
    AcceptLanguage,
}

impl FragmentSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FragmentSource::Query => "query",
            FragmentSource::Body => "body",
            FragmentSource::Multipart => "multipart",
            FragmentSource::AcceptLanguage => "accept-language",
        }
    }
}

impl fmt::Display for FragmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fragment that was skipped or defaulted during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub source: FragmentSource,
    /// The offending input, verbatim.
    pub fragment: String,
    pub reason: String,
}

impl Degradation {
    /// Record a degraded fragment and log it.
    pub fn new(
        source: FragmentSource,
        fragment: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let degradation = Self {
            source,
            fragment: fragment.into(),
            reason: reason.into(),
        };

        tracing::debug!(
            source = %degradation.source,
            fragment = %degradation.fragment,
            reason = %degradation.reason,
            "malformed fragment"
        );

        degradation
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fragment '{}': {}", self.source, self.fragment, self.reason)
    }
}

/// A parsed value together with the fragments that did not parse cleanly.
#[derive(Debug)]
pub struct Parsed<T> {
    pub value: T,
    pub degraded: Vec<Degradation>,
}

impl<T> Parsed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            degraded: Vec::new(),
        }
    }

    /// True when nothing was skipped or defaulted.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }

    #[inline]
    pub fn degrade(&mut self, degradation: Degradation) {
        self.degraded.push(degradation);
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

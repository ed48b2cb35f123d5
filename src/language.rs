//! Accept-Language resolution.
//!
//! Parses the header into `(tag, quality)` pairs ranked by descending quality.
//! Equal qualities keep header order, so the client's left-to-right
//! preference breaks ties deterministically.
//!
//! ```rust,ignore
//! let languages = resolve_accept_language(&request);
//! let locale = languages.negotiate(&["en", "nl"]).unwrap_or("en");
//! ```

use std::fmt;

use serde::Serialize;

use crate::core::Request;
use crate::params::{Degradation, FragmentSource, Parsed};

/// Quality assumed when a segment has no usable `q` parameter.
pub const DEFAULT_QUALITY: f32 = 1.0;

/// One ranked entry of an Accept-Language header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguagePreference {
    /// Language tag as sent, e.g. "en-GB".
    pub language: String,
    /// Quality in [0, 1].
    pub quality: f32,
}

impl fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.language, self.quality)
    }
}

/// Ranked language preferences, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AcceptLanguages(Vec<LanguagePreference>);

impl AcceptLanguages {
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LanguagePreference> {
        self.0.iter()
    }

    /// The most preferred language tag.
    pub fn preferred(&self) -> Option<&str> {
        self.0.first().map(|p| p.language.as_str())
    }

    /// Pick the best entry of `supported` for this client.
    ///
    /// Walks the ranking in order; each entry first tries an exact tag match,
    /// then a match on the primary subtag (`en-GB` matches `en`, `en`
    /// matches `en-US`). Comparison ignores case. Entries with quality 0 and
    /// the `*` wildcard never match.
    pub fn negotiate<'a>(&self, supported: &[&'a str]) -> Option<&'a str> {
        for pref in self.0.iter().filter(|p| p.quality > 0.0 && p.language != "*") {
            if let Some(exact) = supported
                .iter()
                .find(|s| s.eq_ignore_ascii_case(&pref.language))
                .copied()
            {
                return Some(exact);
            }

            let primary = primary_subtag(&pref.language);
            if let Some(partial) = supported
                .iter()
                .find(|s| primary_subtag(s).eq_ignore_ascii_case(primary))
                .copied()
            {
                return Some(partial);
            }
        }
        None
    }
}

impl std::ops::Index<usize> for AcceptLanguages {
    type Output = LanguagePreference;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a AcceptLanguages {
    type Item = &'a LanguagePreference;
    type IntoIter = std::slice::Iter<'a, LanguagePreference>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for AcceptLanguages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pref) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", pref)?;
        }
        Ok(())
    }
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Value of a `q` parameter; the name is case-insensitive.
fn quality_param(param: &str) -> Option<&str> {
    let (name, value) = param.split_once('=')?;
    name.trim().eq_ignore_ascii_case("q").then_some(value)
}

/// Parse a `q=` value; must lie in [0, 1].
fn parse_quality(raw: &str) -> Result<f32, &'static str> {
    let quality: f32 = raw.trim().parse().map_err(|_| "quality is not a number")?;
    if (0.0..=1.0).contains(&quality) {
        Ok(quality)
    } else {
        Err("quality outside [0, 1]")
    }
}

/// Parse an Accept-Language header value.
///
/// Segments with a malformed quality keep their tag with quality 1.0; empty
/// segments are skipped. Both are reported as degraded.
pub fn parse_accept_language(header: &str) -> Parsed<AcceptLanguages> {
    let mut parsed = Parsed::new(AcceptLanguages::default());
    let mut prefs = Vec::new();

    for segment in header.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            if !header.trim().is_empty() {
                parsed.degrade(Degradation::new(
                    FragmentSource::AcceptLanguage,
                    segment,
                    "empty language range",
                ));
            }
            continue;
        }

        let mut tokens = segment.split(';');
        let language = tokens.next().unwrap_or("").trim();
        if language.is_empty() {
            parsed.degrade(Degradation::new(
                FragmentSource::AcceptLanguage,
                segment,
                "missing language tag",
            ));
            continue;
        }

        let quality = match tokens.find_map(quality_param) {
            Some(raw) => parse_quality(raw).unwrap_or_else(|reason| {
                parsed.degrade(Degradation::new(
                    FragmentSource::AcceptLanguage,
                    segment,
                    reason,
                ));
                DEFAULT_QUALITY
            }),
            None => DEFAULT_QUALITY,
        };

        prefs.push(LanguagePreference {
            language: language.to_string(),
            quality,
        });
    }

    // Stable: ties keep header order.
    prefs.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    parsed.value = AcceptLanguages(prefs);
    parsed
}

/// Resolve the ranked Accept-Language preferences of a request.
///
/// A missing or empty header yields an empty ranking.
pub fn resolve_accept_language(req: &Request) -> AcceptLanguages {
    match req.accept_language() {
        Some(header) => parse_accept_language(header).into_inner(),
        None => AcceptLanguages::default(),
    }
}

//! Per-request processing context.

use std::any::Any;
use std::collections::HashMap;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use super::{Request, Result};
use crate::config::ParamsConfig;
use crate::language::{parse_accept_language, AcceptLanguages};
use crate::params::{aggregate, Degradation, ParameterSet};

/// Request-scoped state shared with later pipeline stages.
///
/// Holds the aggregated parameters and language ranking once
/// [`populate`](Context::populate) has run, plus custom key-value storage.
pub struct Context {
    /// Short request ID for logging.
    pub request_id: String,

    /// Request start time.
    pub started_at: Instant,

    params: ParameterSet,
    languages: AcceptLanguages,
    degraded: Vec<Degradation>,

    /// Custom key-value storage for later stages.
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Context {
    /// Create an empty context with a fresh request ID.
    pub fn new() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(16);
        Self::with_request_id(id)
    }

    /// Create an empty context with the given request ID.
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            started_at: Instant::now(),
            params: ParameterSet::default(),
            languages: AcceptLanguages::default(),
            degraded: Vec::new(),
            values: HashMap::new(),
        }
    }

    /// Aggregate parameters and resolve languages for `req`.
    ///
    /// Consumes the request body for form content types. On error the
    /// context is left as it was.
    pub async fn populate(&mut self, req: &mut Request, config: &ParamsConfig) -> Result<()> {
        let span = tracing::debug_span!("params", request_id = %self.request_id);

        let params = aggregate(req, config).instrument(span.clone()).await?;
        let languages = span.in_scope(|| {
            parse_accept_language(req.accept_language().unwrap_or_default())
        });

        self.degraded = params.degraded;
        self.degraded.extend(languages.degraded);
        self.params = params.value;
        self.languages = languages.value;

        tracing::debug!(
            request_id = %self.request_id,
            values = self.params.values().len(),
            files = self.params.files().len(),
            languages = self.languages.len(),
            degraded = self.degraded.len(),
            elapsed_us = self.elapsed_us(),
            "request parameters resolved"
        );

        Ok(())
    }

    /// Aggregated request parameters.
    #[inline]
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Ranked Accept-Language preferences.
    #[inline]
    pub fn languages(&self) -> &AcceptLanguages {
        &self.languages
    }

    /// Fragments skipped or defaulted while populating.
    #[inline]
    pub fn degraded(&self) -> &[Degradation] {
        &self.degraded
    }

    /// Set a custom value.
    #[inline]
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) {
        self.values.insert(key.to_string(), Box::new(value));
    }

    /// Get a custom value.
    #[inline]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref())
    }

    /// Remove a custom value.
    #[inline]
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        self.values
            .remove(key)
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Get elapsed time in microseconds.
    #[inline]
    pub fn elapsed_us(&self) -> u64 {
        self.started_at.elapsed().as_micros() as u64
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

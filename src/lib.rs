//! request_params - request parameter resolution for HTTP pipelines.
//!
//! Turns a raw request into strongly structured, deterministically ordered
//! data for later stages:
//!
//! - **Aggregation**: query string plus URL-encoded or multipart body merged
//!   into one [`ParameterSet`](params::ParameterSet) of ordered multi-values
//!   and uploaded files
//! - **Binding**: best-effort coercion of a field into a typed destination
//! - **Accept-Language**: quality-ranked language preferences with stable
//!   tie-breaking
//!
//! Malformed fragments degrade gracefully and are reported alongside the
//! result; only an oversized body or a failed body read is an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use request_params::config::Config;
//! use request_params::core::{Context, Request};
//!
//! let config = Config::from_env()?;
//! let mut req = Request::from_http(http_request);
//! let mut ctx = Context::new();
//! ctx.populate(&mut req, &config.params).await?;
//!
//! let mut page = 1u32;
//! ctx.params().bind(&mut page, "page");
//! let locale = ctx.languages().negotiate(&["en", "nl"]).unwrap_or("en");
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod binder;
pub mod config;
pub mod core;
pub mod language;
pub mod logging;
pub mod params;

// Re-exports for convenience
pub use binder::{BindOutcome, Bindable, CoercionError};
pub use config::{Config, ParamsConfig};
pub use crate::core::{Context, Error, Request};
pub use language::{parse_accept_language, resolve_accept_language, AcceptLanguages, LanguagePreference};
pub use params::{aggregate, Degradation, ParameterSet, Parsed, UploadedFile};

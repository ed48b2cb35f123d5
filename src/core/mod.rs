//! Core types for request parameter handling.
//!
//! - [`Request`] - HTTP request abstraction with a streaming body
//! - [`Context`] - request context the resolved parameters are attached to
//! - [`Error`] - fatal aggregation errors
//!
//! # Example
//!
//! ```rust,ignore
//! use request_params::core::{Context, Request};
//!
//! async fn handle(mut req: Request, config: &ParamsConfig) -> Result<()> {
//!     let mut ctx = Context::new();
//!     ctx.populate(&mut req, config).await?;
//!
//!     let mut page = 1u32;
//!     ctx.params().bind(&mut page, "page");
//!     Ok(())
//! }
//! ```

mod context;
mod error;
mod request;

pub use context::Context;
pub use error::{Error, Result};
pub use request::{BodyStream, Request};

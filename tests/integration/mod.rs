//! Integration tests for request_params
//!
//! Requests are built in-process and run through the public API, so no
//! server is needed. Uploads spool into a per-test temporary directory.
//!
//! Run with: cargo test --test integration

mod helpers;

mod binding;
mod languages;
mod limits;

#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Administration client for OpenAM through its Common REST JSON API.
//!
//! Layout:
//! - `cli.rs`: argument parsing, settings resolution, and output
//! - `commands/`: operations and the login/execute/logout dispatcher
//! - `client.rs`: HTTP client construction, error taxonomy, and transport
//! - `session.rs`: authenticate and logout calls
//! - `locator.rs` / `request.rs`: resource addressing and request descriptors
//! - `response.rs` / `tree.rs`: response normalization and JSON tree helpers
//! - `exit.rs`: exit-code mapping
//! - `output.rs`: JSON rendering
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod exit;
pub(crate) mod locator;
pub(crate) mod output;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod session;
pub(crate) mod tree;

pub use cli::run;

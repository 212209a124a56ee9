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

//! Layered configuration for the amrest administration client.
//!
//! Layout: `defaults.rs` (built-in values), `model.rs` (file model, CLI
//! overrides, resolved settings), `loader.rs` (config-file and password-file
//! reading plus layer resolution), `error.rs` (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{config_path, load_config_file, read_password_file, resolve};
pub use model::{ConfigFile, Overrides, Settings};

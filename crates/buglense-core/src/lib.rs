#![forbid(unsafe_code)]
//! buglense-core: API client, state stores and persistence for BugLense.
//!
//! # Conventions
//!
//! - **Errors**: HTTP and decoding failures are [`error::ApiError`]; every
//!   variant maps to a stable [`error::ErrorCode`]. File and config
//!   failures use [`anyhow`] with context.
//! - **Logging**: [`tracing`] macros (`debug!`, `info!`, `warn!`,
//!   `error!`). The subscriber is installed by the binary.
//! - **Stores**: one owner per slice; operations take `&mut self` and share
//!   one [`api::ApiClient`] through an `Arc`.
//! - **Time**: anything that expires reads a [`clock::Clock`] so tests can
//!   move time by hand.

pub mod api;
pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod persist;
pub mod store;

pub use app::App;
pub use error::{ApiError, ErrorCode};

//! Core domain types and shared logic for Handoff.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Transfer tokens and the identifier generator
//! - Upload record metadata
//! - Configuration types

pub mod config;
pub mod error;
pub mod record;
pub mod token;

pub use error::{Error, Result};
pub use record::UploadRecord;
pub use token::TransferToken;

/// Default cap on uploaded file size: 32 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

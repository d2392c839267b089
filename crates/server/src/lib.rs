//! HTTP server for one-shot ephemeral file exchange.
//!
//! A file is uploaded once, addressed by an unguessable token, and served
//! exactly once: the first successful download purges both the blob and its
//! metadata record. Nothing about the service is durable by design.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod transfer;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use transfer::{Download, TransferError, TransferResult, TransferService};

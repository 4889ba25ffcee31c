//! API clients for external services
//!
//! - Backend: the EchoFlix upload/seed/status/stream/download endpoints

pub mod backend;

pub use backend::{Backend, BackendClient, BackendError, DEFAULT_API_BASE};

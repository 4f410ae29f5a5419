//! Backend access: the `CaseBackend` seam and its HTTP implementation.

mod backend;
mod error;
pub mod http;

pub use backend::CaseBackend;
pub use error::ClientError;
pub use http::HttpBackend;

//! The request side of the storage proof protocol.

mod error;
pub use error::RequestClientError;

mod request;
pub use request::{Outcome, RequestClient};

mod actor;
pub use actor::{Fulfillment, ProofFulfiller};

mod error;
pub use error::FulfillerError;

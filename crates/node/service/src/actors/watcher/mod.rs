mod actor;
pub use actor::ChainWatcher;

mod error;
pub use error::WatcherError;

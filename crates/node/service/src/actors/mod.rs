//! [RelayActor] services for the relayer.
//!
//! [RelayActor]: super::RelayActor
//!
//!  ```mermaid
//!  flowchart LR
//!
//!  src[(Source chain)]
//!  bridge[(Bridge contract)]
//!  cw[ChainWatcher]
//!  pf[ProofFulfiller]
//!  rc[RequestClient]
//!
//!  src -- head, header --> cw -- saveBlock --> bridge
//!  rc -- request --> bridge -- RequestLogged --> pf
//!  src -- eth_getProof --> pf -- verify --> bridge
//!  bridge -- RequestServed / BlockNotFound --> rc
//!  ```

mod traits;
pub use traits::RelayActor;

mod watcher;
pub use watcher::{ChainWatcher, WatcherError};

mod fulfiller;
pub use fulfiller::{FulfillerError, Fulfillment, ProofFulfiller};

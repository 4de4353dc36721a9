mod error;
pub use error::{BridgeError, LifecycleError};

mod service;
pub use service::{Service, ServiceState};

mod token;
pub use token::{CompletionToken, TokenState};

mod registry;
pub use registry::{AwaitRegistry, Gate, WaitOutcome};

mod processor;
pub use processor::{FnProcessor, Navigate, Processor};

mod spawn;
pub use spawn::{AsyncWork, SpawnProcessor};

mod bridge;
pub use bridge::Bridge;

pub mod prelude {
    pub use crate::bridge::Bridge;
    pub use crate::error::{BridgeError, LifecycleError};
    pub use crate::processor::{FnProcessor, Navigate, Processor};
    pub use crate::registry::AwaitRegistry;
    pub use crate::service::{Service, ServiceState};
    pub use crate::spawn::{AsyncWork, SpawnProcessor};
    pub use crate::token::CompletionToken;
}

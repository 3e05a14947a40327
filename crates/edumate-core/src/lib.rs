pub mod backend;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod policy;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendError, GenerateBackend, GenerateResponse, HttpBackend};
pub use config::Config;
pub use dispatch::{Dispatcher, FailureCause, Outcome};
pub use policy::{FallbackPolicy, OutputPolicy};
pub use session::SessionState;
pub use state::{GenerationResult, Message, MessageKind, Role};

//! Transport, prompt, and retry plumbing for the extraction pipeline.

mod messages;
pub mod prompt;
pub mod retry;
pub mod transport;

pub use messages::{ChatMessage, ChatRole};
pub use retry::{Delay, RetryConfig, RetryController, TokioDelay};
pub use transport::{HttpTransport, Transport};

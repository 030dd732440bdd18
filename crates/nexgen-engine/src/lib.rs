//! Generative-AI orchestration for the NexGen back-office: the consultant
//! chat, structured JSON generation, the startup-builder pipeline and the
//! lead intake flows that sit on top of them.

pub mod cancel;
pub mod config;
pub mod consultant;
pub mod credentials;
pub mod error;
pub mod intake;
pub mod json_payload;
pub mod messaging;
pub mod pipeline;
pub mod prompts;
pub mod proposals;
pub mod provider;
pub mod sheets;
pub mod structured;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancelToken;
pub use config::EngineConfig;
pub use credentials::Credential;
pub use error::{ErrorKind, GenerationError};
pub use provider::{GenerationContext, GenerativeTransport};

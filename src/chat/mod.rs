//! Chat exchanges grounded in magazine articles, blocking or streamed.

mod error;
mod events;
mod orchestrator;

pub use error::ChatError;
pub use events::{ChatEvent, Disconnected, EventSink};
pub use orchestrator::{ChatOrchestrator, ChatReply};

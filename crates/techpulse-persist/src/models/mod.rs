mod knowledge;
mod message;
mod thread;

pub use knowledge::KnowledgeSnippet;
pub use message::{Message, MessageMetadata, MessageRole, MessageType};
pub use thread::{derive_title, Thread, ThreadMetadata};

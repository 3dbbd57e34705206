pub mod error;
pub mod memory;
pub mod models;
pub mod store;

#[cfg(feature = "mongodb")]
pub mod mongo;

pub use error::PersistError;
pub use memory::{InMemoryStore, StaticKnowledgeBase};
pub use models::{
    derive_title, KnowledgeSnippet, Message, MessageMetadata, MessageRole, MessageType, Thread,
    ThreadMetadata,
};
pub use store::{KnowledgeBase, NewMessage, NewThread, ThreadStore};

#[cfg(feature = "mongodb")]
pub use mongo::{MongoKnowledgeBase, MongoStore};

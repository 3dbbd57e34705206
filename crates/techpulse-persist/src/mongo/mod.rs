mod models;
mod store;

pub use models::{MongoMessage, MongoThread};
pub use store::{MongoKnowledgeBase, MongoStore};

pub mod types;
pub mod traits;
pub mod openai;

pub use traits::{
    ChatClient,
    SpeechClient,
    ChatRequest, ChatResponse, ChatOptions,
    TranscribeRequest, Transcription,
    TokenUsage,
};

pub use openai::OpenAIClient;
pub use types::{Message, Content, ContentPart};

use std::sync::Arc;

use techpulse_chat::ChatOrchestrator;
use techpulse_llm::SpeechClient;
use techpulse_persist::ThreadStore;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// Every collaborator sits behind a trait object so handlers can be
/// exercised against in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ThreadStore>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub speech: Arc<dyn SpeechClient>,
    pub relay: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ThreadStore>,
        orchestrator: ChatOrchestrator,
        speech: Arc<dyn SpeechClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            orchestrator: Arc::new(orchestrator),
            speech,
            relay: reqwest::Client::new(),
        }
    }
}

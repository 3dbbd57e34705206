use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use techpulse_api::{
    config::Config,
    routes::{chat, health, transcribe, webhook},
    state::AppState,
};
use techpulse_chat::{ChatOrchestrator, TurnSettings};
use techpulse_llm::OpenAIClient;
use techpulse_persist::{
    InMemoryStore, KnowledgeBase, KnowledgeSnippet, MongoKnowledgeBase, MongoStore,
    StaticKnowledgeBase, ThreadStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting TechPulse API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let openai = Arc::new(OpenAIClient::new(config.openai_api_key.clone())?);

    let (store, knowledge): (Arc<dyn ThreadStore>, Arc<dyn KnowledgeBase>) =
        if config.mongodb_uri.is_empty() {
            tracing::warn!("MONGODB_URI not set, using in-memory store");
            (
                Arc::new(InMemoryStore::new()),
                Arc::new(StaticKnowledgeBase::new(default_snippets())),
            )
        } else {
            tracing::info!("Connecting to MongoDB");
            let client = mongodb::Client::with_uri_str(&config.mongodb_uri).await?;
            let db = &config.mongodb.database;
            tracing::info!("MongoDB connected");
            (
                Arc::new(MongoStore::new(&client, db)),
                Arc::new(MongoKnowledgeBase::new(&client, db)),
            )
        };

    let orchestrator = ChatOrchestrator::new(store.clone(), knowledge, openai.clone())
        .with_settings(TurnSettings {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            llm_timeout: Duration::from_secs(config.llm.timeout_secs),
            ..TurnSettings::default()
        });

    let state = AppState::new(config.clone(), store, orchestrator, openai);

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Chat
        .route("/api/chat/send", post(chat::send_message))
        .route("/api/chat/threads", get(chat::list_threads))
        .route("/api/chat/threads", post(chat::create_thread))
        .route("/api/chat/threads/:thread_id", get(chat::get_thread_messages))
        .route("/api/chat/threads/:thread_id", delete(chat::delete_thread))
        // Transcription
        .route("/api/transcribe", post(transcribe::transcribe))
        .route("/api/transcribe", get(transcribe::transcribe_info))
        // Webhook relay
        .route("/api/webhook-proxy", post(webhook::relay))
        .route("/api/webhook-proxy", get(webhook::relay_info))
        // Health
        .route("/health", get(health::health_check));

    Router::new()
        .merge(api_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            for origin in &config.cors.origins {
                if let Ok(parsed_origin) = origin.parse::<axum::http::HeaderValue>() {
                    cors = cors.allow_origin(parsed_origin);
                }
            }
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

/// Seed snippets for the in-memory knowledge base, used when no MongoDB
/// instance is configured.
fn default_snippets() -> Vec<KnowledgeSnippet> {
    vec![
        KnowledgeSnippet::new(
            "Check Engine Light",
            "A steady check engine light usually indicates an emissions or sensor fault; \
             start by checking the gas cap and reading the stored diagnostic codes.",
        ),
        KnowledgeSnippet::new(
            "Battery Maintenance",
            "Inspect battery terminals for corrosion and verify resting voltage is above \
             12.4V; most batteries need replacement after 3-5 years.",
        ),
        KnowledgeSnippet::new(
            "Oil Change Interval",
            "Most modern vehicles need an oil change every 5,000 to 7,500 miles with \
             conventional oil, or up to 10,000 miles with full synthetic.",
        ),
        KnowledgeSnippet::new(
            "Brake Inspection",
            "Squealing or grinding during braking indicates worn pads; pads below 3mm \
             thickness should be replaced along with a rotor inspection.",
        ),
    ]
}

use std::sync::{Arc, Mutex, RwLock};

use tracing_subscriber::EnvFilter;

use hotelchat::config::AppConfig;
use hotelchat::db;
use hotelchat::routes;
use hotelchat::services::ai::ollama::OllamaProvider;
use hotelchat::services::ai::openai::OpenAiProvider;
use hotelchat::services::ai::LlmProvider;
use hotelchat::services::catalog::HotelCatalog;
use hotelchat::services::extraction::PatternExtractor;
use hotelchat::services::speech::openai::OpenAiSpeechProvider;
use hotelchat::state::{AppState, SessionLocks};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(!config.groq_api_key.is_empty(), "GROQ_API_KEY must be set when LLM_PROVIDER=groq");
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(OpenAiProvider::groq(config.groq_api_key.clone(), config.groq_model.clone()))
        }
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(config.ollama_url.clone(), config.ollama_model.clone()))
        }
        _ => {
            anyhow::ensure!(
                !config.openai_api_key.is_empty(),
                "OPENAI_API_KEY must be set when LLM_PROVIDER=openai"
            );
            tracing::info!("using OpenAI LLM provider (model: {})", config.openai_model);
            Box::new(OpenAiProvider::openai(config.openai_api_key.clone(), config.openai_model.clone()))
        }
    };

    if config.openai_api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY not set, voice routes will fail");
    }
    let speech = OpenAiSpeechProvider::new(config.openai_api_key.clone());

    let catalog = HotelCatalog::load(config.hotels_path.as_deref())?;
    tracing::info!(hotels = catalog.len(), "hotel catalog loaded");

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        llm,
        speech: Box::new(speech),
        extractor: Box::new(PatternExtractor),
        catalog: RwLock::new(Arc::new(catalog)),
        session_locks: SessionLocks::default(),
    });

    let app = routes::app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::env;

/// Fallback values used when a booking is completed from partial information.
#[derive(Clone, Debug)]
pub struct BookingDefaults {
    pub location: String,
    pub hotel_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub price_per_night: f64,
}

impl Default for BookingDefaults {
    fn default() -> Self {
        Self {
            location: "Lagos".to_string(),
            hotel_id: "LAG001".to_string(),
            guest_name: "Guest".to_string(),
            guest_email: "guest@example.com".to_string(),
            price_per_night: 500.0,
        }
    }
}

impl BookingDefaults {
    fn from_env() -> Self {
        let base = Self::default();
        Self {
            location: env::var("DEFAULT_LOCATION").unwrap_or(base.location),
            hotel_id: env::var("FALLBACK_HOTEL_ID").unwrap_or(base.hotel_id),
            guest_name: env::var("DEFAULT_GUEST_NAME").unwrap_or(base.guest_name),
            guest_email: env::var("DEFAULT_GUEST_EMAIL").unwrap_or(base.guest_email),
            price_per_night: env::var("DEFAULT_PRICE_PER_NIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.price_per_night),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub llm_provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    /// JSON hotel catalog; the built-in catalog is used when unset.
    pub hotels_path: Option<String>,
    pub frontend_url: String,
    /// Exposes raw upstream/storage error detail in responses.
    pub diagnostics: bool,
    pub defaults: BookingDefaults,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "hotelchat.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_default(),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            hotels_path: env::var("HOTELS_PATH").ok().filter(|p| !p.is_empty()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5500".to_string()),
            diagnostics: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(false),
            defaults: BookingDefaults::from_env(),
        }
    }
}

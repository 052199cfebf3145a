use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Google Gemini API key
    pub gemini_api_key: String,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model used for recommendations
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Open Library API base URL
    #[serde(default = "default_catalog_api_url")]
    pub catalog_api_url: String,

    /// Open Library covers base URL
    #[serde(default = "default_covers_url")]
    pub covers_url: String,

    /// Timeout applied to every outbound HTTP request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash-001".to_string()
}

fn default_catalog_api_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_covers_url() -> String {
    "https://covers.openlibrary.org".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

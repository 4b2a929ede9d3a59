use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the relay server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:3000")]
    pub server_addr: String,

    /// Include error detail in 500 responses (development mode).
    #[arg(long, env = "DEVELOPMENT", default_value = "false")]
    pub development: bool,

    // --- Reply Generation Args ---
    /// Where assistant replies come from (pattern, webhook).
    #[arg(long, env = "REPLY_BACKEND", default_value = "pattern")]
    pub reply_backend: String,

    /// Outbound automation webhook URL. Required for the webhook backend.
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Request timeout for each outbound webhook attempt, in seconds.
    #[arg(long, env = "WEBHOOK_TIMEOUT_SECS", default_value = "30")]
    pub webhook_timeout_secs: u64,

    /// Total outbound webhook attempts before giving up (including the first).
    #[arg(long, env = "WEBHOOK_RETRY_ATTEMPTS", default_value = "3")]
    pub webhook_retry_attempts: u32,

    /// Base delay for exponential backoff between attempts, in milliseconds.
    #[arg(long, env = "WEBHOOK_BACKOFF_BASE_MS", default_value = "1000")]
    pub webhook_backoff_base_ms: u64,

    // --- Rate Limit Args ---
    /// Maximum requests per client within one rate-limit window.
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value = "30")]
    pub rate_limit_max_requests: u32,

    /// Width of the fixed rate-limit window, in seconds.
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value = "60")]
    pub rate_limit_window_secs: u64,
}

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod ratelimit;
pub mod reply;
pub mod server;
pub mod store;
pub mod validate;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use log::info;

use cli::Args;
use ratelimit::FixedWindowLimiter;
use server::AppState;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Reply Backend: {}", args.reply_backend);
    if args.reply_backend.eq_ignore_ascii_case("webhook") {
        info!("Webhook URL: {}", args.webhook_url.as_deref().unwrap_or("(unset)"));
        info!("Webhook Timeout: {}s", args.webhook_timeout_secs);
        info!("Webhook Retry Attempts: {}", args.webhook_retry_attempts);
    }
    info!("Rate Limit: {} requests / {}s window", args.rate_limit_max_requests, args.rate_limit_window_secs);
    info!("Development Mode: {}", args.development);
    info!("-------------------------");

    let store = store::initialize_store();
    let limiter = Arc::new(
        FixedWindowLimiter::new(
            args.rate_limit_max_requests,
            Duration::from_secs(args.rate_limit_window_secs)
        )
    );
    let generator = reply::create_reply_generator(&args)?;

    let state = AppState::new(store, limiter, generator, &args);
    server::start_http_server(&args.server_addr, state).await?;

    Ok(())
}

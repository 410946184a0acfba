use detailing_backend::app::app::App;
use detailing_backend::config::AppConfig;
use detailing_backend::util::logger::Logger;
use dotenv::dotenv;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // before the logger so LOG_DIR and RUST_LOG from .env apply
    let dotenv_result = dotenv();

    let config = AppConfig::from_env();
    let _logger = Logger::new(&config.log_dir)?;

    info!("🚀 Starting detailing backend");
    match dotenv_result {
        Ok(_) => info!("✅ Successfully loaded .env file"),
        Err(e) => warn!("⚠️ Failed to load .env file: {} (using system env vars)", e),
    }

    let app = App::new(config).await?;
    app.start().await
}

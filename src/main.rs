use dotenv::dotenv;
use tracing::{error, info, warn};

use car_rental_backend::app::app::App;
use car_rental_backend::util::logger::Logger;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file before the log filters are read
    let env_loaded = dotenv();

    let _logger = match Logger::new() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialise logging: {e}");
            std::process::exit(1);
        }
    };

    info!("🚀 Starting Car Rental Backend");
    match env_loaded {
        Ok(_) => info!("✅ Successfully loaded .env file"),
        Err(e) => warn!("⚠️ Failed to load .env file: {} (using system env vars)", e),
    }

    let app = match App::new().await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to build application: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = app.start().await {
        error!("Failed to prepare the database: {e}");
        std::process::exit(1);
    }
}

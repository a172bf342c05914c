// This project was developed with assistance from GitHub Copilot
// JWKS server with an RS256 token issuer
//
// Serves the public halves of its unexpired signing keys as a JSON Web Key
// Set and issues signed JWTs, including deliberately expired ones for
// negative testing.

use jwks::{config::Config, server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::start_server(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

use backend::{startup, types::Environment};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    let default_level = environment.tracing_level().to_string().to_lowercase();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // JSON logs for staging/production (Datadog), plain text for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(filter).init();
        }
        Environment::Development => {
            fmt().with_env_filter(filter).init();
        }
    }

    let provider = startup::start().await?;
    tracing::info!(
        "Object storage ready, public base {}",
        provider.config().public_base_url()
    );

    Ok(())
}

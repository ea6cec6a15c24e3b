use clap::Parser;
use llm_gateway::{
    cli::{Cli, Command},
    error::ServiceResult,
    metadata::{PKG_NAME, PKG_VERSION},
    server,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ServiceResult<()> {
    match Cli::parse().into_command() {
        Command::Version => {
            println!("{PKG_NAME} {PKG_VERSION}");
            Ok(())
        }
        Command::Start(args) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "info".into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            server::start_server(args).await?;
            tracing::info!("Server stopped");
            Ok(())
        }
    }
}

/// FBM Admin - operator CLI for the user table
use clap::Parser;
use fbm_admin::{execute, Cli, Command};
use fbm_gateway::{GatewaySettings, PersistenceGateway};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the JSON report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fbm_admin=info,fbm_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = GatewaySettings::load_validated(cli.config.as_deref())?;
    let gateway = PersistenceGateway::from_settings(&settings.backend)?;

    if matches!(cli.command, Command::Check) {
        // A failed handshake is fatal at startup
        gateway.connection().connect().await?;
        tracing::info!(
            url = %gateway.connection().base_url(),
            table = %gateway.connection().table(),
            "Connected"
        );
    }

    let report = execute(&gateway, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use parkspot::{MockEndpointServer, MockEndpointState, ParkspotConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "parkspot-mock")]
#[command(about = "Local stand-in for the parking service endpoint")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Initial proximity_value returned to polls
    #[arg(short, long, default_value = "0")]
    proximity: String,

    /// Include parking_status in control responses
    #[arg(long)]
    confirm: bool,

    /// Configuration file providing the command literals
    #[arg(short, long, default_value = "parkspot.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parkspot=info")),
        )
        .init();

    let config = ParkspotConfig::load_from_file(&args.config)?;

    let state = MockEndpointState::new(config.toggle);
    state.set_proximity(serde_json::Value::String(args.proximity));
    state.set_confirm_status(args.confirm);

    info!("Point endpoint.url at http://{}/index.php", args.bind);
    MockEndpointServer::run(&args.bind, state).await?;
    Ok(())
}

use clap::Parser;
use hurl_rust::{common::box_error::BoxError, server::gateway_server};

/// Relay scream audio sources to websocket subscribers as opus frames
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// configuration file with ports and channel to source bindings
    #[arg(short, long, default_value = "hurl.json")]
    config: String,
}

fn main() -> Result<(), BoxError> {
    env_logger::init();
    let args = Args::parse();
    gateway_server::run(&args.config)?;
    Ok(())
}

use clap::{ArgAction, Parser};
use log::{error, info};
use server::config::{PositionReplyOpcode, ServerConfig};
use server::network::Server;
use shared::DEFAULT_PORT;
use std::net::{IpAddr, SocketAddr};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Opcode used for position replies
    #[arg(long, value_enum, default_value_t = PositionReplyOpcode::Legacy)]
    position_reply: PositionReplyOpcode,

    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let bind_addr = SocketAddr::new(args.host, args.port);
    let config = ServerConfig::new(bind_addr).with_position_reply(args.position_reply);

    let server = Server::bind(&config).await?;
    info!(
        "Position replies use opcode {}",
        config.position_reply.opcode().as_byte()
    );

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

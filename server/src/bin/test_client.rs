use clap::Parser;
use rand::Rng;
use shared::{parse_positions, Coordinate, Message, Opcode, DEFAULT_PORT};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

/// Handshakes with a position server and walks around randomly
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    server: SocketAddr,

    /// Client id to register with
    #[arg(short, long, default_value = "1")]
    id: u8,

    /// Number of position updates to send
    #[arg(short, long, default_value = "10")]
    updates: u32,

    /// Delay between position updates in milliseconds
    #[arg(long, default_value = "1000")]
    interval_ms: u64,
}

const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

async fn request(
    socket: &UdpSocket,
    server: SocketAddr,
    message: &Message,
) -> Result<Option<Message>, Box<dyn std::error::Error>> {
    socket.send_to(&message.encode(), server).await?;

    let mut buf = [0u8; 1024];
    match timeout(REPLY_TIMEOUT, socket.recv_from(&mut buf)).await {
        Ok(received) => {
            let (len, _) = received?;
            if len == 0 {
                return Ok(None);
            }
            // Replies with no peers are a bare opcode byte, which decode rejects
            Ok(Some(Message {
                opcode: buf[0],
                payload: buf[1..len].to_vec(),
            }))
        }
        Err(_) => Ok(None),
    }
}

fn step(value: u8, delta: i8) -> u8 {
    value.saturating_add_signed(delta)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    println!("Sending handshake for id {} to {}", args.id, args.server);
    match request(&socket, args.server, &Message::handshake(args.id)).await? {
        Some(reply) if reply.kind() == Some(Opcode::HandshakeResponse) => {
            println!("Handshake accepted for id {:?}", reply.payload.first());
        }
        Some(reply) => println!("Unexpected handshake reply: {:?}", reply),
        None => println!("No handshake reply (id may already be taken), continuing anyway"),
    }

    let mut rng = rand::thread_rng();
    let mut position = Coordinate::ORIGIN;

    for _ in 0..args.updates {
        position = Coordinate::new(
            step(position.x, rng.gen_range(-3..=3)),
            step(position.y, rng.gen_range(-3..=3)),
        );

        println!("Sending position {}", position);
        match request(&socket, args.server, &Message::position_update(args.id, position)).await? {
            Some(reply) => {
                let peers = parse_positions(&reply.payload);
                println!(
                    "Reply opcode {} with {} other players",
                    reply.opcode,
                    peers.len()
                );
                for (id, coord) in peers {
                    println!("  Player {}: {}", id, coord);
                }
            }
            None => println!("No position reply"),
        }

        sleep(Duration::from_millis(args.interval_ms)).await;
    }

    println!("Test client finished");
    Ok(())
}

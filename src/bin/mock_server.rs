//! Mock Update Server
//!
//! Serves canned update descriptors and generated packages for exercising
//! the update bridge end to end.
//!
//! Usage:
//!   mock-update-server [--port <PORT>] [--host <ADDR>] [--downloads-dir <PATH>]

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use app_update_bridge::logging::{LogLevel, LoggingConfig, LoggingSystem};
use app_update_bridge::server::{MockServerConfig, MockUpdateServer, Scenario, DEFAULT_MOCK_SERVER_PORT};

/// Command line arguments
struct Args {
    host: IpAddr,
    port: u16,
    downloads_dir: Option<PathBuf>,
    payload_size: Option<usize>,
    /// Delay per body chunk in milliseconds
    chunk_delay_ms: Option<u64>,
    public_url: Option<String>,
    verbose: bool,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_MOCK_SERVER_PORT,
            downloads_dir: None,
            payload_size: None,
            chunk_delay_ms: None,
            public_url: None,
            verbose: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--port" | "-p" => {
                    let val = args.next().ok_or("--port needs a value")?;
                    parsed.port = val.parse().map_err(|_| "Invalid port value")?;
                }
                "--host" => {
                    let val = args.next().ok_or("--host needs a value")?;
                    parsed.host = val.parse().map_err(|_| "Invalid host address")?;
                }
                "--downloads-dir" | "-d" => {
                    parsed.downloads_dir = args.next().map(PathBuf::from);
                }
                "--payload-size" => {
                    let val = args.next().ok_or("--payload-size needs a value")?;
                    parsed.payload_size = Some(val.parse().map_err(|_| "Invalid payload size")?);
                }
                "--chunk-delay-ms" => {
                    let val = args.next().ok_or("--chunk-delay-ms needs a value")?;
                    parsed.chunk_delay_ms = Some(val.parse().map_err(|_| "Invalid chunk delay")?);
                }
                "--public-url" => parsed.public_url = args.next(),
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                // Bare port number, as in `mock-update-server 3000`
                other if other.parse::<u16>().is_ok() => {
                    parsed.port = other.parse().map_err(|_| "Invalid port value")?;
                }
                _ => return Err(format!("Unknown argument: {}", arg)),
            }
        }

        Ok(parsed)
    }

    fn server_config(&self) -> MockServerConfig {
        let mut config = MockServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
            ..Default::default()
        };
        if let Some(dir) = &self.downloads_dir {
            config = config.with_downloads_dir(dir);
        }
        if let Some(size) = self.payload_size {
            config = config.with_payload_size(size);
        }
        if let Some(ms) = self.chunk_delay_ms {
            config = config.with_chunk_delay(Duration::from_millis(ms));
        }
        if let Some(url) = &self.public_url {
            config = config.with_public_base_url(url);
        }
        config
    }
}

fn print_help() {
    println!(
        r#"Mock Update Server

USAGE:
    mock-update-server [OPTIONS] [PORT]

OPTIONS:
    -p, --port <PORT>           Port to listen on, 0 picks a free one (default: 3000)
        --host <ADDR>           Address to bind (default: 127.0.0.1)
    -d, --downloads-dir <PATH>  Directory for served packages
        --payload-size <BYTES>  Size of generated packages (default: 1048576)
        --chunk-delay-ms <MS>   Pause before each body chunk to slow downloads
        --public-url <URL>      Base URL advertised in download links
    -v, --verbose               Enable debug logging
    -h, --help                  Print this help message
"#
    );
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Server shutting down...");
}

async fn run(args: Args) -> anyhow::Result<()> {
    let server = MockUpdateServer::bind(args.server_config())
        .await
        .context("Failed to start mock update server")?;

    let base_url = server.base_url().to_string();
    tracing::info!("Status: {}/status", base_url);
    tracing::info!(
        "Scenarios: {}",
        Scenario::names().join(", ")
    );
    tracing::info!("Quick test: curl {}/api/version/optional-update", base_url);

    server.serve_with_shutdown(shutdown_signal()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let level = if args.verbose { LogLevel::Debug } else { LogLevel::Info };
    let _logging_system = match LoggingSystem::init(LoggingConfig::new().with_level(level)) {
        Ok(system) => Some(system),
        Err(e) => {
            eprintln!("Failed to initialize logging system: {}", e);
            None
        }
    };

    if let Err(e) = run(args).await {
        tracing::error!("Mock update server failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

//! update-bridge - command line front end for the update bridge
//!
//! Usage:
//!   update-bridge [OPTIONS] check
//!   update-bridge [OPTIONS] download <URL>
//!   update-bridge [OPTIONS] version

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::{json, Value};

use app_update_bridge::config::BridgeConfig;
use app_update_bridge::logging::{LogLevel, LoggingSystem};
use app_update_bridge::{ChannelSink, LogOnlyLauncher, PlatformLauncher, SystemLauncher, UpdateBridge};

enum Command {
    Check,
    Download(String),
    Version,
}

/// Command line arguments
struct Args {
    command: Command,
    /// Configuration file
    config: Option<PathBuf>,
    /// Direct update descriptor URL; bypasses the configured updater
    update_url: Option<String>,
    current_version: Option<String>,
    sha256: Option<String>,
    /// Record handoffs instead of launching anything
    dry_run: bool,
    verbose: bool,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut command = None;
        let mut config = None;
        let mut update_url = None;
        let mut current_version = None;
        let mut sha256 = None;
        let mut dry_run = false;
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => config = args.next().map(PathBuf::from),
                "--update-url" | "-u" => update_url = args.next(),
                "--current-version" => current_version = args.next(),
                "--sha256" => sha256 = args.next(),
                "--dry-run" | "-n" => dry_run = true,
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "check" => command = Some(Command::Check),
                "version" => command = Some(Command::Version),
                "download" => {
                    let url = args.next().ok_or("download needs a URL")?;
                    command = Some(Command::Download(url));
                }
                _ => return Err(format!("Unknown argument: {}", arg)),
            }
        }

        Ok(Self {
            command: command.ok_or("a command is required")?,
            config,
            update_url,
            current_version,
            sha256,
            dry_run,
            verbose,
        })
    }
}

fn print_help() {
    println!(
        r#"update-bridge - check, download and install app updates

USAGE:
    update-bridge [OPTIONS] <COMMAND>

COMMANDS:
    check                       Check for an update
    download <URL>              Download a package and hand it to the installer
    version                     Print the platform version

OPTIONS:
    -c, --config <PATH>         Configuration file (toml, json, yaml)
    -u, --update-url <URL>      Check this descriptor URL instead of the configured updater
        --current-version <V>   Version to compare against (default: from config)
        --sha256 <HEX>          Expected package checksum for download
    -n, --dry-run               Log URL and installer handoffs without launching them
    -v, --verbose               Enable debug logging
    -h, --help                  Print this help message

Settings can also be given as UPDATE_BRIDGE__<SECTION>__<KEY> environment variables.
"#
    );
}

fn init_logging(config: &BridgeConfig, verbose: bool) -> Option<LoggingSystem> {
    let mut logging = config.logging.clone();
    if verbose {
        logging = logging.with_level(LogLevel::Debug);
    }

    let level = logging.level.to_tracing_level();
    match LoggingSystem::init(logging) {
        Ok(system) => Some(system),
        Err(e) => {
            eprintln!("Failed to initialize logging system: {}. Using basic logging.", e);
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .init();
            None
        }
    }
}

async fn run(args: Args, config: BridgeConfig) -> anyhow::Result<Value> {
    let launcher: Arc<dyn PlatformLauncher> = if args.dry_run {
        Arc::new(LogOnlyLauncher::new())
    } else {
        Arc::new(SystemLauncher)
    };

    let (sink, mut events) = ChannelSink::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event.arguments() {
                Some(arguments) => eprintln!("{} {}", event.method(), arguments),
                None => eprintln!("{}", event.method()),
            }
        }
    });

    let current_version = args
        .current_version
        .clone()
        .unwrap_or_else(|| config.current_version.clone());
    let bridge = UpdateBridge::new(config, Arc::new(sink), launcher)
        .context("Failed to set up the update bridge")?;

    let (method, arguments) = match args.command {
        Command::Version => ("getPlatformVersion", Value::Null),
        Command::Check => match args.update_url {
            Some(url) => (
                "checkForUpdate",
                json!({ "usePlatformStore": false, "updateUrl": url, "currentVersion": current_version }),
            ),
            None => ("checkForUpdate", json!({})),
        },
        Command::Download(url) => (
            "downloadAndInstallApk",
            json!({ "downloadUrl": url, "sha256": args.sha256 }),
        ),
    };

    let result = bridge.handle(method, arguments).await;
    drop(bridge);
    // The printer ends once the bridge, and with it the sink, is gone
    let _ = printer.await;

    match result {
        Ok(value) => Ok(value),
        Err(e) => bail!("{} failed with {}: {}", method, e.code, e.message),
    }
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

    let config = match BridgeConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let _logging_system = init_logging(&config, args.verbose);

    match run(args, config).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", value),
        },
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

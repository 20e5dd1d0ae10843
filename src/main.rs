// Main binary that starts the metadata server
use arestor_server::ServerConfig;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use std::io::stderr;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Config files probed when `--config` is not given, in order
const DEFAULT_CONFIG_FILES: [&str; 3] = [
    "/etc/arestor/arestor.toml",
    "etc/arestor/arestor.toml",
    "arestor.toml",
];

#[derive(Parser, Debug)]
#[command(author, version, about = "Mocked cloud instance-metadata service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbose output - shows more detailed logs
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the metadata server (default action).
    Serve(ServeArgs),
    /// Loads and validates a config file, then prints the effective config.
    CheckConfig(ConfigArgs),
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Address to listen on, overriding the config file
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

/// Load the explicit config file, else the first default one present
fn load_config(args: &ConfigArgs) -> Result<ServerConfig> {
    if let Some(path) = &args.config {
        return ServerConfig::load(path)
            .wrap_err_with(|| format!("Failed to load config {}", path.display()));
    }

    match DEFAULT_CONFIG_FILES.iter().map(Path::new).find(|p| p.is_file()) {
        Some(path) => {
            debug!(path = %path.display(), "Using default config file");
            ServerConfig::load(path)
                .wrap_err_with(|| format!("Failed to load config {}", path.display()))
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(ServerConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // --- Logging ---
    let default_level = if cli.verbose { "debug" } else { "info" };
    let default_directives = format!(
        "arestor={level},arestor_server={level},arestor_metadata={level},tower_http=warn,hyper=warn",
        level = default_level
    );
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    registry().with(filter).with(fmt::layer().with_writer(stderr)).init();

    match cli.command.unwrap_or_else(|| Commands::Serve(ServeArgs::default())) {
        Commands::CheckConfig(args) => {
            let config = load_config(&args)?;
            let rendered = toml::to_string_pretty(&config).wrap_err("Failed to render config")?;
            println!("{}", rendered);
        }
        Commands::Serve(args) => {
            let mut config = load_config(&args.config)?;
            if let Some(listen) = args.listen {
                config = config.with_listen(listen);
            }

            let (shutdown_tx, shutdown_rx) = watch::channel(());
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                info!("Ctrl+C received, sending shutdown signal...");
                let _ = shutdown_tx.send(());
            });

            if let Err(e) = arestor_server::run(config, shutdown_rx).await {
                error!("Metadata server failed: {:#}", e);
                return Err(color_eyre::eyre::eyre!("{:#}", e));
            }
        }
    }

    Ok(())
}

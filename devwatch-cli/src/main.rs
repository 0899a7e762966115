//! devwatch CLI - relay Devman review results to Telegram
//!
//! Long-polls the Devman review API and posts every new review result, as
//! well as the watcher's own warnings and errors, to a Telegram chat.

mod commands;
mod logging;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use devwatch_core::config::parse_timeout_secs;
use devwatch_core::{chat_log_channel, Config, Secrets, Settings};

use commands::{ReviewsArgs, SendTestArgs, WatchArgs};

/// devwatch: Devman review notifications in Telegram
#[derive(Parser, Debug)]
#[command(name = "devwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Telegram chat receiving notifications (overrides config and env)
    #[arg(long, global = true, env = "TG_CHAT_ID")]
    chat_id: Option<String>,

    /// Poll request timeout in seconds (overrides config and env)
    #[arg(long, global = true, env = "REQUEST_TIMEOUT", value_parser = parse_timeout)]
    request_timeout: Option<Duration>,

    /// File receiving INFO and above log records
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Relay review results to Telegram until interrupted (default)
    #[command(visible_alias = "w")]
    Watch(WatchArgs),

    /// Save every review of the user to a JSON file
    Reviews(ReviewsArgs),

    /// Send a message to check the bot token and chat id
    SendTest(SendTestArgs),

    /// Create a secrets file template
    InitSecrets,

    /// Show current configuration
    Config,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    parse_timeout_secs(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads env-backed flags
    let dotenv_path = dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load_with_overrides(
        cli.chat_id.clone(),
        cli.request_timeout,
        cli.log_file.clone(),
    )?;

    let (chat_layer, log_queue) = chat_log_channel();
    let _log_guard = logging::init(cli.verbose, config.log.file.as_deref(), chat_layer)?;

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    if cli.verbose {
        tracing::info!(
            endpoint = %config.api.endpoint_url,
            request_timeout = ?config.api.request_timeout,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("devwatch {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Watch(args)) => {
            let settings = Settings::resolve(&config, &Secrets::load()?)?;
            args.execute(&settings, log_queue).await?;
        }
        None => {
            let settings = Settings::resolve(&config, &Secrets::load()?)?;
            WatchArgs::default().execute(&settings, log_queue).await?;
        }
        Some(Commands::Reviews(args)) => {
            args.execute(&config, &Secrets::load()?).await?;
        }
        Some(Commands::SendTest(args)) => {
            args.execute(&config, &Secrets::load()?).await?;
        }
        Some(Commands::InitSecrets) => {
            let path = Secrets::create_template()?;
            println!("Created {}", path.display());
        }
        Some(Commands::Config) => {
            print_config(&config);
        }
    }

    Ok(())
}

/// Token status line for `devwatch config`
fn describe_token(token: Option<String>, load_error: Option<&devwatch_core::Error>) -> String {
    match (token, load_error) {
        (Some(_), _) => "(set)".to_string(),
        (None, Some(e)) => format!("(not loaded: {})", e),
        (None, None) => "(not set)".to_string(),
    }
}

fn print_config(config: &Config) {
    // Environment tokens still apply when the secrets file is unusable
    let (secrets, load_error) = match Secrets::load() {
        Ok(secrets) => (secrets, None),
        Err(e) => (Secrets::default(), Some(e)),
    };
    let presence = |value: Option<String>| describe_token(value, load_error.as_ref());

    println!("devwatch Configuration");
    println!("======================");
    println!();
    println!("Review API:");
    println!("  endpoint_url: {}", config.api.endpoint_url);
    println!("  reviews_url: {}", config.api.reviews_url);
    println!(
        "  request_timeout: {}",
        config
            .api
            .request_timeout
            .map(|t| format!("{:?}", t))
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("  token: {}", presence(secrets.devman_token()));
    println!();
    println!("Polling:");
    println!("  connection_backoff: {:?}", config.poll.connection_backoff);
    println!("  error_backoff: {:?}", config.poll.error_backoff);
    println!();
    println!("Telegram:");
    println!("  api_url: {}", config.telegram.api_url);
    println!("  chat_id: {}", config.telegram.chat_id.as_deref().unwrap_or("(not set)"));
    println!("  bot_token: {}", presence(secrets.bot_token()));
    println!();
    println!(
        "Log file: {}",
        config
            .log
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(disabled)".to_string())
    );
    println!();
    if let Some(path) = Secrets::default_secrets_path() {
        println!("Secrets file: {}", path.display());
    }
    if let Some(e) = &load_error {
        println!("  (failed to load: {})", e);
    }
    println!();
    if let Some(path) = Config::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}

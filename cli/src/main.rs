use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

mod api;
mod chat;
mod commands;
mod identity;
mod profile;
mod session;
mod util;
mod view;

use api::ApiClient;
use identity::{DEV_STUB_USER_ID, HostBridge, ResolverConfig};
use util::exit_error;

#[derive(Parser)]
#[command(
    name = "macrocoach",
    version,
    about = "macrocoach: chat with your nutrition coach, personalized by your stored profile"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "MACROCOACH_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Runtime environment. "development" skips the host bridge and uses a stub user id.
    #[arg(long = "env", env = "MACROCOACH_ENV", default_value = "production")]
    app_env: String,

    /// Host init data as JSON (e.g. '{"user":{"id":123}}')
    #[arg(long, env = "MACROCOACH_INIT_DATA")]
    init_data: Option<String>,

    /// File the host writes its init data JSON to (re-read while polling)
    #[arg(long, env = "MACROCOACH_INIT_DATA_FILE")]
    init_data_file: Option<PathBuf>,

    /// Delay between host bridge polls, in milliseconds
    #[arg(
        long,
        env = "MACROCOACH_POLL_INTERVAL_MS",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval_ms: u64,

    /// Host bridge polls before giving up
    #[arg(long, env = "MACROCOACH_MAX_ATTEMPTS", default_value_t = 20)]
    max_attempts: u32,

    /// Timeout for profile and chat requests, in seconds
    #[arg(
        long,
        env = "MACROCOACH_REQUEST_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    request_timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with your coach (default)
    Chat,
    /// Print your stored profile as JSON
    Profile,
}

impl Cli {
    fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_attempts,
            development: is_development(&self.app_env),
            stub_user_id: DEV_STUB_USER_ID,
        }
    }
}

fn is_development(app_env: &str) -> bool {
    app_env.trim().eq_ignore_ascii_case("development")
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    util::init_tracing();

    let api = ApiClient::new(
        &cli.api_url,
        Duration::from_secs(cli.request_timeout_secs),
    )
    .unwrap_or_else(|e| exit_error(&e, Some("Set --api-url or MACROCOACH_API_URL")));
    let config = cli.resolver_config();
    if config.development {
        tracing::warn!("running in development mode, host bridge is ignored");
    }
    let bridge = HostBridge::from_sources(cli.init_data, cli.init_data_file);

    let code = match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(&api, &bridge, config).await,
        Commands::Profile => commands::profile::run(&api, &bridge, config).await,
    };
    std::process::exit(code);
}

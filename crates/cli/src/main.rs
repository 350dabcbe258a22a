use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hinode")]
#[command(about = "LINE sunrise/sunset bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook server. Requires LINE_CHANNEL_SECRET and LINE_CHANNEL_ACCESS_TOKEN
    /// (environment or config file); refuses to start without them.
    Serve {
        /// Config file path (default: HINODE_CONFIG_PATH or ~/.hinode/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 15161)
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("hinode {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, _path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.webhook.port = p;
    }
    log::info!(
        "starting webhook on {}:{}",
        config.webhook.bind,
        config.webhook.port
    );
    lib::webhook::run_webhook(config).await
}

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dashcast_core::config::{DashcastConfig, SourceKind};
use dashcast_gateway::{server, source, watch};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "dashcast", version, about = "Real-time vehicle telemetry broadcaster")]
struct Cli {
    /// Config file (TOML). Missing files are ignored.
    #[arg(long, global = true, env = "DASHCAST_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept dashboard clients and broadcast readings (default)
    Serve(ServeArgs),
    /// Connect to a broadcaster and print readings with gear advice
    Watch(WatchArgs),
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Listen address, overrides server.bind
    #[arg(long)]
    bind: Option<String>,
    /// Listen port, overrides server.port
    #[arg(long)]
    port: Option<u16>,
    /// Broadcast period in milliseconds, overrides broadcast.interval_ms
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Reading source: fixed | stdin
    #[arg(long)]
    source: Option<SourceKind>,
}

impl ServeArgs {
    fn apply(self, config: &mut DashcastConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.broadcast.interval_ms = interval_ms;
        }
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
    }
}

#[derive(Args)]
struct WatchArgs {
    /// Broadcaster URL
    #[arg(long, default_value = watch::DEFAULT_URL)]
    url: String,
}

/// Logs go to stdout when serving; `watch` prints readings on stdout, so
/// its logs move to stderr.
fn init_tracing(to_stderr: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dashcast=info,dashcast_gateway=info,tower_http=info".into());

    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Serve(ServeArgs::default()));

    init_tracing(matches!(command, Commands::Watch(_)));

    let shutdown = CancellationToken::new();
    tokio::spawn(server::shutdown_signal(shutdown.clone()));

    match command {
        Commands::Serve(args) => {
            let mut config = DashcastConfig::load(cli.config.as_deref())
                .context("failed to load configuration")?;
            args.apply(&mut config);
            config.validate()?;

            let source = source::build_source(config.source.kind);
            server::serve(config, source, shutdown).await
        }
        Commands::Watch(args) => watch::run(&args.url, shutdown).await,
    }
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use cellarena::prelude::*;
use cellarena::session::{DEFAULT_REGION, RegionInfo};
use cellarena::DEFAULT_NICKNAME;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Debug, Parser)]
#[command(name = "cellarena")]
#[command(about = "Headless client for the cell arena game: spectate, run bots, replay recordings")]
struct Cli {
    /// Region to ask the lookup endpoint for
    #[arg(long, global = true, default_value = DEFAULT_REGION)]
    region: String,

    /// Nickname used when spawning
    #[arg(short, long = "nick", global = true, default_value = DEFAULT_NICKNAME)]
    nick: String,

    /// More output: -d for debug, -dd for trace plus a log of every message
    #[arg(short = 'd', long = "debug", global = true, action = clap::ArgAction::Count)]
    debug: u8,

    /// Record every received message to this file
    #[arg(short, long, global = true, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Game server address; skips the region lookup (needs --token)
    #[arg(long, global = true, requires = "token")]
    server: Option<String>,

    /// Session token for --server
    #[arg(long, global = true, requires = "server")]
    token: Option<String>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Watch the game
    Spectate,
    /// Print the available regions with their player counts
    ListRegions,
    /// Play with a bot
    Bot {
        /// Bot policy to play with
        #[arg(short = 't', long = "type", value_name = "KIND", required_unless_present = "list_types")]
        kind: Option<BotKind>,

        /// Print the available bot policies and exit
        #[arg(long)]
        list_types: bool,
    },
    /// Play back a recording made with --save
    Replay {
        file: PathBuf,

        /// Playback speed multiplier; 0 plays without pauses
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Longest pause between two messages, in seconds
        #[arg(long, value_name = "SECONDS")]
        max_gap: Option<f64>,
    },
}

impl Cli {
    /// Default filter for the subscriber when `RUST_LOG` is unset.
    fn log_level(&self) -> &'static str {
        let replaying = matches!(self.command, Action::Replay { .. });
        match self.debug {
            0 if replaying => "debug",
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::default().with_region(self.region.clone())
    }

    fn builder(&self, mode: Mode) -> ClientBuilder {
        let builder = ClientBuilder::new()
            .session_config(self.session_config())
            .nickname(self.nick.clone())
            .mode(mode)
            .log_messages(self.debug > 1);
        match &self.save {
            Some(path) => builder.record_to(path.clone()),
            None => builder,
        }
    }

    fn ticket(&self) -> Option<ServerTicket> {
        match (&self.server, &self.token) {
            (Some(server), Some(token)) => Some(ServerTicket::new(server, token)),
            _ => None,
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn print_regions(regions: &[RegionInfo]) {
    println!("{:<20} {:>8} {:>8} {:>8}", "REGION", "PLAYERS", "REALMS", "SERVERS");
    for region in regions {
        println!(
            "{:<20} {:>8} {:>8} {:>8}",
            region.name, region.stats.num_players, region.stats.num_realms, region.stats.num_servers
        );
    }
}

fn print_bot_kinds() {
    for kind in BotKind::ALL {
        println!("{:<24} {}", kind.name(), kind.description());
    }
}

async fn run_live(cli: &Cli, mode: Mode) -> Option<TaskOutcome> {
    let builder = cli.builder(mode);
    let connector = WebSocketConnector::new();
    match cli.ticket() {
        Some(ticket) => {
            tracing::info!(address = %ticket.address, "connecting without region lookup");
            builder.run(StaticLookup::new(ticket), connector).await
        }
        None => builder.run(HttpRegionLookup::default(), connector).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Action::Bot { list_types: true, .. } = cli.command {
        print_bot_kinds();
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.log_level());

    let outcome = match &cli.command {
        Action::ListRegions => {
            return match HttpRegionLookup::default().regions().await {
                Ok(regions) => {
                    print_regions(&regions);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            };
        }
        Action::Spectate => run_live(&cli, Mode::Spectate).await,
        Action::Bot { kind: Some(kind), .. } => {
            tracing::info!(bot = %kind, nick = %cli.nick, "starting bot");
            run_live(&cli, Mode::Bot(*kind)).await
        }
        Action::Bot { kind: None, .. } => {
            eprintln!("a bot type is required; see --list-types");
            return ExitCode::FAILURE;
        }
        Action::Replay {
            file,
            speed,
            max_gap,
        } => {
            let mut config = ReplayConfig::default().with_speed(*speed);
            if let Some(gap) = max_gap.and_then(|secs| Duration::try_from_secs_f64(secs).ok()) {
                config = config.with_max_gap(gap);
            }
            cli.builder(Mode::Spectate).replay(file.clone(), config).await
        }
    };

    match outcome {
        Some(TaskOutcome { result: Ok(()), .. }) => ExitCode::SUCCESS,
        Some(TaskOutcome {
            name,
            result: Err(e),
        }) => {
            eprintln!("{name} failed: {e}");
            ExitCode::FAILURE
        }
        None => ExitCode::FAILURE,
    }
}

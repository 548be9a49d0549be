use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use pubmed_pairs::{
    config::Config,
    pipeline::{ConsolePresenter, Presenter},
    routes::create_router,
    search::parse_terms,
    AppState,
};

#[derive(Parser)]
#[command(name = "pubmed-pairs", version, about = "Pairwise PubMed co-occurrence counts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Count papers for every first × second pair, printing rows as they arrive
    Search {
        /// First-group terms, delimiter-separated
        #[arg(long)]
        first: String,
        /// Second-group terms, delimiter-separated
        #[arg(long)]
        second: String,
        /// Also fetch and print the papers for the first pair
        #[arg(long)]
        papers_for_first: bool,
    },
    /// Fetch and print the papers for one pair
    Papers {
        #[arg(long)]
        first: String,
        #[arg(long)]
        second: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = pubmed_pairs::utils::init_logger(&config.logging);

    let state = AppState::from_config(config.clone())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::Search {
            first,
            second,
            papers_for_first,
        } => {
            let delimiter = config.pipeline.delimiter;
            let first = parse_terms(&first, delimiter);
            let second = parse_terms(&second, delimiter);
            if first.is_empty() || second.is_empty() {
                anyhow::bail!("both --first and --second need at least one term");
            }

            let presenter = ConsolePresenter;
            let token = state.supervisor.begin("cli").await;
            let outcome = state
                .aggregator
                .search(&first, &second, &presenter, &token)
                .await;
            state.supervisor.finish("cli", &token).await;
            let results = outcome?;

            if papers_for_first && !results.is_empty() {
                info!(pair = %results[0].pair(), "Loading papers for first pair");
                state.records.drill_down(&first[0], &second[0], &presenter).await?;
            }
            Ok(())
        }
        Command::Papers { first, second } => {
            let presenter = ConsolePresenter;
            let set = state.records.papers(first.trim(), second.trim()).await?;
            presenter.on_papers(&set.records, &set.label);
            for rejected in &set.rejected {
                eprintln!("skipped block {}: {}", rejected.index, rejected.reason);
            }
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", state.config.server);

    let host: std::net::IpAddr = state.config.server.host.parse()?;
    let addr = SocketAddr::from((host, state.config.server.port));
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use scout_core::ScoutCore;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Doc sync and gated synthesis over a source tree", long_about = None)]
struct Cli {
    /// Repository root to operate on.
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a natural-language question about the source tree.
    Query {
        question: String,
        /// Subpath to restrict the search to, relative to --repo.
        #[arg(long, default_value = "")]
        scope: String,
    },
    /// Regenerate living docs from extracted facts.
    Sync {
        /// Subpath to restrict the sync to, relative to --repo.
        #[arg(long, default_value = "")]
        scope: String,
        /// Only regenerate docs for files whose facts checksum changed.
        #[arg(long)]
        changed_only: bool,
        /// Also synthesize the `.deep.md` tier.
        #[arg(long)]
        deep: bool,
    },
    /// Rank files relevant to a natural-language task.
    Nav { task: String },
    /// Look up symbols by substring in the symbol index.
    Index {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the static registry of operations this binary exposes.
    ListTools,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<(), scout_core::ScoutError> {
    if let Commands::ListTools = cli.command {
        for tool in scout_core::tools::TOOLS {
            println!("{:<12} {}", tool.name, tool.desc);
        }
        return Ok(());
    }

    let mut core = ScoutCore::open(cli.repo)?;

    match cli.command {
        Commands::Query { question, scope } => {
            let answer = core.query(&question, &scope).await?;
            println!("{answer}");
        }
        Commands::Sync {
            scope,
            changed_only,
            deep,
        } => {
            let count = core.sync(&scope, changed_only, deep).await?;
            println!("regenerated {count} doc(s)");
        }
        Commands::Nav { task } => {
            for path in core.nav(&task) {
                println!("{}", path.display());
            }
        }
        Commands::Index { query, limit } => {
            for entry in core.index_query(&query, limit) {
                println!("{}:{} {} ({})", entry.file, entry.line, entry.name, entry.kind);
            }
        }
        Commands::ListTools => unreachable!("handled above"),
    }

    Ok(())
}

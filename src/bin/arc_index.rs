use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use arc_index::app::{App, BuildResult};
use arc_index::assays;
use arc_index::cache::FreshnessWindow;
use arc_index::config::{ConfigLoader, ResolvedConfig};
use arc_index::error::ArcIndexError;
use arc_index::gitlab::GitlabHttpClient;
use arc_index::grid::{DocumentKind, GridReader, XlsxGridReader};
use arc_index::investigation;
use arc_index::output::{JsonOutput, LogSink};
use arc_index::store::IndexStore;

#[derive(Parser)]
#[command(name = "arc-index")]
#[command(about = "Builds and serves the searchable index of public ARCs across DataHUBs")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    index: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Crawl all hubs, refresh stale projects and persist the index")]
    Build(BuildArgs),
    #[command(about = "Print the last persisted index")]
    Show,
    #[command(about = "Parse a local ISA spreadsheet and print what the indexer extracts")]
    Inspect(InspectArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Recompute every project instead of reusing records outside the freshness window.
    #[arg(long)]
    full: bool,

    /// Print the build result as JSON instead of the per-hub summary.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InspectArgs {
    path: Utf8PathBuf,

    #[arg(long, value_enum, default_value_t = KindArg::Investigation)]
    kind: KindArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Investigation,
    Study,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ArcIndexError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ArcIndexError) -> u8 {
    match error {
        ArcIndexError::IndexUnavailable(_)
        | ArcIndexError::ConfigRead(_)
        | ArcIndexError::ConfigParse(_)
        | ArcIndexError::UnknownHub(_)
        | ArcIndexError::InvalidFreshness(_) => 2,
        error if error.is_transport() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(index) = cli.index {
        config.index_path = Utf8PathBuf::from(index);
    }

    match cli.command {
        Commands::Build(args) => run_build(args, &config),
        Commands::Show => {
            let store = IndexStore::new(config.index_path.clone());
            let records = store.load()?;
            JsonOutput::print_index(&records).into_diagnostic()
        }
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn run_build(args: BuildArgs, config: &ResolvedConfig) -> miette::Result<()> {
    let client = GitlabHttpClient::new(
        config.hubs.clone(),
        Duration::from_secs(config.timeout_secs),
        config.per_page,
    )?;
    let mut app = App::from_config(config, client, XlsxGridReader);
    if args.full {
        app = app.with_freshness(FreshnessWindow::everything());
    }

    let result = app.build_index(&LogSink)?;
    if args.json {
        JsonOutput::print_build(&result).into_diagnostic()
    } else {
        print_build_summary(&result);
        Ok(())
    }
}

fn run_inspect(args: InspectArgs) -> miette::Result<()> {
    match args.kind {
        KindArg::Investigation => {
            let grid = XlsxGridReader.read_path(&args.path, DocumentKind::Investigation)?;
            JsonOutput::print_investigation(&investigation::parse(&grid)).into_diagnostic()
        }
        KindArg::Study => {
            let grid = XlsxGridReader.read_path(&args.path, DocumentKind::Study)?;
            JsonOutput::print_assays(&assays::resolve(&grid)).into_diagnostic()
        }
    }
}

fn print_build_summary(result: &BuildResult) {
    println!("ARC index: {} records", result.records.len());
    for hub in &result.hubs {
        println!(
            "  {:<14} {:?}: {} records ({} fetched, {} reused, {} duplicates) in {} ms",
            hub.hub, hub.status, hub.records, hub.fetched, hub.reused, hub.duplicates, hub.elapsed_ms
        );
    }
}

mod report;
mod sources;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use bertram_core::classify::classify;
use bertram_core::dump::CrashDump;
use bertram_core::error::BertramResult;
use bertram_core::solve::solve;
use bertram_core::symbols::SymbolTable;
use bertram_core::unwind::{analyze, DEFAULT_MAX_DEPTH};
use bertram_utils::{debug, info, init_logging, LogLevel};
use clap::{Args, Parser, Subcommand};

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BERTRAM_GIT_HASH"),
    ", ",
    env!("BERTRAM_RUSTC_VERSION"),
    ")"
);

/// Offline analysis of Luma3DS crash dumps.
#[derive(Parser, Debug)]
#[command(name = "bertram")]
#[command(version = VERSION)]
#[command(about = "Decode, classify and symbolicate Luma3DS crash dumps", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

/// Where to find the symbols for one build of the crashed program
#[derive(Args, Debug)]
struct SymbolArgs
{
    /// Symbol CSV (`name,hexAddress[,scope]` per row)
    #[arg(long)]
    symbols: PathBuf,
    /// Bounds CSV (`label,hexStart,hexEnd` per row)
    #[arg(long)]
    bounds: PathBuf,
    /// Row of the bounds CSV to use (e.g. US, EU, JP, KR)
    #[arg(long, default_value = "US")]
    region: String,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print a full report on a crash dump (.dmp)
    Luma
    {
        /// Path to the crash dump
        dump: PathBuf,
    },
    /// Print the raw stack words of a crash dump
    Stack
    {
        /// Path to the crash dump
        dump: PathBuf,
        /// Number of lines (four words each) to display
        #[arg(short, long, default_value_t = report::DEFAULT_STACK_LINES)]
        lines: usize,
    },
    /// Resolve the crash location and call stack of one or more dumps
    Analyze
    {
        /// Paths to the crash dumps
        #[arg(required = true)]
        dumps: Vec<PathBuf>,
        #[command(flatten)]
        symbols: SymbolArgs,
        /// Maximum call stack entries per dump (0 = unlimited)
        #[arg(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
        depth: u32,
    },
    /// Look up the symbol containing an address
    Symbol
    {
        /// Address to look up (hexadecimal)
        address: String,
        #[command(flatten)]
        symbols: SymbolArgs,
    },
    /// Match a crash dump against known causes
    Solve
    {
        /// Path to the crash dump
        dump: PathBuf,
    },
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match init_logging(cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> CliResult<()>
{
    match cli.command {
        Commands::Luma { dump } => {
            let dump = load_dump(&dump)?;
            print!("{}", report::luma_report(&dump, &classify(&dump)));
        }
        Commands::Stack { dump, lines } => {
            let dump = load_dump(&dump)?;
            print!("{}", report::stack_dump(&dump, lines));
        }
        Commands::Analyze { dumps, symbols, depth } => {
            let table = Arc::new(load_table(&symbols)?);
            let runtime = tokio::runtime::Runtime::new()?;
            let reports = runtime.block_on(analyze_all(dumps, table, depth))?;
            print!("{}", reports.join("\n"));
        }
        Commands::Symbol { address, symbols } => {
            let address = sources::parse_address(&address)?;
            let table = load_table(&symbols)?;
            println!("{}", report::symbol_lookup(address, table.resolve(address).as_ref()));
        }
        Commands::Solve { dump } => {
            let dump = load_dump(&dump)?;
            print!("{}", report::solver_report(&solve(&dump)));
        }
    }
    Ok(())
}

fn load_dump(path: &Path) -> BertramResult<CrashDump>
{
    debug!(path = %path.display(), "reading crash dump");
    let bytes = std::fs::read(path)?;
    Ok(CrashDump::decode(&bytes)?)
}

fn load_table(args: &SymbolArgs) -> CliResult<SymbolTable>
{
    Ok(sources::load_symbol_table(&args.symbols, &args.bounds, &args.region)?)
}

/// Decode and analyze every dump on the blocking pool, reporting in argument order
async fn analyze_all(dumps: Vec<PathBuf>, table: Arc<SymbolTable>, depth: u32) -> CliResult<Vec<String>>
{
    info!(count = dumps.len(), depth, "analyzing crash dumps");

    let handles: Vec<_> = dumps
        .into_iter()
        .map(|path| {
            let table = Arc::clone(&table);
            tokio::task::spawn_blocking(move || analyze_one(&path, &table, depth))
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await??);
    }
    Ok(reports)
}

fn analyze_one(path: &Path, table: &SymbolTable, depth: u32) -> CliResult<String>
{
    let dump = load_dump(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let class = classify(&dump);
    let analysis = analyze(&dump, table, depth);
    Ok(format!(
        "== {} ==\n{}",
        path.display(),
        report::analysis_report(&dump, &class, &analysis)
    ))
}

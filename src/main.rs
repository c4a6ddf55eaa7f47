use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use bill_cleaner::app::clean_use_case::{CleanOutcome, CleanUseCase};
use bill_cleaner::app::merge_use_case::{MergeOutcome, MergeUseCase};
use bill_cleaner::app::ports::DiagnosticsPort;
use bill_cleaner::app::run_use_case::RunUseCase;
use bill_cleaner::config::Config;
use bill_cleaner::domain::Platform;
use bill_cleaner::infra::diagnostics_adapter::TracingDiagnostics;
use bill_cleaner::infra::normalize_output_adapter::CsvLedgerOutputAdapter;
use bill_cleaner::pipeline::processing::platforms::PlatformRegistry;
use bill_cleaner::{logging, report};

#[derive(Parser)]
#[command(name = "bill_cleaner")]
#[command(about = "Normalize Alipay, WeChat Pay and JD.com bill exports into one ledger")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to $BILL_CLEANER_CONFIG or bill_cleaner.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean every enabled platform, merge, and write the report
    Run,
    /// Clean a single export file
    Clean {
        /// alipay, wechat or jingdong
        #[arg(long, value_parser = parse_platform)]
        platform: Platform,
        file: PathBuf,
    },
    /// Merge existing normalized files only
    Merge,
}

fn parse_platform(value: &str) -> std::result::Result<Platform, String> {
    value.parse::<Platform>().map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    config.ensure_directories().context("creating data directories")?;
    let _log_guard = logging::init_logging(&config.log_dir);

    let diagnostics: Arc<dyn DiagnosticsPort> = Arc::new(TracingDiagnostics::new());
    let cleaner = CleanUseCase::new(diagnostics.clone(), Box::new(CsvLedgerOutputAdapter::new()));
    let merger = MergeUseCase::new(diagnostics.clone(), Box::new(CsvLedgerOutputAdapter::new()));

    match cli.command {
        Commands::Run => {
            println!("🚀 Cleaning bills from {}...", config.input_dir.display());
            let output_dir = config.output_dir.clone();
            let write = config.write_report;
            let summary = RunUseCase::new(config, cleaner, merger, diagnostics).run();

            for result in &summary.platforms {
                let ok = result.files.iter().filter(|f| f.is_success()).count();
                println!(
                    "   {}: {:?} ({}/{} files)",
                    result.platform.display_name(),
                    result.status,
                    ok,
                    result.files.len()
                );
            }
            if write {
                let path = report::write_report(&summary, &output_dir).context("writing report")?;
                println!("📄 Report written to {}", path.display());
            }

            if summary.has_failures() {
                println!("⚠️  Run finished with failures");
            } else {
                println!("✅ Run completed successfully");
            }
            info!(exit_code = summary.exit_code(), "Run finished");
            Ok(ExitCode::from(summary.exit_code() as u8))
        }
        Commands::Clean { platform, file } => {
            let registry = PlatformRegistry::new();
            let profile = registry
                .get(platform)
                .with_context(|| format!("no profile registered for {}", platform))?;

            match cleaner.clean_file(profile, &file, &config.output_dir) {
                CleanOutcome::Success(stats) => {
                    println!("✅ {} -> {}", file.display(), stats.output_file.display());
                    println!("   Rows: {} -> {}", stats.original_rows, stats.final_rows);
                    println!(
                        "   Dropped: {} empty, {} duplicate",
                        stats.cleaned_rows, stats.deduplicated_rows
                    );
                    println!(
                        "   Income: {}  Expense: {}  Net: {}",
                        stats.income_total,
                        stats.expense_total,
                        stats.net_total()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                CleanOutcome::Failed { error, .. } => {
                    println!("❌ {}: {}", file.display(), error);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Merge => {
            match merger
                .merge(&config.output_dir, &config.merged_file_name)
                .context("merging normalized files")?
            {
                MergeOutcome::Merged(stats) => {
                    println!(
                        "✅ Merged {} files into {} ({} rows)",
                        stats.sources.len(),
                        stats.output_file.display(),
                        stats.total_rows
                    );
                }
                MergeOutcome::NothingToMerge => {
                    println!("⚠️  Nothing to merge in {}", config.output_dir.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use pitest_report::summary::ReportSummary;
use pitest_report::{load_project_report, ProjectReport};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pitest-report")]
#[command(about = "Summarize PIT mutation testing reports per source file")]
struct Cli {
    /// Log debug output regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print mutant counts and mutation coverage for each source file
    Summary {
        /// PIT XML reports (mutations.xml)
        #[arg(required = true)]
        reports: Vec<PathBuf>,

        /// Minimum mutation coverage per source file, in percent
        #[arg(
            short,
            long,
            env = "PITEST_REPORT_THRESHOLD",
            value_parser = clap::value_parser!(u32).range(0..=100)
        )]
        threshold: Option<u32>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the mutants of each source file grouped by line, as JSON
    Json {
        /// PIT XML report
        report: PathBuf,

        /// Only print this project-relative source file
        #[arg(short, long)]
        file: Option<String>,
    },
    /// List mutants that no test killed
    Survivors {
        /// PIT XML report
        report: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Summary {
            reports,
            threshold,
            format,
        } => {
            // Reports are independent; the mutator catalog is shared read-only
            let summaries = reports
                .par_iter()
                .map(|path| {
                    let project = load(path)?;
                    Ok(ReportSummary::new(path.display().to_string(), &project))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            match format {
                OutputFormat::Text => {
                    for summary in &summaries {
                        print!("{}", summary.render_text());
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&summaries)?);
                }
            }

            if let Some(threshold) = threshold {
                for summary in &summaries {
                    summary.check_threshold(threshold)?;
                }
            }
        }
        Commands::Json { report, file } => {
            let project = load(&report)?;

            if let Some(relative_path) = file {
                let Some(source_file) = project.source_file_report(&relative_path) else {
                    bail!("No mutants for {} in {}", relative_path, report.display());
                };
                if let Some(json) = source_file.to_json()? {
                    println!("{}", json);
                }
                return Ok(());
            }

            for source_file in project.source_file_reports() {
                if let Some(json) = source_file.to_json()? {
                    println!("{}", source_file.relative_path());
                    println!("{}", json);
                }
            }
        }
        Commands::Survivors { report } => {
            let project = load(&report)?;
            let mut survivors = 0;

            for mutant in project.survivors() {
                survivors += 1;
                println!(
                    "{}:{}: {}",
                    mutant.relative_path(),
                    mutant.line_number(),
                    mutant.violation_description()
                );
            }
            println!("{} surviving mutants", survivors);
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<ProjectReport> {
    load_project_report(path).with_context(|| format!("Failed to process {}", path.display()))
}

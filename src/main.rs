// Command-line entry point.
//
// `etl` runs the pipeline once and prints a preview of each table,
// `dashboard` opens the interactive terminal menu over the exported data,
// and `serve` exposes the same views over HTTP.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use movie_report::config::{AppConfig, CliConfig, FileConfig};
use movie_report::dashboard::terminal::Terminal;
use movie_report::dashboard::Dataset;
use movie_report::output::preview_table;
use movie_report::server::{run_server, DOWNLOAD_FILE_NAME};
use movie_report::util::format_int;
use movie_report::{run_etl, EtlSummary};
use std::io;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const PREVIEW_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "movie-report", version, about = "Movie dataset ETL and dashboard")]
struct CliArgs {
    /// Optional TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the raw merged CSV and export the analysis tables.
    Etl {
        /// Raw merged movies CSV.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory the tables are written to.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Browse the exported tables in the terminal.
    Dashboard {
        /// Directory holding the ETL output.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Serve the dashboard views over HTTP.
    Serve {
        /// Directory holding the ETL output.
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// The port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Command {
    fn cli_config(&self) -> CliConfig {
        match self {
            Command::Etl { input, output_dir } => CliConfig {
                input: input.clone(),
                output_dir: output_dir.clone(),
                port: None,
            },
            Command::Dashboard { data_dir } => CliConfig {
                output_dir: data_dir.clone(),
                ..CliConfig::default()
            },
            Command::Serve { data_dir, port } => CliConfig {
                output_dir: data_dir.clone(),
                port: *port,
                ..CliConfig::default()
            },
        }
    }
}

fn print_summary(summary: &EtlSummary, output_dir: &Path) {
    let load = &summary.load;
    println!(
        "Processing dataset... ({} rows read, {} skipped)",
        format_int(load.total_rows),
        format_int(load.parse_errors)
    );
    println!(
        "Imputed medians: runtime {}, duration {}, aspect ratio {}",
        format_int(load.imputed_runtime),
        format_int(load.imputed_duration),
        format_int(load.imputed_aspect_ratio)
    );
    if load.year_from_title_year > 0 {
        println!(
            "Info: year taken from title year for {} rows.",
            format_int(load.year_from_title_year)
        );
    }

    let t = &summary.tables;
    preview_table("Director Performance", &t.directors, PREVIEW_ROWS);
    preview_table("Lead Actor Performance", &t.actors, PREVIEW_ROWS);
    preview_table("Yearly Trends", &t.yearly, PREVIEW_ROWS);
    preview_table("Funnel Analysis", &t.funnel, t.funnel.len());
    preview_table("Genre Performance", &t.genres, PREVIEW_ROWS);
    preview_table("Exported Files", &summary.files, summary.files.len());
    println!("Outputs saved to {}", output_dir.display());
}

fn load_dataset(config: &AppConfig) -> Result<Dataset> {
    Dataset::load(&config.output_dir, config.min_support)
        .with_context(|| format!("Cannot open dashboard data in {:?}", config.output_dir))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.command.cli_config(), file_config)?;

    match cli_args.command {
        Command::Etl { .. } => {
            let summary = run_etl(&config.input, &config.output_dir)
                .with_context(|| format!("ETL failed for {:?}", config.input))?;
            print_summary(&summary, &config.output_dir);
        }
        Command::Dashboard { .. } => {
            let dataset = load_dataset(&config)?;
            let stdin = io::stdin();
            Terminal::new(
                &dataset,
                stdin.lock(),
                io::stdout(),
                Path::new(DOWNLOAD_FILE_NAME),
            )
            .run()?;
        }
        Command::Serve { .. } => {
            let dataset = load_dataset(&config)?;
            run_server(dataset, config.port)
                .await
                .with_context(|| format!("Server on port {} stopped", config.port))?;
        }
    }
    Ok(())
}

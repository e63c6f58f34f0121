// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use docgen_core::utils::logging::{
    format_error, format_info, format_module_line, format_success, format_warning, init_logger,
};
use docgen_core::{
    Config, FileProcessor, FileScanner, JsonExporter, PipelineOrchestrator, PipelineRequest,
    PipelineResponse, ScannedFile, Validator,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "docgen")]
#[command(version)]
#[command(about = "Structural documentation summary for Python repositories", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire a repository, parse every Python file and print the summary
    Summarize {
        /// Existing directory to analyse in place
        #[arg(long, value_name = "DIR")]
        local_path: Option<String>,

        /// Remote repository to shallow-clone
        #[arg(long, value_name = "URL")]
        repo_url: Option<String>,

        #[arg(long)]
        depth: Option<u32>,

        /// Clone timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Extra exclude glob, repeatable
        #[arg(long = "exclude", value_name = "GLOB")]
        exclude_patterns: Vec<String>,

        /// Abort parsing after this many seconds
        #[arg(long = "deadline", value_name = "SECS")]
        deadline_secs: Option<u64>,

        /// Read the whole request from a JSON file instead of flags
        #[arg(long, value_name = "FILE", conflicts_with_all = ["local_path", "repo_url"])]
        request: Option<PathBuf>,

        #[arg(short, long)]
        pretty: bool,

        /// Also write the response (and per-file units) under this directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// List modules with a coloured overview on stderr
        #[arg(long)]
        overview: bool,
    },

    /// List the source files a summarize run would parse
    Discover {
        path: PathBuf,

        #[arg(long = "exclude", value_name = "GLOB")]
        exclude_patterns: Vec<String>,
    },

    /// Parse a single Python file and print its declarations
    Parse {
        file: PathBuf,

        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the JSON Schema of a summarize request
    Schema,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    let mut config = if cli.config.exists() {
        info!("Loading configuration from: {}", cli.config.display());
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        Config::load(None).context("Failed to load configuration")?
    };
    config.pipeline.color &= cli.color;

    match cli.command {
        Commands::Summarize {
            local_path,
            repo_url,
            depth,
            timeout,
            exclude_patterns,
            deadline_secs,
            request,
            pretty,
            output,
            overview,
        } => {
            let request = match request {
                Some(path) => read_request(&path)?,
                None => PipelineRequest {
                    local_path,
                    repo_url,
                    depth,
                    timeout,
                    exclude_patterns,
                    deadline_secs,
                },
            };
            cmd_summarize(config, request, pretty, output, overview).await?;
        }
        Commands::Discover {
            path,
            exclude_patterns,
        } => {
            cmd_discover(&config, &path, &exclude_patterns).await?;
        }
        Commands::Parse { file, pretty } => {
            cmd_parse(&file, pretty)?;
        }
        Commands::Schema => {
            print_json(&PipelineRequest::schema(), true)?;
        }
        Commands::Config => {
            print_json(&config, true)?;
        }
    }

    Ok(())
}

fn read_request(path: &Path) -> Result<PipelineRequest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid request in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", encoded);
    Ok(())
}

async fn cmd_summarize(
    config: Config,
    request: PipelineRequest,
    pretty: bool,
    output: Option<PathBuf>,
    overview: bool,
) -> Result<()> {
    let orchestrator = PipelineOrchestrator::new(config).context("Invalid configuration")?;
    let result = orchestrator.run(&request).await;

    if let Ok(report) = &result {
        let summary = &report.summary;
        eprintln!(
            "{}",
            format_success(&format!(
                "{} files, {} modules, {} classes, {} functions, {} methods ({:.1}% documented)",
                summary.files,
                summary.modules,
                summary.classes,
                summary.functions,
                summary.methods,
                summary.documented_ratio()
            ))
        );
        if !summary.parse_errors.is_empty() {
            eprintln!(
                "{}",
                format_warning(&format!(
                    "{} files could not be parsed",
                    summary.parse_errors.len()
                ))
            );
        }
        if overview {
            for entry in &summary.top_modules {
                eprintln!(
                    "{}",
                    format_module_line(&entry.module, entry.classes, entry.functions, entry.has_doc)
                );
            }
        }
        if let Some(dir) = &output {
            let exporter = JsonExporter::new(dir)?;
            let manifest = exporter.export_units(&report.units, pretty)?;
            eprintln!(
                "{}",
                format_info(&format!(
                    "Wrote {} unit files under {}",
                    manifest.total_units,
                    dir.display()
                ))
            );
        }
    }

    let response = PipelineResponse::from_result(result);
    print_json(&response, pretty)?;

    if let Some(dir) = &output {
        let path = JsonExporter::new(dir)?.export_response(&response, pretty)?;
        eprintln!("{}", format_info(&format!("Response saved to {}", path.display())));
    }

    match response {
        PipelineResponse::Completed(_) => Ok(()),
        PipelineResponse::Failed { kind, message } => {
            eprintln!("{}", format_error(&format!("{}: {}", kind, message)));
            anyhow::bail!("summarize failed ({})", kind)
        }
    }
}

async fn cmd_discover(config: &Config, path: &Path, exclude_patterns: &[String]) -> Result<()> {
    Validator::validate_directory(path)?;

    let scanner = FileScanner::with_excludes(&config.discovery, exclude_patterns)?;
    let root = path.to_path_buf();
    let (files, errors) = tokio::task::spawn_blocking(move || scanner.scan_directory(&root))
        .await
        .context("Discovery task failed")?;

    for file in &files {
        println!("{}", file.relative_path);
    }
    for error in &errors {
        warn!("Skipped {}: {}", error.path, error.message);
    }

    eprintln!(
        "{}",
        format_success(&format!("{} source files discovered", files.len()))
    );
    Ok(())
}

fn cmd_parse(file: &Path, pretty: bool) -> Result<()> {
    let metadata =
        fs::metadata(file).with_context(|| format!("Cannot read {}", file.display()))?;
    let relative_path = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let scanned = ScannedFile {
        path: file.to_path_buf(),
        relative_path,
        size: metadata.len(),
    };
    let unit = FileProcessor::new().process(&scanned);

    if let Some(error) = &unit.parse_error {
        eprintln!(
            "{}",
            format_warning(&format!("{:?}: {}", error.kind, error.message))
        );
    }
    print_json(&unit, pretty)
}

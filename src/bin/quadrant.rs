//! Quadrant CLI - command-line interface for the survey analytics pipeline
//!
//! Commands:
//! - analyze: Run a batch of raw submissions into the dashboard JSON
//! - normalize: Emit normalized submissions for inspection (no aggregation)
//! - validate: Report how well a batch resolves against the canonical fields
//! - schema: Print example input/output shapes

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use quadrant_analytics::fieldmap::{FieldMap, MetricField};
use quadrant_analytics::ingest;
use quadrant_analytics::resolver::NormalizedRecord;
use quadrant_analytics::types::RawSubmission;
use quadrant_analytics::{
    AnalyticsProcessor, IngestError, PipelineConfig, PIPELINE_VERSION,
};

/// Environment prefix for field-map overrides, e.g. QA_COLUMN_MOTIVATION
const ENV_COLUMN_PREFIX: &str = "QA_COLUMN_";

/// Quadrant - survey analytics pipeline
#[derive(Parser)]
#[command(name = "quadrant")]
#[command(version = PIPELINE_VERSION)]
#[command(about = "Score survey submissions against a behavioral framework", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch into the dashboard analytics JSON
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Field-map override as field=column (repeatable); also read from
        /// QA_COLUMN_<FIELD> environment variables
        #[arg(long = "map", value_name = "FIELD=COLUMN")]
        map: Vec<String>,
    },

    /// Normalize a batch and emit one submission per line (no aggregation)
    Normalize {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Field-map override as field=column (repeatable)
        #[arg(long = "map", value_name = "FIELD=COLUMN")]
        map: Vec<String>,
    },

    /// Report per-field resolution coverage for a batch
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print example input/output shapes
    Schema {
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Comma-separated values with a header row
    Csv,
    /// Tab-separated values with a header row
    Tsv,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaType {
    /// Example raw submission records
    Input,
    /// Example dashboard analytics payload
    Output,
}

#[derive(Serialize)]
struct CliError {
    error: &'static str,
    message: String,
}

enum QuadrantCliError {
    Ingest(IngestError),
    Io(io::Error),
    BadMapArg(String),
    NoInput,
}

impl From<IngestError> for QuadrantCliError {
    fn from(e: IngestError) -> Self {
        QuadrantCliError::Ingest(e)
    }
}

impl From<io::Error> for QuadrantCliError {
    fn from(e: io::Error) -> Self {
        QuadrantCliError::Io(e)
    }
}

impl From<QuadrantCliError> for CliError {
    fn from(e: QuadrantCliError) -> Self {
        match e {
            QuadrantCliError::Ingest(e) => CliError {
                error: "ingest",
                message: e.to_string(),
            },
            QuadrantCliError::Io(e) => CliError {
                error: "io",
                message: e.to_string(),
            },
            QuadrantCliError::BadMapArg(arg) => CliError {
                error: "config",
                message: format!("expected FIELD=COLUMN, got '{arg}'"),
            },
            QuadrantCliError::NoInput => CliError {
                error: "io",
                message: "stdin is a terminal; pipe input or pass --input FILE".to_string(),
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let envelope = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&envelope)
                    .unwrap_or_else(|_| "{\"error\":\"unknown\"}".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), QuadrantCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            input_format,
            output_format,
            map,
        } => cmd_analyze(&input, &output, input_format, output_format, &map),
        Commands::Normalize {
            input,
            output,
            input_format,
            map,
        } => cmd_normalize(&input, &output, input_format, &map),
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
        Commands::Schema { schema_type } => {
            cmd_schema(schema_type);
            Ok(())
        }
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    map_args: &[String],
) -> Result<(), QuadrantCliError> {
    let records = read_records(input, input_format)?;
    let config = PipelineConfig::new(resolve_field_map(map_args)?);
    let analytics = AnalyticsProcessor::with_config(config).analyze(&records);

    let rendered = match output_format {
        OutputFormat::Json => serde_json::to_string(&analytics),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&analytics),
    }
    .expect("dashboard analytics serializes");
    write_output(output, &rendered)
}

fn cmd_normalize(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    map_args: &[String],
) -> Result<(), QuadrantCliError> {
    let records = read_records(input, input_format)?;
    let config = PipelineConfig::new(resolve_field_map(map_args)?);
    let submissions = AnalyticsProcessor::with_config(config).normalize_batch(&records);

    let mut lines = String::new();
    for submission in &submissions {
        lines.push_str(&serde_json::to_string(submission).expect("submission serializes"));
        lines.push('\n');
    }
    write_output(output, lines.trim_end())
}

#[derive(Serialize)]
struct FieldCoverage {
    field: &'static str,
    resolved: usize,
    total: usize,
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    as_json: bool,
) -> Result<(), QuadrantCliError> {
    let records = read_records(input, input_format)?;
    let field_map = resolve_field_map(&[])?;

    let coverage: Vec<FieldCoverage> = MetricField::ALL
        .into_iter()
        .map(|field| {
            let resolved = records
                .iter()
                .filter(|r| {
                    NormalizedRecord::from_raw(r)
                        .resolve_field(field, &field_map)
                        .is_some()
                })
                .count();
            FieldCoverage {
                field: field.as_str(),
                resolved,
                total: records.len(),
            }
        })
        .collect();

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&coverage).expect("coverage serializes")
        );
    } else {
        println!("{} records", records.len());
        for row in &coverage {
            println!("{:<20} {:>5} / {}", row.field, row.resolved, row.total);
        }
    }
    Ok(())
}

fn cmd_schema(schema_type: SchemaType) {
    match schema_type {
        SchemaType::Input => {
            println!(
                "{}",
                r#"{"Response ID": "r1", "C1": "Extremely", "C2": "Very much", "B2": "yes", "Submitted At": "2024-03-04T10:00:00Z"}"#
            );
        }
        SchemaType::Output => {
            let example = quadrant_analytics::run_pipeline(
                &example_records(),
                &PipelineConfig::default(),
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&example).expect("example serializes")
            );
        }
    }
}

fn example_records() -> Vec<RawSubmission> {
    let raw = r#"[
        {"Response ID": "r1", "C1": "Extremely", "C2": "Very much", "D1": 4, "D2": 5, "B2": "yes", "F1": "Common"},
        {"Response ID": "r2", "motivation_score": 2, "ability_score": 4, "B2": "no"}
    ]"#;
    ingest::parse_json(raw).expect("example records parse")
}

/// Field map from defaults, QA_COLUMN_* environment variables, then --map
/// arguments, in increasing precedence. The core never reads the
/// environment itself; overrides are resolved here and passed in.
fn resolve_field_map(map_args: &[String]) -> Result<FieldMap, QuadrantCliError> {
    let mut field_map = FieldMap::default();
    for field in MetricField::ALL {
        let var = format!("{}{}", ENV_COLUMN_PREFIX, field.as_str().to_uppercase());
        if let Ok(column) = std::env::var(&var) {
            if !column.trim().is_empty() {
                field_map.set(field, column.trim());
            }
        }
    }
    for arg in map_args {
        let (key, column) = arg
            .split_once('=')
            .ok_or_else(|| QuadrantCliError::BadMapArg(arg.clone()))?;
        let field = MetricField::from_key(key.trim())
            .ok_or_else(|| QuadrantCliError::BadMapArg(arg.clone()))?;
        field_map.set(field, column.trim());
    }
    Ok(field_map)
}

fn read_records(
    input: &Path,
    format: InputFormat,
) -> Result<Vec<RawSubmission>, QuadrantCliError> {
    let content = read_input(input)?;
    let records = match format {
        InputFormat::Ndjson => ingest::parse_ndjson(&content)?,
        InputFormat::Json => ingest::parse_json(&content)?,
        InputFormat::Csv => ingest::parse_delimited(&content, b',')?,
        InputFormat::Tsv => ingest::parse_delimited(&content, b'\t')?,
    };
    Ok(records)
}

fn read_input(path: &Path) -> Result<String, QuadrantCliError> {
    if path.as_os_str() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(QuadrantCliError::NoInput);
        }
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn write_output(path: &Path, content: &str) -> Result<(), QuadrantCliError> {
    if path.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{content}")?;
        Ok(())
    } else {
        fs::write(path, format!("{content}\n"))?;
        Ok(())
    }
}

//! Vitalog CLI - Command-line interface for Vitalog
//!
//! Commands:
//! - summarize: Summarize one patient over a week or month plus the rolling three months
//! - entries: Dump the normalized entries of one patient
//! - validate: Report records that would be excluded from normalization
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use vitalog::pipeline::infer_patient_id;
use vitalog::schema::{field::parse_date, Metric, RawRecord, RecordAdapter};
use vitalog::{
    normalize_records, EngineConfig, Period, PatientSession, ReportEncoder, SummaryReport,
    VitalsError, PRODUCER_NAME, VITALOG_VERSION,
};

/// Vitalog - Normalization and windowed aggregation for daily patient health logs
#[derive(Parser)]
#[command(name = "vitalog")]
#[command(version = VITALOG_VERSION)]
#[command(about = "Summarize daily patient health logs", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one patient over the selected period and the rolling three months
    Summarize {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Patient to select from a combined export (defaults to the first Patient_ID)
        #[arg(long)]
        patient_id: Option<String>,

        /// Reference date (YYYY-MM-DD); defaults to the latest record date
        #[arg(long)]
        date: Option<String>,

        /// Navigable period
        #[arg(long, default_value = "week")]
        period: PeriodArg,

        /// Engine configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Dump the normalized entries of one patient
    Entries {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Patient to select from a combined export (defaults to the first Patient_ID)
        #[arg(long)]
        patient_id: Option<String>,

        /// Only print entries of this metric
        #[arg(long)]
        metric: Option<MetricArg>,

        /// Engine configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Report records that would be excluded from normalization
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// CSV with a header row (one row per patient-day)
    Csv,
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable text
    Text,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Week,
    Month,
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Week => Period::Week,
            PeriodArg::Month => Period::Month,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Glucose,
    BloodPressure,
    Exercise,
    Mood,
    Pain,
    Sleep,
    Meals,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Glucose => Metric::Glucose,
            MetricArg::BloodPressure => Metric::BloodPressure,
            MetricArg::Exercise => Metric::Exercise,
            MetricArg::Mood => Metric::Mood,
            MetricArg::Pain => Metric::Pain,
            MetricArg::Sleep => Metric::Sleep,
            MetricArg::Meals => Metric::Meals,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "vitalog=debug" } else { "vitalog=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), VitalogCliError> {
    match cli.command {
        Commands::Summarize {
            input,
            input_format,
            patient_id,
            date,
            period,
            config,
            output,
            output_format,
        } => cmd_summarize(
            &input,
            input_format,
            patient_id,
            date.as_deref(),
            period.into(),
            config.as_deref(),
            &output,
            output_format,
        ),

        Commands::Entries {
            input,
            input_format,
            patient_id,
            metric,
            config,
            output,
        } => cmd_entries(
            &input,
            input_format,
            patient_id,
            metric.map(Metric::from),
            config.as_deref(),
            &output,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_summarize(
    input: &Path,
    input_format: InputFormat,
    patient_id: Option<String>,
    date: Option<&str>,
    period: Period,
    config: Option<&Path>,
    output: &Path,
    output_format: OutputFormat,
) -> Result<(), VitalogCliError> {
    let config = load_config(config)?;
    let (patient_id, records) = load_patient(input, input_format, patient_id)?;

    let reference_date = match date {
        Some(raw) => Some(parse_date(raw).ok_or_else(|| {
            VitalogCliError::InvalidArgument(format!("'{raw}' is not a YYYY-MM-DD date"))
        })?),
        None => None,
    };

    let session = PatientSession::from_records(
        &patient_id,
        &records,
        &config,
        reference_date,
        period,
    )?;
    let report = session.report(&ReportEncoder::new());

    let rendered = match output_format {
        OutputFormat::Json => serde_json::to_string(&report)? + "\n",
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)? + "\n",
        OutputFormat::Text => format_text(&report),
    };
    write_output(output, &rendered)
}

fn cmd_entries(
    input: &Path,
    input_format: InputFormat,
    patient_id: Option<String>,
    metric: Option<Metric>,
    config: Option<&Path>,
    output: &Path,
) -> Result<(), VitalogCliError> {
    let config = load_config(config)?;
    let (patient_id, records) = load_patient(input, input_format, patient_id)?;
    let series = normalize_records(&patient_id, &records, &config)?;

    let mut value = serde_json::to_value(&series)?;
    if let Some(metric) = metric {
        value = value
            .get_mut(metric.as_str())
            .map(serde_json::Value::take)
            .unwrap_or_default();
    }

    write_output(output, &(serde_json::to_string_pretty(&value)? + "\n"))
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), VitalogCliError> {
    let records = read_records(input, input_format)?;
    let results = RecordAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                patient_id: records.get(r.index).and_then(|rec| rec.text("Patient_ID")),
                error: r.problem.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Row {} (patient {}): {}",
                    err.index,
                    err.patient_id.as_deref().unwrap_or("unknown"),
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(VitalogCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), VitalogCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "vitalog_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Vitalog version {}", VITALOG_VERSION),
    });

    match config {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        }),
        Some(path) => {
            let check = match fs::read_to_string(path) {
                Ok(content) => match EngineConfig::from_json(&content) {
                    Ok(config) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (unknown_time {}, medication_name_limit {})",
                            config.unknown_time, config.medication_name_limit
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            };
            checks.push(check);
        }
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VITALOG_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitalog Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitalogCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, VitalogCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), VitalogCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn read_records(input: &Path, format: InputFormat) -> Result<Vec<RawRecord>, VitalogCliError> {
    let data = read_input(input)?;
    let records = match format {
        InputFormat::Csv => RecordAdapter::parse_csv_str(&data)?,
        InputFormat::Json => RecordAdapter::parse_array(&data)?,
        InputFormat::Ndjson => RecordAdapter::parse_ndjson(&data)?,
    };
    if records.is_empty() {
        return Err(VitalogCliError::NoRecords);
    }
    Ok(records)
}

/// Read the input and keep the rows of one patient
fn load_patient(
    input: &Path,
    format: InputFormat,
    patient_id: Option<String>,
) -> Result<(String, Vec<RawRecord>), VitalogCliError> {
    let records = read_records(input, format)?;
    let patient_id = patient_id
        .or_else(|| infer_patient_id(&records))
        .unwrap_or_else(|| "unknown".to_string());
    let records = RecordAdapter::select_patient(records, &patient_id);
    Ok((patient_id, records))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, VitalogCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}

fn format_text(report: &SummaryReport) -> String {
    let mut lines = vec![
        format!("Patient {}", report.provenance.patient_id),
        format!(
            "Dataset {} to {} ({} records, {} excluded)",
            report.provenance.dataset_start,
            report.provenance.dataset_end,
            report.provenance.records_total,
            report.provenance.records_excluded
        ),
    ];

    for (title, summary) in [("Period", &report.period), ("Last three months", &report.three_month)]
    {
        lines.push(String::new());
        lines.push(format!(
            "{} {} to {}",
            title,
            summary.window.start.date(),
            summary.window.end.date()
        ));
        if summary.is_empty() {
            lines.push("  no data".to_string());
            continue;
        }
        if let Some(g) = &summary.glucose {
            lines.push(format!(
                "  glucose         mean {:.1}, {}% in range ({} readings)",
                g.mean_value, g.in_range_percent, g.stats.count
            ));
        }
        if let Some(bp) = &summary.blood_pressure {
            lines.push(format!(
                "  blood pressure  {:.0}/{:.0} ({})",
                bp.mean_systolic, bp.mean_diastolic, bp.risk_label
            ));
        }
        if let Some(ex) = &summary.exercise {
            lines.push(format!(
                "  exercise        {:.0} min over {} active days",
                ex.total_minutes, ex.active_days
            ));
        }
        if let Some(mood) = &summary.mood {
            lines.push(format!(
                "  mood            mostly {}",
                mood.stats.most_common.as_deref().unwrap_or("unknown")
            ));
        }
        if let Some(pain) = &summary.pain {
            lines.push(format!(
                "  pain            mean {:.1}, max {}",
                pain.mean_intensity, pain.max_intensity
            ));
        }
        if let Some(sleep) = &summary.sleep {
            lines.push(format!(
                "  sleep           {:.1} h, {}",
                sleep.mean_hours,
                sleep.quality_label.as_str()
            ));
        }
        if let Some(meals) = &summary.meals {
            lines.push(format!(
                "  meals           {} logged, alcohol on {} days",
                meals.meals_logged, meals.alcohol_days
            ));
        }
    }

    lines.join("\n") + "\n"
}

// Error types

#[derive(Debug)]
enum VitalogCliError {
    Io(io::Error),
    Engine(VitalsError),
    Json(serde_json::Error),
    InvalidArgument(String),
    NoRecords,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for VitalogCliError {
    fn from(e: io::Error) -> Self {
        VitalogCliError::Io(e)
    }
}

impl From<VitalsError> for VitalogCliError {
    fn from(e: VitalsError) -> Self {
        VitalogCliError::Engine(e)
    }
}

impl From<serde_json::Error> for VitalogCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalogCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalogCliError> for CliError {
    fn from(e: VitalogCliError) -> Self {
        match e {
            VitalogCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalogCliError::Engine(e) => {
                let (code, hint) = match &e {
                    VitalsError::EmptyRecords(_) => {
                        ("NO_PATIENT_RECORDS", "Check --patient-id against the Patient_ID column")
                    }
                    VitalsError::DateParseError(_) => {
                        ("DATE_ERROR", "Run 'vitalog validate' to list records without a valid Date")
                    }
                    VitalsError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'vitalog doctor --config <file>' for details")
                    }
                    _ => ("PARSE_ERROR", "Check that --input-format matches the input"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            VitalogCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitalogCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Run 'vitalog --help' for usage".to_string()),
            },
            VitalogCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            VitalogCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Records without a valid Date are excluded from summaries".to_string()),
            },
            VitalogCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    patient_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

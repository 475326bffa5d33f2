use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use itn_tools::filter::LocationFilter;
use itn_tools::model::{ColumnScheme, DEFAULT_SCAN_COLUMN, LocationField};
use itn_tools::pipeline::{self, InputOptions};
use itn_tools::tabulate::render_overview;
use itn_tools::{ItnError, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ItnError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract(args) => execute_extract(args),
        Command::Summarize(args) => execute_summarize(args),
        Command::Options(args) => execute_options(args),
    }
}

fn execute_extract(args: ExtractArgs) -> Result<()> {
    let options = args.input.options();
    let extraction = pipeline::extract_to_file(&args.input.input, &args.output, &options)?;
    println!(
        "Extracted {} rows to {}",
        extraction.records.len(),
        args.output.display()
    );
    Ok(())
}

fn execute_summarize(args: SummarizeArgs) -> Result<()> {
    let options = args.input.options();
    let filter = args.selection.location_filter()?;
    let analysis = pipeline::analyse(&args.input.input, &options, &filter)?;

    if analysis.records.is_empty() {
        warn!("no rows to summarise");
    }
    print!("{}", render_overview(&analysis.summaries));

    if let Some(path) = &args.json {
        pipeline::write_summary_json(path, &analysis.summaries)?;
        println!("\nSummary written to {}", path.display());
    }
    if let Some(path) = &args.workbook {
        pipeline::write_report_workbook(path, &analysis)?;
        println!("Report workbook written to {}", path.display());
    }
    Ok(())
}

fn execute_options(args: OptionsArgs) -> Result<()> {
    let options = args.input.options();
    let level = LocationField::from(args.level);
    let filter = args.selection.location_filter()?;
    let values = pipeline::level_options(&args.input.input, &options, level, &filter)?;

    if values.is_empty() {
        println!("No values available for {level}");
    }
    for value in values {
        println!("{value}");
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Extract school locations from QR scans and summarise ITN distribution."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse QR payloads and write the enriched table.
    Extract(ExtractArgs),
    /// Summarise enrollment, gender and ITN coverage by district and chiefdom.
    Summarize(SummarizeArgs),
    /// List the values available at one level of the location hierarchy.
    Options(OptionsArgs),
}

#[derive(clap::Args)]
struct InputArgs {
    /// Input table (.xlsx or .csv).
    #[arg(long)]
    input: PathBuf,

    /// Worksheet to read from an Excel input. Defaults to the first sheet.
    #[arg(long)]
    sheet: Option<String>,

    /// Header of the column holding the QR payload.
    #[arg(long, default_value = DEFAULT_SCAN_COLUMN)]
    scan_column: String,
}

impl InputArgs {
    fn options(&self) -> InputOptions {
        InputOptions {
            sheet: self.sheet.clone(),
            scheme: ColumnScheme::with_scan_column(self.scan_column.clone()),
        }
    }
}

#[derive(clap::Args)]
struct ExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output file path (.csv or .xlsx).
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct SummarizeArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Write the summaries as JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write extracted rows and summary sheets to this workbook.
    #[arg(long)]
    workbook: Option<PathBuf>,
}

#[derive(clap::Args)]
struct OptionsArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Hierarchy level to list.
    #[arg(long, value_enum)]
    level: LevelArg,

    // Selections below `--level` are ignored.
    #[command(flatten)]
    selection: SelectionArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LevelArg {
    District,
    Chiefdom,
    Phu,
    Community,
    School,
}

impl From<LevelArg> for LocationField {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::District => LocationField::District,
            LevelArg::Chiefdom => LocationField::Chiefdom,
            LevelArg::Phu => LocationField::PhuName,
            LevelArg::Community => LocationField::CommunityName,
            LevelArg::School => LocationField::SchoolName,
        }
    }
}

#[derive(clap::Args)]
struct SelectionArgs {
    /// Only include schools in this district.
    #[arg(long)]
    district: Option<String>,

    /// Only include schools in this chiefdom.
    #[arg(long)]
    chiefdom: Option<String>,

    /// Only include schools served by this PHU.
    #[arg(long)]
    phu: Option<String>,

    /// Only include schools in this community.
    #[arg(long)]
    community: Option<String>,

    /// Only include the school with this name.
    #[arg(long)]
    school: Option<String>,
}

impl SelectionArgs {
    fn location_filter(&self) -> Result<LocationFilter> {
        LocationFilter::from_levels([
            (LocationField::District, self.district.clone()),
            (LocationField::Chiefdom, self.chiefdom.clone()),
            (LocationField::PhuName, self.phu.clone()),
            (LocationField::CommunityName, self.community.clone()),
            (LocationField::SchoolName, self.school.clone()),
        ])
    }
}

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "GroundModels CLI - AGS data conversion and layered ground models"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Settings file in TOML format, overriding project and default settings
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an AGS3/AGS4 file to JSON.
    Convert(ConvertArgs),
    /// Convert AGS JSON back to AGS4 text.
    ToAgs(ToAgsArgs),
    /// Import soils and a ground model from an AGSi JSON file into a project.
    ImportAgsi(ImportAgsiArgs),
    /// Create a new project file.
    Init(InitArgs),
    /// Add a soil parameter set (JSON) to a project's soil library.
    AddSoil(AddSoilArgs),
    /// Add a layer to a model, creating the model if needed.
    AddLayer(AddLayerArgs),
    /// Report the layer and soil parameters at a depth.
    Query(QueryArgs),
    /// Print the effective stress profile of a model.
    Profile(ProfileArgs),
    /// Print a model's strip log.
    StripLog(StripLogArgs),
    /// Parse and check BS 5930 soil/rock descriptions.
    Describe(DescribeArgs),
    /// Suggest soil parameters from soil/rock descriptions.
    SuggestParams(SuggestParamsArgs),
}

/// Project file and model selection shared by the model commands.
#[derive(Args, Debug, Clone)]
pub struct ModelSelection {
    /// Path to the project file (.gmp).
    #[arg(short, long, value_name = "PATH")]
    pub project: PathBuf,

    /// Model reference (e.g. borehole name).
    #[arg(short, long, value_name = "REF")]
    pub model: String,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// AGS input file.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Output file; JSON goes to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Skip malformed data rows and report them instead of stopping.
    #[arg(long)]
    pub skip_bad_rows: bool,

    /// Write compact JSON.
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug)]
pub struct ToAgsArgs {
    /// AGS JSON input file.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Output file; AGS text goes to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportAgsiArgs {
    /// AGSi JSON input file.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Project file to import into; created when missing.
    #[arg(short, long, value_name = "PATH")]
    pub project: PathBuf,

    /// Only import the soil parameter sets, not the layered model.
    #[arg(long)]
    pub soils_only: bool,

    /// Replace library soils that share a reference with imported ones.
    #[arg(long)]
    pub replace: bool,

    /// User identifier recorded in the lock file.
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path of the project file to create.
    #[arg(value_name = "PATH")]
    pub project: PathBuf,

    #[arg(long, default_value = "")]
    pub engineer: String,

    #[arg(long, default_value = "")]
    pub job_id: String,

    #[arg(long, default_value = "")]
    pub site: String,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct AddSoilArgs {
    /// Path to the project file (.gmp).
    #[arg(short, long, value_name = "PATH")]
    pub project: PathBuf,

    /// JSON file holding one soil parameter set or an array of them.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    #[arg(long, value_name = "USER")]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddLayerArgs {
    #[command(flatten)]
    pub selection: ModelSelection,

    /// Layer top depth below ground surface (m).
    #[arg(long, value_name = "M")]
    pub top: f64,

    /// Layer bottom depth below ground surface (m).
    #[arg(long, value_name = "M")]
    pub bottom: f64,

    /// Reference of a soil in the project library.
    #[arg(long, value_name = "REF")]
    pub soil: String,

    #[arg(long)]
    pub description: Option<String>,

    /// GEOL_GEOL code, when it differs from the soil reference.
    #[arg(long, value_name = "CODE")]
    pub geol_code: Option<String>,

    /// Set the model's groundwater depth (m).
    #[arg(long, value_name = "M")]
    pub groundwater: Option<f64>,

    #[arg(long, value_name = "USER")]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub selection: ModelSelection,

    /// Depth below ground surface (m).
    #[arg(long, value_name = "M", allow_negative_numbers = true)]
    pub depth: f64,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub selection: ModelSelection,

    /// Sample spacing (m); defaults to the model's stress step.
    #[arg(long, value_name = "M")]
    pub step: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct StripLogArgs {
    #[command(flatten)]
    pub selection: ModelSelection,

    /// Include mid-layer stresses.
    #[arg(long)]
    pub stresses: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// LOCA_ID for AGS output; defaults to the model reference.
    #[arg(long, value_name = "ID")]
    pub hole_id: Option<String>,

    /// Title drawn above an SVG log.
    #[arg(long)]
    pub title: Option<String>,

    /// Vertical scale of an SVG log; fits 600 px when omitted.
    #[arg(long, value_name = "PX")]
    pub px_per_metre: Option<f64>,
}

/// Descriptions from `--text` or a file with one per line.
#[derive(Args, Debug, Clone)]
pub struct DescriptionInput {
    /// A single description, e.g. "Firm brown slightly sandy CLAY".
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// File with one description per line; blank lines are skipped.
    #[arg(value_name = "PATH", conflicts_with = "text")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub source: DescriptionInput,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,

    /// Require a strength term (consistency, density or rock strength).
    #[arg(long)]
    pub require_strength: bool,

    /// Require a primary soil or rock type.
    #[arg(long)]
    pub require_primary: bool,

    /// Skip checks for unusual term combinations.
    #[arg(long)]
    pub no_correlations: bool,
}

#[derive(Args, Debug)]
pub struct SuggestParamsArgs {
    #[command(flatten)]
    pub source: DescriptionInput,

    /// Soil reference; defaults to the primary type, numbered when there
    /// are several descriptions.
    #[arg(long, value_name = "REF")]
    pub reference: Option<String>,

    /// Add the suggested soils to this project's library.
    #[arg(long, value_name = "PATH")]
    pub add_to: Option<PathBuf>,

    #[arg(long, value_name = "USER")]
    pub user: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    /// AGS4 GEOL group (strip log only)
    Ags,
    /// SVG drawing (strip log only)
    Svg,
}

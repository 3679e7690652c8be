use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pubfig::document::Document;
use pubfig::export::{self, OutputFormat};
use pubfig::pipeline::{self, ClassifierKind, RunConfig};
use pubfig::preset::{self, Preset, PresetOverrides};
use pubfig::query::{GeometryQuery, InkscapeQuery, ReportFile, UsvgQuery};
use pubfig::style::normalize_color;
use pubfig::{Error, Result};

/// Republish an exported plot SVG as a print-ready figure
#[derive(Parser, Debug)]
#[command(name = "pubfig")]
#[command(version)]
#[command(about = "Restyle exported plots and regenerate their labels at a fixed print size", long_about = None)]
struct Args {
    /// Input SVG file (use "-" for stdin)
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output file path (extension determines format: .svg, .png or .pdf)
    #[arg(short, long, value_name = "OUTPUT", required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Built-in size preset
    #[arg(short, long, default_value = "full")]
    format: String,

    /// TOML or YAML preset file, used instead of the built-in one
    #[arg(long, value_name = "FILE")]
    preset_file: Option<PathBuf>,

    /// Plot width (number or CSS length)
    #[arg(long, value_parser = length)]
    width: Option<f64>,

    /// Plot height (number or CSS length)
    #[arg(long, value_parser = length)]
    height: Option<f64>,

    #[arg(long)]
    font_family: Option<String>,

    #[arg(long)]
    font_color: Option<String>,

    /// Tick label font size in points
    #[arg(long, value_parser = length)]
    ticks_size: Option<f64>,

    /// Axis label font size in points
    #[arg(long, value_parser = length)]
    labels_size: Option<f64>,

    #[arg(long, value_parser = length)]
    plot_stroke_width: Option<f64>,

    /// Stroke width of the frame and the grid
    #[arg(long, value_parser = length)]
    bbox_stroke_width: Option<f64>,

    /// Comma separated x-tick labels, left to right
    #[arg(long)]
    xticks: Option<String>,

    /// Comma separated y-tick labels, bottom to top
    #[arg(long)]
    yticks: Option<String>,

    /// Curve palette (brewer_set1, brewer_dark2, chamon_pal or original)
    #[arg(long, default_value = "original")]
    palette: String,

    #[arg(long, default_value = preset::DEFAULT_BBOX_COLOR)]
    bbox_color: String,

    /// Stroke color identifying the frame in the input
    #[arg(long)]
    bbox_find_color: Option<String>,

    #[arg(long, default_value = preset::DEFAULT_GRID_COLOR)]
    grid_color: String,

    /// Stroke color identifying the grid in the input
    #[arg(long)]
    grid_find_color: Option<String>,

    #[arg(long, value_enum, default_value_t = ClassifierArg::Auto)]
    classifier: ClassifierArg,

    /// Skip the legend and the example arrow
    #[arg(long)]
    no_decorations: bool,

    /// Geometry source (defaults to "report" when --report is given, else "usvg")
    #[arg(long, value_enum)]
    geometry: Option<GeometryArg>,

    /// Precomputed `id,x,y,width,height` report
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    #[arg(long, value_name = "SECS", default_value_t = 30)]
    query_timeout: u64,

    /// Raster scale multiplier for PNG output
    #[arg(long, default_value_t = 1.0)]
    png_scale: f32,

    /// Print a JSON summary of the run to stdout
    #[arg(long)]
    summary: bool,

    #[arg(short, long)]
    verbose: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClassifierArg {
    Auto,
    Style,
    Positional,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GeometryArg {
    Usvg,
    Inkscape,
    Report,
}

fn length(value: &str) -> std::result::Result<f64, String> {
    preset::parse_length(value).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "pubfig", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        Args::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "INPUT and --output are required",
            )
            .exit();
    };

    match run(&args, input, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, input: &Path, output: &Path) -> Result<()> {
    let format = OutputFormat::from_path(output)?;
    let config = run_config(args)?;

    let source = read_input(input)?;
    let query = geometry_query(args)?;
    let report = query.query(input, &source)?;
    info!(provider = query.name(), entries = report.entries().len(), "geometry report loaded");

    let doc = Document::parse(&source)?;
    let outcome = pipeline::run(doc, &report, &config)?;

    let bytes = export::render(&outcome.document.to_svg_string(), format, args.png_scale)?;
    std::fs::write(output, bytes).map_err(|source| Error::Io {
        path: output.to_path_buf(),
        source,
    })?;
    info!(path = %output.display(), "figure saved");

    if args.summary {
        let json = serde_json::to_string_pretty(&outcome.summary).map_err(|e| Error::Export {
            message: format!("cannot serialize summary: {}", e),
        })?;
        println!("{}", json);
    }
    Ok(())
}

fn run_config(args: &Args) -> Result<RunConfig> {
    let mut preset = match &args.preset_file {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            Preset::from_file_content(&content)?
        }
        None => Preset::from_builtin(&args.format)?,
    };
    preset.apply(&PresetOverrides {
        width: args.width,
        height: args.height,
        font_family: args.font_family.clone(),
        font_color: args.font_color.clone(),
        ticks_size: args.ticks_size,
        labels_size: args.labels_size,
        plot_stroke_width: args.plot_stroke_width,
        bbox_stroke_width: args.bbox_stroke_width,
    });

    let mut config = RunConfig::new(preset.validated()?);
    config.palette = preset::palette(&args.palette)?;
    config.x_ticks = args.xticks.as_deref().and_then(preset::parse_tick_labels);
    config.y_ticks = args.yticks.as_deref().and_then(preset::parse_tick_labels);
    config.bbox_color = normalize_color(&args.bbox_color);
    config.grid_color = normalize_color(&args.grid_color);
    config.bbox_find_color = args.bbox_find_color.clone();
    config.grid_find_color = args.grid_find_color.clone();
    config.classifier = match args.classifier {
        ClassifierArg::Auto => ClassifierKind::Auto,
        ClassifierArg::Style => ClassifierKind::Style,
        ClassifierArg::Positional => ClassifierKind::Positional,
    };
    config.include_decorations = !args.no_decorations;
    Ok(config)
}

fn geometry_query(args: &Args) -> Result<Box<dyn GeometryQuery>> {
    let kind = args.geometry.unwrap_or(if args.report.is_some() {
        GeometryArg::Report
    } else {
        GeometryArg::Usvg
    });
    Ok(match kind {
        GeometryArg::Usvg => Box::new(UsvgQuery),
        GeometryArg::Inkscape => Box::new(InkscapeQuery::new(Duration::from_secs(args.query_timeout))),
        GeometryArg::Report => {
            let path = args.report.clone().ok_or_else(|| Error::QueryFailed {
                message: "--geometry report needs --report FILE".to_string(),
            })?;
            Box::new(ReportFile { path })
        }
    })
}

fn read_input(path: &Path) -> Result<String> {
    if path.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

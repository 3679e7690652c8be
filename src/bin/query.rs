use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pubfig::query::UsvgQuery;

/// Print the `id,x,y,width,height` geometry report of an SVG file
#[derive(Parser, Debug)]
#[command(name = "pubfig-query")]
#[command(version)]
#[command(about = "Print the bounding box of every element with an id", long_about = None)]
struct Args {
    /// Input SVG file
    #[arg(value_name = "INPUT")]
    input: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match std::fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read {}: {}", args.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match UsvgQuery.report_text(&source) {
        Ok(report) => {
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

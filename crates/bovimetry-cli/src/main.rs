use std::path::PathBuf;
use std::process::ExitCode;

use bovimetry::annotate::annotate;
use bovimetry::pipeline::{MeasurementPipeline, PipelineParams};
use bovimetry::pose::JsonPoseProvider;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser)]
#[command(
    name = "bovimetry",
    about = "Single-photo livestock body measurement",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Measure an animal on a photograph with a reference object placed
    /// left of the subject.
    Measure(MeasureArgs),
}

#[derive(clap::Args)]
struct MeasureArgs {
    /// Source photograph.
    image: PathBuf,

    /// JSON file with the pose backend's normalized landmarks.
    #[arg(long)]
    pose: PathBuf,

    /// Physical width of the reference object, in report units.
    #[arg(long, default_value_t = 30.0)]
    reference_dimension: f64,

    /// Minimum contour area (px^2) for reference candidates.
    #[arg(long, default_value_t = 1000.0)]
    min_area: f64,

    /// Write the measurement record here as JSON.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write the annotated overlay image here.
    #[arg(long)]
    annotated: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Measurement-crate records only by default; -vv opens the floodgates.
    let _ = match cli.verbose {
        0 => bovimetry_core::init_scoped(LevelFilter::Info, "bovimetry"),
        1 => bovimetry_core::init_scoped(LevelFilter::Debug, "bovimetry"),
        _ => bovimetry_core::init_with_level(LevelFilter::Trace),
    };

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Measure(args) => run_measure(args),
    }
}

fn run_measure(args: MeasureArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rgb = image::open(&args.image)?.to_rgb8();
    let pose = JsonPoseProvider::load_json(&args.pose)?;

    let mut params = PipelineParams::default();
    params.calibration.reference_dimension = args.reference_dimension;
    params.calibration.min_contour_area = args.min_area;

    let pipeline = MeasurementPipeline::new(params, pose);
    let outcome = pipeline.measure(&rgb)?;

    if let Some(path) = &args.out {
        outcome.result.write_json(path)?;
        log::info!("wrote measurement record to {}", path.display());
    }
    if let Some(path) = &args.annotated {
        annotate(&rgb, &outcome).save(path)?;
        log::info!("wrote annotated image to {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn measure_defaults_match_the_calibration_contract() {
        let cli = Cli::parse_from([
            "bovimetry",
            "measure",
            "photo.jpg",
            "--pose",
            "pose.json",
        ]);
        let Command::Measure(args) = cli.command;
        assert_eq!(args.reference_dimension, 30.0);
        assert_eq!(args.min_area, 1000.0);
        assert!(args.out.is_none());
    }
}

//! edgebench - edge-filter benchmark across every OpenCL device
//!
//! Runs a 3x3 find-edges filter on the host, then the same filter as an
//! OpenCL kernel on each device, and prints timings side by side.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use edgebench_compute::{OpenClBackend, Orchestrator, Progress, RunConfig};

mod logging;
mod render;

#[derive(Parser, Debug)]
#[command(name = "edgebench")]
#[command(author, version, about = "Edge-filter benchmark across all OpenCL devices")]
#[command(long_about = "
Runs a 3x3 find-edges filter on the host as a reference, then runs the same
filter as an OpenCL kernel on every device of every installed platform.

Each device writes its result next to the input name, tagged with the device
type: (GPU)photo.png, (CPU)photo.png. The host result is (REFERENCE)photo.png.

Examples:
  edgebench photo.png
  edgebench photo.png --kernel kernels/xFilter.cl --output-dir out
  edgebench photo.png --json report.json -v
")]
struct Cli {
    /// Input image (png, jpeg, bmp, tiff)
    input: PathBuf,

    /// Kernel source file [env: EDGEBENCH_KERNEL]
    #[arg(short, long)]
    kernel: Option<PathBuf>,

    /// Kernel entry point [env: EDGEBENCH_ENTRY]
    #[arg(short, long)]
    entry: Option<String>,

    /// Directory for output images [env: EDGEBENCH_OUTPUT_DIR]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Sampler addressing: none, clamp-to-edge, clamp, repeat [env: EDGEBENCH_ADDRESSING]
    #[arg(long)]
    addressing: Option<String>,

    /// Sampler filter: nearest, linear [env: EDGEBENCH_FILTER]
    #[arg(long)]
    filter: Option<String>,

    /// Use normalized sampler coordinates [env: EDGEBENCH_NORMALIZED]
    #[arg(long)]
    normalized: bool,

    /// Also write the run report as JSON
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return usage_exit(e),
    };

    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Help and version exit 0; anything else prints usage and exits 1.
fn usage_exit(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("{err}");
            println!("{}", Cli::command().render_usage());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    tracing::debug!(?config, "configuration");

    let orchestrator = Orchestrator::new(OpenClBackend::new(), config);
    let mut reference_secs = None;
    let report = orchestrator
        .run_with_progress(&cli.input, |progress| match progress {
            Progress::Reference(r) => {
                reference_secs = Some(r.elapsed_secs);
                print!("{}", render::reference(r));
            }
            Progress::Device(d) => print!("{}", render::device(d, reference_secs)),
        })
        .with_context(|| format!("benchmark of {} failed", cli.input.display()))?;

    print!("{}", render::summary(&report));

    if let Some(path) = &cli.json {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

/// Environment overrides first, then explicit flags on top.
fn build_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = RunConfig::from_env().context("Invalid EDGEBENCH_* environment")?;

    if let Some(kernel) = &cli.kernel {
        config.kernel_path = kernel.clone();
    }
    if let Some(entry) = &cli.entry {
        config.entry_point = entry.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(mode) = &cli.addressing {
        config.sampler.addressing = mode.parse()?;
    }
    if let Some(mode) = &cli.filter {
        config.sampler.filter = mode.parse()?;
    }
    if cli.normalized {
        config.sampler.normalized_coords = true;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "edgebench",
            "in.png",
            "--kernel",
            "k.cl",
            "--entry",
            "edges",
            "--addressing",
            "clamp",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let config = build_config(&cli).unwrap();
        assert_eq!(config.kernel_path, PathBuf::from("k.cl"));
        assert_eq!(config.entry_point, "edges");
        assert_eq!(config.sampler.addressing, edgebench_compute::AddressingMode::Clamp);
    }

    #[test]
    fn test_positional_count() {
        assert!(Cli::try_parse_from(["edgebench"]).is_err());
        assert!(Cli::try_parse_from(["edgebench", "a.png", "b.png"]).is_err());
    }

    #[test]
    fn test_bad_sampler_mode_rejected() {
        let cli = Cli::try_parse_from(["edgebench", "in.png", "--filter", "cubic"]).unwrap();
        assert!(build_config(&cli).is_err());
    }
}

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gxs_core::{CaptureSession, DecodedImage, GxsError, SessionConfig, decode};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "GXS700 x-ray sensor capture tool", long_about = None)]
struct Args {
    /// Session configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wait for exposures and save the frames
    Capture {
        /// Number of frames to capture
        #[arg(short, default_value_t = 1)]
        n: usize,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Only write the raw .bin frames
        #[arg(long)]
        raw_only: bool,

        /// Skip FPGA bring-up (device already configured)
        #[arg(long)]
        no_init: bool,
    },
    /// Print firmware versions and exposure counters
    Versions,
    /// Print the state and error registers
    State,
    /// Print the timestamp of the last exposure
    Timestamp,
    /// Fire a capture without x-rays
    Trigger,
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(args) {
        error!("Error: {:#}", e);
        if is_device_fault(&e) {
            error!("The sensor reported a fault; unplug it and try again");
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => SessionConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let mut session = CaptureSession::open(config).context("opening GXS700")?;

    match args.command {
        Command::Capture {
            n,
            out,
            raw_only,
            no_init,
        } => {
            if !no_init {
                session.initialize().context("device bring-up")?;
            }
            capture(&mut session, n, &out, raw_only)
        }
        Command::Versions => {
            let versions = session.read_versions()?;
            let counters = session.registers().exposure_counters()?;
            println!("{}", versions);
            println!(
                "Exposures: {} since manufacture, {} at last calibration",
                counters.since_manufacture, counters.last_calibration
            );
            Ok(())
        }
        Command::State => {
            let state = session.read_state()?;
            let code = session.read_error()?;
            println!("State: {}", state);
            println!("Error: 0x{:02X}", code.value());
            Ok(())
        }
        Command::Timestamp => {
            println!("{}", session.exposure_timestamp()?);
            Ok(())
        }
        Command::Trigger => {
            session.registers().software_trigger()?;
            info!("Software trigger sent");
            Ok(())
        }
    }
}

fn capture<T: gxs_core::UsbTransport>(
    session: &mut CaptureSession<T>,
    n: usize,
    out: &Path,
    raw_only: bool,
) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let geometry = *session.geometry();

    info!(frames = n, "Waiting for exposure");
    let mut index = 0;
    session.capture_n(n, |frame| -> Result<()> {
        let stem = out.join(format!("capture_{:03}", index));
        index += 1;

        let bin = stem.with_extension("bin");
        fs::write(&bin, frame.as_bytes()).with_context(|| format!("writing {}", bin.display()))?;
        info!(path = %bin.display(), bytes = frame.len(), "Raw frame saved");

        if !raw_only {
            let image = decode(frame.as_bytes(), &geometry)?;
            let pgm = stem.with_extension("pgm");
            write_pgm(&pgm, &image).with_context(|| format!("writing {}", pgm.display()))?;
            info!(path = %pgm.display(), "Image saved");
        }
        Ok(())
    })
}

/// Binary 8-bit greymap.
fn write_pgm(path: &Path, image: &DecodedImage) -> Result<()> {
    let mut file = fs::File::create(path)?;
    write!(file, "P5\n{} {}\n255\n", image.width(), image.height())?;
    file.write_all(image.as_bytes())?;
    Ok(())
}

fn is_device_fault(e: &anyhow::Error) -> bool {
    e.downcast_ref::<GxsError>()
        .is_some_and(GxsError::is_device_fault)
}

use clap::Parser;
use rfd::FileDialog;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

mod camera;
mod cli;
mod color;
mod config;
mod decode;
mod raw;
mod state;
mod transfer;
mod ui;

use camera::{CameraError, Gphoto2, TetheredCapture};
use cli::Args;
use config::{ConfigError, ViewerConfig};
use state::selection::SelectionSet;
use state::sidecar::{self, PersistError};
use transfer::{TransferError, TransferMode};
use ui::viewer::{RunError, ViewerOptions};

/// Anything that ends the program with a non-zero exit code
#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Viewer(#[from] RunError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("cannot create capture directory {path}: {source}")]
    CaptureDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let config = load_config(&args)?;
    let gphoto = Gphoto2::new(config.gphoto2_program.clone());

    if args.detect {
        return print_cameras(&gphoto);
    }
    // clap enforces DIR unless --detect
    let Some(dir) = args.dir.clone() else {
        return Ok(());
    };

    let selection = match args.selection.as_deref() {
        Some(raw) => sidecar::parse_selection(raw),
        None => sidecar::load(&sidecar::sidecar_path(&dir)),
    };

    let capture = if args.capture {
        Some(start_capture(&gphoto, &dir, args.filename_prefix.as_deref())?)
    } else {
        None
    };

    match state::scanner::newest_image(&dir) {
        Ok(Some(image)) => log::info!("Latest picture in {}: {}", dir.display(), image.name),
        Ok(None) => log::info!("No pictures in {} yet", dir.display()),
        Err(_) => log::info!("{} does not exist yet, waiting for it", dir.display()),
    }

    let selection = ui::viewer::run(ViewerOptions {
        dir: dir.clone(),
        selection,
        config,
    })?;

    if let Some(mut capture) = capture {
        if !capture.is_running() {
            log::warn!("Tethered capture had already exited before the viewer closed");
        }
        capture.stop();
    }

    sidecar::save(&selection, &sidecar::sidecar_path(&dir))?;
    println!("{}", sidecar::to_json(&selection)?);

    if args.wants_transfer() {
        run_transfer(&dir, args.transfer_to, args.transfer_all, selection)?;
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<ViewerConfig, AppError> {
    let mut config = ViewerConfig::load(args.config.as_deref())?;
    if let Some(poll_ms) = args.poll_ms {
        config.poll_interval_ms = poll_ms;
    }
    if args.windowed {
        config.fullscreen = false;
    }
    Ok(config.normalized())
}

fn print_cameras(gphoto: &Gphoto2) -> Result<(), AppError> {
    let cameras = gphoto.detect()?;
    if cameras.is_empty() {
        println!("No camera detected");
    }
    for camera in cameras {
        println!("{}\t{}", camera.model, camera.port);
    }
    Ok(())
}

fn start_capture(gphoto: &Gphoto2, dir: &Path, prefix: Option<&str>) -> Result<TetheredCapture, AppError> {
    let prefix = match prefix {
        Some(prefix) => prefix.to_string(),
        None => camera::default_prefix(&gphoto.connected_model()?),
    };
    fs::create_dir_all(dir).map_err(|source| AppError::CaptureDirectory {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(gphoto.start_tethered(dir, Some(&prefix))?)
}

fn run_transfer(
    dir: &Path,
    destination: Option<PathBuf>,
    all: bool,
    selection: SelectionSet,
) -> Result<(), AppError> {
    let destination = match destination {
        Some(destination) => destination,
        None => match FileDialog::new()
            .set_title("Select destination for the pictures")
            .pick_folder()
        {
            Some(folder) => folder,
            None => {
                log::info!("Transfer cancelled");
                return Ok(());
            }
        },
    };

    let mode = if all {
        TransferMode::All
    } else {
        if selection.is_empty() {
            log::info!("No pictures selected, nothing to transfer");
            return Ok(());
        }
        TransferMode::Selected(selection)
    };

    let report = transfer::transfer(dir, &destination, &mode)?;
    log::info!(
        "Transfer to {} complete: {} copied, {} already there, {} missing",
        destination.display(),
        report.copied.len(),
        report.skipped.len(),
        report.missing.len()
    );
    Ok(())
}

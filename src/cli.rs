/// CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;

/// Full-screen live viewer for tethered camera captures
#[derive(Parser, Debug)]
#[command(name = "tether-view")]
#[command(version, about = "Watch a capture directory and pick the keepers", long_about = None)]
pub struct Args {
    /// Directory the camera writes pictures into
    #[arg(required_unless_present = "detect")]
    pub dir: Option<PathBuf>,

    /// Initial selection as JSON (array of file names, null, 0 or "");
    /// defaults to the directory's selected_pictures.json
    pub selection: Option<String>,

    /// Start gphoto2 tethered capture into DIR while viewing
    #[arg(long)]
    pub capture: bool,

    /// File name prefix for captured pictures (default: camera model)
    #[arg(long, requires = "capture")]
    pub filename_prefix: Option<String>,

    /// Copy pictures to this directory after the viewer closes
    #[arg(long)]
    pub transfer_to: Option<PathBuf>,

    /// Transfer every picture, not just the selected ones
    #[arg(long)]
    pub transfer_all: bool,

    /// List connected cameras and exit
    #[arg(long)]
    pub detect: bool,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Directory poll interval in milliseconds (clamped to 200-300)
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// Run in a window instead of full screen
    #[arg(long)]
    pub windowed: bool,
}

impl Args {
    pub fn wants_transfer(&self) -> bool {
        self.transfer_to.is_some() || self.transfer_all
    }
}

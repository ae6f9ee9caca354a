//! 逐阶段预览训练集数据增强的命令行工具.
//!
//! ```text
//! visualize-transforms -i sub-01_T2w.nii.gz -c config.json -n 3 -o ./out -r sub-01_seg.nii.gz
//! ```

mod result;
mod runner;

use clap::Parser;
use log::{error, LevelFilter};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process::ExitCode;

/// 命令行参数.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input image (nii, nii.gz or npy).
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON config with `loader_parameters.slice_axis` and `transformation`.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Number of slices randomly picked along the slice axis.
    #[arg(short, long, default_value_t = 1)]
    pub number: usize,

    /// Output folder, created if missing.
    #[arg(short, long, default_value = "./")]
    pub ofolder: PathBuf,

    /// ROI volume aligned with the input. Required by ROI-dependent transforms such as ROICrop.
    #[arg(short, long)]
    pub roi: Option<PathBuf>,

    /// Seed for slice sampling and random transforms.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Log per-slice metadata.
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("cannot initialise logger: {e}");
    }

    match runner::run(&args) {
        Ok(summary) => {
            summary.analyze();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

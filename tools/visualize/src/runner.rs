//! 程序运行函数.

use aug_berry::consts::DEFAULT_SEED;
use aug_berry::data::sampler::SliceSampler;
use aug_berry::transforms::TransformRegistry;
use aug_berry::viz::{render_stages, PngRenderer, Visualizer};
use aug_berry::{AugError, AugResult, Context, Volume};
use log::{info, warn};

use crate::result::RunSummary;
use crate::Args;

/// 实际运行.
///
/// 所有能提前发现的错误 (配置, 未知变换, 缺少 ROI, 采样数量) 都在写出任何文件之前报告.
pub fn run(args: &Args) -> AugResult<RunSummary> {
    let ctx = Context::open(&args.config)?;
    let axis = ctx.slice_axis()?;
    let seed = args.seed.unwrap_or(DEFAULT_SEED);

    let registry = TransformRegistry::with_builtins();
    let viz = Visualizer::new(&registry, ctx.training_transforms()?, seed);

    // 短路判断
    let roi_path = match (viz.roi_dependency(), &args.roi) {
        (Some(_), Some(p)) if p.is_file() => Some(p),
        (Some(name), _) => {
            return Err(AugError::RoiRequired {
                transform: name.to_string(),
            })
        }
        (None, Some(p)) => {
            warn!("{}: no transform needs a ROI, ignored", p.display());
            None
        }
        (None, None) => None,
    };
    viz.validate(roi_path.is_some())?;

    let image = Volume::open(&args.input)?.to_hwd(axis);
    let roi = match roi_path {
        Some(p) => Some(Volume::open(p)?.to_hwd(axis)),
        None => None,
    };
    let indexes = SliceSampler::new(seed).sample(image.depth(), args.number)?;
    info!(
        "{}: {} slices along `{axis}` out of {}, seed {seed}",
        args.input.display(),
        indexes.len(),
        image.depth(),
    );

    let stages = viz.run(&image, roi.as_ref(), &indexes)?;

    std::fs::create_dir_all(&args.ofolder)?;
    let files = render_stages(&stages, &args.ofolder, &PngRenderer::default())?;
    Ok(RunSummary::new(axis, seed, indexes, &stages, files))
}

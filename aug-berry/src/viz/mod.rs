//! 逐阶段的变换预览.
//!
//! 对于长度为 `N` 的变换列表, 依次构建长度为 `1..=N` 的前缀流水线,
//! 并把每个前缀作用在同一组切片上. 第 `k` 阶段的 "变换前" 就是第 `k - 1` 阶段的
//! "变换后" (第 1 阶段为原始切片), 从而可以逐步观察每个变换带来的变化.
//!
//! 输出文件名为 `<变换名以 "_" 连接>_slice<切片索引>.png`, 例如 `Resample_ROICrop_slice7.png`.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::TransformSpec;
use crate::consts::{NAME_SEP, SKIPPED_TRANSFORMS};
use crate::data::intensity::rescale_unit;
use crate::data::{Sample, Volume};
use crate::error::{AugError, AugResult};
use crate::meta::{DataType, Metadata};
use crate::transforms::{derive_seed, Compose, RoiGate, TransformRegistry};

pub mod render;

pub use render::{Colormap, PngRenderer, Renderer};

/// 某个阶段在某个切片上的结果.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput {
    /// 本阶段 (即当前前缀) 的变换名.
    pub names: Vec<String>,
    /// 切片索引.
    pub slice_index: usize,
    /// 输出文件名 (不含扩展名).
    pub file_key: String,
    /// 变换前, 已映射到 `[0, 1]`.
    pub before: Sample,
    /// 变换后, 已映射到 `[0, 1]`.
    pub after: Sample,
    /// 变换后的元数据.
    pub metadata: Metadata,
    /// 两幅面板的标题: 变换名以换行连接. 变换前不含本阶段新增的变换.
    pub titles: [String; 2],
    /// 颜色映射.
    pub colormap: Colormap,
}

/// 输出文件名 (不含扩展名): `<names 以 "_" 连接>_slice<index>`.
pub fn file_key<S: AsRef<str>>(names: &[S], slice_index: usize) -> String {
    let joined: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    format!("{}{NAME_SEP}slice{slice_index}", joined.join(NAME_SEP))
}

/// 可视化驱动.
#[derive(Debug)]
pub struct Visualizer<'r> {
    registry: &'r TransformRegistry,
    specs: Vec<TransformSpec>,
    seed: u64,
}

impl<'r> Visualizer<'r> {
    /// 由变换列表构建. 不改变数值的变换 (如 `NumpyToTensor`) 被略去.
    pub fn new(registry: &'r TransformRegistry, specs: Vec<TransformSpec>, seed: u64) -> Self {
        let specs = specs
            .into_iter()
            .filter(|spec| !SKIPPED_TRANSFORMS.contains(&spec.name()))
            .collect();
        Self {
            registry,
            specs,
            seed,
        }
    }

    /// 参与预览的变换.
    #[inline]
    pub fn specs(&self) -> &[TransformSpec] {
        &self.specs
    }

    /// 第一个依赖 ROI 的变换名.
    #[inline]
    pub fn roi_dependency(&self) -> Option<&str> {
        crate::transforms::roi_dependency(&self.specs)
    }

    /// 在读取任何数据之前构建完整流水线, 提前发现未知变换和非法参数,
    /// 并检查 ROI 是否可用.
    pub fn validate(&self, roi_available: bool) -> AugResult<Compose> {
        let compose = Compose::new(&self.specs, self.registry)?;
        RoiGate::new(&compose).check(roi_available)?;
        Ok(compose)
    }

    /// 对 `image` 的第 `indexes` 层切片逐阶段执行变换.
    ///
    /// `image` 和 `roi` 必须已是 HWD 排布. 返回值按阶段优先, 切片其次的顺序排列.
    /// 任何一个阶段失败都会中止整个运行. 切片索引越界时返回
    /// [`AugError::SliceOutOfRange`].
    pub fn run(
        &self,
        image: &Volume,
        roi: Option<&Volume>,
        indexes: &[usize],
    ) -> AugResult<Vec<StageOutput>> {
        self.validate(roi.is_some())?;
        if let Some(roi) = roi {
            image.check_aligned(roi)?;
        }
        let depth = image.depth();
        if let Some(&index) = indexes.iter().find(|&&index| index >= depth) {
            return Err(AugError::SliceOutOfRange { index, depth });
        }

        let data_type = if image.is_binary() {
            DataType::GroundTruth
        } else {
            DataType::Image
        };
        let colormap = Colormap::for_data_type(data_type);
        debug!("input treated as `{data_type}`, colormap {}", colormap.name());

        let mut outputs = Vec::with_capacity(self.specs.len() * indexes.len());
        let mut previous: Vec<Option<Sample>> = vec![None; indexes.len()];
        let mut compose = Compose::empty();
        for spec in &self.specs {
            compose.push(spec.clone(), self.registry)?;
            let gate = RoiGate::new(&compose);
            let names: Vec<String> = compose.names().into_iter().map(String::from).collect();
            info!("stage {}: {}", names.len(), names.join(" -> "));

            let titles = [
                names[..names.len() - 1].join("\n"),
                names.join("\n"),
            ];
            for (slot, &index) in previous.iter_mut().zip(indexes) {
                let sample = image.slice_at(index).to_owned();
                let roi_sample = roi.map(|r| r.slice_at(index).to_owned());
                // 每个切片都拿到独立的元数据.
                let metadata = Metadata::new(image.zooms(), data_type);

                let before = match slot.take() {
                    Some(prev) => prev,
                    None => rescale_unit(sample.view()),
                };
                let seed = derive_seed(self.seed, index as u64);
                let (after, metadata) = gate.apply(sample, roi_sample, metadata, seed)?;
                let after = rescale_unit(after.view());
                *slot = Some(after.clone());

                let file_key = file_key(&names, index);
                info!("Fname out: {file_key}.png");
                debug!("\t{}", metadata.to_json());
                outputs.push(StageOutput {
                    names: names.clone(),
                    slice_index: index,
                    file_key,
                    before,
                    after,
                    metadata,
                    titles: titles.clone(),
                    colormap,
                });
            }
        }
        Ok(outputs)
    }
}

/// 把所有阶段渲染到 `folder` 下, 返回写出的文件路径.
pub fn render_stages<R: Renderer + ?Sized>(
    stages: &[StageOutput],
    folder: &Path,
    renderer: &R,
) -> AugResult<Vec<PathBuf>> {
    stages
        .iter()
        .map(|stage| {
            let path = folder.join(format!("{}.png", stage.file_key));
            renderer.render(stage, &path)?;
            Ok(path)
        })
        .collect()
}

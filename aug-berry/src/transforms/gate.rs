//! 依赖 ROI 的流水线.
//!
//! 像 `ROICrop` 这样的变换需要先在 ROI 上计算参数, 再把同样的参数用在影像上.
//! [`RoiGate`] 先把 ROI 切片 (标记为 `roi`) 送入流水线, 再把其中记录的裁剪框
//! 拷贝到样本的原始元数据上, 让样本经过同一条流水线.
//!
//! ROI 流水线的其余元数据 (如重采样后的 `zooms`) 不会带到样本上,
//! 否则样本上的形状变换会被跳过.

use super::Compose;
use crate::config::TransformSpec;
use crate::consts::ROI_DEPENDENT_TRANSFORMS;
use crate::data::Sample;
use crate::error::{AugError, AugResult};
use crate::meta::{DataType, Metadata};

/// `specs` 中第一个依赖 ROI 的变换名. 不存在时返回 `None`.
pub fn roi_dependency(specs: &[TransformSpec]) -> Option<&str> {
    specs
        .iter()
        .map(TransformSpec::name)
        .find(|name| ROI_DEPENDENT_TRANSFORMS.contains(name))
}

/// 包装一条流水线, 在需要时先让 ROI 经过它.
#[derive(Debug, Clone, Copy)]
pub struct RoiGate<'a> {
    compose: &'a Compose,
}

impl<'a> RoiGate<'a> {
    /// 包装 `compose`.
    #[inline]
    pub fn new(compose: &'a Compose) -> Self {
        Self { compose }
    }

    /// 流水线中第一个依赖 ROI 的变换名.
    #[inline]
    pub fn requires_roi(&self) -> Option<&'a str> {
        roi_dependency(self.compose.specs())
    }

    /// 流水线中所有依赖 ROI 的变换名.
    fn roi_dependents(&self) -> impl Iterator<Item = &'a str> {
        let compose = self.compose;
        compose
            .specs()
            .iter()
            .map(TransformSpec::name)
            .filter(|name| ROI_DEPENDENT_TRANSFORMS.contains(name))
    }

    /// 在不做任何计算之前, 检查 ROI 是否可用.
    pub fn check(&self, roi_available: bool) -> AugResult<()> {
        match self.requires_roi() {
            Some(name) if !roi_available => Err(AugError::RoiRequired {
                transform: name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// 以 `seed` 执行流水线.
    ///
    /// 流水线依赖 ROI 时, `roi` 必须与 `sample` 对齐, 并先于 `sample` 经过同一条流水线.
    /// 每个依赖 ROI 的变换都必须在 ROI 上留下裁剪框 (即其 `applied_to` 包含 `roi`),
    /// 否则返回 [`AugError::Transform`]. 不依赖 ROI 时 `roi` 被忽略.
    pub fn apply(
        &self,
        sample: Sample,
        roi: Option<Sample>,
        metadata: Metadata,
        seed: u64,
    ) -> AugResult<(Sample, Metadata)> {
        let Some(name) = self.requires_roi() else {
            return self.compose.apply(sample, metadata, seed);
        };
        let roi = roi.ok_or_else(|| AugError::RoiRequired {
            transform: name.to_string(),
        })?;
        if roi.dim() != sample.dim() {
            return Err(AugError::ShapeMismatch {
                expected: sample.shape().to_vec(),
                found: roi.shape().to_vec(),
            });
        }

        let (_, roi_metadata) =
            self.compose
                .apply(roi, metadata.clone().with_data_type(DataType::Roi), seed)?;

        let mut metadata = metadata;
        for name in self.roi_dependents() {
            let crop = roi_metadata.crop_params(name).ok_or_else(|| {
                AugError::transform(
                    name,
                    "no crop box was computed on the ROI (`applied_to` must include `roi`)",
                )
            })?;
            metadata.set_crop_params(name, *crop);
        }
        self.compose.apply(sample, metadata, seed)
    }
}

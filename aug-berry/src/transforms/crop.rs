//! 裁剪变换.
//!
//! 裁剪框可以超出样本边界, 超出部分以 0 填充, 因此输出形状总是等于目标尺寸.
//! 计算出的裁剪框记录在元数据的 `crop_params` 中, 以变换名为键.

use log::warn;
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;

use super::{param_size, Transform};
use crate::config::Params;
use crate::consts::names;
use crate::data::Sample;
use crate::error::{AugError, AugResult};
use crate::meta::{CropBox, DataType, Metadata};
use crate::Idx2d;

/// 以 `crop` 左上角为原点取出 `size` 大小的区域. 超出 `src` 的部分填 0.
pub(crate) fn crop_padded(src: ArrayView2<f32>, crop: &CropBox, size: Idx2d) -> Array2<f32> {
    let (h, w) = src.dim();
    Array2::from_shape_fn(size, |(i, j)| {
        let y = crop.top + i as i64;
        let x = crop.left + j as i64;
        if y < 0 || x < 0 || y as usize >= h || x as usize >= w {
            0.0
        } else {
            src[(y as usize, x as usize)]
        }
    })
}

fn size_from_params(params: &Params, transform: &str) -> AugResult<Idx2d> {
    param_size(params, "size", transform)?
        .ok_or_else(|| AugError::param(transform, "missing `size`"))
}

/// 以中心为基准, 取出 `size` 大小的区域.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CenterCrop {
    size: Idx2d,
}

impl CenterCrop {
    /// 目标尺寸 `(h, w)`.
    #[inline]
    pub fn new(size: Idx2d) -> Self {
        Self { size }
    }

    pub(crate) fn from_params(params: &Params) -> AugResult<Self> {
        size_from_params(params, names::CENTER_CROP).map(Self::new)
    }
}

impl Transform for CenterCrop {
    fn name(&self) -> &str {
        names::CENTER_CROP
    }

    fn apply(
        &self,
        sample: Sample,
        mut metadata: Metadata,
        _rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        let (h, w) = sample.dim();
        let (th, tw) = self.size;
        let crop = CropBox {
            top: (h as i64 - th as i64).div_euclid(2),
            left: (w as i64 - tw as i64).div_euclid(2),
            src_height: h,
            src_width: w,
        };
        metadata.set_crop_params(names::CENTER_CROP, crop);
        Ok((crop_padded(sample.view(), &crop, self.size), metadata))
    }
}

/// 以 ROI 的质心为中心, 取出 `size` 大小的区域.
///
/// 作用于 ROI 时, 由 ROI 本身计算裁剪框; 作用于其他数据时, 优先复用元数据中
/// 已记录的裁剪框 (即 ROI 上计算出的那一个), 否则由样本自身的非零像素计算.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiCrop {
    size: Idx2d,
}

impl RoiCrop {
    /// 目标尺寸 `(h, w)`.
    #[inline]
    pub fn new(size: Idx2d) -> Self {
        Self { size }
    }

    pub(crate) fn from_params(params: &Params) -> AugResult<Self> {
        size_from_params(params, names::ROI_CROP).map(Self::new)
    }

    /// 以正像素为权重的质心为中心计算裁剪框.
    /// 样本中没有正像素时退回到几何中心.
    fn locate(&self, roi: ArrayView2<f32>) -> CropBox {
        let (h, w) = roi.dim();
        let (th, tw) = self.size;

        let (mut total, mut sy, mut sx) = (0.0f64, 0.0f64, 0.0f64);
        for ((i, j), &v) in roi.indexed_iter() {
            if v > 0.0 && v.is_finite() {
                let v = v as f64;
                total += v;
                sy += v * i as f64;
                sx += v * j as f64;
            }
        }
        let (cy, cx) = if total > 0.0 {
            (sy / total, sx / total)
        } else {
            warn!("ROI slice is empty, cropping around the geometric centre instead");
            ((h as f64 - 1.0) / 2.0, (w as f64 - 1.0) / 2.0)
        };

        CropBox {
            top: (cy - th as f64 / 2.0 + 0.5).floor() as i64,
            left: (cx - tw as f64 / 2.0 + 0.5).floor() as i64,
            src_height: h,
            src_width: w,
        }
    }
}

impl Transform for RoiCrop {
    fn name(&self) -> &str {
        names::ROI_CROP
    }

    fn apply(
        &self,
        sample: Sample,
        mut metadata: Metadata,
        _rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        let (h, w) = sample.dim();
        let crop = match metadata.crop_params(names::ROI_CROP) {
            Some(&crop) if metadata.data_type() != DataType::Roi => {
                if (crop.src_height, crop.src_width) != (h, w) {
                    return Err(AugError::transform(
                        names::ROI_CROP,
                        format!(
                            "crop box was computed on a {}x{} ROI but the sample is {h}x{w}",
                            crop.src_height, crop.src_width
                        ),
                    ));
                }
                crop
            }
            _ => self.locate(sample.view()),
        };
        metadata.set_crop_params(names::ROI_CROP, crop);
        Ok((crop_padded(sample.view(), &crop, self.size), metadata))
    }
}

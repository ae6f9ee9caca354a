//! 几何变换: 翻转, 旋转, 重采样.
//!
//! 影像使用双线性插值, 真值标签和 ROI 使用最近邻插值, 以保证标签值不被混合.

use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::Rng;

use super::{param_f64, param_pair, Transform};
use crate::config::Params;
use crate::consts::names;
use crate::data::Sample;
use crate::error::{AugError, AugResult};
use crate::meta::{DataType, Metadata};

/// 插值方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Interp {
    Nearest,
    Bilinear,
}

impl Interp {
    #[inline]
    pub(crate) fn for_data_type(data_type: DataType) -> Self {
        if data_type.is_label() {
            Interp::Nearest
        } else {
            Interp::Bilinear
        }
    }
}

/// 越界像素视为 0.
#[inline]
fn pixel(src: ArrayView2<f32>, y: isize, x: isize) -> f64 {
    let (h, w) = src.dim();
    if y < 0 || x < 0 || y as usize >= h || x as usize >= w {
        0.0
    } else {
        src[(y as usize, x as usize)] as f64
    }
}

/// 在浮点坐标 `(y, x)` 处取值.
pub(crate) fn interpolate(src: ArrayView2<f32>, y: f64, x: f64, interp: Interp) -> f32 {
    match interp {
        Interp::Nearest => pixel(src, y.round() as isize, x.round() as isize) as f32,
        Interp::Bilinear => {
            let (y0, x0) = (y.floor(), x.floor());
            let (dy, dx) = (y - y0, x - x0);
            let (y0, x0) = (y0 as isize, x0 as isize);
            let v = pixel(src, y0, x0) * (1.0 - dy) * (1.0 - dx)
                + pixel(src, y0, x0 + 1) * (1.0 - dy) * dx
                + pixel(src, y0 + 1, x0) * dy * (1.0 - dx)
                + pixel(src, y0 + 1, x0 + 1) * dy * dx;
            v as f32
        }
    }
}

/// 沿给定轴翻转. `axis` 为 0 (上下) 或 1 (左右), 默认 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flip {
    axis: usize,
}

impl Flip {
    /// 沿 `axis` 翻转. `axis` 必须为 0 或 1.
    pub fn new(axis: usize) -> AugResult<Self> {
        if axis < 2 {
            Ok(Self { axis })
        } else {
            Err(AugError::param(names::FLIP, format!("`axis` must be 0 or 1, got {axis}")))
        }
    }

    pub(crate) fn from_params(params: &Params) -> AugResult<Self> {
        match param_f64(params, "axis", names::FLIP)? {
            None => Self::new(0),
            Some(a) if a == 0.0 || a == 1.0 => Self::new(a as usize),
            Some(a) => Err(AugError::param(names::FLIP, format!("`axis` must be 0 or 1, got {a}"))),
        }
    }
}

impl Transform for Flip {
    fn name(&self) -> &str {
        names::FLIP
    }

    fn apply(
        &self,
        mut sample: Sample,
        mut metadata: Metadata,
        _rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        sample.invert_axis(Axis(self.axis));
        metadata.set_extra(names::FLIP, self.axis);
        Ok((sample, metadata))
    }
}

/// 以 1/2 的概率独立地翻转每个轴.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomReverse;

impl Transform for RandomReverse {
    fn name(&self) -> &str {
        names::RANDOM_REVERSE
    }

    fn apply(
        &self,
        mut sample: Sample,
        mut metadata: Metadata,
        rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        let reversed = [rng.gen_bool(0.5), rng.gen_bool(0.5)];
        for (axis, &r) in reversed.iter().enumerate() {
            if r {
                sample.invert_axis(Axis(axis));
            }
        }
        metadata.set_extra(names::RANDOM_REVERSE, reversed.to_vec());
        Ok((sample, metadata))
    }
}

/// 绕样本中心旋转, 角度 (单位: 度) 在 `[lo, hi]` 中均匀抽取. 空出的区域填 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomRotation {
    lo: f64,
    hi: f64,
}

impl RandomRotation {
    /// 角度范围 `[lo, hi]`.
    pub fn new(lo: f64, hi: f64) -> AugResult<Self> {
        if lo.is_finite() && hi.is_finite() && lo <= hi {
            Ok(Self { lo, hi })
        } else {
            Err(AugError::param(
                names::RANDOM_ROTATION,
                format!("`degrees` must be a finite range, got [{lo}, {hi}]"),
            ))
        }
    }

    /// `degrees` 为单个数 `d` 时表示 `[-|d|, |d|]`.
    pub(crate) fn from_params(params: &Params) -> AugResult<Self> {
        let (lo, hi) = param_pair(params, "degrees", names::RANDOM_ROTATION, |d| {
            (-d.abs(), d.abs())
        })?
        .ok_or_else(|| AugError::param(names::RANDOM_ROTATION, "missing `degrees`"))?;
        Self::new(lo, hi)
    }
}

/// 以中心为原点逆时针旋转 `degrees` 度.
pub(crate) fn rotate(src: ArrayView2<f32>, degrees: f64, interp: Interp) -> Array2<f32> {
    let (h, w) = src.dim();
    let (cy, cx) = ((h as f64 - 1.0) / 2.0, (w as f64 - 1.0) / 2.0);
    let (sin, cos) = degrees.to_radians().sin_cos();
    // 目标像素反向映射回源图像.
    Array2::from_shape_fn((h, w), |(i, j)| {
        let (dy, dx) = (i as f64 - cy, j as f64 - cx);
        let y = cy + cos * dy - sin * dx;
        let x = cx + sin * dy + cos * dx;
        interpolate(src, y, x, interp)
    })
}

impl Transform for RandomRotation {
    fn name(&self) -> &str {
        names::RANDOM_ROTATION
    }

    fn apply(
        &self,
        sample: Sample,
        mut metadata: Metadata,
        rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        let angle = rng.gen_range(self.lo..=self.hi);
        let interp = Interp::for_data_type(metadata.data_type());
        let out = rotate(sample.view(), angle, interp);
        metadata.set_extra(names::RANDOM_ROTATION, angle);
        Ok((out, metadata))
    }
}

/// 把样本重采样到给定的像素间距 (单位: 毫米), 并更新元数据中的 `zooms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resample {
    hspace: f64,
    wspace: f64,
}

impl Resample {
    /// 目标间距. 两者都必须为正.
    pub fn new(hspace: f64, wspace: f64) -> AugResult<Self> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(hspace) && ok(wspace) {
            Ok(Self { hspace, wspace })
        } else {
            Err(AugError::param(
                names::RESAMPLE,
                format!("spacing must be positive, got hspace={hspace}, wspace={wspace}"),
            ))
        }
    }

    pub(crate) fn from_params(params: &Params) -> AugResult<Self> {
        let get = |key: &str| {
            param_f64(params, key, names::RESAMPLE)?
                .ok_or_else(|| AugError::param(names::RESAMPLE, format!("missing `{key}`")))
        };
        Self::new(get("hspace")?, get("wspace")?)
    }
}

/// 把 `src` 缩放到 `(nh, nw)`. 像素中心对齐, 边缘外的坐标夹到边缘上.
pub(crate) fn resize(src: ArrayView2<f32>, (nh, nw): (usize, usize), interp: Interp) -> Array2<f32> {
    let (h, w) = src.dim();
    let (sy, sx) = (h as f64 / nh as f64, w as f64 / nw as f64);
    let (ymax, xmax) = (h.saturating_sub(1) as f64, w.saturating_sub(1) as f64);
    Array2::from_shape_fn((nh, nw), |(i, j)| {
        let y = ((i as f64 + 0.5) * sy - 0.5).clamp(0.0, ymax);
        let x = ((j as f64 + 0.5) * sx - 0.5).clamp(0.0, xmax);
        interpolate(src, y, x, interp)
    })
}

impl Transform for Resample {
    fn name(&self) -> &str {
        names::RESAMPLE
    }

    fn apply(
        &self,
        sample: Sample,
        mut metadata: Metadata,
        _rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        let (h, w) = sample.dim();
        if h == 0 || w == 0 {
            return Err(AugError::transform(names::RESAMPLE, "cannot resample an empty sample"));
        }
        let [zh, zw, zd] = metadata.zooms();
        let target = |len: usize, zoom: f64, space: f64| {
            ((len as f64 * zoom / space).round() as usize).max(1)
        };
        let shape = (target(h, zh, self.hspace), target(w, zw, self.wspace));

        let out = resize(sample.view(), shape, Interp::for_data_type(metadata.data_type()));
        metadata.set_zooms([self.hspace, self.wspace, zd]);
        Ok((out, metadata))
    }
}

//! 强度归一化.
//!
//! 变换前后的样本取值范围往往差别很大 (例如 `NormalizeInstance` 之后会出现负数),
//! 为了能在同一尺度下比较和渲染, 在交给渲染器之前统一线性映射到 `[0, 1]`.

use itertools::{Itertools, MinMaxResult};
use ndarray::{Array2, ArrayView2};
use ordered_float::OrderedFloat;

/// 一个闭区间形式的强度范围.
///
/// 该范围是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntensityRange {
    lo: f32,
    hi: f32,
}

impl IntensityRange {
    /// 构建强度范围.
    ///
    /// `lo` 和 `hi` 必须有限且 `lo < hi`, 否则返回 `None`.
    pub fn new(lo: f32, hi: f32) -> Option<IntensityRange> {
        (lo.is_finite() && hi.is_finite() && lo < hi).then_some(Self { lo, hi })
    }

    /// 单位区间 `[0, 1]`.
    #[inline]
    pub const fn unit() -> IntensityRange {
        Self { lo: 0.0, hi: 1.0 }
    }

    /// 下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.lo
    }

    /// 上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.hi
    }

    /// 宽度.
    #[inline]
    pub fn width(&self) -> f32 {
        self.hi - self.lo
    }

    /// 把 `arr` 线性映射到该范围: 最小值映射为下限, 最大值映射为上限.
    ///
    /// 计算最值时忽略非有限值 (NaN, inf); 这些位置在输出中被置为下限.
    /// 当 `arr` 为常数 (或没有有限值) 时, 输出全部为下限, 不会产生 NaN.
    pub fn rescale(&self, arr: ArrayView2<f32>) -> Array2<f32> {
        let (min, max) = match finite_min_max(arr) {
            Some((min, max)) if min < max => (min, max),
            _ => return Array2::from_elem(arr.raw_dim(), self.lo),
        };
        let scale = self.width() / (max - min);
        arr.mapv(|v| {
            if v.is_finite() {
                num::clamp((v - min) * scale + self.lo, self.lo, self.hi)
            } else {
                self.lo
            }
        })
    }

    /// 求 `v` 在该范围下对应的 8-bit 灰度值 (0 <= value <= 255).
    /// 超出范围的值被截断.
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        if v <= self.lo {
            Some(u8::MIN)
        } else if v >= self.hi {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some(((v - self.lo) / self.width() * 255.0) as u8)
        }
    }
}

/// 有限值的最小值和最大值. 没有有限值时返回 `None`.
pub fn finite_min_max(arr: ArrayView2<f32>) -> Option<(f32, f32)> {
    match arr
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .map(OrderedFloat)
        .minmax()
    {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v.0, v.0)),
        MinMaxResult::MinMax(min, max) => Some((min.0, max.0)),
    }
}

/// 把 `arr` 线性映射到 `[lo, hi]`. 参数不合法 (非有限或 `lo >= hi`) 时退化为 `[0, 1]`.
pub fn rescale_values(arr: ArrayView2<f32>, lo: f32, hi: f32) -> Array2<f32> {
    IntensityRange::new(lo, hi)
        .unwrap_or(IntensityRange::unit())
        .rescale(arr)
}

/// 把 `arr` 线性映射到 `[0, 1]`.
#[inline]
pub fn rescale_unit(arr: ArrayView2<f32>) -> Array2<f32> {
    IntensityRange::unit().rescale(arr)
}

//! 强度变换.

use rand::rngs::StdRng;
use rand::Rng;

use super::{param_pair, Transform};
use crate::config::Params;
use crate::consts::names;
use crate::data::Sample;
use crate::error::{AugError, AugResult};
use crate::meta::Metadata;

/// 按样本自身的均值和标准差做标准化: `(x - mean) / std`.
///
/// 标准差为 0 (常数样本) 时只减去均值, 输出全 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeInstance;

impl Transform for NormalizeInstance {
    fn name(&self) -> &str {
        names::NORMALIZE_INSTANCE
    }

    fn apply(
        &self,
        sample: Sample,
        metadata: Metadata,
        _rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        let Some(mean) = sample.mean() else {
            return Ok((sample, metadata));
        };
        let std = sample.std(0.0);
        let out = if std > 0.0 && std.is_finite() {
            sample.mapv(|v| (v - mean) / std)
        } else {
            sample.mapv(|v| v - mean)
        };
        Ok((out, metadata))
    }
}

/// 给整张样本加上一个在 `[lo, hi]` 中均匀抽取的偏移量.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomShiftIntensity {
    lo: f64,
    hi: f64,
}

impl RandomShiftIntensity {
    /// 偏移范围 `[lo, hi]`.
    pub fn new(lo: f64, hi: f64) -> AugResult<Self> {
        if lo.is_finite() && hi.is_finite() && lo <= hi {
            Ok(Self { lo, hi })
        } else {
            Err(AugError::param(
                names::RANDOM_SHIFT_INTENSITY,
                format!("`shift_range` must be a finite range, got [{lo}, {hi}]"),
            ))
        }
    }

    /// `shift_range` 为单个数 `d` 时表示 `[-|d|, |d|]`.
    pub(crate) fn from_params(params: &Params) -> AugResult<Self> {
        let (lo, hi) = param_pair(params, "shift_range", names::RANDOM_SHIFT_INTENSITY, |d| {
            (-d.abs(), d.abs())
        })?
        .ok_or_else(|| AugError::param(names::RANDOM_SHIFT_INTENSITY, "missing `shift_range`"))?;
        Self::new(lo, hi)
    }
}

impl Transform for RandomShiftIntensity {
    fn name(&self) -> &str {
        names::RANDOM_SHIFT_INTENSITY
    }

    fn apply(
        &self,
        sample: Sample,
        mut metadata: Metadata,
        rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        let offset = rng.gen_range(self.lo..=self.hi);
        metadata.set_extra(names::RANDOM_SHIFT_INTENSITY, offset);
        let offset = offset as f32;
        Ok((sample.mapv_into(|v| v + offset), metadata))
    }
}

/// 原样返回 (样本, 元数据). 用于只改变存储格式而不改变数值的变换.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
}

impl Identity {
    /// 以 `name` 命名.
    #[inline]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Transform for Identity {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        sample: Sample,
        metadata: Metadata,
        _rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)> {
        Ok((sample, metadata))
    }
}

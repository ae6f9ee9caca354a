//! 变换与变换流水线.
//!
//! 流水线只认识 [`Transform`] 这一能力接口: 接受一个 (样本, 元数据) 对, 返回一个新的对.
//! 变换名到实现的解析由显式传入的 [`TransformRegistry`] 完成, 不存在全局查找表.
//!
//! 所有随机性都来自调用方给出的种子. 流水线为第 `k` 个变换派生一个独立的随机源
//! (见 [`derive_seed`]), 因此:
//!
//! 1. 长度为 `k` 的前缀与更长流水线的前 `k` 步得到完全相同的结果;
//! 2. ROI 和影像以同一种子运行时, 每个随机变换抽到的参数完全相同.

use rand::rngs::StdRng;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::config::{Params, TransformSpec};
use crate::consts::names;
use crate::data::Sample;
use crate::error::{AugError, AugResult};
use crate::meta::Metadata;

mod compose;
mod crop;
mod gate;
mod geometric;
mod intensity;

pub use compose::Compose;
pub use crop::{CenterCrop, RoiCrop};
pub use gate::{roi_dependency, RoiGate};
pub use geometric::{Flip, RandomReverse, RandomRotation, Resample};
pub use intensity::{Identity, NormalizeInstance, RandomShiftIntensity};

/// 变换流水线中的一个单元.
pub trait Transform: Debug + Send + Sync {
    /// 变换名.
    fn name(&self) -> &str;

    /// 作用于一个 (样本, 元数据) 对.
    ///
    /// 变换可以修改并返回它收到的元数据, 也可以返回全新的元数据.
    /// 所有随机性都必须来自 `rng`.
    fn apply(
        &self,
        sample: Sample,
        metadata: Metadata,
        rng: &mut StdRng,
    ) -> AugResult<(Sample, Metadata)>;
}

/// 由参数构建变换.
pub type Builder = Box<dyn Fn(&Params) -> AugResult<Box<dyn Transform>> + Send + Sync>;

/// 变换名到构建函数的注册表.
#[derive(Default)]
pub struct TransformRegistry {
    builders: BTreeMap<String, Builder>,
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.builders.keys()).finish()
    }
}

impl TransformRegistry {
    /// 空注册表.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 包含全部内置变换的注册表.
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        r.register(names::RESAMPLE, |p| Ok(Box::new(Resample::from_params(p)?)));
        r.register(names::CENTER_CROP, |p| {
            Ok(Box::new(CenterCrop::from_params(p)?))
        });
        r.register(names::ROI_CROP, |p| Ok(Box::new(RoiCrop::from_params(p)?)));
        r.register(names::FLIP, |p| Ok(Box::new(Flip::from_params(p)?)));
        r.register(names::RANDOM_REVERSE, |_| Ok(Box::new(RandomReverse)));
        r.register(names::RANDOM_ROTATION, |p| {
            Ok(Box::new(RandomRotation::from_params(p)?))
        });
        r.register(names::NORMALIZE_INSTANCE, |_| Ok(Box::new(NormalizeInstance)));
        r.register(names::RANDOM_SHIFT_INTENSITY, |p| {
            Ok(Box::new(RandomShiftIntensity::from_params(p)?))
        });
        r.register(names::NUMPY_TO_TENSOR, |_| {
            Ok(Box::new(Identity::new(names::NUMPY_TO_TENSOR)))
        });
        r
    }

    /// 注册 (或替换) 名为 `name` 的变换. 返回是否替换了已有的构建函数.
    pub fn register<F>(&mut self, name: &str, builder: F) -> bool
    where
        F: Fn(&Params) -> AugResult<Box<dyn Transform>> + Send + Sync + 'static,
    {
        self.builders
            .insert(name.to_string(), Box::new(builder))
            .is_some()
    }

    /// 是否注册了名为 `name` 的变换.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// 所有已注册的变换名, 按字典序.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// 根据 `spec` 构建变换.
    pub fn build(&self, spec: &TransformSpec) -> AugResult<Box<dyn Transform>> {
        let builder = self
            .builders
            .get(spec.name())
            .ok_or_else(|| AugError::UnknownTransform(spec.name().to_string()))?;
        builder(spec.params())
    }
}

/// 由 `seed` 和 `salt` 派生一个新种子 (splitmix64 混合).
///
/// 用于为每个切片、每个变换派生相互独立且可复现的随机源.
pub fn derive_seed(seed: u64, salt: u64) -> u64 {
    let mut z = seed ^ salt.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// 读取一个数值参数.
pub(crate) fn param_f64(params: &Params, key: &str, transform: &str) -> AugResult<Option<f64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| AugError::param(transform, format!("`{key}` must be a number"))),
    }
}

/// 读取一个 `[a, b]` 形式的数值对. 单个数值 `x` 被 `single` 展开.
pub(crate) fn param_pair(
    params: &Params,
    key: &str,
    transform: &str,
    single: fn(f64) -> (f64, f64),
) -> AugResult<Option<(f64, f64)>> {
    let bad = || AugError::param(transform, format!("`{key}` must be a number or a pair of numbers"));
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(single(n.as_f64().ok_or_else(bad)?))),
        Some(Value::Array(items)) => match items.as_slice() {
            [a, b] => Ok(Some((
                a.as_f64().ok_or_else(bad)?,
                b.as_f64().ok_or_else(bad)?,
            ))),
            _ => Err(bad()),
        },
        Some(_) => Err(bad()),
    }
}

/// 读取 `[h, w]` 形式的尺寸 (单个整数表示正方形). 各分量必须为正整数.
pub(crate) fn param_size(
    params: &Params,
    key: &str,
    transform: &str,
) -> AugResult<Option<(usize, usize)>> {
    let Some((h, w)) = param_pair(params, key, transform, |x| (x, x))? else {
        return Ok(None);
    };
    let to_len = |x: f64| (x >= 1.0 && x.fract() == 0.0).then_some(x as usize);
    match (to_len(h), to_len(w)) {
        (Some(h), Some(w)) => Ok(Some((h, w))),
        _ => Err(AugError::param(
            transform,
            format!("`{key}` must contain positive integers, got [{h}, {w}]"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_seed, param_f64, param_pair, param_size, TransformRegistry};
    use crate::config::{Params, TransformSpec};
    use crate::error::AugError;
    use serde_json::json;

    fn params(v: serde_json::Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_builtins_are_registered() {
        let r = TransformRegistry::with_builtins();
        for name in [
            "Resample",
            "CenterCrop",
            "ROICrop",
            "Flip",
            "RandomReverse",
            "RandomRotation",
            "NormalizeInstance",
            "RandomShiftIntensity",
            "NumpyToTensor",
        ] {
            assert!(r.contains(name), "{name}");
        }
        assert!(!r.contains("Clahe"));
    }

    #[test]
    fn test_unknown_transform() {
        let r = TransformRegistry::with_builtins();
        assert!(matches!(
            r.build(&TransformSpec::named("Clahe")),
            Err(AugError::UnknownTransform(name)) if name == "Clahe"
        ));
    }

    #[test]
    fn test_build_checks_params() {
        let r = TransformRegistry::with_builtins();
        let spec = TransformSpec::new("CenterCrop", params(json!({ "size": [0, 4] })));
        assert!(matches!(r.build(&spec), Err(AugError::InvalidParameter { .. })));
        let spec = TransformSpec::new("CenterCrop", params(json!({ "size": [8, 4] })));
        assert_eq!(r.build(&spec).unwrap().name(), "CenterCrop");
    }

    #[test]
    fn test_param_helpers() {
        let p = params(json!({ "a": 1.5, "b": [2, 3], "c": 4, "d": "x", "e": [1.5, 2] }));
        assert_eq!(param_f64(&p, "a", "T").unwrap(), Some(1.5));
        assert_eq!(param_f64(&p, "zz", "T").unwrap(), None);
        assert!(param_f64(&p, "d", "T").is_err());

        assert_eq!(param_pair(&p, "b", "T", |x| (-x, x)).unwrap(), Some((2.0, 3.0)));
        assert_eq!(param_pair(&p, "c", "T", |x| (-x, x)).unwrap(), Some((-4.0, 4.0)));
        assert!(param_pair(&p, "d", "T", |x| (x, x)).is_err());

        assert_eq!(param_size(&p, "b", "T").unwrap(), Some((2, 3)));
        assert_eq!(param_size(&p, "c", "T").unwrap(), Some((4, 4)));
        assert!(param_size(&p, "e", "T").is_err());
    }

    #[test]
    fn test_derive_seed() {
        assert_eq!(derive_seed(1, 2), derive_seed(1, 2));
        assert_ne!(derive_seed(1, 2), derive_seed(1, 3));
        assert_ne!(derive_seed(1, 2), derive_seed(2, 2));
        assert_ne!(derive_seed(0, 0), 0);
    }
}

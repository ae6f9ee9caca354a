use log::trace;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{derive_seed, Transform, TransformRegistry};
use crate::config::TransformSpec;
use crate::data::Sample;
use crate::error::AugResult;
use crate::meta::Metadata;

/// 有序的变换流水线.
///
/// 每个变换只作用于其 `applied_to` 中列出的数据角色, 其余角色的样本跳过该变换.
/// 空流水线是恒等变换.
#[derive(Debug, Default)]
pub struct Compose {
    specs: Vec<TransformSpec>,
    stages: Vec<Box<dyn Transform>>,
}

impl Compose {
    /// 空流水线.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// 按 `specs` 的顺序构建流水线. 任何一个变换构建失败都会使整个流水线失败.
    pub fn new(specs: &[TransformSpec], registry: &TransformRegistry) -> AugResult<Self> {
        let mut compose = Self::empty();
        for spec in specs {
            compose.push(spec.clone(), registry)?;
        }
        Ok(compose)
    }

    /// 在末尾追加一个变换.
    pub fn push(&mut self, spec: TransformSpec, registry: &TransformRegistry) -> AugResult<()> {
        let stage = registry.build(&spec)?;
        self.specs.push(spec);
        self.stages.push(stage);
        Ok(())
    }

    /// 变换个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// 流水线中的变换配置.
    #[inline]
    pub fn specs(&self) -> &[TransformSpec] {
        &self.specs
    }

    /// 变换名, 按执行顺序.
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(TransformSpec::name).collect()
    }

    /// 以 `seed` 依次执行作用于 `metadata.data_type()` 的变换.
    ///
    /// 第 `k` 个变换的随机源只由 `seed` 和 `k` 决定, 与其前后有哪些变换无关.
    /// 变换返回的错误原样传递.
    pub fn apply(
        &self,
        sample: Sample,
        metadata: Metadata,
        seed: u64,
    ) -> AugResult<(Sample, Metadata)> {
        let data_type = metadata.data_type();
        self.specs
            .iter()
            .zip(&self.stages)
            .enumerate()
            .filter(|(_, (spec, _))| spec.applies_to(data_type))
            .try_fold((sample, metadata), |(sample, metadata), (k, (_, stage))| {
                trace!("{data_type}: {}", stage.name());
                let mut rng = StdRng::seed_from_u64(derive_seed(seed, k as u64));
                stage.apply(sample, metadata, &mut rng)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Compose;
    use crate::config::{Params, TransformSpec};
    use crate::error::{AugError, AugResult};
    use crate::meta::{DataType, Metadata};
    use crate::transforms::{Transform, TransformRegistry};
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use serde_json::json;

    fn params(v: serde_json::Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    fn meta(data_type: DataType) -> Metadata {
        Metadata::new([1.0; 3], data_type)
    }

    fn ramp() -> Array2<f32> {
        Array2::from_shape_fn((12, 10), |(i, j)| (i * 10 + j) as f32)
    }

    #[derive(Debug)]
    struct Broken;

    impl Transform for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn apply(
            &self,
            _: Array2<f32>,
            _: Metadata,
            _: &mut StdRng,
        ) -> AugResult<(Array2<f32>, Metadata)> {
            Err(AugError::transform("Broken", "always fails"))
        }
    }

    #[test]
    fn test_empty_is_identity() {
        let compose = Compose::empty();
        let (out, m) = compose.apply(ramp(), meta(DataType::Image), 1).unwrap();
        assert_eq!(out, ramp());
        assert_eq!(m, meta(DataType::Image));
    }

    #[test]
    fn test_applied_to() {
        let registry = TransformRegistry::with_builtins();
        let specs = [
            TransformSpec::new("Flip", params(json!({ "axis": 1 })))
                .applied_to(&[DataType::GroundTruth]),
        ];
        let compose = Compose::new(&specs, &registry).unwrap();
        let (out, _) = compose.apply(ramp(), meta(DataType::Image), 1).unwrap();
        assert_eq!(out, ramp());
        let (out, _) = compose.apply(ramp(), meta(DataType::GroundTruth), 1).unwrap();
        assert_ne!(out, ramp());
    }

    #[test]
    fn test_prefix_consistency() {
        let registry = TransformRegistry::with_builtins();
        let specs = [
            TransformSpec::new("RandomRotation", params(json!({ "degrees": 30 }))),
            TransformSpec::named("RandomReverse"),
            TransformSpec::new("RandomShiftIntensity", params(json!({ "shift_range": [0, 5] }))),
        ];
        let full = Compose::new(&specs, &registry).unwrap();
        let mut growing = Compose::empty();
        for (k, spec) in specs.iter().enumerate() {
            growing.push(spec.clone(), &registry).unwrap();
            let prefix = Compose::new(&specs[..=k], &registry).unwrap();
            let a = growing.apply(ramp(), meta(DataType::Image), 77).unwrap();
            let b = prefix.apply(ramp(), meta(DataType::Image), 77).unwrap();
            assert_eq!(a, b);
        }
        assert_eq!(full.names(), ["RandomRotation", "RandomReverse", "RandomShiftIntensity"]);
        let a = full.apply(ramp(), meta(DataType::Image), 77).unwrap();
        let b = growing.apply(ramp(), meta(DataType::Image), 77).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_skipped_stage_keeps_positions() {
        // 跳过的变换不应改变后续变换抽到的随机数.
        let registry = TransformRegistry::with_builtins();
        let shift = TransformSpec::new("RandomShiftIntensity", params(json!({ "shift_range": 3 })));
        let with_gap = [
            TransformSpec::named("RandomReverse").applied_to(&[DataType::Roi]),
            shift.clone(),
        ];
        let without = [TransformSpec::named("NumpyToTensor"), shift];
        let a = Compose::new(&with_gap, &registry).unwrap();
        let b = Compose::new(&without, &registry).unwrap();
        let (_, ma) = a.apply(ramp(), meta(DataType::Image), 5).unwrap();
        let (_, mb) = b.apply(ramp(), meta(DataType::Image), 5).unwrap();
        assert_eq!(ma.extra("RandomShiftIntensity"), mb.extra("RandomShiftIntensity"));
    }

    #[test]
    fn test_errors_propagate() {
        let mut registry = TransformRegistry::with_builtins();
        registry.register("Broken", |_| Ok(Box::new(Broken)));
        let specs = [TransformSpec::named("Flip"), TransformSpec::named("Broken")];
        let compose = Compose::new(&specs, &registry).unwrap();
        assert_eq!(compose.len(), 2);
        let res = compose.apply(array![[1.0f32]], meta(DataType::Image), 0);
        assert!(matches!(res, Err(AugError::Transform { transform, .. }) if transform == "Broken"));
    }

    #[test]
    fn test_unknown_name_fails_construction() {
        let registry = TransformRegistry::with_builtins();
        let specs = [TransformSpec::named("Flip"), TransformSpec::named("Elastic")];
        assert!(matches!(
            Compose::new(&specs, &registry),
            Err(AugError::UnknownTransform(_))
        ));
    }
}

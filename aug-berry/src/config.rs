//! 配置文件.
//!
//! 配置是一个 JSON 对象, 至少包含:
//!
//! ```json
//! {
//!     "loader_parameters": { "slice_axis": "axial" },
//!     "transformation": {
//!         "Resample": { "wspace": 0.75, "hspace": 0.75 },
//!         "ROICrop": { "size": [48, 48] },
//!         "NormalizeInstance": { "applied_to": ["im"] }
//!     }
//! }
//! ```
//!
//! `transformation` 是 **有序** 映射, 其顺序就是变换的执行顺序.
//! 每个变换的参数中有两个键由流水线解释, 其余参数原样交给变换:
//!
//! - `applied_to`: 该变换作用于哪些数据角色, 默认 `["im", "gt", "roi"]`;
//! - `dataset_type`: 该变换属于哪些子数据集, 默认 `["training", "validation", "testing"]`.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use crate::data::SliceAxis;
use crate::error::{AugError, AugResult};
use crate::meta::DataType;

/// 交给变换的参数映射. 对流水线不透明.
pub type Params = Map<String, Value>;

const APPLIED_TO: &str = "applied_to";
const DATASET_TYPE: &str = "dataset_type";

/// 子数据集.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Subset {
    /// 训练集.
    Training,
    /// 验证集.
    Validation,
    /// 测试集.
    Testing,
}

impl Subset {
    /// 全部子数据集.
    pub const ALL: [Subset; 3] = [Subset::Training, Subset::Validation, Subset::Testing];

    /// 名字.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Subset::Training => "training",
            Subset::Validation => "validation",
            Subset::Testing => "testing",
        }
    }
}

impl Display for Subset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Subset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subset::ALL
            .into_iter()
            .find(|subset| subset.name() == s)
            .ok_or_else(|| format!("unknown dataset type `{s}`"))
    }
}

/// 一个变换的名字和参数.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSpec {
    name: String,
    params: Params,
    applied_to: Vec<DataType>,
    dataset_type: Vec<Subset>,
}

impl TransformSpec {
    /// 作用于全部数据角色和全部子数据集的变换.
    pub fn new(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
            applied_to: DataType::ALL.to_vec(),
            dataset_type: Subset::ALL.to_vec(),
        }
    }

    /// 无参数的变换.
    #[inline]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Params::new())
    }

    /// 限定作用的数据角色.
    pub fn applied_to(mut self, data_types: &[DataType]) -> Self {
        self.applied_to = data_types.to_vec();
        self
    }

    /// 从配置中的一项 `name: value` 解析. `value` 必须是 JSON 对象.
    pub fn from_entry(name: &str, value: &Value) -> AugResult<Self> {
        let malformed = |reason: String| AugError::MalformedTransform {
            name: name.to_string(),
            reason,
        };

        let mut params = value
            .as_object()
            .cloned()
            .ok_or_else(|| malformed(format!("expected an object of parameters, got `{value}`")))?;

        let applied_to = match params.remove(APPLIED_TO) {
            None => DataType::ALL.to_vec(),
            Some(v) => string_list(&v)
                .ok_or_else(|| malformed(format!("`{APPLIED_TO}` must be a list of strings")))?
                .into_iter()
                .map(|s| s.parse::<DataType>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| malformed(format!("`{APPLIED_TO}` must only contain im, gt, roi")))?,
        };
        let dataset_type = match params.remove(DATASET_TYPE) {
            None => Subset::ALL.to_vec(),
            Some(v) => string_list(&v)
                .ok_or_else(|| malformed(format!("`{DATASET_TYPE}` must be a list of strings")))?
                .into_iter()
                .map(|s| s.parse::<Subset>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(malformed)?,
        };

        Ok(Self {
            name: name.to_string(),
            params,
            applied_to,
            dataset_type,
        })
    }

    /// 变换名.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 交给变换的参数.
    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// 是否作用于 `data_type`.
    #[inline]
    pub fn applies_to(&self, data_type: DataType) -> bool {
        self.applied_to.contains(&data_type)
    }

    /// 是否属于子数据集 `subset`.
    #[inline]
    pub fn belongs_to(&self, subset: Subset) -> bool {
        self.dataset_type.contains(&subset)
    }
}

/// 字符串或字符串列表.
fn string_list(v: &Value) -> Option<Vec<&str>> {
    match v {
        Value::String(s) => Some(vec![s.as_str()]),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

/// 加载器参数.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderParameters {
    /// 切片方向名.
    pub slice_axis: String,
}

/// 配置文件的内容. 未知字段被忽略.
#[derive(Debug, Clone, Deserialize)]
pub struct Context {
    /// 加载器参数.
    pub loader_parameters: LoaderParameters,

    /// 有序的变换配置.
    #[serde(default)]
    pub transformation: Map<String, Value>,
}

impl Context {
    /// 读取 JSON 配置文件.
    pub fn open<P: AsRef<Path>>(path: P) -> AugResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// 解析 JSON 文本.
    #[inline]
    pub fn from_json(text: &str) -> AugResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 切片方向.
    #[inline]
    pub fn slice_axis(&self) -> AugResult<SliceAxis> {
        self.loader_parameters.slice_axis.parse()
    }

    /// 按配置顺序解析所有变换.
    pub fn transforms(&self) -> AugResult<Vec<TransformSpec>> {
        self.transformation
            .iter()
            .map(|(name, value)| TransformSpec::from_entry(name, value))
            .collect()
    }

    /// 按配置顺序获取属于 `subset` 的变换.
    pub fn subdataset_transforms(&self, subset: Subset) -> AugResult<Vec<TransformSpec>> {
        let mut all = self.transforms()?;
        all.retain(|t| t.belongs_to(subset));
        Ok(all)
    }

    /// 训练集的变换. 可视化工具只展示这一部分.
    #[inline]
    pub fn training_transforms(&self) -> AugResult<Vec<TransformSpec>> {
        self.subdataset_transforms(Subset::Training)
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, Subset, TransformSpec};
    use crate::data::SliceAxis;
    use crate::error::AugError;
    use crate::meta::DataType;
    use serde_json::json;

    const CONFIG: &str = r#"{
        "loader_parameters": { "slice_axis": "coronal", "target_suffix": ["_seg"] },
        "transformation": {
            "Resample": { "wspace": 0.75, "hspace": 0.75 },
            "CenterCrop": { "size": [48, 48], "dataset_type": ["validation", "testing"] },
            "ROICrop": { "size": [48, 48], "dataset_type": ["training"] },
            "NormalizeInstance": { "applied_to": ["im"] },
            "NumpyToTensor": {}
        }
    }"#;

    #[test]
    fn test_order_is_preserved() {
        let ctx = Context::from_json(CONFIG).unwrap();
        assert_eq!(ctx.slice_axis().unwrap(), SliceAxis::Coronal);
        let names: Vec<_> = ctx
            .transforms()
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(
            names,
            ["Resample", "CenterCrop", "ROICrop", "NormalizeInstance", "NumpyToTensor"]
        );
    }

    #[test]
    fn test_subdatasets() {
        let ctx = Context::from_json(CONFIG).unwrap();
        let train: Vec<_> = ctx
            .training_transforms()
            .unwrap()
            .into_iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(train, ["Resample", "ROICrop", "NormalizeInstance", "NumpyToTensor"]);

        let valid = ctx.subdataset_transforms(Subset::Validation).unwrap();
        assert!(valid.iter().any(|t| t.name() == "CenterCrop"));
        assert!(valid.iter().all(|t| t.name() != "ROICrop"));
    }

    #[test]
    fn test_pipeline_keys_are_stripped() {
        let spec = TransformSpec::from_entry(
            "NormalizeInstance",
            &json!({ "applied_to": ["im"], "dataset_type": ["training"], "eps": 1e-6 }),
        )
        .unwrap();
        assert!(spec.applies_to(DataType::Image));
        assert!(!spec.applies_to(DataType::Roi));
        assert!(spec.belongs_to(Subset::Training));
        assert!(!spec.belongs_to(Subset::Testing));
        assert_eq!(spec.params().len(), 1);
        assert!(spec.params().contains_key("eps"));
    }

    #[test]
    fn test_malformed() {
        for bad in [
            json!(3),
            json!({ "applied_to": 1 }),
            json!({ "applied_to": ["image"] }),
            json!({ "dataset_type": ["train"] }),
        ] {
            assert!(matches!(
                TransformSpec::from_entry("X", &bad),
                Err(AugError::MalformedTransform { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_axis() {
        let ctx = Context::from_json(
            r#"{ "loader_parameters": { "slice_axis": "oblique" }, "transformation": {} }"#,
        )
        .unwrap();
        assert!(matches!(ctx.slice_axis(), Err(AugError::UnknownAxis(_))));
    }

    #[test]
    fn test_missing_loader() {
        assert!(matches!(
            Context::from_json(r#"{ "transformation": {} }"#),
            Err(AugError::Config(_))
        ));
    }
}

//! 随样本流经变换流水线的元数据.
//!
//! 元数据是值类型: 每个切片在进入流水线之前都会拿到一份独立的拷贝,
//! 变换可以自由修改它收到的那一份, 而不会影响其他切片.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::consts::tag;
use crate::error::AugError;

/// 体素分辨率 (单位: 毫米), 与数组各轴一一对应.
pub type Zooms = [f64; 3];

/// 数组的语义角色.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 影像 (`"im"`).
    #[serde(rename = "im")]
    Image,

    /// 真值标签 (`"gt"`).
    #[serde(rename = "gt")]
    GroundTruth,

    /// 感兴趣区域 (`"roi"`).
    #[serde(rename = "roi")]
    Roi,
}

impl DataType {
    /// 全部角色, 按 `im`, `gt`, `roi` 排列.
    pub const ALL: [DataType; 3] = [DataType::Image, DataType::GroundTruth, DataType::Roi];

    /// 标签字符串.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataType::Image => tag::IMAGE,
            DataType::GroundTruth => tag::GROUND_TRUTH,
            DataType::Roi => tag::ROI,
        }
    }

    /// 是否是离散标签 (真值或 ROI). 离散标签在插值时应使用最近邻.
    #[inline]
    pub const fn is_label(&self) -> bool {
        matches!(self, DataType::GroundTruth | DataType::Roi)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = AugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            tag::IMAGE => Ok(DataType::Image),
            tag::GROUND_TRUTH => Ok(DataType::GroundTruth),
            tag::ROI => Ok(DataType::Roi),
            other => Err(AugError::MalformedTransform {
                name: String::from("applied_to"),
                reason: format!("unknown data type `{other}`"),
            }),
        }
    }
}

/// 裁剪框, 以样本左上角为原点. 左上角可以为负, 也可以超出样本范围,
/// 超出部分以 0 填充.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    /// 左上角的行.
    pub top: i64,
    /// 左上角的列.
    pub left: i64,
    /// 裁剪前样本的高.
    pub src_height: usize,
    /// 裁剪前样本的宽.
    pub src_width: usize,
}

/// 样本元数据.
///
/// `zooms` 和 `data_type` 是必需字段. 裁剪类变换把计算出的裁剪框写在
/// `crop_params` 中 (以变换名为键), 其他变换特有的信息写在 `extra` 中.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metadata {
    zooms: Zooms,
    data_type: DataType,
    crop_params: BTreeMap<String, CropBox>,
    extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// 创建只包含必需字段的元数据.
    pub fn new(zooms: Zooms, data_type: DataType) -> Self {
        Self {
            zooms,
            data_type,
            crop_params: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// 体素分辨率.
    #[inline]
    pub fn zooms(&self) -> Zooms {
        self.zooms
    }

    /// 修改体素分辨率.
    #[inline]
    pub fn set_zooms(&mut self, zooms: Zooms) {
        self.zooms = zooms;
    }

    /// 数据角色.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// 修改数据角色.
    #[inline]
    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    /// 消费自我, 换成新的数据角色.
    #[inline]
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// 获取变换 `transform` 记录的裁剪框.
    #[inline]
    pub fn crop_params(&self, transform: &str) -> Option<&CropBox> {
        self.crop_params.get(transform)
    }

    /// 记录变换 `transform` 的裁剪框, 返回此前的值.
    #[inline]
    pub fn set_crop_params(&mut self, transform: &str, crop: CropBox) -> Option<CropBox> {
        self.crop_params.insert(transform.to_string(), crop)
    }

    /// 获取扩展字段.
    #[inline]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// 写入扩展字段, 返回此前的值.
    #[inline]
    pub fn set_extra(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.extra.insert(key.to_string(), value.into())
    }

    /// 以 JSON 文本形式展示, 用于日志.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{CropBox, DataType, Metadata};

    #[test]
    fn test_data_type_tags() {
        for dt in DataType::ALL {
            assert_eq!(dt.as_str().parse::<DataType>().unwrap(), dt);
        }
        assert!("mask".parse::<DataType>().is_err());
        assert!(DataType::Roi.is_label());
        assert!(!DataType::Image.is_label());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = Metadata::new([1.0, 1.0, 2.5], DataType::Image);
        let b = a.clone();
        a.set_extra("RandomRotation", 12.5);
        a.set_crop_params(
            "CenterCrop",
            CropBox {
                top: 1,
                left: 2,
                src_height: 8,
                src_width: 8,
            },
        );
        assert_ne!(a, b);
        assert!(b.extra("RandomRotation").is_none());
        assert!(b.crop_params("CenterCrop").is_none());
    }

    #[test]
    fn test_json_snapshot() {
        let mut m = Metadata::new([0.5, 0.5, 3.0], DataType::GroundTruth);
        m.set_extra("Flip", 1);
        let json = m.to_json();
        assert!(json.contains("\"data_type\":\"gt\""));
        assert!(json.contains("\"zooms\":[0.5,0.5,3.0]"));
        assert!(json.contains("\"Flip\":1"));
    }
}

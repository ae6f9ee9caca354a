//! 切片方向.
//!
//! 标准方向 (RAS) 的体数据中, 第 0/1/2 轴分别对应矢状面 (sagittal)、
//! 冠状面 (coronal)、轴状面 (axial) 的法向. 为了统一地沿第 2 轴切片,
//! 我们把所选方向的轴移动到第 2 轴, 得到 "高-宽-深" (HWD) 排布.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::AugError;

/// 切片方向.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SliceAxis {
    /// 矢状面, 标准方向下的第 0 轴.
    Sagittal,

    /// 冠状面, 标准方向下的第 1 轴.
    Coronal,

    /// 轴状面, 标准方向下的第 2 轴.
    Axial,
}

impl SliceAxis {
    /// 全部方向.
    pub const ALL: [SliceAxis; 3] = [SliceAxis::Sagittal, SliceAxis::Coronal, SliceAxis::Axial];

    /// 该方向在标准方向体数据中的轴索引.
    #[inline]
    pub const fn index(&self) -> usize {
        match self {
            SliceAxis::Sagittal => 0,
            SliceAxis::Coronal => 1,
            SliceAxis::Axial => 2,
        }
    }

    /// 方向名.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            SliceAxis::Sagittal => "sagittal",
            SliceAxis::Coronal => "coronal",
            SliceAxis::Axial => "axial",
        }
    }

    /// 标准方向 -> HWD 的轴置换. 第 `i` 个输出轴取自第 `perm[i]` 个输入轴.
    #[inline]
    pub const fn hwd_perm(&self) -> [usize; 3] {
        match self {
            SliceAxis::Sagittal => [2, 1, 0],
            SliceAxis::Coronal => [2, 0, 1],
            SliceAxis::Axial => [0, 1, 2],
        }
    }

    /// HWD -> 标准方向的轴置换, 是 [`Self::hwd_perm`] 的逆.
    #[inline]
    pub const fn ras_perm(&self) -> [usize; 3] {
        match self {
            SliceAxis::Sagittal => [2, 1, 0],
            SliceAxis::Coronal => [1, 2, 0],
            SliceAxis::Axial => [0, 1, 2],
        }
    }
}

impl Display for SliceAxis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 名字不区分大小写.
impl FromStr for SliceAxis {
    type Err = AugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        SliceAxis::ALL
            .into_iter()
            .find(|axis| axis.name() == lower)
            .ok_or_else(|| AugError::UnknownAxis(s.to_string()))
    }
}

/// 按 `perm` 重排一个三元组. 第 `i` 个输出取自第 `perm[i]` 个输入.
#[inline]
pub fn permute3<T: Copy>(values: [T; 3], perm: [usize; 3]) -> [T; 3] {
    perm.map(|i| values[i])
}

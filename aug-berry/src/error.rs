//! 运行时错误.

use thiserror::Error;

/// 切片采样、变换流水线和文件读写过程中的错误.
///
/// 前几类是配置或前置条件错误, 需要用户修正输入;
/// [`AugError::Transform`] 由变换内部产生, 流水线原样向上传递, 不做任何掩盖.
#[derive(Debug, Error)]
pub enum AugError {
    /// 未知的切片方向名.
    #[error("unknown slice axis `{0}` (expected one of: sagittal, coronal, axial)")]
    UnknownAxis(String),

    /// 采样数量不在 `(0, depth]` 范围内.
    #[error("cannot sample {requested} distinct slices from a depth of {depth}")]
    InvalidSampleSize {
        /// 请求的切片个数.
        requested: usize,
        /// 深度轴长度.
        depth: usize,
    },

    /// 切片索引超出深度轴.
    #[error("slice index {index} is out of range for a depth of {depth}")]
    SliceOutOfRange {
        /// 切片索引.
        index: usize,
        /// 深度轴长度.
        depth: usize,
    },

    /// 变换配置格式错误.
    #[error("malformed transform `{name}`: {reason}")]
    MalformedTransform {
        /// 变换名.
        name: String,
        /// 原因.
        reason: String,
    },

    /// 注册表中不存在该变换.
    #[error("transform `{0}` is not available in the registry")]
    UnknownTransform(String),

    /// 变换参数不合法.
    #[error("invalid parameter for `{transform}`: {reason}")]
    InvalidParameter {
        /// 变换名.
        transform: String,
        /// 原因.
        reason: String,
    },

    /// 配置中存在依赖 ROI 的变换, 但没有提供 (可用的) ROI.
    #[error("ROI required but not provided: `{transform}` needs a ROI volume (-r)")]
    RoiRequired {
        /// 依赖 ROI 的变换名.
        transform: String,
    },

    /// 两个数组形状不一致.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// 期望形状.
        expected: Vec<usize>,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 体数据维度不受支持.
    #[error("unsupported dimensionality {0} (expected a 3D volume)")]
    UnsupportedDimensionality(usize),

    /// 变换内部错误.
    #[error("`{transform}` failed: {reason}")]
    Transform {
        /// 变换名.
        transform: String,
        /// 原因.
        reason: String,
    },

    /// 读取 nifti 文件错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// 读取 npy 文件错误.
    #[error(transparent)]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// 写出图像错误.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// 配置文件解析错误.
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    /// 其他底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AugError {
    /// 构建一个 [`AugError::InvalidParameter`].
    pub fn param(transform: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            transform: transform.to_string(),
            reason: reason.into(),
        }
    }

    /// 构建一个 [`AugError::Transform`].
    pub fn transform(transform: &str, reason: impl Into<String>) -> Self {
        Self::Transform {
            transform: transform.to_string(),
            reason: reason.into(),
        }
    }
}

/// 本 crate 的结果类型.
pub type AugResult<T> = Result<T, AugError>;

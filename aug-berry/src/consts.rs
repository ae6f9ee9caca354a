//! 通用常量.

/// 数据角色标签, 即元数据中 `data_type` 的取值.
pub mod tag {
    /// 影像.
    pub const IMAGE: &str = "im";

    /// 真值标签.
    pub const GROUND_TRUTH: &str = "gt";

    /// 感兴趣区域.
    pub const ROI: &str = "roi";
}

/// 内置变换名.
pub mod names {
    /// 重采样.
    pub const RESAMPLE: &str = "Resample";

    /// 中心裁剪.
    pub const CENTER_CROP: &str = "CenterCrop";

    /// 以 ROI 质心为中心的裁剪. 需要 ROI 伴随体数据.
    pub const ROI_CROP: &str = "ROICrop";

    /// 确定性翻转.
    pub const FLIP: &str = "Flip";

    /// 随机翻转.
    pub const RANDOM_REVERSE: &str = "RandomReverse";

    /// 随机旋转.
    pub const RANDOM_ROTATION: &str = "RandomRotation";

    /// 实例标准化.
    pub const NORMALIZE_INSTANCE: &str = "NormalizeInstance";

    /// 随机强度平移.
    pub const RANDOM_SHIFT_INTENSITY: &str = "RandomShiftIntensity";

    /// 仅做数据类型转换的变换.
    pub const NUMPY_TO_TENSOR: &str = "NumpyToTensor";
}

/// 依赖 ROI 伴随体数据的变换.
pub const ROI_DEPENDENT_TRANSFORMS: &[&str] = &[names::ROI_CROP];

/// 可视化时跳过的变换. 它们不改变像素值, 也不出现在输出文件名中.
pub const SKIPPED_TRANSFORMS: &[&str] = &[names::NUMPY_TO_TENSOR];

/// 输出文件名中变换名之间的分隔符.
pub const NAME_SEP: &str = "_";

/// 未指定时使用的随机种子.
pub const DEFAULT_SEED: u64 = 0x5EED_AB0B_2024;

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;
}

use std::path::Path;

use log::debug;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::error::{AugError, AugResult};
use crate::meta::Zooms;
use crate::Idx3d;

pub mod axis;
pub mod intensity;
pub mod orient;
pub mod sampler;

pub use axis::SliceAxis;
use orient::{AxCodes, Orientation, RAS};

/// 二维切片样本. 流经变换流水线的数组类型.
pub type Sample = Array2<f32>;

/// 三维体数据, 包括体素值 (以 `f32` 保存), 体素分辨率和方向.
///
/// 加载后的体数据总是处于标准方向 (RAS). 经过 [`Volume::to_hwd`] 之后,
/// 第 2 轴即切片轴, 此时 `zooms` 和 `axcodes` 与数组各轴保持一致的排列.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<f32>,
    zooms: Zooms,
    axcodes: AxCodes,
}

impl Volume {
    /// 直接由数组构建体数据. `zooms` 和 `axcodes` 必须与 `data` 的各轴对应.
    #[inline]
    pub fn new(data: Array3<f32>, zooms: Zooms, axcodes: AxCodes) -> Self {
        Self {
            data,
            zooms,
            axcodes,
        }
    }

    /// 由标准方向 (RAS) 的数组构建体数据.
    #[inline]
    pub fn from_canonical(data: Array3<f32>, zooms: Zooms) -> Self {
        Self::new(data, zooms, RAS)
    }

    /// 打开体数据文件. 后缀为 `.npy` 时按 npy 数组读取, 否则按 nifti 读取.
    pub fn open<P: AsRef<Path>>(path: P) -> AugResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("npy") => Self::open_npy(path),
            _ => Self::open_nifti(path),
        }
    }

    /// 打开 nii (或 nii.gz) 文件, 并重排为最接近的标准方向.
    pub fn open_nifti<P: AsRef<Path>>(path: P) -> AugResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = obj.header().clone();
        let data = obj.into_volume().into_ndarray::<f32>()?;

        // 允许末尾长度为 1 的时间轴.
        let data = match data.ndim() {
            3 => data,
            4 if data.len_of(Axis(3)) == 1 => data.index_axis_move(Axis(3), 0),
            n => return Err(AugError::UnsupportedDimensionality(n)),
        };
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| AugError::UnsupportedDimensionality(ndim))?;

        let [_, dx, dy, dz, ..] = header.pixdim;
        let zooms = [dx, dy, dz].map(|z| (z as f64).abs());

        let orientation = Orientation::from_header(&header);
        debug!(
            "{}: shape {:?}, zooms {:?}, orientation {}",
            path.as_ref().display(),
            data.shape(),
            zooms,
            String::from_iter(orientation.axcodes()),
        );
        let (data, zooms) = orientation.to_canonical(data, zooms);
        Ok(Self::from_canonical(data, zooms))
    }

    /// 打开 npy 文件. npy 数组没有空间信息, 因此视为各向同性 (1 mm) 的标准方向数据.
    pub fn open_npy<P: AsRef<Path>>(path: P) -> AugResult<Self> {
        let data: Array3<f32> = ndarray_npy::read_npy(path.as_ref())?;
        Ok(Self::from_canonical(data, [1.0; 3]))
    }

    /// 数据形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 切片轴 (第 2 轴) 长度.
    #[inline]
    pub fn depth(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// 体素分辨率, 单位为毫米, 与数组各轴对应.
    #[inline]
    pub fn zooms(&self) -> Zooms {
        self.zooms
    }

    /// 各轴的方向字母.
    #[inline]
    pub fn axcodes(&self) -> AxCodes {
        self.axcodes
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 获取第 2 轴上第 `index` 层切片视图.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), index)
    }

    /// 所有体素是否都是 0 或 1. 这样的体数据被视为掩膜 (真值标签).
    pub fn is_binary(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0 || v == 1.0)
    }

    /// 按 `perm` 重排数组轴, 同时重排体素分辨率和方向字母.
    /// 第 `i` 个输出轴取自第 `perm[i]` 个输入轴.
    pub fn permuted(self, perm: [usize; 3]) -> Self {
        Self {
            data: self.data.permuted_axes(perm),
            zooms: axis::permute3(self.zooms, perm),
            axcodes: axis::permute3(self.axcodes, perm),
        }
    }

    /// 把 `axis` 方向移动到第 2 轴 (HWD 排布).
    #[inline]
    pub fn to_hwd(self, axis: SliceAxis) -> Self {
        self.permuted(axis.hwd_perm())
    }

    /// [`Self::to_hwd`] 的逆操作.
    #[inline]
    pub fn to_ras(self, axis: SliceAxis) -> Self {
        self.permuted(axis.ras_perm())
    }

    /// 检查 `other` 是否与自身形状一致 (例如 ROI 伴随体数据).
    pub fn check_aligned(&self, other: &Volume) -> AugResult<()> {
        if self.data.shape() == other.data.shape() {
            Ok(())
        } else {
            Err(AugError::ShapeMismatch {
                expected: self.data.shape().to_vec(),
                found: other.data.shape().to_vec(),
            })
        }
    }
}

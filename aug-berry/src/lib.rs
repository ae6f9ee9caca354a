#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供医学影像切片上的数据增强流水线, 以及逐阶段预览这些增强效果的工具.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 数据流
//!
//! 1. 读取体数据 (nii / nii.gz / npy) 并重排为标准方向 (RAS), 见 [`data::Volume`];
//! 2. 按配置中的切片方向把切片轴移动到最后 (HWD 排布), 见 [`data::SliceAxis`];
//! 3. 无放回地抽取切片索引, 见 [`data::sampler::SliceSampler`];
//! 4. 把切片和元数据送入变换流水线, 见 [`transforms::Compose`] 与 [`transforms::RoiGate`];
//! 5. 逐阶段生成 "变换前 / 变换后" 对比图, 见 [`viz::Visualizer`].
//!
//! # 注意
//!
//! 1. 所有随机性都来自显式给出的种子. 相同的输入和种子总是得到相同的输出.
//! 2. 配置、参数、前置条件错误都以 [`AugError`] 返回, 不会 panic.
//!
//! # 开发计划
//!
//! ### 读取体数据并规范方向 ✅
//!
//! 实现位于 `aug-berry/src/data/orient.rs`.
//!
//! ### 变换注册表与有序流水线 ✅
//!
//! 实现位于 `aug-berry/src/transforms`.
//!
//! ### 依赖 ROI 的变换 (`ROICrop`) ✅
//!
//! 先在 ROI 上计算裁剪框, 再复用到影像上.
//!
//! ### 逐阶段预览 ✅
//!
//! 实现位于 `aug-berry/src/viz`.
//!
//! ### 三维变换 ⌛️
//!
//! 目前所有变换都作用于二维切片.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod config;
pub mod consts;

/// 体数据的读取, 方向, 切片和采样.
pub mod data;

pub mod error;
pub mod meta;
pub mod prelude;
pub mod transforms;
pub mod viz;

pub use config::{Context, TransformSpec};
pub use data::{Sample, SliceAxis, Volume};
pub use error::{AugError, AugResult};
pub use meta::{DataType, Metadata};

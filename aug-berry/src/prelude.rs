//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::config::{Context, Params, Subset, TransformSpec};
pub use crate::data::intensity::{rescale_unit, rescale_values, IntensityRange};
pub use crate::data::sampler::SliceSampler;
pub use crate::data::{Sample, SliceAxis, Volume};
pub use crate::error::{AugError, AugResult};
pub use crate::meta::{CropBox, DataType, Metadata, Zooms};
pub use crate::transforms::{Compose, RoiGate, Transform, TransformRegistry};
pub use crate::viz::{render_stages, PngRenderer, Renderer, StageOutput, Visualizer};

pub use crate::consts::DEFAULT_SEED;

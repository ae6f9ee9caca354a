//! 对比图渲染.
//!
//! 左侧为变换前, 右侧为变换后. 两侧都在 `[0, 1]` 尺度下着色,
//! 并逆时针旋转 90° 展示 (只影响显示, 不影响数据).

use image::{Rgb, RgbImage};
use log::info;
use ndarray::{ArrayView2, Axis};
use std::path::Path;

use super::StageOutput;
use crate::consts::gray::{BLACK, WHITE};
use crate::data::intensity::IntensityRange;
use crate::error::AugResult;
use crate::meta::DataType;

/// 颜色映射.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Colormap {
    /// 灰度. 用于影像.
    Gray,
    /// jet 伪彩色. 用于掩膜.
    Jet,
}

impl Colormap {
    /// 掩膜用 jet, 其他用灰度.
    #[inline]
    pub fn for_data_type(data_type: DataType) -> Self {
        if data_type.is_label() {
            Colormap::Jet
        } else {
            Colormap::Gray
        }
    }

    /// 名字.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Colormap::Gray => "gray",
            Colormap::Jet => "jet",
        }
    }

    /// `[0, 1]` 中的值对应的颜色. 非有限值为黑色.
    pub fn rgb(&self, v: f32) -> [u8; 3] {
        let Some(g) = IntensityRange::unit().eval(v) else {
            return [BLACK; 3];
        };
        match self {
            Colormap::Gray => [g; 3],
            Colormap::Jet => {
                let v = g as f32 / 255.0;
                let channel = |offset: f32| {
                    let c = num::clamp(1.5 - (4.0 * v - offset).abs(), 0.0, 1.0);
                    (c * 255.0).round() as u8
                };
                [channel(3.0), channel(2.0), channel(1.0)]
            }
        }
    }
}

/// 把一个阶段的输出写成图片.
///
/// 是否绘制 [`StageOutput::titles`] 由实现决定. 内置的 [`PngRenderer`] 只输出两幅面板,
/// 标题仅写进日志; 需要带标题的图片时请自行实现.
pub trait Renderer {
    /// 把 `stage` 渲染到 `path`.
    fn render(&self, stage: &StageOutput, path: &Path) -> AugResult<()>;
}

/// 逆时针旋转 90°, 与 `numpy.rot90` 一致: `out[i, j] = src[j, w - 1 - i]`.
pub fn rot90(src: ArrayView2<f32>) -> ArrayView2<f32> {
    let mut v = src;
    v.invert_axis(Axis(1));
    v.reversed_axes()
}

/// 并排输出 PNG 图片. 两幅面板之间以白色竖条分隔.
///
/// 标题不会被绘制到图片上, 而是写进日志.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngRenderer {
    gap: u32,
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self { gap: 4 }
    }
}

impl PngRenderer {
    /// 以 `gap` 像素宽的竖条分隔两幅面板.
    #[inline]
    pub fn with_gap(gap: u32) -> Self {
        Self { gap }
    }

    fn paint(buf: &mut RgbImage, panel: ArrayView2<f32>, x0: u32, colormap: Colormap) {
        for ((h, w), &v) in panel.indexed_iter() {
            buf.put_pixel(x0 + w as u32, h as u32, Rgb(colormap.rgb(v)));
        }
    }
}

impl Renderer for PngRenderer {
    fn render(&self, stage: &StageOutput, path: &Path) -> AugResult<()> {
        let before = rot90(stage.before.view());
        let after = rot90(stage.after.view());
        let (bh, bw) = before.dim();
        let (ah, aw) = after.dim();

        let width = (bw + aw) as u32 + self.gap;
        let height = bh.max(ah) as u32;
        let mut buf = RgbImage::from_pixel(width, height, Rgb([WHITE; 3]));
        Self::paint(&mut buf, before, 0, stage.colormap);
        Self::paint(&mut buf, after, bw as u32 + self.gap, stage.colormap);
        buf.save(path)?;

        info!(
            "{}: [{}] -> [{}] ({})",
            path.display(),
            stage.titles[0].replace('\n', ", "),
            stage.titles[1].replace('\n', ", "),
            stage.colormap.name(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{rot90, Colormap, PngRenderer, Renderer};
    use crate::meta::{DataType, Metadata};
    use crate::viz::StageOutput;
    use ndarray::{array, Array2};

    #[test]
    fn test_rot90() {
        let src = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(rot90(src.view()), array![[3.0, 6.0], [2.0, 5.0], [1.0, 4.0]]);
    }

    #[test]
    fn test_colormap() {
        assert_eq!(Colormap::Gray.rgb(0.0), [0, 0, 0]);
        assert_eq!(Colormap::Gray.rgb(1.0), [255, 255, 255]);
        assert_eq!(Colormap::Gray.rgb(f32::NAN), [0, 0, 0]);
        // jet: 低端偏蓝, 高端偏红.
        let [r, _, b] = Colormap::Jet.rgb(0.0);
        assert!(b > r);
        let [r, _, b] = Colormap::Jet.rgb(1.0);
        assert!(r > b);
        assert_eq!(Colormap::for_data_type(DataType::GroundTruth), Colormap::Jet);
        assert_eq!(Colormap::for_data_type(DataType::Image), Colormap::Gray);
    }

    #[test]
    fn test_png_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Flip_slice3.png");
        let stage = StageOutput {
            names: vec!["Flip".to_string()],
            slice_index: 3,
            file_key: "Flip_slice3".to_string(),
            before: Array2::zeros((6, 4)),
            after: Array2::ones((5, 4)),
            metadata: Metadata::new([1.0; 3], DataType::Image),
            titles: [String::new(), "Flip".to_string()],
            colormap: Colormap::Gray,
        };
        PngRenderer::with_gap(2).render(&stage, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        // 旋转后面板为 4x6 和 4x5.
        assert_eq!(img.dimensions(), (6 + 2 + 5, 4));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(7, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(12, 3).0, [255, 255, 255]);
    }
}

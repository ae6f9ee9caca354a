//! 体数据方向.
//!
//! nifti 文件通过 sform / qform 仿射矩阵描述体素轴到世界坐标 (RAS+) 的映射.
//! 这里为每个体素轴找到最接近的世界坐标轴及其正负方向,
//! 并据此把数组重排为 "最接近的标准方向" (RAS), 即:
//!
//! - 第 0 轴由左 (L) 指向右 (R);
//! - 第 1 轴由后 (P) 指向前 (A);
//! - 第 2 轴由下 (I) 指向上 (S).
//!
//! 重排只交换轴和翻转轴, 不做任何插值.

use ndarray::{Array3, Axis};
use nifti::NiftiHeader;

use crate::meta::Zooms;

/// 每个数组轴的方向字母, 如 `['R', 'A', 'S']`.
pub type AxCodes = [char; 3];

/// 标准方向.
pub const RAS: AxCodes = ['R', 'A', 'S'];

/// 3x4 仿射矩阵, 按行存储 (省略最后一行 `[0, 0, 0, 1]`).
pub type Affine = [[f64; 4]; 3];

/// 体素轴到世界坐标轴的映射.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Orientation {
    /// 第 `v` 个体素轴对应的世界坐标轴.
    world: [usize; 3],
    /// 第 `v` 个体素轴与世界坐标轴同向 (`1`) 还是反向 (`-1`).
    sign: [i8; 3],
}

impl Orientation {
    /// 标准方向, 即单位映射.
    pub const CANONICAL: Orientation = Orientation {
        world: [0, 1, 2],
        sign: [1, 1, 1],
    };

    /// 从仿射矩阵推断方向.
    ///
    /// 每次在尚未使用的 (世界轴, 体素轴) 对中选取方向余弦绝对值最大的一对,
    /// 因此结果总是一个合法的轴置换. 退化 (全零) 的列按单位向量之外的任意顺序补齐.
    pub fn from_affine(affine: &Affine) -> Self {
        let mut dir = [[0.0f64; 3]; 3];
        for v in 0..3 {
            let norm = (0..3).map(|w| affine[w][v].powi(2)).sum::<f64>().sqrt();
            let norm = if norm > 0.0 { norm } else { 1.0 };
            for w in 0..3 {
                dir[w][v] = affine[w][v] / norm;
            }
        }

        let mut world = [usize::MAX; 3];
        let mut sign = [1i8; 3];
        let mut used_w = [false; 3];
        for _ in 0..3 {
            let mut best = (usize::MAX, usize::MAX, -1.0f64);
            for (w, row) in dir.iter().enumerate().filter(|(w, _)| !used_w[*w]) {
                for (v, &d) in row.iter().enumerate() {
                    if world[v] == usize::MAX && d.abs() > best.2 {
                        best = (w, v, d.abs());
                    }
                }
            }
            let (w, v, _) = best;
            used_w[w] = true;
            world[v] = w;
            sign[v] = if dir[w][v] < 0.0 { -1 } else { 1 };
        }
        Self { world, sign }
    }

    /// 从 nifti header 推断方向. 优先使用 sform, 其次 qform,
    /// 两者都缺失时按 Analyze 约定 (x 轴反向) 处理.
    #[inline]
    pub fn from_header(header: &NiftiHeader) -> Self {
        Self::from_affine(&header_affine(header))
    }

    /// 每个体素轴的方向字母.
    pub fn axcodes(&self) -> AxCodes {
        let mut ans = RAS;
        for (v, code) in ans.iter_mut().enumerate() {
            *code = match (self.world[v], self.sign[v] > 0) {
                (0, true) => 'R',
                (0, false) => 'L',
                (1, true) => 'A',
                (1, false) => 'P',
                (2, true) => 'S',
                _ => 'I',
            };
        }
        ans
    }

    /// 是否已是标准方向.
    #[inline]
    pub fn is_canonical(&self) -> bool {
        *self == Self::CANONICAL
    }

    /// 把体数据和体素分辨率重排为标准方向.
    pub fn to_canonical(&self, data: Array3<f32>, zooms: Zooms) -> (Array3<f32>, Zooms) {
        if self.is_canonical() {
            return (data, zooms);
        }
        // perm[w] = 对应第 w 个世界轴的体素轴.
        let mut perm = [0usize; 3];
        for (v, &w) in self.world.iter().enumerate() {
            perm[w] = v;
        }
        let mut data = data.permuted_axes(perm);
        for (w, &v) in perm.iter().enumerate() {
            if self.sign[v] < 0 {
                data.invert_axis(Axis(w));
            }
        }
        (data, perm.map(|v| zooms[v]))
    }
}

/// 按 nifti 标准计算体素坐标到世界坐标的仿射矩阵.
pub fn header_affine(h: &NiftiHeader) -> Affine {
    let [qfac, dx, dy, dz, ..] = h.pixdim.map(|p| p as f64);
    if h.sform_code > 0 {
        return [h.srow_x, h.srow_y, h.srow_z].map(|row| row.map(|x| x as f64));
    }
    if h.qform_code > 0 {
        let (b, c, d) = (
            h.quatern_b as f64,
            h.quatern_c as f64,
            h.quatern_d as f64,
        );
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let r = [
            [
                a * a + b * b - c * c - d * d,
                2.0 * (b * c - a * d),
                2.0 * (b * d + a * c),
            ],
            [
                2.0 * (b * c + a * d),
                a * a + c * c - b * b - d * d,
                2.0 * (c * d - a * b),
            ],
            [
                2.0 * (b * d - a * c),
                2.0 * (c * d + a * b),
                a * a + d * d - b * b - c * c,
            ],
        ];
        let qfac = if qfac < 0.0 { -1.0 } else { 1.0 };
        let scale = [dx, dy, qfac * dz];
        let offset = [h.quatern_x, h.quatern_y, h.quatern_z].map(|x| x as f64);
        let mut ans = [[0.0; 4]; 3];
        for i in 0..3 {
            for j in 0..3 {
                ans[i][j] = r[i][j] * scale[j];
            }
            ans[i][3] = offset[i];
        }
        return ans;
    }
    [
        [-dx.abs(), 0.0, 0.0, 0.0],
        [0.0, dy.abs(), 0.0, 0.0],
        [0.0, 0.0, dz.abs(), 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::{header_affine, Affine, Orientation, RAS};
    use ndarray::Array3;
    use nifti::NiftiHeader;

    fn diag(x: f64, y: f64, z: f64) -> Affine {
        [
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
        ]
    }

    fn ramp(shape: (usize, usize, usize)) -> Array3<f32> {
        let mut k = 0.0;
        Array3::from_shape_fn(shape, |_| {
            k += 1.0;
            k
        })
    }

    #[test]
    fn test_identity_is_canonical() {
        let o = Orientation::from_affine(&diag(0.8, 0.8, 2.5));
        assert!(o.is_canonical());
        assert_eq!(o.axcodes(), RAS);

        let data = ramp((2, 3, 4));
        let (out, zooms) = o.to_canonical(data.clone(), [0.8, 0.8, 2.5]);
        assert_eq!(out, data);
        assert_eq!(zooms, [0.8, 0.8, 2.5]);
    }

    #[test]
    fn test_lps_flips_two_axes() {
        let o = Orientation::from_affine(&diag(-1.0, -1.0, 3.0));
        assert_eq!(o.axcodes(), ['L', 'P', 'S']);

        let data = ramp((2, 3, 4));
        let (out, zooms) = o.to_canonical(data.clone(), [1.0, 1.0, 3.0]);
        assert_eq!(out.shape(), &[2, 3, 4]);
        assert_eq!(zooms, [1.0, 1.0, 3.0]);
        for ((i, j, k), v) in out.indexed_iter() {
            assert_eq!(*v, data[(1 - i, 2 - j, k)]);
        }
    }

    #[test]
    fn test_permuted_axes() {
        // 体素第 0 轴指向上, 第 2 轴指向右.
        let affine = [
            [0.0, 0.0, 0.5, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0],
        ];
        let o = Orientation::from_affine(&affine);
        assert_eq!(o.axcodes(), ['S', 'A', 'R']);

        let data = ramp((4, 3, 2));
        let (out, zooms) = o.to_canonical(data.clone(), [2.0, 1.0, 0.5]);
        assert_eq!(out.shape(), &[2, 3, 4]);
        assert_eq!(zooms, [0.5, 1.0, 2.0]);
        for ((i, j, k), v) in out.indexed_iter() {
            assert_eq!(*v, data[(k, j, i)]);
        }
    }

    #[test]
    fn test_header_affine_sources() {
        let mut h = NiftiHeader::default();
        h.pixdim = [1.0, 0.5, 0.5, 3.0, 0.0, 0.0, 0.0, 0.0];

        // 无 sform / qform: Analyze 约定, x 反向.
        h.sform_code = 0;
        h.qform_code = 0;
        assert_eq!(Orientation::from_header(&h).axcodes(), ['L', 'A', 'S']);

        // 单位四元数.
        h.qform_code = 1;
        h.quatern_b = 0.0;
        h.quatern_c = 0.0;
        h.quatern_d = 0.0;
        let a = header_affine(&h);
        assert_eq!((a[0][0], a[1][1], a[2][2]), (0.5, 0.5, 3.0));
        assert!(Orientation::from_header(&h).is_canonical());

        // 绕 z 轴旋转 180 度: x, y 均反向.
        h.quatern_d = 1.0;
        assert_eq!(Orientation::from_header(&h).axcodes(), ['L', 'P', 'S']);

        // sform 优先.
        h.sform_code = 1;
        h.srow_x = [0.0, 0.0, 3.0, 0.0];
        h.srow_y = [0.0, 0.5, 0.0, 0.0];
        h.srow_z = [-0.5, 0.0, 0.0, 0.0];
        assert_eq!(Orientation::from_header(&h).axcodes(), ['I', 'A', 'R']);
    }
}

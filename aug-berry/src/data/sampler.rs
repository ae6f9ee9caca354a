//! 切片索引采样.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{AugError, AugResult};

/// 从深度轴上无放回地抽取切片索引.
///
/// 随机源必须由调用方显式给出种子, 因此相同种子的两次运行得到相同的索引.
#[derive(Debug, Clone)]
pub struct SliceSampler {
    rng: StdRng,
}

impl SliceSampler {
    /// 以 `seed` 初始化.
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 从 `[0, depth)` 中无放回地抽取 `n` 个互不相同的索引.
    ///
    /// 必须满足 `0 < n <= depth`, 否则返回 [`AugError::InvalidSampleSize`].
    /// 返回值的顺序就是后续渲染的顺序, 一次运行中的所有阶段都应使用同一份索引.
    pub fn sample(&mut self, depth: usize, n: usize) -> AugResult<Vec<usize>> {
        if n == 0 || n > depth {
            return Err(AugError::InvalidSampleSize {
                requested: n,
                depth,
            });
        }
        Ok(rand::seq::index::sample(&mut self.rng, depth, n).into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::SliceSampler;
    use crate::error::AugError;
    use std::collections::HashSet;

    #[test]
    fn test_distinct_in_range() {
        let mut sampler = SliceSampler::new(7);
        let idx = sampler.sample(50, 5).unwrap();
        assert_eq!(idx.len(), 5);
        assert!(idx.iter().all(|&i| i < 50));
        assert_eq!(idx.iter().collect::<HashSet<_>>().len(), 5);
    }

    #[test]
    fn test_full_depth_is_permutation() {
        let mut idx = SliceSampler::new(1).sample(12, 12).unwrap();
        idx.sort_unstable();
        assert_eq!(idx, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_size() {
        let mut sampler = SliceSampler::new(0);
        assert!(matches!(
            sampler.sample(50, 0),
            Err(AugError::InvalidSampleSize {
                requested: 0,
                depth: 50
            })
        ));
        assert!(matches!(
            sampler.sample(50, 51),
            Err(AugError::InvalidSampleSize { requested: 51, .. })
        ));
        assert!(sampler.sample(0, 1).is_err());
    }

    #[test]
    fn test_seed_reproducible() {
        let a = SliceSampler::new(42).sample(100, 10).unwrap();
        let b = SliceSampler::new(42).sample(100, 10).unwrap();
        assert_eq!(a, b);
    }
}

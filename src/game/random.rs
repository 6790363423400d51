//! 可注入的随机源。洗牌、抛硬币与随机弃牌都只通过 [`RandomSource`] 取随机数。

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use sha2::{Digest, Sha256};

use super::card::CoinSide;

pub trait RandomSource {
    /// 返回 `[0, bound)` 内均匀分布的整数。`bound` 为 0 时返回 0。
    fn next_below(&mut self, bound: usize) -> usize;

    fn coin_flip(&mut self) -> CoinSide {
        if self.next_below(2) == 0 {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }
}

/// 以种子字符串初始化的 PCG 随机数流，同一种子在任何平台上产生相同序列。
#[derive(Debug, Clone)]
pub struct GameRng {
    inner: Pcg64Mcg,
}

impl GameRng {
    pub fn from_seed_str(seed: &str) -> Self {
        Self::labelled(seed, "game")
    }

    /// 同一种子派生出的独立随机流，与主流互不影响。
    pub fn labelled(seed: &str, label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut seed_bytes = [0u8; 16];
        seed_bytes.copy_from_slice(&digest[..16]);
        Self {
            inner: Pcg64Mcg::from_seed(seed_bytes),
        }
    }

    pub fn random_seed() -> String {
        let mut entropy = SmallRng::from_entropy();
        format!("{:016x}", entropy.gen::<u64>())
    }
}

impl RandomSource for GameRng {
    fn next_below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.inner.gen_range(0..bound)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// 按脚本返回固定值的随机源，脚本耗尽后返回 0。
    #[derive(Debug, Default)]
    pub struct ScriptedRandom {
        values: VecDeque<usize>,
    }

    impl ScriptedRandom {
        pub fn new(values: impl IntoIterator<Item = usize>) -> Self {
            Self {
                values: values.into_iter().collect(),
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn next_below(&mut self, bound: usize) -> usize {
            if bound == 0 {
                return 0;
            }
            self.values.pop_front().unwrap_or(0) % bound
        }
    }
}

// ==========================================
// 工作坊席位分配系统 - 确定性决胜项
// ==========================================
// 职责: 为 (学校, 优先级层, 种子) 生成 [0, range) 的伪随机值
// 红线: 不使用系统随机源; 相同输入在任何平台上得到相同结果
// ==========================================
//
// 构造:
// 1) h = FNV-1a 64 (school_id 的 UTF-8 字节)
// 2) s = h XOR (tier as u64 * 0x9E3779B97F4A7C15) XOR seed   (wrapping)
// 3) x = splitmix64(s)
// 4) unit = (x >> 11) / 2^53          ∈ [0, 1)
// 5) tie_break = unit * range
//
// 全部为 64 位整数运算, 只有最后一步转为 f64 (53 位尾数可精确表示)

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// FNV-1a 64 位哈希
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// splitmix64 单步输出（状态先加黄金增量再混合）
pub fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// 组合种子
pub fn tie_break_seed(school_id: &str, tier: i32, seed: u64) -> u64 {
    let tier_mix = (tier as i64 as u64).wrapping_mul(GOLDEN_GAMMA);
    fnv1a64(school_id.as_bytes()) ^ tier_mix ^ seed
}

/// [0, 1) 单位值
pub fn unit_value(school_id: &str, tier: i32, seed: u64) -> f64 {
    let x = splitmix64(tie_break_seed(school_id, tier, seed));
    (x >> 11) as f64 / (1u64 << 53) as f64
}

/// [0, range) 决胜项
pub fn tie_break(school_id: &str, tier: i32, seed: u64, range: f64) -> f64 {
    unit_value(school_id, tier, seed) * range
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a64_reference_values() {
        assert_eq!(fnv1a64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_splitmix64_reference_value() {
        // 种子 0 的第一个输出
        assert_eq!(splitmix64(0), 0xe220_a839_7b1d_cdaf);
    }

    #[test]
    fn test_tie_break_is_reproducible_and_in_range() {
        for tier in 1..=5 {
            for school in ["S-001", "S-002", "escola-42", ""] {
                let a = tie_break(school, tier, 7, 10.0);
                let b = tie_break(school, tier, 7, 10.0);
                assert_eq!(a.to_bits(), b.to_bits());
                assert!((0.0..10.0).contains(&a));
            }
        }
    }

    #[test]
    fn test_tie_break_depends_on_school_tier_and_seed() {
        let base = tie_break("S-001", 1, 0, 10.0);
        assert_ne!(base, tie_break("S-002", 1, 0, 10.0));
        assert_ne!(base, tie_break("S-001", 2, 0, 10.0));
        assert_ne!(base, tie_break("S-001", 1, 1, 10.0));
    }
}

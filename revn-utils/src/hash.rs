pub fn u8s_from_str(input: &str) -> [u8; 32] {
    blake3::hash(input.as_bytes()).into()
}

/// Seed of one run: `blake3("{rand_hash}_{nonce}")`.
pub fn seed_for_run(rand_hash: &str, nonce: u64) -> [u8; 32] {
    u8s_from_str(&format!("{}_{}", rand_hash, nonce))
}

/// `count` independent seeds derived from `input`, for repeated experiments.
pub fn seeds_from_str(input: &str, count: usize) -> Vec<[u8; 32]> {
    (0..count as u64).map(|k| seed_for_run(input, k)).collect()
}

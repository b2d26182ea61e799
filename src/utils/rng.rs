use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Deterministic RNG for chain `chain` of a run seeded with `master`.
///
/// The chain index is mixed in with a splitmix64 finalizer so that
/// neighbouring chains start from unrelated streams.
pub fn chain_rng(master: u64, chain: usize) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(chain_seed(master, chain))
}

pub fn chain_seed(master: u64, chain: usize) -> u64 {
    let mut x = master ^ (chain as u64).wrapping_mul(0x9E3779B97F4A7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

use rand_chacha::{
    rand_core::{CryptoRng, RngCore, SeedableRng},
    ChaChaRng,
};

const TEST_SEED: [u8; 32] = [
    7, 0, 0, 0, 41, 0, 0, 0, 113, 2, 0, 0, 254, 17, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0,
];

/// Should be used only for tests, not for any real world usage.
///
/// Set `DETERMINISTIC_TEST_RNG=1` to replay a fixed seed.
#[cfg(feature = "std")]
pub fn test_rng() -> impl RngCore + CryptoRng {
    let is_deterministic = std::env::var("DETERMINISTIC_TEST_RNG")
        .map(|v| v == "1")
        .unwrap_or(false);
    if is_deterministic {
        ChaChaRng::from_seed(TEST_SEED)
    } else {
        ChaChaRng::from_entropy()
    }
}

/// Should be used only for tests, not for any real world usage.
#[cfg(not(feature = "std"))]
pub fn test_rng() -> impl RngCore + CryptoRng {
    ChaChaRng::from_seed(TEST_SEED)
}

//! Container labels
//!
//! Every block is dressed as a shipping container stamped with a Rust crate
//! name and a semver version. Labels are static metadata picked once at
//! creation from the session RNG.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Crate names stamped on containers
pub const CRATE_NAMES: &[&str] = &[
    "ark-bn254",
    "ark-ec",
    "ark-ff",
    "ark-serialize",
    "array-bytes",
    "base64",
    "base69",
    "bincode",
    "bitflags",
    "blake3",
    "borsh",
    "borsh-again",
    "moar-borsh",
    "bs58",
    "bs69",
    "bv",
    "bytemuck",
    "console_error_panic_hook",
    "console_log",
    "curve25519-dalek",
    "getrandom",
    "itertools",
    "js-sys",
    "lazy_static",
    "active-static",
    "libc",
    "libsecp256k1",
    "log",
    "memoffset",
    "num-bigint",
    "num-derive",
    "num-traits",
    "parking_lot",
    "rand",
    "rand_chacha",
    "rustversion",
    "serde",
    "serde_bytes",
    "serde_derive",
    "serde_json",
    "sha2",
    "sha3",
    "sha4",
    "sha5",
    "sha-tokyo-drift",
    "solana-frozen-abi",
    "solana-grilled-abi",
    "solana-frozen-abi-macro",
    "solana-sdk-macro",
    "thiserror",
    "tiny-bip39",
    "wasm-bindgen",
    "zeroize",
    "atime",
    "btime",
    "anotherborsh",
    "metaboss-tears",
    "rage",
    "solana-zk-stuff",
    "more-zk-idk-y",
    "spl-token-2022",
    "spl-token-2024",
    "spl-token-2026",
    "spl-token-2099",
    "spl-token-3000-BC",
    "spl-yanked",
    "fortran-lang",
];

const PRE_RELEASE_TAGS: &[&str] = &["alpha", "beta", "rc"];

/// Container colours (0xRRGGBB)
pub const PALETTE: [u32; 6] = [
    0x2C5F85, // navy blue
    0xA84632, // rust red
    0x3D5E45, // container green
    0xBCAA99, // khaki
    0x8B5D33, // brown
    0x6E7F80, // steel gray
];

/// Pick a crate name for a container
pub fn crate_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    CRATE_NAMES.choose(rng).copied().unwrap_or("crate")
}

/// Generate a semver version, sometimes with a pre-release tag
pub fn version<R: Rng + ?Sized>(rng: &mut R) -> String {
    let major = rng.random_range(0..3);
    let minor = rng.random_range(0..20);
    let patch = rng.random_range(0..15);

    if rng.random_bool(0.2) {
        let tag = PRE_RELEASE_TAGS.choose(rng).copied().unwrap_or("rc");
        let n = rng.random_range(1..=10);
        format!("{}.{}.{}-{}.{}", major, minor, patch, tag, n)
    } else {
        format!("{}.{}.{}", major, minor, patch)
    }
}

/// Pick a container colour
pub fn color<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    PALETTE[rng.random_range(0..PALETTE.len())]
}

//! Benchmark utilities.

#![warn(missing_docs)]

use rand::Rng;
use seqarc_core::{Archive, CompressionConfig, Region};

/// Generate a random nucleotide sequence of the specified length.
pub fn random_sequence(len: usize) -> Vec<u8> {
    const ALPHABET: &[u8; 4] = b"ACGT";
    let mut rng = rand::thread_rng();
    (0..len).map(|_| ALPHABET[rng.gen_range(0..4)]).collect()
}

/// Build a region of `len` random units, fully persisted into a fresh
/// in-memory archive.
pub fn archived_region(len: usize, capacity: usize) -> (Region, Archive) {
    let mut store = Archive::in_memory();
    let mut region = Region::from_content(None, "bench", capacity, &random_sequence(len))
        .expect("Failed to create region");
    region
        .persist_all(&mut store, &CompressionConfig::default())
        .expect("Failed to persist region");
    (region, store)
}

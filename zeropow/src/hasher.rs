//! Initial digest generation
//!
//! Every solve starts by filling the arena with `2^index_bits` Blake2b
//! digests of `header ‖ nonce ‖ LE32(i)`. The Blake2b parameter block
//! carries a 16-byte personalization of `"ZERO_PoW" ‖ LE32(n) ‖ LE32(k)`,
//! binding each digest to the exact problem instance.
//!
//! The header and nonce are absorbed once into a shared mid-state; each
//! index only mixes its own 4-byte tail. Batches of tails go through
//! `blake2b_simd`'s many-lane update so wide SIMD units stay busy, but the
//! output is byte-identical to finalizing one state per index.

use arrayvec::ArrayVec;
use blake2b_simd::many::{update_many, MAX_DEGREE};
use blake2b_simd::{Params as Blake2bParams, State};
use byteorder::{ByteOrder, LittleEndian};

use crate::params::{Params, HASH_BYTES};

/// ASCII tag prefixing the Blake2b personalization field
const PERSONAL_TAG: &[u8; 8] = b"ZERO_PoW";

/// Seed indices hashed between cancellation polls
pub(crate) const CANCEL_POLL_INTERVAL: usize = 1024;

/// Build the 16-byte personalization for an `(n, k)` instance.
pub(crate) fn personalization(n: u32, k: u32) -> [u8; 16] {
    let mut personal = [0u8; 16];
    personal[..8].copy_from_slice(PERSONAL_TAG);
    LittleEndian::write_u32(&mut personal[8..12], n);
    LittleEndian::write_u32(&mut personal[12..16], k);
    personal
}

/// Digest of `header ‖ nonce ‖ LE32(index)` under the personalization
/// for `params`.
///
/// Standalone counterpart of the arena fill, for callers that need to
/// recheck individual digests of a reported solution.
pub fn seed_digest(
    params: &Params,
    header: &[u8],
    nonce: &[u8],
    index: u32,
) -> [u8; HASH_BYTES] {
    HashGenerator::new(params, header, nonce).generate(index)
}

/// Digest generator for one `(header, nonce)` pair
pub(crate) struct HashGenerator {
    base: State,
}

impl HashGenerator {
    /// Absorb the header and nonce into a fresh personalized state.
    pub(crate) fn new(params: &Params, header: &[u8], nonce: &[u8]) -> Self {
        let personal = personalization(params.n(), params.k());
        let mut base = Blake2bParams::new()
            .hash_length(HASH_BYTES)
            .personal(&personal)
            .to_state();
        base.update(header);
        base.update(nonce);
        HashGenerator { base }
    }

    /// Digest for a single seed index. This is the scalar reference path.
    pub(crate) fn generate(&self, index: u32) -> [u8; HASH_BYTES] {
        let mut tail = [0u8; 4];
        LittleEndian::write_u32(&mut tail, index);
        let mut state = self.base.clone();
        state.update(&tail);
        let mut out = [0u8; HASH_BYTES];
        out.copy_from_slice(state.finalize().as_bytes());
        out
    }

    /// Fill `out[i]` with the digest of seed index `i` for the whole slice.
    ///
    /// Polls `cancel` coarsely, once per [`CANCEL_POLL_INTERVAL`] indices.
    /// Returns the number of digests produced, which is short of
    /// `out.len()` only when a poll observed cancellation.
    pub(crate) fn fill<F>(&self, out: &mut [[u8; HASH_BYTES]], mut cancel: F) -> usize
    where
        F: FnMut() -> bool,
    {
        let mut produced = 0;
        while produced < out.len() {
            if cancel() {
                return produced;
            }
            let batch_end = (produced + CANCEL_POLL_INTERVAL).min(out.len());
            while produced < batch_end {
                let lanes = (batch_end - produced).min(MAX_DEGREE);
                let mut states: ArrayVec<State, MAX_DEGREE> =
                    (0..lanes).map(|_| self.base.clone()).collect();
                let mut tails = [[0u8; 4]; MAX_DEGREE];
                for (lane, tail) in tails.iter_mut().enumerate().take(lanes) {
                    LittleEndian::write_u32(tail, (produced + lane) as u32);
                }
                update_many(states.iter_mut().zip(tails.iter().take(lanes)));
                for (lane, state) in states.iter_mut().enumerate() {
                    out[produced + lane].copy_from_slice(state.finalize().as_bytes());
                }
                produced += lanes;
            }
        }
        produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn personalization_layout() {
        assert_eq!(
            personalization(192, 7),
            hex!("5a45 524f 5f50 6f57 c000 0000 0700 0000")
        );
        assert_eq!(
            personalization(96, 5),
            hex!("5a45 524f 5f50 6f57 6000 0000 0500 0000")
        );
    }

    #[test]
    fn index_tail_is_little_endian() {
        // The bytes fed for header "abc", empty nonce, index 1 are
        // 61 62 63 01 00 00 00; hashing the concatenation in one shot
        // must agree with the incremental mid-state path.
        let params = Params::EQUIHASH_192_7;
        let generator = HashGenerator::new(&params, b"abc", b"");
        let oneshot = Blake2bParams::new()
            .hash_length(HASH_BYTES)
            .personal(&personalization(192, 7))
            .hash(&hex!("6162 6301 0000 00"));
        assert_eq!(&generator.generate(1)[..], oneshot.as_bytes());
    }

    #[test]
    fn batched_fill_matches_scalar_path() {
        let params = Params::EQUIHASH_192_7;
        let generator = HashGenerator::new(&params, b"header bytes", b"nonce");
        let mut out = [[0u8; HASH_BYTES]; 100];
        assert_eq!(generator.fill(&mut out, || false), 100);
        for (i, row) in out.iter().enumerate() {
            assert_eq!(*row, generator.generate(i as u32), "index {i}");
        }
    }

    #[test]
    fn cancellation_stops_between_batches() {
        let params = Params::EQUIHASH_192_7;
        let generator = HashGenerator::new(&params, b"", b"");
        let mut out = vec![[0u8; HASH_BYTES]; 3 * CANCEL_POLL_INTERVAL];
        let mut polls = 0;
        let produced = generator.fill(&mut out, || {
            polls += 1;
            polls >= 2
        });
        assert_eq!(produced, CANCEL_POLL_INTERVAL);
    }
}

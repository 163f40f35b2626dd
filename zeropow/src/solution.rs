//! Structural validation of reported solutions

use crate::err::SolutionError;
use crate::hasher::HashGenerator;
use crate::params::{Params, HASH_BYTES};

/// Check that `indices` is a structurally valid solution for
/// `(header, nonce)` under `params`.
///
/// A valid solution holds exactly `2^k` strictly ascending seed indices
/// inside the seed space whose digests XOR to zero across the meaningful
/// `n` bits. The trailing digest bits are ignored, as the search itself
/// ignores them.
///
/// This recomputes every digest from scratch, so it is independent of any
/// solver state and suitable for checking third-party solutions.
pub fn verify_indices(
    params: &Params,
    header: &[u8],
    nonce: &[u8],
    indices: &[u32],
) -> Result<(), SolutionError> {
    if indices.len() != params.solution_len() {
        return Err(SolutionError::Length);
    }
    if indices.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(SolutionError::Order);
    }
    let index_count = params.index_count();
    if indices.iter().any(|&index| index as usize >= index_count) {
        return Err(SolutionError::IndexRange);
    }

    let generator = HashGenerator::new(params, header, nonce);
    let meaningful = params.hash_byte_length();
    let mut acc = [0u8; HASH_BYTES];
    for &index in indices {
        let digest = generator.generate(index);
        for (slot, byte) in acc[..meaningful].iter_mut().zip(&digest[..meaningful]) {
            *slot ^= byte;
        }
    }
    if acc[..meaningful].iter().all(|&b| b == 0) {
        Ok(())
    } else {
        Err(SolutionError::NonZeroXor)
    }
}

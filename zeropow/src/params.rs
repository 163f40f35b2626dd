//! Equihash parameter selection and validation

use crate::err::Error;

/// Number of bytes in each generated digest and each stage value
pub const HASH_BYTES: usize = 32;

/// Largest supported tree depth. Genealogy buffers are sized for
/// `2^(MAX_K + 1)` leaves.
pub(crate) const MAX_K: u32 = 7;

/// Largest supported number of stages, `MAX_K + 1`
pub const MAX_STAGES: usize = (MAX_K + 1) as usize;

/// A validated Equihash parameter set
///
/// `n` and `k` select the generalized birthday problem instance and are baked
/// into the Blake2b personalization. `index_bits` selects the seed space: the
/// solver generates `2^index_bits` initial digests per solve.
///
/// The shipping configuration is [`Params::EQUIHASH_192_7`]. Smaller
/// instances exist so the full pipeline can be exercised quickly in tests
/// and benchmarks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Params {
    n: u32,
    k: u32,
    index_bits: u32,
}

impl Params {
    /// The production instance: Equihash-192,7 over a 21-bit seed space
    pub const EQUIHASH_192_7: Params = Params {
        n: 192,
        k: 7,
        index_bits: 21,
    };

    /// Validate and build a parameter set.
    ///
    /// The requirements combine the usual Equihash well-formedness rules
    /// with the solver's own layout constraints:
    /// - `n` is a multiple of 8, so digests have an exact byte length;
    /// - `3 <= k <= 7` and `k < n`;
    /// - `n` is a multiple of `k + 1`, so the per-stage collision width
    ///   `w = n / (k + 1)` is an integer;
    /// - `w` is a multiple of 8 and at most 24, so bucket keys are
    ///   byte-aligned and the bucket index region stays bounded;
    /// - `4 <= index_bits <= 24`, so row references fit comfortably in `u32`.
    pub fn new(n: u32, k: u32, index_bits: u32) -> Result<Self, Error> {
        if n % 8 != 0 || !(3..=MAX_K).contains(&k) || k >= n || n % (k + 1) != 0 {
            return Err(Error::Params);
        }
        let w = n / (k + 1);
        if w % 8 != 0 || w > 24 {
            return Err(Error::Params);
        }
        if !(4..=24).contains(&index_bits) {
            return Err(Error::Params);
        }
        Ok(Params { n, k, index_bits })
    }

    /// Hash bit width `n`
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Tree depth parameter `k`
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Number of bits in a seed index
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Number of initial digests generated per solve, `2^index_bits`
    pub fn index_count(&self) -> usize {
        1 << self.index_bits
    }

    /// Bits matched per stage, `w = n / (k + 1)`
    pub fn collision_bit_length(&self) -> usize {
        (self.n / (self.k + 1)) as usize
    }

    /// Bytes matched per stage, `w / 8`
    pub fn collision_byte_length(&self) -> usize {
        self.collision_bit_length() / 8
    }

    /// Number of collision stages, `k + 1`
    pub fn stage_count(&self) -> usize {
        (self.k + 1) as usize
    }

    /// Number of distinct seed indices in a reported solution, `2^k`
    pub fn solution_len(&self) -> usize {
        1 << self.k
    }

    /// Bytes of each digest that carry algorithmic meaning, `n / 8`
    pub fn hash_byte_length(&self) -> usize {
        (self.n / 8) as usize
    }
}

//! Solve Equihash-192,7 proof-of-work puzzles.
//!
//! This crate implements the solver side of the generalized birthday
//! problem with parameters N=192, K=7: given a block header and a nonce,
//! find 128 distinct 21-bit seed indices whose Blake2b digests XOR to zero
//! across the leading 192 bits. Digests are bound to the problem instance
//! through a `"ZERO_PoW"` Blake2b personalization.
//!
//! The search runs eight stages of prefix-matching XOR reduction over a
//! preallocated, 64-byte aligned arena. Each stage strips another 24-bit
//! window from the unmatched prefix and doubles the index tuples behind
//! each surviving row; the final stage walks the surviving genealogies and
//! reports every set of 128 distinct indices that cancels completely.
//!
//! Solves are synchronous and single-threaded. Drivers that want to search
//! several nonces in parallel run one [`Solver`] per worker.
//!
//! ```
//! use zeropow::{Params, SolveEvents, Solver};
//!
//! struct Collect(Vec<Vec<u32>>);
//!
//! impl SolveEvents for Collect {
//!     fn on_solution(&mut self, indices: &[u32]) {
//!         self.0.push(indices.to_vec());
//!     }
//!     fn on_hash_done(&mut self) {}
//! }
//!
//! // A reduced instance; production use is Params::EQUIHASH_192_7.
//! let mut solver = Solver::new(Params::new(64, 3, 8)?);
//! solver.start()?;
//! let mut events = Collect(Vec::new());
//! let stats = solver.solve(b"example header", b"nonce", &mut events)?;
//! assert_eq!(stats.hashes, 256);
//! solver.stop();
//! # Ok::<(), zeropow::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]

mod arena;
mod collision;
mod err;
mod hasher;
mod params;
mod solution;
mod solver;
mod xor;

pub use err::{Error, SolutionError};
pub use hasher::seed_digest;
pub use params::{Params, HASH_BYTES, MAX_STAGES};
pub use solution::verify_indices;
pub use solver::{SolveEvents, SolveStats, Solver, SolverBuilder, MAX_INPUT_BYTES};
pub use xor::XorBackend;

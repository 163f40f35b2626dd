//! Solver lifecycle and solve orchestration
//!
//! A [`Solver`] owns the arena between `start()` and `stop()` and drives one
//! synchronous search per [`Solver::solve`] call: hash the seed space, run
//! the collision stages, report solutions through the caller's
//! [`SolveEvents`] sink. Nothing is retained between solves except the
//! arena allocation itself.

use arrayvec::ArrayVec;
use tracing::debug;

use crate::arena::Arena;
use crate::collision::{self, SearchFlow};
use crate::err::Error;
use crate::hasher::HashGenerator;
use crate::params::{Params, MAX_STAGES};
use crate::xor::XorBackend;

/// Upper bound on `header.len() + nonce.len()` accepted by a solve.
///
/// Real block headers are on the order of 140 bytes; anything past this
/// limit is treated as malformed input rather than hashed.
pub const MAX_INPUT_BYTES: usize = 4096;

/// Continuation interface between a solve and its driver
///
/// One solve calls `cancel` at its coarse check-points, `on_solution` for
/// every solution it finds, and `on_hash_done` exactly once at the end,
/// whether or not anything was found.
pub trait SolveEvents {
    /// Abort the solve at the next check-point when this returns true.
    fn cancel(&mut self) -> bool {
        false
    }

    /// One detected solution: `2^k` distinct seed indices, strictly
    /// ascending. The same index set may be reported more than once if the
    /// search reaches it through different pairings; deduplication is the
    /// caller's business.
    fn on_solution(&mut self, indices: &[u32]);

    /// The search is over. Called exactly once per solve, also on
    /// cancellation and when no solution exists.
    fn on_hash_done(&mut self);
}

/// Counters describing one solve
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct SolveStats {
    /// Seed digests generated
    pub hashes: u64,
    /// Candidate pairs examined across all stages
    pub comparisons: u64,
    /// Rows produced per stage, in stage order
    pub stage_rows: ArrayVec<u64, MAX_STAGES>,
    /// Buckets that held at least two rows, summed over stages
    pub buckets_used: u64,
    /// Widest bucket observed in any stage
    pub max_bucket: u32,
    /// Solutions reported through the event sink
    pub solutions: u64,
    /// Whether a cancellation poll cut the solve short
    pub cancelled: bool,
}

/// Builder for [`Solver`] instances with non-default settings
#[derive(Clone, Debug)]
pub struct SolverBuilder {
    params: Params,
    xor: Option<XorBackend>,
}

impl SolverBuilder {
    /// Start building a solver for `params`.
    pub fn new(params: Params) -> Self {
        SolverBuilder { params, xor: None }
    }

    /// Request a specific XOR backend instead of the detected one.
    ///
    /// A backend the current CPU cannot execute is ignored in favor of
    /// detection, so a forced build never produces an unusable solver.
    pub fn xor_backend(&mut self, backend: XorBackend) -> &mut Self {
        self.xor = Some(backend);
        self
    }

    /// Build the solver. The arena is not allocated until `start()`.
    pub fn build(&self) -> Solver {
        let backend = self
            .xor
            .filter(|backend| backend.is_supported())
            .unwrap_or_else(XorBackend::detect);
        Solver {
            params: self.params,
            backend,
            arena: None,
        }
    }
}

/// An Equihash solver bound to one parameter set
pub struct Solver {
    params: Params,
    backend: XorBackend,
    arena: Option<Box<Arena>>,
}

impl Solver {
    /// Make a solver with detected kernels and no arena.
    pub fn new(params: Params) -> Self {
        SolverBuilder::new(params).build()
    }

    /// The parameter set this solver searches under
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The XOR kernel backend in use
    pub fn xor_backend(&self) -> XorBackend {
        self.backend
    }

    /// Whether the arena is currently allocated
    pub fn is_started(&self) -> bool {
        self.arena.is_some()
    }

    /// One-line description of the solver configuration
    pub fn description(&self) -> String {
        format!(
            "Equihash-{},{} CPU solver ({} xor, 2^{} seeds)",
            self.params.n(),
            self.params.k(),
            self.backend.name(),
            self.params.index_bits(),
        )
    }

    /// Allocate the arena. Idempotent; an already started solver is left
    /// untouched. On failure the solver stays stopped.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.arena.is_none() {
            self.arena = Some(Box::new(Arena::new(&self.params)?));
            debug!(params = ?self.params, "arena allocated");
        }
        Ok(())
    }

    /// Release the arena. Idempotent.
    pub fn stop(&mut self) {
        if self.arena.take().is_some() {
            debug!("arena released");
        }
    }

    /// Search one `(header, nonce)` pair.
    ///
    /// Runs the whole pipeline on the calling thread. Solutions and the
    /// final `on_hash_done` notification arrive through `events`; the
    /// returned [`SolveStats`] summarize the search. Exhausting the space
    /// without a solution is a normal return, not an error.
    ///
    /// Fails without invoking any callback if the solver was never started
    /// or the header and nonce together exceed [`MAX_INPUT_BYTES`].
    pub fn solve<E: SolveEvents>(
        &mut self,
        header: &[u8],
        nonce: &[u8],
        events: &mut E,
    ) -> Result<SolveStats, Error> {
        let arena = self.arena.as_deref_mut().ok_or(Error::NotStarted)?;
        if header.len().saturating_add(nonce.len()) > MAX_INPUT_BYTES {
            return Err(Error::InputLength);
        }

        let mut stats = SolveStats::default();
        arena.reset();

        debug!(
            header_len = header.len(),
            nonce_len = nonce.len(),
            "solve started"
        );
        let generator = HashGenerator::new(&self.params, header, nonce);
        let produced = generator.fill(&mut arena.hashes, || events.cancel());
        stats.hashes = produced as u64;

        if produced == arena.hashes.len() {
            match collision::run_stages(&self.params, arena, self.backend, events, &mut stats) {
                SearchFlow::Completed => {}
                SearchFlow::Cancelled => stats.cancelled = true,
            }
        } else {
            stats.cancelled = true;
        }

        debug!(
            hashes = stats.hashes,
            solutions = stats.solutions,
            cancelled = stats.cancelled,
            "solve finished"
        );
        events.on_hash_done();
        Ok(stats)
    }
}

//! Layered XOR collision search
//!
//! The engine runs `k + 1` stages over the arena. Stage `s` groups the rows
//! of its input buffer by the `w`-bit big-endian window at bit offset `s*w`,
//! enumerates the unordered pairs inside each group, and appends one
//! [`CollisionPair`] record per accepted pair. The pair's 32-byte XOR gains
//! `w` more leading zero bits than its parents and is written to a fresh row
//! of the opposite ping-pong buffer, which becomes the next stage's input.
//!
//! Only parent references are recorded per pair; the raw seed indices under
//! a row are recovered by walking the per-stage records back to stage 0.
//! The final stage walks every candidate in full and hands solutions to the
//! caller's event sink.

use arrayvec::ArrayVec;
use tracing::debug;

use crate::arena::Arena;
use crate::params::{Params, HASH_BYTES};
use crate::solver::{SolveEvents, SolveStats};
use crate::xor::XorBackend;

/// Parent references for one accepted pair
///
/// At stage 0 the fields are raw seed indices; at later stages they are row
/// indices into the previous stage's records. The pair's XOR value lives in
/// the ping-pong buffer at the row this record was appended under, so old
/// stages keep genealogy only and at most two stages of values coexist.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct CollisionPair {
    pub(crate) left: u32,
    pub(crate) right: u32,
}

/// Genealogy buffers hold `2^(MAX_K + 1)` leaves, enough for the final
/// merge of the deepest supported tree.
pub(crate) const MAX_TREE_LEAVES: usize = 256;

/// Bucket runs wider than this are truncated before pair enumeration,
/// bounding the quadratic scan on pathological inputs.
const MAX_BUCKET_WIDTH: usize = 512;

/// Candidate pairs examined between cancellation polls
const CANCEL_PAIR_INTERVAL: u64 = 1 << 16;

/// How a stage sweep ended
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum SearchFlow {
    /// All stages ran, or an empty stage cut the search short
    Completed,
    /// A cancellation poll returned true
    Cancelled,
}

/// Extract the stage-`s` bucket key from a 32-byte value.
///
/// The key is the `w`-bit slice at bit offset `s*w`, read big-endian with
/// bit 0 being the most significant bit of byte 0. `w` is a multiple of 8,
/// so the slice is byte-aligned.
#[inline]
pub(crate) fn window_key(value: &[u8; HASH_BYTES], stage: usize, w: usize) -> u32 {
    let offset = stage * w / 8;
    let mut key = 0u32;
    for &byte in &value[offset..offset + w / 8] {
        key = (key << 8) | u32::from(byte);
    }
    key
}

/// Collect the raw seed indices under `row`, depth-first.
///
/// `stages` holds the pair records below the row's own stage; with an empty
/// slice the row already is a seed index.
pub(crate) fn walk_leaves(
    stages: &[Vec<CollisionPair>],
    row: u32,
    out: &mut ArrayVec<u32, MAX_TREE_LEAVES>,
) {
    match stages.split_last() {
        None => out.push(row),
        Some((top, rest)) => {
            let pair = top[row as usize];
            walk_leaves(rest, pair.left, out);
            walk_leaves(rest, pair.right, out);
        }
    }
}

/// Whether two rows of the same stage share no seed index.
fn leaves_disjoint(stages: &[Vec<CollisionPair>], a: u32, b: u32) -> bool {
    let mut leaves = ArrayVec::<u32, MAX_TREE_LEAVES>::new();
    walk_leaves(stages, a, &mut leaves);
    walk_leaves(stages, b, &mut leaves);
    leaves.sort_unstable();
    leaves.windows(2).all(|pair| pair[0] != pair[1])
}

/// Run all stages over a freshly hashed arena.
///
/// Assumes `arena.hashes` holds `params.index_count()` digests and the
/// collision vectors are clear. Solutions are reported through `events`
/// as the final stage discovers them.
pub(crate) fn run_stages<E: SolveEvents>(
    params: &Params,
    arena: &mut Arena,
    backend: XorBackend,
    events: &mut E,
    stats: &mut SolveStats,
) -> SearchFlow {
    let Arena {
        hashes,
        stage_values,
        bucket_rows,
        bucket_bounds,
        collisions,
        row_cap,
    } = arena;
    let (front, back) = stage_values.split_at_mut(1);
    let (front, back) = (&mut front[0], &mut back[0]);

    let mut input_rows = params.index_count();
    for stage in 0..params.stage_count() {
        if events.cancel() {
            return SearchFlow::Cancelled;
        }
        let (input, output): (&[[u8; HASH_BYTES]], &mut [[u8; HASH_BYTES]]) = if stage == 0 {
            (&hashes[..input_rows], &mut front[..])
        } else if stage % 2 == 0 {
            (&back[..input_rows], &mut front[..])
        } else {
            (&front[..input_rows], &mut back[..])
        };
        let (done, rest) = collisions.split_at_mut(stage);
        let produced = match run_one_stage(
            params,
            stage,
            backend,
            input,
            output,
            &hashes[..],
            done,
            &mut rest[0],
            bucket_rows,
            bucket_bounds,
            *row_cap,
            events,
            stats,
        ) {
            Some(produced) => produced,
            None => return SearchFlow::Cancelled,
        };
        stats.stage_rows.push(produced as u64);
        debug!(stage, rows = produced, "stage complete");
        if produced == 0 {
            break;
        }
        input_rows = produced;
    }
    SearchFlow::Completed
}

/// Bucket one stage's input and enumerate candidate pairs.
///
/// Returns the number of rows appended, or `None` on cancellation.
#[allow(clippy::too_many_arguments)]
fn run_one_stage<E: SolveEvents>(
    params: &Params,
    stage: usize,
    backend: XorBackend,
    input: &[[u8; HASH_BYTES]],
    output: &mut [[u8; HASH_BYTES]],
    hashes: &[[u8; HASH_BYTES]],
    done: &[Vec<CollisionPair>],
    out_pairs: &mut Vec<CollisionPair>,
    bucket_rows: &mut [u32],
    bucket_bounds: &mut [u32],
    row_cap: usize,
    events: &mut E,
    stats: &mut SolveStats,
) -> Option<usize> {
    let w = params.collision_bit_length();
    let key_count = 1usize << w;
    let is_final = stage + 1 == params.stage_count();
    let lead_bytes = (stage + 1) * params.collision_byte_length();

    // Two-pass counting sort: per-key counts, inclusive prefix sums, then a
    // backward scatter. Afterwards bounds[key] is the start of key's run and
    // bounds[key + 1] is its end.
    let bounds = &mut bucket_bounds[..key_count + 1];
    bounds.fill(0);
    for value in input {
        bounds[window_key(value, stage, w) as usize] += 1;
    }
    let mut total = 0u32;
    for slot in bounds[..key_count].iter_mut() {
        total += *slot;
        *slot = total;
    }
    bounds[key_count] = total;
    for (row, value) in input.iter().enumerate().rev() {
        let key = window_key(value, stage, w) as usize;
        bounds[key] -= 1;
        bucket_rows[bounds[key] as usize] = row as u32;
    }

    let mut produced = 0usize;
    let mut since_poll = 0u64;
    'scan: for key in 0..key_count {
        let start = bounds[key] as usize;
        let end = bounds[key + 1] as usize;
        if end - start > 1 {
            stats.buckets_used += 1;
            stats.max_bucket = stats.max_bucket.max((end - start) as u32);
        }
        let width = (end - start).min(MAX_BUCKET_WIDTH);
        if width < 2 {
            continue;
        }
        let run = &bucket_rows[start..start + width];
        for i in 0..width - 1 {
            for j in i + 1..width {
                stats.comparisons += 1;
                since_poll += 1;
                if since_poll >= CANCEL_PAIR_INTERVAL {
                    since_poll = 0;
                    if events.cancel() {
                        return None;
                    }
                }
                let (left, right) = (run[i], run[j]);
                if is_final {
                    emit_if_solution(params, done, left, right, hashes, events, stats);
                    if produced < row_cap {
                        out_pairs.push(CollisionPair { left, right });
                        produced += 1;
                    }
                    continue;
                }
                if stage > 0 && !leaves_disjoint(done, left, right) {
                    continue;
                }
                if produced == row_cap {
                    break 'scan;
                }
                backend.xor32(
                    &input[left as usize],
                    &input[right as usize],
                    &mut output[produced],
                );
                debug_assert!(
                    output[produced][..lead_bytes].iter().all(|&b| b == 0),
                    "bucket identity must force the leading bytes to cancel"
                );
                out_pairs.push(CollisionPair { left, right });
                produced += 1;
            }
        }
    }
    Some(produced)
}

/// Walk a final-stage candidate and report it if it is a solution.
///
/// The candidate's own XOR cancels by construction, so the test that
/// matters is on the seed digests themselves: the walked genealogy must
/// cover exactly `2^k` distinct indices whose digests XOR to zero across
/// the meaningful `n` bits.
fn emit_if_solution<E: SolveEvents>(
    params: &Params,
    done: &[Vec<CollisionPair>],
    left: u32,
    right: u32,
    hashes: &[[u8; HASH_BYTES]],
    events: &mut E,
    stats: &mut SolveStats,
) {
    let mut leaves = ArrayVec::<u32, MAX_TREE_LEAVES>::new();
    walk_leaves(done, left, &mut leaves);
    walk_leaves(done, right, &mut leaves);
    leaves.sort_unstable();

    let mut indices = ArrayVec::<u32, MAX_TREE_LEAVES>::new();
    for &leaf in &leaves {
        if indices.last() != Some(&leaf) {
            indices.push(leaf);
        }
    }
    if indices.len() != params.solution_len() {
        return;
    }

    let meaningful = params.hash_byte_length();
    let mut acc = [0u8; HASH_BYTES];
    for &index in &indices {
        for (slot, byte) in acc[..meaningful]
            .iter_mut()
            .zip(&hashes[index as usize][..meaningful])
        {
            *slot ^= byte;
        }
    }
    if acc[..meaningful].iter().any(|&b| b != 0) {
        return;
    }

    stats.solutions += 1;
    events.on_solution(&indices);
}

//! Thin driver around the zeropow solver: hash one header over a range of
//! nonce counters and print whatever the search reports.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zeropow::{verify_indices, Params, SolveEvents, Solver};

#[derive(Parser, Debug)]
#[command(name = "zeropow", about = "Equihash-192,7 CPU solver", version)]
struct Args {
    /// Block header bytes, hex encoded
    #[arg(long, default_value = "")]
    header: String,

    /// Nonce prefix bytes, hex encoded; a 4-byte little-endian counter is
    /// appended per attempt
    #[arg(long, default_value = "")]
    nonce: String,

    /// Number of consecutive nonce counters to try
    #[arg(long, default_value_t = 1)]
    nonces: u32,

    /// Seed space size as a power of two, for reduced-instance experiments
    #[arg(long, default_value_t = 21)]
    index_bits: u32,
}

/// Rechecks and prints solutions as the solver reports them.
struct Report {
    params: Params,
    header: Vec<u8>,
    nonce: Vec<u8>,
    found: u64,
}

impl SolveEvents for Report {
    fn on_solution(&mut self, indices: &[u32]) {
        match verify_indices(&self.params, &self.header, &self.nonce, indices) {
            Ok(()) => {
                self.found += 1;
                println!("solution: {indices:?}");
            }
            Err(err) => warn!(%err, "solver reported a malformed solution"),
        }
    }

    fn on_hash_done(&mut self) {}
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let header = hex::decode(&args.header).context("header is not valid hex")?;
    let nonce_prefix = hex::decode(&args.nonce).context("nonce is not valid hex")?;

    let params = Params::new(192, 7, args.index_bits).context("invalid index-bits")?;
    let mut solver = Solver::new(params);
    solver.start().context("arena allocation failed")?;
    info!("{}", solver.description());

    let mut total_found = 0u64;
    for counter in 0..args.nonces {
        let mut nonce = nonce_prefix.clone();
        nonce.extend_from_slice(&counter.to_le_bytes());

        let mut events = Report {
            params,
            header: header.clone(),
            nonce: nonce.clone(),
            found: 0,
        };
        let stats = solver.solve(&header, &nonce, &mut events)?;
        total_found += events.found;
        info!(
            counter,
            hashes = stats.hashes,
            comparisons = stats.comparisons,
            solutions = stats.solutions,
            "solve finished"
        );
    }

    info!(total_found, "done");
    solver.stop();
    Ok(())
}

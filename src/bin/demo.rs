//! Minimal CLI demo: build a grid, run one convolution, log the result.
//!
//! Stands in for the XML-driven `runnable.py` driver without the XML I/O,
//! which stays out of core scope. Builds a small deterministic ifmap and
//! kernel, runs `conv()`, and logs the resulting ofmap shape and counters.
//!
//! Usage:
//!   demo --width 2 --height 2 --stride-row 1 --stride-col 1 --ifmap-rows 6

#![forbid(unsafe_code)]

use std::env;

use rowstationary::{AcceleratorBuilder, Matrix};
use tracing::info;

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn parse_usize(args: &[String], key: &str, default: usize) -> usize {
    parse_flag(args, key).and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// `out[r][c] = seed + c * col_inc + r * row_inc`, the same arithmetic
/// progression used by the crate's own test suite
/// (`crate::matrix::create_array`, test-only there; duplicated here since a
/// runnable demo is not itself a test).
fn create_array(seed: i64, col_inc: i64, row_inc: i64, rows: usize, cols: usize) -> Matrix {
    let mut data = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            data.push(seed + c as i64 * col_inc + r as i64 * row_inc);
        }
    }
    Matrix::from_vec(rows, cols, data)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "demo=info,rowstationary=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();
    let width = parse_usize(&args, "--width", 2);
    let height = parse_usize(&args, "--height", 2);
    let stride_row = parse_usize(&args, "--stride-row", 1);
    let stride_col = parse_usize(&args, "--stride-col", 1);
    let ifmap_rows = parse_usize(&args, "--ifmap-rows", 6);
    let ifmap_cols = 28usize;

    info!(width, height, stride_row, stride_col, ifmap_rows, "demo: building accelerator");

    let mut accelerator = AcceleratorBuilder::new(width, height)
        .stride(stride_row, stride_col)
        .build()?;

    let kernel = create_array(0, 1, ifmap_cols as i64, height, 2);
    let ifmap = create_array(0, 1, ifmap_cols as i64, ifmap_rows, ifmap_cols);

    accelerator.set_kernel(kernel);
    accelerator.set_ifmap(ifmap);

    let ofmap = accelerator.conv().map_err(|e| anyhow::anyhow!("conv failed: {e}"))?;
    let counters = accelerator.counters_snapshot();

    info!(
        ofmap_rows = ofmap.rows(),
        ofmap_cols = ofmap.cols(),
        spad_reads = counters.spad_reads,
        spad_writes = counters.spad_writes,
        dram_reads = counters.dram_reads,
        dram_writes = counters.dram_writes,
        add_ops = counters.add_ops,
        mult_ops = counters.mult_ops,
        "demo: conv complete"
    );

    Ok(())
}

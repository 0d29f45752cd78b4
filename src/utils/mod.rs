//! Helpers for the experiment runners.
//!
//! None of this is needed to use the factorization itself:
//!
//! - **`data_loader`**: Reads point sets from plain text files, one point per line.
//! - **`synthetic`**: Generates reproducible random point sets and provides the
//!   Gaussian kernel the experiments factorize.
//! - **`perf`**: Wall-clock timing and peak resident set size (RSS) on Linux.

pub mod data_loader;
pub mod perf;
pub mod synthetic;

//! # kmerplot
//!
//! `kmerplot` normalizes and charts k-mer frequency histograms (the
//! two-column `frequency  distinct_kmers` tables written by k-mer counters)
//! so that several samples can be compared side by side.
//!
//! Tables are loaded with [`histogram::HistogramTable`], transformed in place
//! by the functions in [`normalize`], laid out as a [`figure::Figure`] either
//! overlaid on one set of axes or as a 2x2 grid, and drawn with
//! [`plotting::save_figure`].
pub mod config;
pub mod error;
pub mod figure;
pub mod histogram;
pub mod normalize;
pub mod plotting;
pub mod smoothing;
pub mod startup;

pub use config::PlotOptions;
pub use error::{HistError, Result};
pub use figure::{plot_kmer_histogram_grid, plot_kmer_histograms, Figure};
pub use histogram::{HistogramTable, TableSource};

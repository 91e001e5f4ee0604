//! In-memory genomic annotation index: overlap queries over a centered
//! interval tree built per reference sequence, plus an alignment
//! classifier that reconciles per-block query results into per-read and
//! per-template verdicts (split consistency, gene pairing, junction
//! coincidence, protein-coding status, fractional exon coverage).

pub mod alignment;
pub mod classify;
pub mod config;
pub mod counts;
pub mod error;
pub mod feature;
pub mod index;
pub mod ingest;
pub mod interner;
pub mod introns;
pub mod line_source;
pub mod parser;
pub mod timing;
pub mod tree;

#[cfg(feature = "htslib")]
pub mod bam;

pub use alignment::{Block, Map, Template};
pub use classify::{classify_template, Hit};
pub use config::IngestConfig;
pub use counts::count_template;
pub use error::{GtfError, Result};
pub use feature::{Feature, Strand};
pub use index::{Index, ReferenceBucket};
pub use ingest::load;
pub use interner::Handle;
pub use line_source::{BufLineSource, LineSource};

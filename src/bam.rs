//! Thin adapter from `rust_htslib` BAM records into [`crate::alignment`]
//! types. Feature-gated (`htslib`) and not part of the core: the core only
//! needs the `Map`/`Template` contract described in the alignment model.

use anyhow::{Context, Result};
use rust_htslib::bam::ext::BamRecordExtensions;
use rust_htslib::bam::{self, Read};

use crate::alignment::{Block, Map};

/// Builds a single-end `Map` from one aligned, non-secondary BAM record,
/// splitting on reference-skip ('N') CIGAR operations to produce blocks.
pub fn map_from_record(record: &bam::Record, reference_name: &str) -> Option<Map> {
    if record.is_unmapped() {
        return None;
    }
    let mut blocks = Vec::new();
    let exon_pairs: Vec<(i64, i64)> = record.aligned_block_pairs().map(|(s, e)| (s, e)).collect();
    for (i, &(start, end)) in exon_pairs.iter().enumerate() {
        let junction_to_next = exon_pairs.get(i + 1).map(|&(next_start, _)| {
            (next_start - end).max(0) as u32
        });
        blocks.push(Block {
            start: (start + 1).max(0) as u32,
            end: end.max(0) as u32,
            junction_to_next,
        });
    }
    if blocks.is_empty() {
        return None;
    }
    Some(Map {
        reference: reference_name.to_string(),
        blocks,
    })
}

/// Iterates every mapped, primary record of a BAM/CRAM file, yielding one
/// single-end `Map` per record. Errors reading the file are fatal and
/// propagated, matching the core's `IOError` policy.
pub fn maps_from_bam_path(path: &str) -> Result<Vec<Map>> {
    let mut reader = bam::Reader::from_path(path)
        .with_context(|| format!("failed to open BAM/CRAM file {path}"))?;
    let header = reader.header().to_owned();
    let mut maps = Vec::new();
    for result in reader.records() {
        let record = result.context("failed to read BAM record")?;
        if record.is_unmapped() || record.is_secondary() || record.is_supplementary() {
            continue;
        }
        let Some(reference_name) = header
            .target_names()
            .get(record.tid().max(0) as usize)
            .map(|name| String::from_utf8_lossy(name).into_owned())
        else {
            continue;
        };
        if let Some(map) = map_from_record(&record, &reference_name) {
            maps.push(map);
        }
    }
    Ok(maps)
}

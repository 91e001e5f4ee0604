use rustc_hash::{FxHashMap, FxHashSet};

use crate::alignment::{Map, Template};
use crate::feature::{GeneIdHandle, TranscriptIdHandle};
use crate::index::Index;

/// Per-map (or per-mate-pair, after merge) accumulator. `map_index`
/// identifies which entry of the caller's template this hit was produced
/// from; the hit does not borrow the alignment data itself.
#[derive(Clone, Debug, Default)]
pub struct Hit {
    pub map_index: usize,
    pub num_junctions: u32,
    pub intron_length: u64,
    pub exon_overlap: f64,
    pub junction_hits: f64,
    pub is_protein_coding: bool,
    pub transcripts: FxHashMap<TranscriptIdHandle, u32>,
    pub genes: FxHashMap<GeneIdHandle, u32>,
    pub pairs_splits: bool,
    pub pairs_gene: bool,
    pub pairs_transcript: bool,
}

/// Classifies every map (or mate-pair) of `template`, returning one `Hit`
/// per entry.
pub fn classify_template(index: &Index, template: &Template) -> Vec<Hit> {
    match template {
        Template::SingleEnd(maps) => maps
            .iter()
            .enumerate()
            .map(|(i, map)| {
                let mut hit = classify_map(index, map, false);
                hit.map_index = i;
                hit
            })
            .collect(),
        Template::Paired(pairs) => pairs
            .iter()
            .enumerate()
            .map(|(i, (mate0, mate1))| {
                let mut hit0 = classify_map(index, mate0, true);
                let hit1 = classify_map(index, mate1, true);
                merge_paired(&mut hit0, hit1, mate0.num_blocks(), mate1.num_blocks());
                hit0.map_index = i;
                hit0
            })
            .collect(),
    }
}

/// Builds a single map's hit per the per-block construction algorithm.
/// `paired` selects the junction_hits normalization divisor (see the
/// paired-template aggregation rules).
fn classify_map(index: &Index, map: &Map, paired: bool) -> Hit {
    let exon_type = index.types.lookup("exon");
    let protein_coding = index.gene_types.lookup("protein_coding");

    let k = map.blocks.len() as u32;
    let mut hit = Hit {
        num_junctions: k.saturating_sub(1),
        ..Hit::default()
    };

    for (i, block) in map.blocks.iter().enumerate() {
        let hits = index.search(&map.reference, block.start, block.end);
        let mut local_overlap = 0.0_f64;
        let mut block_junction_credited = false;
        let mut genes_seen_this_block: FxHashSet<GeneIdHandle> = FxHashSet::default();

        for feature in hits {
            if Some(feature.feature_type) != exon_type {
                continue;
            }
            if protein_coding.is_none() || feature.gene_type != protein_coding {
                continue;
            }
            hit.is_protein_coding = true;

            let read_length = (block.end - block.start + 1) as f64;
            let lclip = block.start.saturating_sub(feature.start) as f64;
            let rclip = feature.end.saturating_sub(block.end) as f64;
            let feature_length = (feature.end - feature.start + 1) as f64;
            let over = (feature_length - lclip - rclip) / read_length;
            if over > local_overlap {
                local_overlap = over;
            }

            if i > 0 && !block_junction_credited {
                let hits_junction = block.start == feature.start
                    || block.start == feature.end
                    || block.end == feature.start
                    || block.end == feature.end;
                if hits_junction {
                    hit.junction_hits += 1.0;
                }
                block_junction_credited = true;
            }

            if let Some(transcript_id) = feature.transcript_id {
                *hit.transcripts.entry(transcript_id).or_insert(0) += 1;
            }
            if let Some(gene_id) = feature.gene_id {
                if genes_seen_this_block.insert(gene_id) {
                    *hit.genes.entry(gene_id).or_insert(0) += 1;
                }
            }
        }

        if let Some(gap) = block.junction_to_next {
            hit.intron_length += gap as u64;
        }
        hit.exon_overlap += local_overlap;
    }

    if k > 0 {
        hit.exon_overlap /= k as f64;
    }
    if hit.num_junctions > 0 {
        let divisor = if paired {
            2.0 * hit.num_junctions as f64
        } else {
            hit.num_junctions as f64
        };
        hit.junction_hits /= divisor;
    }

    hit.pairs_splits = hit.transcripts.values().any(|&count| count > 1 && count == k);
    if !paired {
        hit.pairs_gene = k == 0 || hit.genes.values().any(|&count| count == k);
    }

    hit
}

/// Merges mate1's hit into mate0's (the template hit) per the paired
/// aggregation rules.
fn merge_paired(template_hit: &mut Hit, mate1: Hit, blocks0: u32, blocks1: u32) {
    template_hit.exon_overlap = (template_hit.exon_overlap + mate1.exon_overlap) / 2.0;

    template_hit.pairs_splits = if template_hit.num_junctions > 0 && mate1.num_junctions > 0 {
        template_hit.pairs_splits && mate1.pairs_splits
    } else if template_hit.num_junctions > 0 {
        template_hit.pairs_splits
    } else {
        mate1.pairs_splits
    };

    template_hit.is_protein_coding = template_hit.is_protein_coding && mate1.is_protein_coding;
    template_hit.intron_length += mate1.intron_length;
    template_hit.num_junctions += mate1.num_junctions;
    template_hit.junction_hits = (template_hit.junction_hits + mate1.junction_hits) / 2.0;

    template_hit.transcripts = intersect_counts(std::mem::take(&mut template_hit.transcripts), &mate1.transcripts);
    template_hit.genes = intersect_counts(std::mem::take(&mut template_hit.genes), &mate1.genes);

    let total_blocks = blocks0 + blocks1;
    template_hit.pairs_transcript = template_hit
        .transcripts
        .values()
        .any(|&count| count > 1 && count == total_blocks);
    template_hit.pairs_gene = template_hit
        .genes
        .values()
        .any(|&count| count > 1 && count == total_blocks);
}

fn intersect_counts<K: Eq + std::hash::Hash + Copy>(
    a: FxHashMap<K, u32>,
    b: &FxHashMap<K, u32>,
) -> FxHashMap<K, u32> {
    a.into_iter()
        .filter_map(|(key, count)| b.get(&key).map(|&other| (key, count + other)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Block;
    use crate::config::IngestConfig;
    use crate::ingest::load_str;

    #[test]
    fn single_block_full_coverage() {
        let input = "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; gene_type \"protein_coding\"; transcript_id \"t1\";\n";
        let idx = load_str(input, &IngestConfig::default()).unwrap();
        let map = Map {
            reference: "chr1".into(),
            blocks: vec![Block {
                start: 120,
                end: 180,
                junction_to_next: None,
            }],
        };
        let hits = classify_template(&idx, &Template::SingleEnd(vec![map]));
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert!((hit.exon_overlap - 1.0).abs() < 1e-9);
        assert!(hit.is_protein_coding);
        assert_eq!(hit.num_junctions, 0);
    }

    #[test]
    fn exon_with_no_gene_type_is_not_protein_coding() {
        let input = "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n";
        let idx = load_str(input, &IngestConfig::default()).unwrap();
        let map = Map {
            reference: "chr1".into(),
            blocks: vec![Block {
                start: 120,
                end: 180,
                junction_to_next: None,
            }],
        };
        let hits = classify_template(&idx, &Template::SingleEnd(vec![map]));
        let hit = &hits[0];
        assert!(!hit.is_protein_coding);
        assert_eq!(hit.exon_overlap, 0.0);
        assert!(hit.transcripts.is_empty());
    }

    #[test]
    fn split_read_pairs_transcript_and_full_junction_hits() {
        let input = concat!(
            "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; gene_type \"protein_coding\"; transcript_id \"t1\";\n",
            "chr1\tsrc\texon\t400\t500\t.\t+\t.\tgene_id \"g1\"; gene_type \"protein_coding\"; transcript_id \"t1\";\n",
        );
        let idx = load_str(input, &IngestConfig::default()).unwrap();
        let map = Map {
            reference: "chr1".into(),
            blocks: vec![
                Block {
                    start: 150,
                    end: 200,
                    junction_to_next: Some(199),
                },
                Block {
                    start: 400,
                    end: 450,
                    junction_to_next: None,
                },
            ],
        };
        let hits = classify_template(&idx, &Template::SingleEnd(vec![map]));
        let hit = &hits[0];
        assert!(hit.pairs_splits);
        assert!((hit.junction_hits - 1.0).abs() < 1e-9);
    }
}

use rustc_hash::{FxHashMap, FxHashSet};

use crate::alignment::{Block, Map, Template};
use crate::feature::GeneIdHandle;
use crate::index::Index;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Category {
    Exon,
    Intron,
    Unknown,
}

/// Classifies uniquely-mapped reads/templates into type and gene count
/// tables. Multi-mapped entries (more than one map, or more than one
/// mate-pair) are silently skipped per the uniqueness rule.
pub fn count_template(
    index: &Index,
    template: &Template,
    type_counts: &mut FxHashMap<String, u64>,
    gene_counts: &mut FxHashMap<GeneIdHandle, u64>,
) {
    if !template.is_unique() {
        return;
    }
    match template {
        Template::SingleEnd(maps) => count_map(index, &maps[0], type_counts, gene_counts),
        Template::Paired(pairs) => {
            let (mate0, mate1) = &pairs[0];
            count_map(index, mate0, type_counts, gene_counts);
            count_map(index, mate1, type_counts, gene_counts);
        }
    }
}

fn block_category(index: &Index, reference: &str, block: &Block) -> Category {
    let exon = index.types.lookup("exon");
    let intron = index.types.lookup("intron");
    let hits = index.search(reference, block.start, block.end);
    if let Some(exon) = exon {
        if hits.iter().any(|f| f.feature_type == exon) {
            return Category::Exon;
        }
    }
    if let Some(intron) = intron {
        if hits.iter().any(|f| f.feature_type == intron) {
            return Category::Intron;
        }
    }
    Category::Unknown
}

fn block_single_gene(index: &Index, reference: &str, block: &Block) -> Option<GeneIdHandle> {
    let hits = index.search(reference, block.start, block.end);
    let mut genes: FxHashSet<GeneIdHandle> = FxHashSet::default();
    for feature in &hits {
        if let Some(gene_id) = feature.gene_id {
            genes.insert(gene_id);
        }
    }
    if genes.len() == 1 {
        genes.into_iter().next()
    } else {
        None
    }
}

fn count_map(
    index: &Index,
    map: &Map,
    type_counts: &mut FxHashMap<String, u64>,
    gene_counts: &mut FxHashMap<GeneIdHandle, u64>,
) {
    if map.blocks.is_empty() {
        return;
    }

    let categories: Vec<Category> = map
        .blocks
        .iter()
        .map(|block| block_category(index, &map.reference, block))
        .collect();

    let label = if categories.iter().all(|&c| c == Category::Exon) {
        "exon".to_string()
    } else if categories.iter().all(|&c| c == Category::Intron) {
        "intron".to_string()
    } else if categories.iter().all(|&c| c == Category::Unknown) {
        "unknown".to_string()
    } else {
        let mut parts = Vec::new();
        if categories.iter().any(|&c| c == Category::Exon) {
            parts.push("exon");
        }
        if categories.iter().any(|&c| c == Category::Intron) {
            parts.push("intron");
        }
        if categories.iter().any(|&c| c == Category::Unknown) {
            parts.push("unknown");
        }
        parts.join("|")
    };
    *type_counts.entry(label).or_insert(0) += 1;

    let gene_votes: Vec<Option<GeneIdHandle>> = map
        .blocks
        .iter()
        .map(|block| block_single_gene(index, &map.reference, block))
        .collect();
    if let Some(first) = gene_votes[0] {
        if gene_votes.iter().all(|&vote| vote == Some(first)) {
            *gene_counts.entry(first).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::ingest::load_str;

    #[test]
    fn mixed_block_categories_vote_composite_label() {
        let input = "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\";\n";
        let idx = load_str(input, &IngestConfig::default()).unwrap();
        let map = Map {
            reference: "chr1".into(),
            blocks: vec![
                Block {
                    start: 120,
                    end: 180,
                    junction_to_next: Some(0),
                },
                Block {
                    start: 10_000,
                    end: 10_010,
                    junction_to_next: None,
                },
            ],
        };
        let mut type_counts = FxHashMap::default();
        let mut gene_counts = FxHashMap::default();
        count_template(
            &idx,
            &Template::SingleEnd(vec![map]),
            &mut type_counts,
            &mut gene_counts,
        );
        assert_eq!(type_counts.get("exon|unknown"), Some(&1));
    }

    #[test]
    fn multi_mapped_template_does_not_contribute() {
        let input = "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\";\n";
        let idx = load_str(input, &IngestConfig::default()).unwrap();
        let map = Map {
            reference: "chr1".into(),
            blocks: vec![Block {
                start: 120,
                end: 180,
                junction_to_next: None,
            }],
        };
        let mut type_counts = FxHashMap::default();
        let mut gene_counts = FxHashMap::default();
        count_template(
            &idx,
            &Template::SingleEnd(vec![map.clone(), map]),
            &mut type_counts,
            &mut gene_counts,
        );
        assert!(type_counts.is_empty());
    }
}

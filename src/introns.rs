use rustc_hash::FxHashMap;

use crate::feature::{Feature, GeneIdHandle, Strand, TranscriptIdHandle, TypeHandle};
use crate::index::{Index, ReferenceBucket};
use crate::interner::Interner;

/// Sorts each reference's features by start (type-spelling tie-break) and
/// synthesizes `intron` features between consecutive same-transcript
/// exons. Continues the global `uid` sequence so it stays a contiguous
/// prefix across the whole index, introns included. The `intron` type is
/// only interned if at least one synthetic intron is actually emitted, so
/// an input with no qualifying transcript never grows the type table.
pub fn synthesize_introns(index: &mut Index) {
    let Some(exon_type) = index.types.lookup("exon") else {
        return;
    };

    let mut ref_handles: Vec<_> = index.references.keys().copied().collect();
    ref_handles.sort_by_key(|h| index.ref_names.resolve(*h).to_owned());

    let mut next_uid = index.total_features;
    let mut intron_type: Option<TypeHandle> = None;
    for handle in ref_handles {
        let bucket = index.references.get_mut(&handle).unwrap();
        sort_bucket(bucket, &index.types);
        let synthesized =
            synthesize_for_bucket(bucket, exon_type, &mut intron_type, &mut index.types, &mut next_uid);
        bucket.features.extend(synthesized);
        sort_bucket(bucket, &index.types);
    }
    index.total_features = next_uid;
}

pub(crate) fn sort_bucket(bucket: &mut ReferenceBucket, types: &crate::interner::Interner<crate::feature::TypeTag>) {
    bucket.features.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| types.resolve(a.feature_type).cmp(types.resolve(b.feature_type)))
    });
}

fn synthesize_for_bucket(
    bucket: &ReferenceBucket,
    exon_type: TypeHandle,
    intron_type: &mut Option<TypeHandle>,
    types: &mut Interner<crate::feature::TypeTag>,
    next_uid: &mut u64,
) -> Vec<Feature> {
    let mut last_exon: FxHashMap<TranscriptIdHandle, (u32, Strand, Option<GeneIdHandle>)> =
        FxHashMap::default();
    let mut synthesized = Vec::new();

    for feature in &bucket.features {
        if feature.feature_type != exon_type {
            continue;
        }
        let Some(transcript_id) = feature.transcript_id else {
            continue;
        };
        match last_exon.get(&transcript_id) {
            None => {
                last_exon.insert(transcript_id, (feature.end, feature.strand, feature.gene_id));
            }
            Some(&(prev_end, strand, gene_id)) => {
                if prev_end < feature.start {
                    let start = prev_end + 1;
                    let end = feature.start - 1;
                    if start <= end {
                        let intron_handle = *intron_type.get_or_insert_with(|| types.intern("intron"));
                        synthesized.push(Feature::new(
                            *next_uid,
                            start,
                            end,
                            strand,
                            intron_handle,
                            gene_id,
                            Some(transcript_id),
                            None,
                        ));
                        *next_uid += 1;
                    }
                }
                last_exon.insert(transcript_id, (feature.end, feature.strand, feature.gene_id));
            }
        }
    }

    synthesized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::ingest::load_str;

    #[test]
    fn synthesizes_intron_between_consecutive_exons() {
        let input = concat!(
            "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
            "chr1\tsrc\texon\t150\t300\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
            "chr1\tsrc\texon\t400\t500\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
        );
        let idx = load_str(input, &IngestConfig::default()).unwrap();
        let introns = idx.search("chr1", 301, 399);
        let intron_type = idx.types.lookup("intron").unwrap();
        let found = introns.iter().find(|f| f.feature_type == intron_type).unwrap();
        assert_eq!(found.start, 301);
        assert_eq!(found.end, 399);
        assert_eq!(found.transcript_id, idx.transcript_ids.lookup("t1"));
    }

    #[test]
    fn overlapping_exons_suppress_negative_length_intron() {
        let input = concat!(
            "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
            "chr1\tsrc\texon\t150\t300\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
        );
        let idx = load_str(input, &IngestConfig::default()).unwrap();
        assert!(idx.types.lookup("intron").is_none());
    }
}

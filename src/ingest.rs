use std::sync::Mutex;

use rayon::ThreadPoolBuilder;

use crate::config::IngestConfig;
use crate::error::{GtfError, Result};
use crate::feature::Feature;
use crate::index::{Index, ReferenceBucket};
use crate::introns::synthesize_introns;
use crate::line_source::{BufLineSource, LineSource};
use crate::parser::parse_line;
use crate::timing::Timing;
use crate::tree::TreeNode;

/// Builds the index: fans `source`'s lines across `config.threads` worker
/// threads into thread-local indices, merges them deterministically in
/// thread order, synthesizes introns, and builds each reference's
/// interval tree.
pub fn load<S: LineSource>(source: S, config: &IngestConfig) -> Result<Index> {
    let timing = Timing::new(config.verbose);
    let thread_count = config.threads.max(1);
    let shared = Mutex::new((source, 0u64));

    // One slot per worker, written exactly once each; reading them back in
    // slot order after the scope completes is what gives the merge step
    // its required "thread order" regardless of which worker finishes
    // first.
    let slots: Vec<Mutex<Option<Result<Index>>>> = (0..thread_count).map(|_| Mutex::new(None)).collect();

    {
        let _guard = timing.scoped("ingest");
        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build()
            .expect("failed to build ingestion thread pool");
        pool.scope(|scope| {
            for slot in &slots {
                scope.spawn(|_| {
                    let result = ingest_worker(&shared);
                    *slot.lock().unwrap() = Some(result);
                });
            }
        });
    }

    let results: Vec<Result<Index>> = slots
        .into_iter()
        .map(|slot| slot.into_inner().unwrap().expect("worker did not run"))
        .collect();

    let mut locals = Vec::with_capacity(results.len());
    for result in results {
        locals.push(result?);
    }

    let mut index = {
        let _guard = timing.scoped("merge");
        merge(locals)
    };

    {
        let _guard = timing.scoped("introns");
        synthesize_introns(&mut index);
    }

    {
        let _guard = timing.scoped("tree");
        build_trees(&mut index);
    }

    timing.set("total_features", index.total_features as u128);
    timing.finish("load");
    Ok(index)
}

/// Convenience entry point over an in-memory string, used by tests.
pub fn load_str(input: &str, config: &IngestConfig) -> Result<Index> {
    let cursor = std::io::Cursor::new(input.as_bytes().to_vec());
    let source = BufLineSource::new(std::io::BufReader::new(cursor));
    load(source, config)
}

fn ingest_worker<S: LineSource>(shared: &Mutex<(S, u64)>) -> Result<Index> {
    let mut local = Index::empty();
    loop {
        let next = {
            let mut guard = shared.lock().unwrap();
            let line_no = guard.1;
            let line = guard.0.next_line()?;
            guard.1 += 1;
            line.map(|text| (line_no, text))
        };
        let Some((line_no, line)) = next else {
            break;
        };
        match parse_line(line_no, &line) {
            Ok(Some(parsed)) => {
                let reference = local.ref_names.intern(parsed.reference);
                let feature_type = local.types.intern(parsed.feature_type);
                let gene_id = parsed.gene_id.map(|g| local.gene_ids.intern(g));
                let transcript_id = parsed.transcript_id.map(|t| local.transcript_ids.intern(t));
                let gene_type = parsed.gene_type.map(|g| local.gene_types.intern(g));
                let feature = Feature::new(
                    0,
                    parsed.start,
                    parsed.end,
                    parsed.strand,
                    feature_type,
                    gene_id,
                    transcript_id,
                    gene_type,
                );
                local
                    .references
                    .entry(reference)
                    .or_insert_with(ReferenceBucket::empty)
                    .features
                    .push(feature);
            }
            Ok(None) => {}
            // MalformedNumber is local and non-fatal: skip the line, keep going.
            Err(GtfError::MalformedNumber { .. }) => {}
            Err(other) => return Err(other),
        }
    }
    Ok(local)
}

/// Walks thread-local indices in thread order, re-interning every handle
/// into the global tables and assigning fresh, contiguous `uid`s.
fn merge(locals: Vec<Index>) -> Index {
    let mut global = Index::empty();
    let mut next_uid: u64 = 0;

    for local in locals {
        for (local_ref, bucket) in local.references {
            let name = local.ref_names.resolve(local_ref);
            let global_ref = global.ref_names.intern(name);
            let global_bucket = global
                .references
                .entry(global_ref)
                .or_insert_with(ReferenceBucket::empty);

            for feature in bucket.features {
                let feature_type = global.types.intern(local.types.resolve(feature.feature_type));
                let gene_id = feature
                    .gene_id
                    .map(|h| global.gene_ids.intern(local.gene_ids.resolve(h)));
                let transcript_id = feature
                    .transcript_id
                    .map(|h| global.transcript_ids.intern(local.transcript_ids.resolve(h)));
                let gene_type = feature
                    .gene_type
                    .map(|h| global.gene_types.intern(local.gene_types.resolve(h)));

                let uid = next_uid;
                next_uid += 1;
                global_bucket.features.push(Feature::new(
                    uid,
                    feature.start,
                    feature.end,
                    feature.strand,
                    feature_type,
                    gene_id,
                    transcript_id,
                    gene_type,
                ));
            }
        }
    }

    global.total_features = next_uid;
    global
}

fn build_trees(index: &mut Index) {
    for bucket in index.references.values_mut() {
        let indices: Vec<u32> = (0..bucket.features.len() as u32).collect();
        bucket.tree = TreeNode::build(&bucket.features, &index.types, indices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_are_a_contiguous_prefix() {
        let input = concat!(
            "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
            "chr1\tsrc\texon\t150\t300\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
            "chr2\tsrc\tgene\t1\t50\t.\t+\t.\t\n",
        );
        let idx = load_str(input, &IngestConfig::default()).unwrap();
        let mut uids: Vec<u64> = idx
            .references
            .values()
            .flat_map(|b| b.features.iter().map(|f| f.uid))
            .collect();
        uids.sort();
        let expected: Vec<u64> = (0..idx.total_features()).collect();
        assert_eq!(uids, expected);
    }

    #[test]
    fn thread_count_does_not_change_feature_multiset() {
        let input = concat!(
            "chr1\tsrc\texon\t100\t200\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
            "chr1\tsrc\texon\t150\t300\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";\n",
            "chr2\tsrc\tgene\t1\t50\t.\t+\t.\t\n",
            "chr2\tsrc\texon\t10\t40\t.\t-\t.\tgene_id \"g2\";\n",
        );
        let one = load_str(
            input,
            &IngestConfig {
                threads: 1,
                verbose: false,
            },
        )
        .unwrap();
        let many = load_str(
            input,
            &IngestConfig {
                threads: 4,
                verbose: false,
            },
        )
        .unwrap();
        assert_eq!(one.total_features(), many.total_features());

        let spelling = |idx: &Index, f: &Feature| {
            (
                f.start,
                f.end,
                f.strand,
                idx.types.resolve(f.feature_type).to_owned(),
            )
        };
        let mut one_set: Vec<_> = one
            .references
            .values()
            .flat_map(|b| b.features.iter().map(|f| spelling(&one, f)))
            .collect();
        let mut many_set: Vec<_> = many
            .references
            .values()
            .flat_map(|b| b.features.iter().map(|f| spelling(&many, f)))
            .collect();
        one_set.sort();
        many_set.sort();
        assert_eq!(one_set, many_set);
    }
}

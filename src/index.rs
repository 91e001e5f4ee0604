use rustc_hash::FxHashMap;

use crate::feature::{
    Feature, GeneIdTag, GeneTypeTag, RefHandle, RefTag, TranscriptIdTag, TypeTag,
};
use crate::interner::Interner;
use crate::tree::TreeNode;

/// Ordered collection of features for one reference sequence, plus the
/// root of its interval tree. Built once; immutable after `load`.
pub struct ReferenceBucket {
    pub features: Vec<Feature>,
    pub tree: Option<Box<TreeNode>>,
}

impl ReferenceBucket {
    pub(crate) fn empty() -> Self {
        ReferenceBucket {
            features: Vec::new(),
            tree: None,
        }
    }
}

/// Top-level, immutable, owning index: reference buckets plus the five
/// canonical intern tables. Dropping an `Index` releases every feature,
/// tree node, and interned string it owns.
pub struct Index {
    pub(crate) references: FxHashMap<RefHandle, ReferenceBucket>,
    pub(crate) ref_names: Interner<RefTag>,
    pub(crate) types: Interner<TypeTag>,
    pub(crate) gene_ids: Interner<GeneIdTag>,
    pub(crate) transcript_ids: Interner<TranscriptIdTag>,
    pub(crate) gene_types: Interner<GeneTypeTag>,
    pub(crate) total_features: u64,
}

impl Index {
    pub(crate) fn empty() -> Self {
        Index {
            references: FxHashMap::default(),
            ref_names: Interner::new(),
            types: Interner::new(),
            gene_ids: Interner::new(),
            transcript_ids: Interner::new(),
            gene_types: Interner::new(),
            total_features: 0,
        }
    }

    pub fn total_features(&self) -> u64 {
        self.total_features
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn bucket(&self, reference: &str) -> Option<&ReferenceBucket> {
        let handle = self.ref_names.lookup(reference)?;
        self.references.get(&handle)
    }

    /// Every feature whose interval has non-empty intersection with
    /// `[start, end]`. An unknown reference yields the empty result.
    /// Result ordering is not part of the contract.
    pub fn search(&self, reference: &str, start: u32, end: u32) -> Vec<&Feature> {
        let Some(bucket) = self.bucket(reference) else {
            return Vec::new();
        };
        let Some(root) = &bucket.tree else {
            return Vec::new();
        };
        let mut indices = Vec::new();
        root.search(&bucket.features, start, end, &mut indices);
        indices
            .into_iter()
            .map(|idx| &bucket.features[idx as usize])
            .collect()
    }
}

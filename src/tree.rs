use std::cmp::Ordering;

use crate::feature::{Feature, TypeTag};
use crate::interner::Interner;

/// Centered interval tree node. `by_start`/`by_end` hold the features
/// routed to this node (those whose interval contains `midpoint`); `left`
/// and `right` hold features strictly below/above it.
pub struct TreeNode {
    pub midpoint: u32,
    pub by_start: Vec<u32>,
    pub by_end: Vec<u32>,
    pub left: Option<Box<TreeNode>>,
    pub right: Option<Box<TreeNode>>,
}

fn cmp_by_start(a: &Feature, b: &Feature, types: &Interner<TypeTag>) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| types.resolve(a.feature_type).cmp(types.resolve(b.feature_type)))
}

fn cmp_by_end(a: &Feature, b: &Feature, types: &Interner<TypeTag>) -> Ordering {
    a.end
        .cmp(&b.end)
        .then_with(|| types.resolve(a.feature_type).cmp(types.resolve(b.feature_type)))
}

impl TreeNode {
    /// Builds a tree over the given feature indices. The pivot is the
    /// median element (by start, after the same tie-break used for the
    /// reference bucket's own ordering); its midpoint partitions the rest.
    pub fn build(
        features: &[Feature],
        types: &Interner<TypeTag>,
        mut indices: Vec<u32>,
    ) -> Option<Box<TreeNode>> {
        if indices.is_empty() {
            return None;
        }
        indices.sort_by(|&a, &b| cmp_by_start(&features[a as usize], &features[b as usize], types));

        let pivot = &features[indices[indices.len() / 2] as usize];
        let midpoint = pivot.start + (pivot.end - pivot.start) / 2;

        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut center = Vec::new();
        for idx in indices {
            let f = &features[idx as usize];
            if f.end < midpoint {
                left.push(idx);
            } else if f.start > midpoint {
                right.push(idx);
            } else {
                center.push(idx);
            }
        }

        let mut by_start = center.clone();
        by_start.sort_by(|&a, &b| cmp_by_start(&features[a as usize], &features[b as usize], types));
        let mut by_end = center;
        by_end.sort_by(|&a, &b| cmp_by_end(&features[a as usize], &features[b as usize], types));

        Some(Box::new(TreeNode {
            midpoint,
            by_start,
            by_end,
            left: TreeNode::build(features, types, left),
            right: TreeNode::build(features, types, right),
        }))
    }

    /// Appends the indices of every feature overlapping `[start, end]` to
    /// `out`. Recursion conditions and the early scan break mirror the
    /// reference overlap-query algorithm exactly.
    pub fn search(&self, features: &[Feature], start: u32, end: u32, out: &mut Vec<u32>) {
        for &idx in &self.by_start {
            let f = &features[idx as usize];
            if f.start > end {
                break;
            }
            if f.start <= end && f.end >= start {
                out.push(idx);
            }
        }
        if start < self.midpoint || end < self.midpoint {
            if let Some(left) = &self.left {
                left.search(features, start, end, out);
            }
        }
        if start > self.midpoint || end > self.midpoint {
            if let Some(right) = &self.right {
                right.search(features, start, end, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Strand;

    fn mk(start: u32, end: u32, types: &mut Interner<TypeTag>) -> Feature {
        Feature::new(0, start, end, Strand::Forward, types.intern("exon"), None, None, None)
    }

    #[test]
    fn every_result_satisfies_overlap_containment() {
        let mut types = Interner::new();
        let features = vec![
            mk(100, 200, &mut types),
            mk(150, 300, &mut types),
            mk(400, 500, &mut types),
            mk(10, 20, &mut types),
        ];
        let indices: Vec<u32> = (0..features.len() as u32).collect();
        let root = TreeNode::build(&features, &types, indices).unwrap();

        let mut out = Vec::new();
        root.search(&features, 250, 260, &mut out);
        let mut starts: Vec<u32> = out.iter().map(|&i| features[i as usize].start).collect();
        starts.sort();
        assert_eq!(starts, vec![150]);
    }

    #[test]
    fn midpoint_invariant_holds_for_center_set() {
        let mut types = Interner::new();
        let features = vec![
            mk(1, 1000, &mut types),
            mk(5, 10, &mut types),
            mk(990, 1100, &mut types),
        ];
        let indices: Vec<u32> = (0..features.len() as u32).collect();
        let root = TreeNode::build(&features, &types, indices).unwrap();
        for &idx in &root.by_start {
            let f = &features[idx as usize];
            assert!(f.start <= root.midpoint && root.midpoint <= f.end);
        }
    }
}

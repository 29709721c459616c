use std::collections::HashMap;

use rust_lapper::{Interval, Lapper};
use varfx_core::models::Region;

use crate::genome::{Feature, FeatureId, FeatureKind};

///
/// Interval trees over the top-level features of a genome, one tree per
/// chromosome. Transcripts and their parts are not indexed: they are
/// reached by descending from the genes.
///
#[derive(Debug, Default)]
pub struct FeatureIndex {
    trees: HashMap<String, Lapper<u32, FeatureId>>,
}

fn is_indexed(feature: &Feature) -> bool {
    !matches!(
        feature.kind,
        FeatureKind::Transcript(_)
            | FeatureKind::Exon(_)
            | FeatureKind::Intron(_)
            | FeatureKind::Utr5
            | FeatureKind::Utr3
            | FeatureKind::SpliceSite(_)
    )
}

impl FeatureIndex {
    pub fn build(features: &[Feature]) -> Self {
        let mut intervals: HashMap<String, Vec<Interval<u32, FeatureId>>> = HashMap::new();

        for (i, feature) in features.iter().enumerate() {
            if !is_indexed(feature) {
                continue;
            }
            // lapper intervals are half-open
            let interval = Interval {
                start: feature.region.start,
                stop: feature.region.end + 1,
                val: FeatureId(i as u32),
            };
            intervals
                .entry(feature.region.chr.clone())
                .or_default()
                .push(interval);
        }

        let trees = intervals
            .into_iter()
            .map(|(chr, chr_intervals)| (chr, Lapper::new(chr_intervals)))
            .collect();

        FeatureIndex { trees }
    }

    pub fn has_tree(&self, chr: &str) -> bool {
        self.trees.contains_key(chr)
    }

    ///
    /// Features intersecting a closed region, sorted by handle so results
    /// do not depend on the tree layout.
    ///
    pub fn query(&self, region: &Region) -> Vec<FeatureId> {
        let Some(tree) = self.trees.get(&region.chr) else {
            return Vec::new();
        };
        let mut ids: Vec<FeatureId> = tree
            .find(region.start, region.end.saturating_add(1))
            .map(|i| i.val)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn query_pos(&self, chr: &str, pos: u32) -> Vec<FeatureId> {
        self.query(&Region::new(chr, pos, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use varfx_core::models::Strand;

    fn feature(id: &str, start: u32, end: u32, kind: FeatureKind) -> Feature {
        Feature {
            id: id.to_string(),
            region: Region::new("chr1", start, end),
            strand: Strand::Plus,
            parent: None,
            kind,
        }
    }

    #[rstest]
    fn test_query_closed_bounds() {
        let features = vec![
            feature("a", 10, 19, FeatureKind::Intergenic),
            feature("b", 20, 29, FeatureKind::Intergenic),
            feature("c", 15, 15, FeatureKind::Utr5),
        ];
        let index = FeatureIndex::build(&features);

        assert_eq!(index.query_pos("chr1", 19), vec![FeatureId(0)]);
        assert_eq!(index.query_pos("chr1", 20), vec![FeatureId(1)]);
        assert_eq!(
            index.query(&Region::new("chr1", 19, 20)),
            vec![FeatureId(0), FeatureId(1)]
        );
        // not indexed
        assert_eq!(index.query_pos("chr1", 15), vec![FeatureId(0)]);
        assert!(index.query_pos("chr2", 15).is_empty());
        assert!(index.has_tree("chr1"));
        assert!(!index.has_tree("chr2"));
    }
}

use varfx_core::models::{Region, Strand};

use crate::codon::reverse_complement;
use crate::genome::{Feature, FeatureId, Genome, TranscriptData};

/// Coding sequence of a transcript as far as exon sequences are known.
#[derive(Debug, Clone, PartialEq)]
pub enum CdsSequence {
    Available(String),
    /// Some coding exons have a sequence, others do not.
    Partial,
    Missing,
}

///
/// Borrowed view of a transcript with its coordinate arithmetic:
/// genomic, CDS and mRNA positions, all strand aware.
///
#[derive(Debug, Clone, Copy)]
pub struct TranscriptView<'g> {
    genome: &'g Genome,
    id: FeatureId,
    feature: &'g Feature,
    data: &'g TranscriptData,
}

impl<'g> TranscriptView<'g> {
    pub(crate) fn new(genome: &'g Genome, id: FeatureId) -> Self {
        let feature = genome.feature(id);
        let data = match feature.transcript() {
            Some(data) => data,
            None => panic!(
                "Feature '{}' is a {}, not a transcript",
                feature.id,
                feature.kind_name()
            ),
        };
        TranscriptView {
            genome,
            id,
            feature,
            data,
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn feature(&self) -> &'g Feature {
        self.feature
    }

    pub fn data(&self) -> &'g TranscriptData {
        self.data
    }

    pub fn strand(&self) -> Strand {
        self.feature.strand
    }

    pub fn is_plus(&self) -> bool {
        self.feature.strand.is_plus()
    }

    pub fn is_protein_coding(&self) -> bool {
        self.data.protein_coding && self.data.cds.is_some()
    }

    pub fn cds_region(&self) -> Option<Region> {
        self.data
            .cds
            .map(|(start, end)| Region::new(&self.feature.region.chr, start, end))
    }

    /// Exons, 5' to 3' on the transcript strand.
    pub fn exons(&self) -> impl Iterator<Item = (FeatureId, &'g Feature)> + 'g {
        let genome = self.genome;
        self.data
            .exons
            .iter()
            .map(move |id| (*id, genome.feature(*id)))
    }

    pub fn exon_count(&self) -> usize {
        self.data.exons.len()
    }

    pub fn find_exon(&self, pos: u32) -> Option<FeatureId> {
        self.exons()
            .find(|(_, exon)| exon.region.intersects_pos(pos))
            .map(|(id, _)| id)
    }

    /// Coding part of an exon.
    pub fn coding_part(&self, exon: &Feature) -> Option<Region> {
        self.cds_region().and_then(|cds| exon.region.intersect(&cds))
    }

    pub fn mrna_length(&self) -> u32 {
        self.exons().map(|(_, e)| e.region.size()).sum()
    }

    pub fn cds_length(&self) -> u32 {
        self.exons()
            .filter_map(|(_, e)| self.coding_part(e))
            .map(|r| r.size())
            .sum()
    }

    /// Number of complete codons, stop codon included.
    pub fn protein_length(&self) -> u32 {
        self.cds_length() / 3
    }

    pub fn coding_exons(&self) -> Vec<FeatureId> {
        self.exons()
            .filter(|(_, e)| self.coding_part(e).is_some())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn first_coding_exon(&self) -> Option<FeatureId> {
        self.exons()
            .find(|(_, e)| self.coding_part(e).is_some())
            .map(|(id, _)| id)
    }

    /// Does the region touch any coding base?
    pub fn is_cds(&self, region: &Region) -> bool {
        self.exons()
            .filter_map(|(_, e)| self.coding_part(e))
            .any(|cds| cds.intersects(region))
    }

    ///
    /// Position of a genomic base inside the CDS (0 = first base of the
    /// start codon). `None` when the base is not coding.
    ///
    pub fn cds_base_number(&self, pos: u32) -> Option<u32> {
        let mut first_base = 0;
        for (_, exon) in self.exons() {
            let Some(coding) = self.coding_part(exon) else {
                continue;
            };
            if coding.intersects_pos(pos) {
                return Some(if self.is_plus() {
                    first_base + pos - coding.start
                } else {
                    first_base + coding.end - pos
                });
            }
            first_base += coding.size();
        }
        None
    }

    ///
    /// Genomic position of every CDS base, indexed by CDS base number.
    ///
    pub fn cds_positions(&self) -> Vec<u32> {
        let mut positions = Vec::with_capacity(self.cds_length() as usize);
        for (_, exon) in self.exons() {
            if let Some(coding) = self.coding_part(exon) {
                if self.is_plus() {
                    positions.extend(coding.start..=coding.end);
                } else {
                    positions.extend((coding.start..=coding.end).rev());
                }
            }
        }
        positions
    }

    /// Position of a genomic base in the spliced mRNA.
    pub fn mrna_position(&self, pos: u32) -> Option<u32> {
        let mut first_base = 0;
        for (_, exon) in self.exons() {
            if exon.region.intersects_pos(pos) {
                return Some(if self.is_plus() {
                    first_base + pos - exon.region.start
                } else {
                    first_base + exon.region.end - pos
                });
            }
            first_base += exon.region.size();
        }
        None
    }

    ///
    /// Coding sequence on the transcript strand, built from exon sequences.
    ///
    pub fn cds_sequence(&self) -> CdsSequence {
        let mut seq = String::with_capacity(self.cds_length() as usize);
        let mut found = 0;
        let mut missing = 0;

        for (_, exon) in self.exons() {
            let Some(coding) = self.coding_part(exon) else {
                continue;
            };
            let Some(exon_seq) = exon.exon().and_then(|d| d.sequence.as_deref()) else {
                missing += 1;
                continue;
            };
            found += 1;

            let from = (coding.start - exon.region.start) as usize;
            let to = (coding.end - exon.region.start + 1) as usize;
            let part = &exon_seq[from.min(exon_seq.len())..to.min(exon_seq.len())];
            if self.is_plus() {
                seq.push_str(part);
            } else {
                seq.push_str(&reverse_complement(part));
            }
        }

        match (found, missing) {
            (0, _) => CdsSequence::Missing,
            (_, 0) => CdsSequence::Available(seq.to_ascii_uppercase()),
            _ => CdsSequence::Partial,
        }
    }

    ///
    /// Distance from a region to the transcript's 5' (or 3') end, used
    /// for upstream and downstream annotations.
    ///
    pub fn distance_to_start(&self, region: &Region) -> u32 {
        let tr = &self.feature.region;
        if self.is_plus() {
            tr.start.saturating_sub(region.end)
        } else {
            region.start.saturating_sub(tr.end)
        }
    }

    pub fn distance_to_end(&self, region: &Region) -> u32 {
        let tr = &self.feature.region;
        if self.is_plus() {
            region.start.saturating_sub(tr.end)
        } else {
            tr.start.saturating_sub(region.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use crate::config::PredictorConfig;
    use crate::genome::{GeneSpec, GenomeBuilder, TranscriptSpec};

    ///
    /// Two transcripts with exons [100,199] [300,399] [500,599]
    /// and CDS 150..549, one per strand.
    ///
    #[fixture]
    fn genome() -> Genome {
        let mut builder = GenomeBuilder::new("test");
        builder.add_chromosome("chr1", 10_000).unwrap();
        for (gene, strand) in [("plus", Strand::Plus), ("minus", Strand::Minus)] {
            builder
                .add_gene(GeneSpec::new(gene, "chr1", 100, 599, strand))
                .unwrap();
            builder
                .add_transcript(
                    TranscriptSpec::new(&format!("{}.t1", gene), gene)
                        .with_exon(100, 199)
                        .with_exon(300, 399)
                        .with_exon(500, 599)
                        .with_cds(150, 549),
                )
                .unwrap();
        }
        builder.build(&PredictorConfig::default()).unwrap()
    }

    fn view<'g>(genome: &'g Genome, id: &str) -> TranscriptView<'g> {
        genome.transcript(genome.find_by_id(id).unwrap())
    }

    #[rstest]
    fn test_lengths(genome: Genome) {
        let tr = view(&genome, "plus.t1");
        assert_eq!(tr.mrna_length(), 300);
        assert_eq!(tr.cds_length(), 50 + 100 + 50);
        assert_eq!(tr.coding_exons().len(), 3);
    }

    #[rstest]
    fn test_cds_base_number_plus(genome: Genome) {
        let tr = view(&genome, "plus.t1");
        assert_eq!(tr.cds_base_number(150), Some(0));
        assert_eq!(tr.cds_base_number(199), Some(49));
        assert_eq!(tr.cds_base_number(300), Some(50));
        assert_eq!(tr.cds_base_number(250), None);
        assert_eq!(tr.cds_base_number(120), None);
    }

    #[rstest]
    fn test_cds_base_number_minus(genome: Genome) {
        let tr = view(&genome, "minus.t1");
        assert_eq!(tr.cds_base_number(549), Some(0));
        assert_eq!(tr.cds_base_number(500), Some(49));
        assert_eq!(tr.cds_base_number(399), Some(50));
        assert_eq!(tr.cds_base_number(150), Some(199));
    }

    #[rstest]
    fn test_cds_positions_match_base_numbers(genome: Genome) {
        for id in ["plus.t1", "minus.t1"] {
            let tr = view(&genome, id);
            let positions = tr.cds_positions();
            assert_eq!(positions.len() as u32, tr.cds_length());
            for (i, pos) in positions.iter().enumerate() {
                assert_eq!(tr.cds_base_number(*pos), Some(i as u32));
            }
        }
    }

    #[rstest]
    fn test_first_coding_exon(genome: Genome) {
        let plus = view(&genome, "plus.t1");
        let first = genome.feature(plus.first_coding_exon().unwrap());
        assert_eq!(first.region.start, 100);

        let minus = view(&genome, "minus.t1");
        let first = genome.feature(minus.first_coding_exon().unwrap());
        assert_eq!(first.region.start, 500);
    }

    #[rstest]
    fn test_mrna_position(genome: Genome) {
        let tr = view(&genome, "minus.t1");
        assert_eq!(tr.mrna_position(599), Some(0));
        assert_eq!(tr.mrna_position(100), Some(299));
        assert_eq!(tr.mrna_position(250), None);
    }

    #[rstest]
    fn test_cds_sequence_missing(genome: Genome) {
        let tr = view(&genome, "plus.t1");
        assert_eq!(tr.cds_sequence(), CdsSequence::Missing);
    }
}

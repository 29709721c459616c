use log::debug;
use varfx_core::models::{Region, Variant, VariantType};

use crate::config::PredictorConfig;
use crate::effect_type::EffectType;
use crate::errors::{ErrorWarningType, PredictorError};
use crate::feature_effect::compute_effect;
use crate::genome::{FeatureId, FeatureKind, Genome};
use crate::structural::StructuralVariantEffect;
use crate::variant_effects::VariantEffects;

/// First window used by [`VariantEffectPredictor::closest_gene`].
pub const CLOSEST_GENE_WINDOW: u32 = 1000;

///
/// Predicts the effects of variants on a built [`Genome`].
///
/// The predictor only borrows the genome and the configuration, so one
/// genome can serve any number of predictors, on any number of threads.
///
/// # Example
///
/// ```
/// use varfx_core::models::{Strand, Variant};
/// use varfx_effect::{EffectType, GeneSpec, GenomeBuilder, PredictorConfig, TranscriptSpec, VariantEffectPredictor};
///
/// let config = PredictorConfig::default();
/// let mut builder = GenomeBuilder::new("demo");
/// builder.add_chromosome("chr1", 100_000).unwrap();
/// builder.add_gene(GeneSpec::new("g1", "chr1", 1000, 2999, Strand::Plus)).unwrap();
/// builder
///     .add_transcript(TranscriptSpec::new("t1", "g1").with_exon(1000, 1199).with_exon(2800, 2999))
///     .unwrap();
/// let genome = builder.build(&config).unwrap();
///
/// let predictor = VariantEffectPredictor::new(&genome, &config);
/// let effects = predictor.predict(&Variant::new("chr1", 2000, "A", "G"));
/// assert_eq!(effects.current().unwrap().effect_type(), EffectType::Intron);
/// ```
///
#[derive(Debug, Clone, Copy)]
pub struct VariantEffectPredictor<'a> {
    genome: &'a Genome,
    config: &'a PredictorConfig,
}

impl<'a> VariantEffectPredictor<'a> {
    pub fn new(genome: &'a Genome, config: &'a PredictorConfig) -> Self {
        VariantEffectPredictor { genome, config }
    }

    pub fn genome(&self) -> &'a Genome {
        self.genome
    }

    pub fn config(&self) -> &'a PredictorConfig {
        self.config
    }

    fn is_chromosome_missing(&self, chr: &str) -> bool {
        self.genome.chromosome_length(chr).unwrap_or(0) == 0 || !self.genome.index().has_tree(chr)
    }

    ///
    /// Predict every effect of a variant.
    ///
    /// Missing chromosomes and variants outside the chromosome are
    /// recorded as diagnostics on the result, never returned as errors.
    ///
    pub fn predict(&self, variant: &Variant) -> VariantEffects {
        let mut effects = VariantEffects::new();

        if self.config.error_on_missing_chromosome && self.is_chromosome_missing(variant.chr()) {
            debug!("Chromosome '{}' not found for {}", variant.chr(), variant);
            effects.add_error_warning(variant, ErrorWarningType::ErrorChromosomeNotFound);
            return effects;
        }

        if variant.is_bnd() {
            self.predict_translocation(variant, &mut effects);
            return effects;
        }

        let structural =
            variant.is_structural() && variant.size() > self.config.small_variant_size_threshold;
        let chr_size = self.genome.chromosome_length(variant.chr()).unwrap_or(0);
        let huge = structural
            && variant.is_structural_huge_with(
                chr_size,
                self.config.huge_variant_size_threshold,
                self.config.huge_variant_ratio_threshold,
            );

        if huge {
            self.predict_huge(variant, &mut effects);
            return effects;
        }

        let hits = self.genome.index().query(&variant.region);
        if structural && self.predict_structural(variant, &hits, &mut effects) {
            return effects;
        }

        self.predict_features(variant, &hits, &mut effects);
        effects
    }

    fn predict_translocation(&self, variant: &Variant, effects: &mut VariantEffects) {
        let mut hits = self.genome.index().query(&variant.region);
        if let Some(breakend) = &variant.breakend {
            hits.extend(self.genome.index().query_pos(&breakend.chr, breakend.pos));
        }
        debug!("Translocation {}: {} features at both breakpoints", variant, hits.len());

        let sv = StructuralVariantEffect::new(self.genome, variant, &hits);
        for fusion in sv.fusions(self.genome) {
            effects.add_effect(fusion.into_effect());
        }
    }

    ///
    /// Variants covering a large part of a chromosome: genes are scanned
    /// directly instead of descending into every feature.
    ///
    /// # Panics
    /// When the variant is not a DEL, DUP or INV.
    ///
    fn predict_huge(&self, variant: &Variant, effects: &mut VariantEffects) {
        let (chr_tag, gene_tag, tr_tag, exon_tag, exon_partial_tag) = match variant.variant_type {
            VariantType::Del => (
                EffectType::ChromosomeLargeDeletion,
                EffectType::GeneDeleted,
                EffectType::TranscriptDeleted,
                EffectType::ExonDeleted,
                EffectType::ExonDeletedPartial,
            ),
            VariantType::Dup => (
                EffectType::ChromosomeLargeDuplication,
                EffectType::GeneDuplication,
                EffectType::TranscriptDuplication,
                EffectType::ExonDuplication,
                EffectType::ExonDuplicationPartial,
            ),
            VariantType::Inv => (
                EffectType::ChromosomeLargeInversion,
                EffectType::GeneInversion,
                EffectType::TranscriptInversion,
                EffectType::ExonInversion,
                EffectType::ExonInversionPartial,
            ),
            other => panic!("Huge structural variant of unsupported type {}", other),
        };
        debug!("Huge structural variant {}", variant);

        let chromosome = self.genome.chromosome_id(variant.chr()).map(|id| self.genome.link(id));
        effects.add(variant, chromosome, chr_tag, "");

        let region = &variant.region;
        let mut genes = Vec::new();
        for gid in self.genome.genes(variant.chr()) {
            let gene = self.genome.feature(*gid);
            if !gene.region.intersects(region) {
                continue;
            }
            genes.push(*gid);
            effects.add(variant, Some(self.genome.link(*gid)), gene_tag, "");

            for tid in gene.gene().map_or(&[][..], |g| g.transcripts.as_slice()) {
                let tr = self.genome.transcript(*tid);
                if region.includes(&tr.feature().region) {
                    effects.add(variant, Some(self.genome.link(*tid)), tr_tag, "");
                } else if region.intersects(&tr.feature().region) {
                    for (eid, exon) in tr.exons() {
                        if region.includes(&exon.region) {
                            effects.add(variant, Some(self.genome.link(eid)), exon_tag, "");
                        } else if region.intersects(&exon.region) {
                            effects.add(variant, Some(self.genome.link(eid)), exon_partial_tag, "");
                        }
                    }
                }
            }
        }

        let sv = StructuralVariantEffect::new(self.genome, variant, &genes);
        let fusions = sv.fusions(self.genome);
        if sv.effect_type() != EffectType::None {
            effects.add_effect(sv.into_effect());
        }
        for fusion in fusions {
            effects.add_effect(fusion.into_effect());
        }
    }

    ///
    /// Record the multi-gene summary and fusions. Returns true when the
    /// prediction is complete; deletions and duplications always go on to
    /// the per-feature analysis.
    ///
    fn predict_structural(&self, variant: &Variant, hits: &[FeatureId], effects: &mut VariantEffects) -> bool {
        let sv = StructuralVariantEffect::new(self.genome, variant, hits);
        let fusions = sv.fusions(self.genome);

        let mut added = false;
        if sv.effect_type() != EffectType::None {
            effects.add_effect(sv.into_effect());
            added = true;
        }
        for fusion in fusions {
            effects.add_effect(fusion.into_effect());
            added = true;
        }

        if variant.is_del() || variant.is_dup() {
            return false;
        }
        added
    }

    fn predict_features(&self, variant: &Variant, hits: &[FeatureId], effects: &mut VariantEffects) {
        let mut hit_chromosome = false;
        let mut hit_something = false;
        let mut deferred = Vec::new();

        for id in hits {
            let feature = self.genome.feature(*id);
            if feature.is_chromosome() {
                hit_chromosome = true;
            } else if feature.is_deferred() {
                deferred.push(*id);
            } else {
                hit_something |= compute_effect(self.genome, self.config, *id, variant, effects);
            }
        }

        for id in deferred {
            hit_something |= compute_effect(self.genome, self.config, id, variant, effects);
        }

        if !hit_chromosome {
            let chr_size = self.genome.chromosome_length(variant.chr()).unwrap_or(0);
            if variant.is_ins() && variant.start() == chr_size {
                // past the last base, no feature overlaps the insertion
                effects.add(variant, None, EffectType::ChromosomeElongation, "");
            } else if self.config.error_on_chromosome_miss {
                debug!("{} is outside chromosome '{}'", variant, variant.chr());
                effects.add_error_warning(variant, ErrorWarningType::ErrorOutOfChromosomeRange);
            }
        } else if !hit_something {
            let tag = if self.config.only_regulation {
                EffectType::None
            } else {
                EffectType::Intergenic
            };
            let chromosome = self.genome.chromosome_id(variant.chr()).map(|id| self.genome.link(id));
            effects.add(variant, chromosome, tag, "");
        }
    }

    ///
    /// Closest gene to a region. The search window starts at
    /// [`CLOSEST_GENE_WINDOW`] bases and doubles until a gene is found or
    /// the window covers the chromosome. Ties go to protein coding genes.
    ///
    pub fn closest_gene(&self, region: &Region) -> Option<FeatureId> {
        let chr_size = self.genome.chromosome_length(&region.chr)?;
        if chr_size == 0 {
            return None;
        }

        let mut window = CLOSEST_GENE_WINDOW;
        loop {
            let query = Region::new(
                &region.chr,
                region.start.saturating_sub(window).min(chr_size - 1),
                region.end.saturating_add(window).min(chr_size - 1),
            );
            let closest = self
                .genome
                .index()
                .query(&query)
                .into_iter()
                .filter(|id| self.genome.feature(*id).is_gene())
                .min_by_key(|id| {
                    let gene = self.genome.feature(*id);
                    (
                        gene.region.distance(region).unwrap_or(u32::MAX),
                        !self.genome.is_protein_coding_gene(*id),
                        *id,
                    )
                });

            if closest.is_some() || window >= chr_size {
                return closest;
            }
            window = window.saturating_mul(2);
        }
    }

    ///
    /// Every feature intersecting a region, at every level of the feature
    /// graph, sorted by handle.
    ///
    pub fn query_deep(&self, region: &Region) -> Result<Vec<FeatureId>, PredictorError> {
        let chr_size = match self.genome.chromosome_length(&region.chr) {
            Some(size) if size > 0 => size,
            _ => return Err(PredictorError::ChromosomeNotFound(region.chr.clone())),
        };
        if region.end >= chr_size {
            return Err(PredictorError::OutOfChromosomeRange {
                region: region.as_string(),
                chr: region.chr.clone(),
                length: chr_size,
            });
        }

        let mut result = Vec::new();
        for id in self.genome.index().query(region) {
            result.push(id);
            self.descend(id, region, &mut result);
        }
        result.sort();
        result.dedup();
        Ok(result)
    }

    fn descend(&self, id: FeatureId, region: &Region, result: &mut Vec<FeatureId>) {
        let feature = self.genome.feature(id);
        let children: Vec<FeatureId> = match &feature.kind {
            FeatureKind::Gene(data) => data.transcripts.clone(),
            FeatureKind::Transcript(data) => data
                .exons
                .iter()
                .chain(&data.introns)
                .chain(&data.utrs)
                .copied()
                .collect(),
            FeatureKind::Exon(data) => data.splice_sites.clone(),
            FeatureKind::Intron(data) => data.splice_sites.clone(),
            _ => Vec::new(),
        };

        for child in children {
            if self.genome.feature(child).region.intersects(region) {
                result.push(child);
                self.descend(child, region, result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use varfx_core::models::Strand;

    use crate::genome::{GeneSpec, GenomeBuilder, TranscriptSpec};

    ///
    /// chr1 (10 kb): coding gene `pc` [2000,2999], non coding `nc`
    /// [3400,3999]. chr2 has no features. chr3 has zero length.
    ///
    #[fixture]
    fn genome() -> Genome {
        let mut builder = GenomeBuilder::new("test");
        builder.add_chromosome("chr1", 10_000).unwrap();
        builder.add_chromosome("chr2", 5_000).unwrap();
        builder.add_chromosome("chr3", 0).unwrap();
        builder
            .add_gene(GeneSpec::new("pc", "chr1", 2000, 2999, Strand::Plus))
            .unwrap();
        builder
            .add_transcript(
                TranscriptSpec::new("pc.t1", "pc")
                    .with_exon(2000, 2199)
                    .with_exon(2800, 2999)
                    .with_cds(2100, 2899),
            )
            .unwrap();
        builder
            .add_gene(GeneSpec::new("nc", "chr1", 3400, 3999, Strand::Plus))
            .unwrap();
        builder
            .add_transcript(TranscriptSpec::new("nc.t1", "nc").with_exon(3400, 3999))
            .unwrap();
        builder.build(&PredictorConfig::default()).unwrap()
    }

    fn config() -> PredictorConfig {
        PredictorConfig {
            up_down_stream_length: 0,
            ..PredictorConfig::default()
        }
    }

    #[rstest]
    #[case("chrX")]
    #[case("chr3")]
    fn test_missing_chromosome(genome: Genome, #[case] chr: &str) {
        let config = config();
        let predictor = VariantEffectPredictor::new(&genome, &config);
        let effects = predictor.predict(&Variant::new(chr, 10, "A", "G"));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.current().unwrap().error_string(), "ERROR_CHROMOSOME_NOT_FOUND");
    }

    #[rstest]
    fn test_missing_chromosome_ignored(genome: Genome) {
        let config = PredictorConfig {
            error_on_missing_chromosome: false,
            ..config()
        };
        let predictor = VariantEffectPredictor::new(&genome, &config);
        let effects = predictor.predict(&Variant::new("chrX", 10, "A", "G"));
        assert_eq!(effects.current().unwrap().error_string(), "ERROR_OUT_OF_CHROMOSOME_RANGE");
    }

    #[rstest]
    fn test_chromosome_elongation(genome: Genome) {
        let config = config();
        let predictor = VariantEffectPredictor::new(&genome, &config);
        let effects = predictor.predict(&Variant::new("chr1", 10_000, "", "ACGT"));
        assert_eq!(effects.len(), 1);
        assert_eq!(
            effects.current().unwrap().effect_type(),
            EffectType::ChromosomeElongation
        );
        assert!(effects.current().unwrap().link().is_none());

        let effects = predictor.predict(&Variant::new("chr1", 10_005, "", "ACGT"));
        assert_eq!(effects.current().unwrap().error_string(), "ERROR_OUT_OF_CHROMOSOME_RANGE");
    }

    #[rstest]
    fn test_intergenic(genome: Genome) {
        let config = config();
        let predictor = VariantEffectPredictor::new(&genome, &config);
        let effects = predictor.predict(&Variant::new("chr2", 100, "A", "G"));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.current().unwrap().effect_type(), EffectType::Intergenic);

        let config = PredictorConfig {
            only_regulation: true,
            ..config
        };
        let predictor = VariantEffectPredictor::new(&genome, &config);
        let effects = predictor.predict(&Variant::new("chr1", 2500, "A", "G"));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.current().unwrap().effect_type(), EffectType::None);
    }

    #[rstest]
    #[case(1500, Some("pc"))]
    #[case(3150, Some("pc"))]
    #[case(3300, Some("nc"))]
    #[case(9000, Some("nc"))]
    fn test_closest_gene(genome: Genome, #[case] pos: u32, #[case] expected: Option<&str>) {
        let config = config();
        let predictor = VariantEffectPredictor::new(&genome, &config);
        let closest = predictor.closest_gene(&Region::new("chr1", pos, pos));
        assert_eq!(closest.map(|id| genome.feature(id).id.as_str()), expected);
        assert_eq!(predictor.closest_gene(&Region::new("chr2", 10, 10)), None);
    }

    #[rstest]
    fn test_closest_gene_prefers_protein_coding(genome: Genome) {
        let config = config();
        let predictor = VariantEffectPredictor::new(&genome, &config);
        // 199 bases from both genes
        let closest = predictor.closest_gene(&Region::new("chr1", 3198, 3201));
        assert_eq!(closest, genome.find_by_id("pc"));
    }

    #[rstest]
    fn test_query_deep(genome: Genome) {
        let config = config();
        let predictor = VariantEffectPredictor::new(&genome, &config);
        let hits = predictor.query_deep(&Region::new("chr1", 2150, 2150)).unwrap();
        let ids: Vec<&str> = hits.iter().map(|id| genome.feature(*id).id.as_str()).collect();
        assert!(ids.contains(&"chr1"));
        assert!(ids.contains(&"pc"));
        assert!(ids.contains(&"pc.t1"));
        assert!(ids.contains(&"pc.t1.exon1"));
        assert!(!ids.contains(&"pc.t1.intron1"));

        assert_eq!(
            predictor.query_deep(&Region::new("chrX", 1, 1)),
            Err(PredictorError::ChromosomeNotFound("chrX".to_string()))
        );
        assert!(matches!(
            predictor.query_deep(&Region::new("chr1", 9990, 10_010)),
            Err(PredictorError::OutOfChromosomeRange { length: 10_000, .. })
        ));
    }
}

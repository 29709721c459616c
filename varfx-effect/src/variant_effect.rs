use std::cmp::Ordering;

use serde::Serialize;
use varfx_core::models::{Region, Variant};

use crate::effect_type::{EffectImpact, EffectType};
use crate::errors::ErrorWarningType;
use crate::genome::{FeatureId, FeatureLink, Genome};

/// One classification: a tag and its impact, always added together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EffectEntry {
    pub effect_type: EffectType,
    pub impact: EffectImpact,
}

impl EffectEntry {
    pub fn new(effect_type: EffectType) -> Self {
        EffectEntry {
            effect_type,
            impact: effect_type.impact(),
        }
    }
}

///
/// Protein positions kept by a gene fusion: `(first, last)` amino acid
/// of each partner.
///
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FusionDetail {
    pub gene_left: Option<FeatureId>,
    pub gene_right: Option<FeatureId>,
    /// Non-gene partner of a translocation.
    pub feature_left: Option<FeatureId>,
    pub feature_right: Option<FeatureId>,
    pub transcript_left: Option<FeatureId>,
    pub transcript_right: Option<FeatureId>,
    pub aa_left: Option<(u32, u32)>,
    pub aa_right: Option<(u32, u32)>,
}

/// Extra data carried by structural summaries and fusions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectDetail {
    Structural {
        genes_left: Vec<FeatureId>,
        genes_right: Vec<FeatureId>,
        genes: Vec<FeatureId>,
        count_whole: usize,
        count_partial: usize,
    },
    Fusion(FusionDetail),
}

///
/// Effect of a variant on one feature.
///
/// The most severe tag and impact are recomputed from the entry list on
/// every read, so they do not depend on insertion order.
///
#[derive(Debug, Clone, PartialEq)]
pub struct VariantEffect {
    variant: Variant,
    link: Option<FeatureLink>,
    entries: Vec<EffectEntry>,
    diagnostics: Vec<ErrorWarningType>,

    pub codons_ref: String,
    pub codons_alt: String,
    /// 0-based codon number in the CDS.
    pub codon_num: Option<u32>,
    /// Base inside the codon (0, 1 or 2).
    pub codon_index: Option<u32>,
    pub aa_ref: String,
    pub aa_alt: String,
    /// Position in the spliced mRNA.
    pub cdna_pos: Option<u32>,
    pub distance: Option<u32>,
    pub message: String,
    pub detail: Option<EffectDetail>,
}

impl VariantEffect {
    pub fn new(variant: &Variant) -> Self {
        VariantEffect {
            variant: variant.clone(),
            link: None,
            entries: Vec::new(),
            diagnostics: Vec::new(),
            codons_ref: String::new(),
            codons_alt: String::new(),
            codon_num: None,
            codon_index: None,
            aa_ref: String::new(),
            aa_alt: String::new(),
            cdna_pos: None,
            distance: None,
            message: String::new(),
            detail: None,
        }
    }

    ///
    /// Set the primary classification. After this the entry list is never
    /// empty.
    ///
    pub fn set(
        &mut self,
        link: Option<FeatureLink>,
        effect_type: EffectType,
        impact: EffectImpact,
        message: &str,
    ) {
        self.link = link;
        self.add_effect_with_impact(effect_type, impact);
        self.message = message.to_string();
    }

    pub fn add_effect(&mut self, effect_type: EffectType) {
        self.entries.push(EffectEntry::new(effect_type));
    }

    pub fn add_effect_with_impact(&mut self, effect_type: EffectType, impact: EffectImpact) {
        self.entries.push(EffectEntry {
            effect_type,
            impact,
        });
    }

    /// Replace every entry with a single one.
    pub fn set_effect(&mut self, effect_type: EffectType) {
        self.entries.clear();
        self.add_effect(effect_type);
    }

    ///
    /// Codons and their translation. Amino acids are only filled in when
    /// both codon strings are complete.
    ///
    pub fn set_codons(&mut self, codons_ref: &str, codons_alt: &str, codon_num: u32, codon_index: u32) {
        self.codons_ref = codons_ref.to_string();
        self.codons_alt = codons_alt.to_string();
        self.codon_num = Some(codon_num);
        self.codon_index = Some(codon_index);
        self.aa_ref = crate::codon::translate(codons_ref);
        self.aa_alt = crate::codon::translate(codons_alt);
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn link(&self) -> Option<&FeatureLink> {
        self.link.as_ref()
    }

    pub fn feature(&self) -> Option<FeatureId> {
        self.link.map(|l| l.feature)
    }

    pub fn transcript(&self) -> Option<FeatureId> {
        self.link.and_then(|l| l.transcript)
    }

    pub fn gene(&self) -> Option<FeatureId> {
        self.link.and_then(|l| l.gene)
    }

    pub fn entries(&self) -> &[EffectEntry] {
        &self.entries
    }

    pub fn effect_types(&self) -> impl Iterator<Item = EffectType> + '_ {
        self.entries.iter().map(|e| e.effect_type)
    }

    pub fn has_effect_type(&self, effect_type: EffectType) -> bool {
        self.entries.iter().any(|e| e.effect_type == effect_type)
    }

    /// Most severe tag, `NONE` when nothing was added.
    pub fn effect_type(&self) -> EffectType {
        self.entries
            .iter()
            .map(|e| e.effect_type)
            .min()
            .unwrap_or(EffectType::None)
    }

    /// Most severe impact, `MODIFIER` for plain intervals.
    pub fn effect_impact(&self) -> EffectImpact {
        if !self.variant.is_variant() {
            return EffectImpact::Modifier;
        }
        self.entries
            .iter()
            .map(|e| e.impact)
            .min()
            .unwrap_or(EffectImpact::Modifier)
    }

    pub fn add_error_warning(&mut self, kind: ErrorWarningType) {
        if !self.diagnostics.contains(&kind) {
            self.diagnostics.push(kind);
        }
    }

    pub fn diagnostics(&self) -> &[ErrorWarningType] {
        &self.diagnostics
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Errors joined with `&`.
    pub fn error_string(&self) -> String {
        self.join_diagnostics(|d| d.is_error())
    }

    /// Warnings and infos joined with `&`.
    pub fn warning_string(&self) -> String {
        self.join_diagnostics(|d| !d.is_error())
    }

    fn join_diagnostics(&self, keep: impl Fn(&ErrorWarningType) -> bool) -> String {
        self.diagnostics
            .iter()
            .filter(|d| keep(d))
            .map(|d| d.name())
            .collect::<Vec<_>>()
            .join("&")
    }

    ///
    /// Protein length without the stop codon, for effects on protein
    /// coding transcripts.
    ///
    pub fn aa_length(&self, genome: &Genome) -> Option<u32> {
        let tr = genome.transcript(self.transcript()?);
        if !tr.is_protein_coding() {
            return None;
        }
        Some(tr.cds_length().saturating_sub(3) / 3)
    }

    fn transcript_key<'g>(&self, genome: &'g Genome) -> (u16, bool, Option<&'g Region>, Option<&'g str>) {
        match self.transcript() {
            Some(id) => {
                let feature = genome.feature(id);
                let data = feature.transcript();
                let tsl = data
                    .and_then(|d| d.support_level)
                    .map_or(u16::MAX, u16::from);
                let canonical = data.is_some_and(|d| d.canonical);
                (tsl, !canonical, Some(&feature.region), Some(feature.id.as_str()))
            }
            None => (u16::MAX, true, None, None),
        }
    }

    fn feature_key<'g>(&self, genome: &'g Genome) -> Option<(&'g Region, &'g str)> {
        self.feature().map(|id| {
            let f = genome.feature(id);
            (&f.region, f.id.as_str())
        })
    }

    ///
    /// Total order used to report effects: impact, tag, transcript support
    /// level (missing last), canonical first, transcript position and id,
    /// feature position and id, then the variant itself.
    ///
    pub fn compare(&self, other: &VariantEffect, genome: &Genome) -> Ordering {
        self.effect_impact()
            .cmp(&other.effect_impact())
            .then_with(|| self.effect_type().cmp(&other.effect_type()))
            .then_with(|| self.transcript_key(genome).cmp(&other.transcript_key(genome)))
            .then_with(|| self.feature_key(genome).cmp(&other.feature_key(genome)))
            .then_with(|| {
                fn key(e: &VariantEffect) -> (&Region, &str, &str) {
                    let v = &e.variant;
                    (&v.region, v.reference.as_str(), v.alt.as_str())
                }
                key(self).cmp(&key(other))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use varfx_core::models::{Strand, VariantType};

    use crate::config::PredictorConfig;
    use crate::genome::{GeneSpec, GenomeBuilder, TranscriptSpec};

    fn snp() -> Variant {
        Variant::new("chr1", 100, "A", "G")
    }

    ///
    /// chr1: `g1` [1000,1999] with transcript `t1`, `g2` [3000,3999].
    ///
    fn genome() -> Genome {
        let mut builder = GenomeBuilder::new("test");
        builder.add_chromosome("chr1", 10_000).unwrap();
        builder
            .add_gene(GeneSpec::new("g1", "chr1", 1000, 1999, Strand::Plus))
            .unwrap();
        builder
            .add_transcript(TranscriptSpec::new("t1", "g1").with_exon(1000, 1199).with_exon(1800, 1999))
            .unwrap();
        builder
            .add_gene(GeneSpec::new("g2", "chr1", 3000, 3999, Strand::Plus))
            .unwrap();
        builder.build(&PredictorConfig::default()).unwrap()
    }

    fn linked(genome: &Genome, variant: &Variant, id: &str, tag: EffectType) -> VariantEffect {
        let mut effect = VariantEffect::new(variant);
        let link = genome.find_by_id(id).map(|id| genome.link(id));
        effect.set(link, tag, tag.impact(), "");
        effect
    }

    #[rstest]
    fn test_compare_falls_back_to_variant() {
        let genome = genome();
        let later = linked(&genome, &Variant::new("chr1", 1100, "A", "G"), "t1", EffectType::Exon);
        let earlier = linked(&genome, &Variant::new("chr1", 1050, "C", "T"), "t1", EffectType::Exon);

        assert_eq!(later.compare(&later, &genome), Ordering::Equal);
        assert_eq!(earlier.compare(&later, &genome), Ordering::Less);
        assert_eq!(later.compare(&earlier, &genome), Ordering::Greater);
    }

    #[rstest]
    fn test_compare_orders_features_by_position() {
        let genome = genome();
        let variant = Variant::structural("chr1", 500, 5000, VariantType::Dup);
        let first = linked(&genome, &variant, "g1", EffectType::GeneDuplication);
        let second = linked(&genome, &variant, "g2", EffectType::GeneDuplication);

        assert_eq!(first.compare(&second, &genome), Ordering::Less);
        assert_eq!(second.compare(&first, &genome), Ordering::Greater);

        // severity comes before position
        let high = linked(&genome, &variant, "g2", EffectType::GeneDeleted);
        assert_eq!(high.compare(&first, &genome), Ordering::Less);
    }

    #[rstest]
    fn test_empty_effect() {
        let effect = VariantEffect::new(&snp());
        assert_eq!(effect.effect_type(), EffectType::None);
        assert_eq!(effect.effect_impact(), EffectImpact::Modifier);
    }

    #[rstest]
    #[case(&[EffectType::Intron, EffectType::StopGained, EffectType::SpliceSiteRegion])]
    #[case(&[EffectType::StopGained, EffectType::SpliceSiteRegion, EffectType::Intron])]
    #[case(&[EffectType::SpliceSiteRegion, EffectType::Intron, EffectType::StopGained])]
    fn test_order_independent_severity(#[case] tags: &[EffectType]) {
        let mut effect = VariantEffect::new(&snp());
        effect.set(None, tags[0], tags[0].impact(), "");
        for tag in &tags[1..] {
            effect.add_effect(*tag);
        }
        assert_eq!(effect.effect_type(), EffectType::StopGained);
        assert_eq!(effect.effect_impact(), EffectImpact::High);
    }

    #[rstest]
    fn test_lower_severity_does_not_downgrade() {
        let mut effect = VariantEffect::new(&snp());
        effect.set(None, EffectType::FrameShift, EffectImpact::High, "");
        effect.add_effect(EffectType::Intron);
        assert_eq!(effect.effect_impact(), EffectImpact::High);
    }

    #[rstest]
    fn test_interval_is_modifier() {
        let mut effect = VariantEffect::new(&Variant::interval("chr1", 10, 20));
        effect.set(None, EffectType::ExonDeleted, EffectImpact::High, "");
        assert_eq!(effect.effect_impact(), EffectImpact::Modifier);
        assert_eq!(effect.effect_type(), EffectType::ExonDeleted);
    }

    #[rstest]
    fn test_diagnostics_are_joined_once() {
        let mut effect = VariantEffect::new(&snp());
        effect.add_error_warning(ErrorWarningType::WarningSequenceNotAvailable);
        effect.add_error_warning(ErrorWarningType::WarningTranscriptIncomplete);
        effect.add_error_warning(ErrorWarningType::WarningSequenceNotAvailable);
        effect.add_error_warning(ErrorWarningType::ErrorOutOfExon);

        assert_eq!(
            effect.warning_string(),
            "WARNING_SEQUENCE_NOT_AVAILABLE&WARNING_TRANSCRIPT_INCOMPLETE"
        );
        assert_eq!(effect.error_string(), "ERROR_OUT_OF_EXON");
        assert!(effect.has_error());
    }

    #[rstest]
    fn test_set_codons_translates() {
        let mut effect = VariantEffect::new(&snp());
        effect.set_codons("TGG", "TGA", 4, 2);
        assert_eq!(effect.aa_ref, "W");
        assert_eq!(effect.aa_alt, "*");
        assert_eq!(effect.codon_num, Some(4));
    }
}

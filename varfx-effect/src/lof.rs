//!
//! Loss of function (LOF) and nonsense-mediated decay (NMD) calls over the
//! effects of one variant.
//!
use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::config::PredictorConfig;
use crate::effect_type::EffectType;
use crate::genome::{FeatureId, FeatureKind, Genome, TranscriptView};
use crate::variant_effect::VariantEffect;
use crate::variant_effects::VariantEffects;

/// A stop codon further upstream than this from the last exon-exon
/// junction triggers NMD.
pub const MND_BASES_BEFORE_LAST_JUNCTION: usize = 50;

/// Share of a gene's transcripts hit by LOF or NMD effects.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneFraction {
    pub gene: FeatureId,
    pub gene_name: String,
    pub transcripts: usize,
    pub affected: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LofReport {
    pub is_lof: bool,
    pub is_nmd: bool,
    /// Sorted by gene.
    pub lof: Vec<GeneFraction>,
    /// Sorted by gene.
    pub nmd: Vec<GeneFraction>,
}

#[derive(Default)]
struct Affected {
    transcripts: BTreeSet<FeatureId>,
    genes: BTreeSet<FeatureId>,
}

impl Affected {
    fn insert(&mut self, effect: &VariantEffect) {
        if let (Some(tr), Some(gene)) = (effect.transcript(), effect.gene()) {
            self.transcripts.insert(tr);
            self.genes.insert(gene);
        }
    }

    fn fractions(&self, genome: &Genome) -> Vec<GeneFraction> {
        let mut by_gene: BTreeMap<FeatureId, GeneFraction> = BTreeMap::new();
        for gene in &self.genes {
            let Some(data) = genome.feature(*gene).gene() else {
                continue;
            };
            let transcripts = data.transcripts.len();
            let affected = data
                .transcripts
                .iter()
                .filter(|t| self.transcripts.contains(t))
                .count();
            let fraction = if transcripts == 0 {
                0.0
            } else {
                affected as f64 / transcripts as f64
            };
            by_gene.insert(
                *gene,
                GeneFraction {
                    gene: *gene,
                    gene_name: data.name.clone(),
                    transcripts,
                    affected,
                    fraction,
                },
            );
        }
        by_gene.into_values().collect()
    }
}

///
/// Classifies finished effect collections. Thresholds come from
/// [`PredictorConfig`]: `lof_ignore_before`, `lof_ignore_after`,
/// `lof_delete_fraction` and `treat_all_as_protein_coding`.
///
#[derive(Debug, Clone, Copy)]
pub struct LossOfFunction<'a> {
    genome: &'a Genome,
    config: &'a PredictorConfig,
}

impl<'a> LossOfFunction<'a> {
    pub fn new(genome: &'a Genome, config: &'a PredictorConfig) -> Self {
        LossOfFunction { genome, config }
    }

    pub fn classify(&self, effects: &VariantEffects) -> LofReport {
        let mut lof = Affected::default();
        let mut nmd = Affected::default();

        for effect in effects {
            if !self.is_lof_effect(effect) {
                continue;
            }
            lof.insert(effect);
            if self.is_stop_gained_only(effect) && self.is_nmd(effect) {
                nmd.insert(effect);
            }
        }

        let report = LofReport {
            is_lof: !lof.genes.is_empty(),
            is_nmd: !nmd.genes.is_empty(),
            lof: lof.fractions(self.genome),
            nmd: nmd.fractions(self.genome),
        };
        debug!(
            "LOF: {} genes, NMD: {} genes over {} effects",
            report.lof.len(),
            report.nmd.len(),
            effects.len()
        );
        report
    }

    /// Stop gained is only looked at when no splice core tag is present.
    fn is_stop_gained_only(&self, effect: &VariantEffect) -> bool {
        effect.has_effect_type(EffectType::StopGained)
            && !effect.has_effect_type(EffectType::SpliceSiteAcceptor)
            && !effect.has_effect_type(EffectType::SpliceSiteDonor)
    }

    fn is_protein_coding(&self, effect: &VariantEffect) -> bool {
        if self.config.treat_all_as_protein_coding {
            return true;
        }
        let (Some(gene), Some(tr)) = (effect.gene(), effect.transcript()) else {
            return false;
        };
        self.genome.is_protein_coding_gene(gene) && self.genome.transcript(tr).is_protein_coding()
    }

    ///
    /// Does this single effect knock the transcript out?
    ///
    /// Only effects on a gene and a transcript qualify, and both must be
    /// protein coding unless `treat_all_as_protein_coding` is set.
    ///
    pub fn is_lof_effect(&self, effect: &VariantEffect) -> bool {
        let variant = effect.variant();
        if !variant.is_variant() || effect.gene().is_none() || effect.transcript().is_none() {
            return false;
        }
        if !self.is_protein_coding(effect) {
            return false;
        }

        let mut lof = false;
        if effect.has_effect_type(EffectType::FrameShift) {
            lof |= self.is_lof_frame_shift(effect);
        }
        if variant.is_del() {
            lof |= self.is_lof_deletion(effect);
        }

        if effect.has_effect_type(EffectType::SpliceSiteAcceptor)
            || effect.has_effect_type(EffectType::SpliceSiteDonor)
        {
            lof |= self.hits_splice_core(effect);
        } else if effect.has_effect_type(EffectType::StopGained) {
            lof |= self.is_nmd(effect);
        } else if effect.has_effect_type(EffectType::RareAminoAcid)
            || effect.has_effect_type(EffectType::StartLost)
        {
            lof = true;
        }
        lof
    }

    fn is_lof_frame_shift(&self, effect: &VariantEffect) -> bool {
        let (Some(aa_length), Some(codon_num)) = (effect.aa_length(self.genome), effect.codon_num) else {
            return false;
        };
        if aa_length == 0 {
            return false;
        }
        let fraction = codon_num as f64 / aa_length as f64;
        self.config.lof_ignore_before <= fraction && fraction <= self.config.lof_ignore_after
    }

    fn is_lof_deletion(&self, effect: &VariantEffect) -> bool {
        let Some(tid) = effect.transcript() else {
            return false;
        };
        if effect.has_effect_type(EffectType::TranscriptDeleted)
            || effect.has_effect_type(EffectType::GeneFusion)
            || effect.has_effect_type(EffectType::GeneFusionHalf)
            || effect.has_effect_type(EffectType::GeneFusionReverse)
        {
            return true;
        }

        let tr = self.genome.transcript(tid);
        let variant = effect.variant();
        if effect.has_effect_type(EffectType::ExonDeleted) {
            let first = tr.first_coding_exon().map(|id| self.genome.feature(id));
            if first.is_some_and(|exon| variant.region.includes(&exon.region)) {
                return true;
            }
        }

        let Some(cds) = tr.cds_region() else {
            return false;
        };
        let Some(deleted) = variant.region.intersect(&cds) else {
            return false;
        };

        let (mut coding, mut coding_deleted) = (0u64, 0u64);
        for (_, exon) in tr.exons() {
            coding += u64::from(cds.intersect_size(&exon.region));
            coding_deleted += u64::from(deleted.intersect_size(&exon.region));
        }
        if coding == 0 {
            return false;
        }
        coding_deleted as f64 / coding as f64 > self.config.lof_delete_fraction
    }

    fn hits_splice_core(&self, effect: &VariantEffect) -> bool {
        let Some(tid) = effect.transcript() else {
            return false;
        };
        let variant = effect.variant();
        self.genome
            .transcript(tid)
            .data()
            .introns
            .iter()
            .filter_map(|id| match &self.genome.feature(*id).kind {
                FeatureKind::Intron(data) => Some(&data.splice_sites),
                _ => None,
            })
            .flatten()
            .filter_map(|id| self.genome.feature(*id).splice_site())
            .filter_map(|site| site.core.as_ref())
            .any(|core| core.intersects(&variant.region))
    }

    ///
    /// Would the stop codon introduced by this effect trigger NMD?
    ///
    /// # Panics
    /// When the effect has no transcript.
    ///
    pub fn is_nmd(&self, effect: &VariantEffect) -> bool {
        let Some(tid) = effect.transcript() else {
            panic!("NMD requested for an effect without transcript: {}", effect.variant());
        };
        let tr = self.genome.transcript(tid);
        if tr.exon_count() <= 1 {
            return false;
        }
        let Some(last_nmd_pos) = self.last_nmd_pos(tr) else {
            return false;
        };

        let variant = effect.variant();
        if tr.is_plus() {
            variant.start() <= last_nmd_pos
        } else {
            last_nmd_pos <= variant.end()
        }
    }

    ///
    /// Last genomic position, 5' to 3' on the transcript, where a stop
    /// codon still triggers NMD: [`MND_BASES_BEFORE_LAST_JUNCTION`] CDS
    /// bases before the last exon-exon junction. `None` when the CDS has
    /// a single coding exon or the junction is too close to the start.
    ///
    pub fn last_nmd_pos(&self, tr: TranscriptView<'_>) -> Option<u32> {
        let cds = tr.cds_region()?;
        if tr.coding_exons().len() <= 1 {
            return None;
        }

        let cds_end = if tr.is_plus() { cds.end } else { cds.start };
        let last_exon = tr
            .exons()
            .filter(|(_, e)| e.region.intersects_pos(cds_end))
            .map(|(_, e)| e)
            .last()?;
        let junction = if tr.is_plus() {
            last_exon.region.start
        } else {
            last_exon.region.end
        };

        let positions = tr.cds_positions();
        let cdsi = positions.iter().rposition(|pos| *pos == junction)?;
        if cdsi > MND_BASES_BEFORE_LAST_JUNCTION {
            positions.get(cdsi - MND_BASES_BEFORE_LAST_JUNCTION - 1).copied()
        } else {
            None
        }
    }
}

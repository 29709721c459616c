//! Coding changes: how a variant alters the codons of one transcript.

use varfx_core::models::{Region, Variant, VariantType};

use crate::codon::{CODON_SIZE, complement, is_start, is_stop, reverse_complement, translate};
use crate::config::PredictorConfig;
use crate::effect_type::{EffectImpact, EffectType};
use crate::errors::ErrorWarningType;
use crate::genome::transcript::CdsSequence;
use crate::genome::{FeatureId, Genome, TranscriptView};
use crate::variant_effect::VariantEffect;
use crate::variant_effects::VariantEffects;

#[derive(Debug, Clone, PartialEq)]
struct Codons {
    reference: String,
    alt: String,
    num: u32,
    index: u32,
}

impl Codons {
    fn position(num: u32, index: u32) -> Self {
        Codons {
            reference: String::new(),
            alt: String::new(),
            num,
            index,
        }
    }
}

pub(crate) struct CodonChange<'a> {
    genome: &'a Genome,
    config: &'a PredictorConfig,
    tr: TranscriptView<'a>,
    variant: &'a Variant,
    cds: CdsSequence,
}

impl<'a> CodonChange<'a> {
    pub(crate) fn new(
        genome: &'a Genome,
        config: &'a PredictorConfig,
        transcript: FeatureId,
        variant: &'a Variant,
    ) -> Self {
        let tr = genome.transcript(transcript);
        let cds = tr.cds_sequence();
        CodonChange {
            genome,
            config,
            tr,
            variant,
            cds,
        }
    }

    fn is_coding(&self) -> bool {
        self.tr.is_protein_coding() || self.config.treat_all_as_protein_coding
    }

    fn sequence(&self) -> Option<&str> {
        match &self.cds {
            CdsSequence::Available(seq) => Some(seq),
            _ => None,
        }
    }

    ///
    /// Reference codons `first..=last`, padded with `N` when the CDS ends
    /// in an incomplete codon. Empty without a sequence.
    ///
    fn codons_ref(&self, first: u32, last: u32) -> String {
        let Some(seq) = self.sequence() else {
            return String::new();
        };
        let start = ((first * CODON_SIZE) as usize).min(seq.len());
        let end = (((last + 1) * CODON_SIZE) as usize).min(seq.len());
        let mut codons = seq[start..end].to_string();
        while codons.len() % CODON_SIZE as usize != 0 {
            codons.push('N');
        }
        codons
    }

    fn sequence_diagnostics(&self) -> Vec<ErrorWarningType> {
        let seq = match &self.cds {
            CdsSequence::Missing => return vec![ErrorWarningType::WarningSequenceNotAvailable],
            CdsSequence::Partial => return vec![ErrorWarningType::ErrorMissingCdsSequence],
            CdsSequence::Available(seq) => seq,
        };

        let mut diagnostics = Vec::new();
        if seq.len() % CODON_SIZE as usize != 0 {
            diagnostics.push(ErrorWarningType::WarningTranscriptIncomplete);
        }
        if seq.len() < CODON_SIZE as usize {
            return diagnostics;
        }
        if !is_start(&seq[..3]) {
            diagnostics.push(ErrorWarningType::WarningTranscriptNoStartCodon);
        }
        let protein = translate(seq);
        if !protein.ends_with('*') {
            diagnostics.push(ErrorWarningType::WarningTranscriptNoStopCodon);
        }
        if protein.trim_end_matches('*').contains('*') {
            diagnostics.push(ErrorWarningType::WarningTranscriptMultipleStopCodons);
        }
        diagnostics
    }

    ///
    /// Start and stop codon consequences of a codon change.
    ///
    fn additional_effect(&self, codons: &Codons, aa_ref: &str, aa_alt: &str) -> Option<EffectType> {
        let (old, new) = (codons.reference.as_str(), codons.alt.as_str());
        let first_codon = codons.num == 0 && is_start(old);

        if self.variant.is_snp() || self.variant.is_mnp() {
            let tag = match (aa_ref == aa_alt, first_codon) {
                (true, true) if is_start(new) => EffectType::SynonymousStart,
                (true, true) => EffectType::StartLost,
                (true, false) if is_stop(old) && is_stop(new) => EffectType::SynonymousStop,
                (true, false) if is_stop(old) => EffectType::StopLost,
                (true, false) => EffectType::SynonymousCoding,
                (false, true) if is_start(new) => EffectType::NonSynonymousStart,
                (false, true) => EffectType::StartLost,
                (false, false) if is_stop(old) && is_stop(new) => EffectType::NonSynonymousStop,
                (false, false) if is_stop(old) => EffectType::StopLost,
                (false, false) if is_stop(new) => EffectType::StopGained,
                (false, false) => EffectType::NonSynonymousCoding,
            };
            return Some(tag);
        }

        if first_codon && !is_start(new) {
            Some(EffectType::StartLost)
        } else if is_stop(old) && !is_stop(new) {
            Some(EffectType::StopLost)
        } else if !is_stop(old) && is_stop(new) {
            Some(EffectType::StopGained)
        } else {
            None
        }
    }

    fn effect<'e>(
        &self,
        effects: &'e mut VariantEffects,
        feature: FeatureId,
        effect_type: EffectType,
        impact: EffectImpact,
        codons: Option<&Codons>,
        allow_replace: bool,
    ) -> &'e mut VariantEffect {
        let mut effect = VariantEffect::new(self.variant);
        effect.set(Some(self.genome.link(feature)), effect_type, impact, "");
        effect.cdna_pos = self.tr.mrna_position(self.variant.start());

        if let Some(codons) = codons {
            effect.set_codons(&codons.reference, &codons.alt, codons.num, codons.index);
            let extra = if codons.reference.is_empty() {
                None
            } else {
                self.additional_effect(codons, &effect.aa_ref, &effect.aa_alt)
            };
            match extra {
                Some(extra) if extra != effect_type => {
                    if allow_replace && extra < effect_type {
                        effect.set_effect(extra);
                    } else {
                        effect.add_effect(extra);
                    }
                }
                _ => {}
            }
            for diagnostic in self.sequence_diagnostics() {
                effect.add_error_warning(diagnostic);
            }
        }

        effects.add_effect(effect)
    }

    fn simple(&self, effects: &mut VariantEffects, feature: FeatureId, effect_type: EffectType) {
        self.effect(effects, feature, effect_type, effect_type.impact(), None, false);
    }

    fn cds_bounds(&self, region: &Region) -> Option<(u32, u32)> {
        let a = self.tr.cds_base_number(region.start)?;
        let b = self.tr.cds_base_number(region.end)?;
        Some((a.min(b), a.max(b)))
    }

    /// The variant covers the whole transcript.
    pub(crate) fn transcript_structural(&self, effects: &mut VariantEffects) -> bool {
        let tag = match self.variant.variant_type {
            VariantType::Del => EffectType::TranscriptDeleted,
            VariantType::Dup => EffectType::TranscriptDuplication,
            VariantType::Inv => EffectType::TranscriptInversion,
            _ => return false,
        };
        self.simple(effects, self.tr.id(), tag);
        true
    }

    ///
    /// Variants spanning several exons: whole and partial exon tags, plus
    /// the frame consequence on the CDS for deletions and block changes.
    ///
    pub(crate) fn multi_exon(&self, exons: &[FeatureId], effects: &mut VariantEffects) -> bool {
        let region = &self.variant.region;
        let (full, partial): (Vec<FeatureId>, Vec<FeatureId>) = exons
            .iter()
            .partition(|id| region.includes(&self.genome.feature(**id).region));

        let tags = match self.variant.variant_type {
            VariantType::Del => Some((EffectType::ExonDeleted, EffectType::ExonDeletedPartial)),
            VariantType::Dup => Some((EffectType::ExonDuplication, EffectType::ExonDuplicationPartial)),
            VariantType::Inv => Some((EffectType::ExonInversion, EffectType::ExonInversionPartial)),
            _ => None,
        };

        if !self.is_coding() {
            if let Some((full_tag, partial_tag)) = tags {
                let tid = self.tr.id();
                if !full.is_empty() {
                    self.effect(effects, tid, full_tag, EffectImpact::Modifier, None, false);
                }
                if !partial.is_empty() {
                    self.effect(effects, tid, partial_tag, EffectImpact::Modifier, None, false);
                }
            }
            return true;
        }

        match self.variant.variant_type {
            VariantType::Del => {
                for id in &full {
                    self.simple(effects, *id, EffectType::ExonDeleted);
                }
                if partial.is_empty() {
                    return true;
                }
                let deleted: u32 = exons
                    .iter()
                    .filter_map(|id| self.tr.coding_part(self.genome.feature(*id)))
                    .map(|coding| coding.intersect_size(region))
                    .sum();
                self.frame_change(effects, exons, deleted, EffectType::CodonDeletion);
            }
            VariantType::Dup | VariantType::Inv => {
                if let Some((full_tag, partial_tag)) = tags {
                    for id in &full {
                        self.simple(effects, *id, full_tag);
                    }
                    for id in &partial {
                        self.simple(effects, *id, partial_tag);
                    }
                }
            }
            _ => {
                let change = self.variant.length_change().unsigned_abs() as u32;
                self.frame_change(effects, exons, change, EffectType::CodonChange);
            }
        }
        true
    }

    fn frame_change(
        &self,
        effects: &mut VariantEffects,
        exons: &[FeatureId],
        bases: u32,
        in_frame: EffectType,
    ) {
        let Some(first) = exons.first() else {
            return;
        };
        let tag = if bases % CODON_SIZE != 0 {
            EffectType::FrameShift
        } else {
            in_frame
        };

        let first_cds_base = self
            .tr
            .cds_positions()
            .iter()
            .position(|pos| self.variant.region.intersects_pos(*pos));
        let codons = first_cds_base.map(|b| Codons::position(b as u32 / CODON_SIZE, b as u32 % CODON_SIZE));
        self.effect(effects, *first, tag, tag.impact(), codons.as_ref(), false);
    }

    ///
    /// Coding change inside one exon. Returns false when the variant does
    /// not touch a coding base of the exon.
    ///
    pub(crate) fn exon(&self, exon: FeatureId, effects: &mut VariantEffects) -> bool {
        let feature = self.genome.feature(exon);
        let Some(coding) = self
            .tr
            .coding_part(feature)
            .and_then(|c| c.intersect(&self.variant.region))
        else {
            return false;
        };

        match self.variant.variant_type {
            VariantType::Snp | VariantType::Mnp => self.snp_mnp(exon, &coding, effects),
            VariantType::Ins => self.insertion(exon, effects),
            VariantType::Del => self.deletion(exon, &coding, effects),
            VariantType::Mixed => self.mixed(exon, &coding, effects),
            VariantType::Dup => {
                if self.variant.region.includes(&feature.region) {
                    self.simple(effects, exon, EffectType::ExonDuplication);
                    return true;
                }
                let tag = if coding.size() % CODON_SIZE != 0 {
                    EffectType::FrameShift
                } else {
                    EffectType::CodonInsertion
                };
                self.with_position(exon, &coding, tag, effects)
            }
            VariantType::Inv => {
                let tag = if self.variant.region.includes(&feature.region) {
                    EffectType::ExonInversion
                } else {
                    EffectType::ExonInversionPartial
                };
                self.simple(effects, exon, tag);
                true
            }
            VariantType::Interval | VariantType::Bnd => false,
        }
    }

    fn with_position(
        &self,
        exon: FeatureId,
        coding: &Region,
        tag: EffectType,
        effects: &mut VariantEffects,
    ) -> bool {
        let Some((lo, _)) = self.cds_bounds(coding) else {
            return false;
        };
        let codons = Codons::position(lo / CODON_SIZE, lo % CODON_SIZE);
        self.effect(effects, exon, tag, tag.impact(), Some(&codons), false);
        true
    }

    fn snp_mnp(&self, exon: FeatureId, coding: &Region, effects: &mut VariantEffects) -> bool {
        let Some((lo, hi)) = self.cds_bounds(coding) else {
            return false;
        };
        let num = lo / CODON_SIZE;
        let index = lo % CODON_SIZE;

        if self.sequence().is_none() {
            let codons = Codons::position(num, index);
            self.effect(effects, exon, EffectType::CodonChange, EffectType::CodonChange.impact(), Some(&codons), false);
            return true;
        }

        let reference = self.codons_ref(num, hi / CODON_SIZE);
        let mut alt = reference.clone().into_bytes();
        let mut mismatch = false;
        // alleles shorter than the coding span they claim
        let mut out_of_exon = false;

        let ref_bases = self.variant.reference.as_bytes();
        let alt_bases = self.variant.alt.as_bytes();
        for pos in coding.start..=coding.end {
            let offset = (pos - self.variant.start()) as usize;
            let (Some(r), Some(a)) = (ref_bases.get(offset), alt_bases.get(offset)) else {
                out_of_exon = true;
                continue;
            };
            let (r, a) = if self.tr.is_plus() {
                (*r, *a)
            } else {
                (complement(*r), complement(*a))
            };
            let Some(b) = self.tr.cds_base_number(pos) else {
                out_of_exon = true;
                continue;
            };
            let i = (b - num * CODON_SIZE) as usize;
            if let Some(base) = alt.get_mut(i) {
                if *base != r {
                    mismatch = true;
                }
                *base = a;
            }
        }

        let codons = Codons {
            alt: String::from_utf8_lossy(&alt).into_owned(),
            reference,
            num,
            index,
        };
        let tag = if translate(&codons.reference) == translate(&codons.alt) {
            EffectType::SynonymousCoding
        } else {
            EffectType::NonSynonymousCoding
        };

        let effect = self.effect(effects, exon, tag, tag.impact(), Some(&codons), true);
        if mismatch {
            effect.add_error_warning(ErrorWarningType::WarningRefDoesNotMatchGenome);
        }
        if out_of_exon {
            effect.add_error_warning(ErrorWarningType::ErrorOutOfExon);
        }
        true
    }

    fn insertion(&self, exon: FeatureId, effects: &mut VariantEffects) -> bool {
        let Some(base) = self.tr.cds_base_number(self.variant.start()) else {
            return false;
        };
        // on the minus strand the inserted bases follow `base`
        let at = if self.tr.is_plus() { base } else { base + 1 };
        let num = at / CODON_SIZE;
        let index = at % CODON_SIZE;

        let net = if self.tr.is_plus() {
            self.variant.alt.clone()
        } else {
            reverse_complement(&self.variant.alt)
        };

        let reference = self.codons_ref(num, num);
        let alt = if reference.is_empty() {
            String::new()
        } else {
            let split = (index as usize).min(reference.len());
            format!("{}{}{}", &reference[..split], net, &reference[split..])
        };

        let tag = if net.len() % CODON_SIZE as usize != 0 {
            EffectType::FrameShift
        } else if index == 0 || alt.starts_with(&reference) {
            EffectType::CodonInsertion
        } else {
            EffectType::CodonChangePlusCodonInsertion
        };

        let codons = Codons {
            reference,
            alt,
            num,
            index,
        };
        self.effect(effects, exon, tag, tag.impact(), Some(&codons), false);
        true
    }

    fn deletion(&self, exon: FeatureId, coding: &Region, effects: &mut VariantEffects) -> bool {
        if self
            .variant
            .region
            .includes(&self.genome.feature(exon).region)
        {
            self.simple(effects, exon, EffectType::ExonDeleted);
            return true;
        }

        let Some((lo, hi)) = self.cds_bounds(coding) else {
            return false;
        };
        let num = lo / CODON_SIZE;
        let index = lo % CODON_SIZE;
        let deleted = coding.size() as usize;

        let reference = self.codons_ref(num, hi / CODON_SIZE);
        let prefix = (index as usize).min(reference.len());
        let suffix = (index as usize + deleted).min(reference.len());
        let alt = format!("{}{}", &reference[..prefix], &reference[suffix..]);

        let tag = if deleted % CODON_SIZE as usize != 0 {
            EffectType::FrameShift
        } else if index == 0 || alt.is_empty() || reference.starts_with(&alt) {
            EffectType::CodonDeletion
        } else {
            EffectType::CodonChangePlusCodonDeletion
        };

        let alt = if tag == EffectType::FrameShift {
            String::new()
        } else {
            alt
        };
        let codons = Codons {
            reference,
            alt,
            num,
            index,
        };
        self.effect(effects, exon, tag, tag.impact(), Some(&codons), false);
        true
    }

    fn mixed(&self, exon: FeatureId, coding: &Region, effects: &mut VariantEffects) -> bool {
        let change = self.variant.length_change();
        let tag = if change % CODON_SIZE as i64 != 0 {
            EffectType::FrameShift
        } else if change > 0 {
            EffectType::CodonChangePlusCodonInsertion
        } else if change < 0 {
            EffectType::CodonChangePlusCodonDeletion
        } else {
            EffectType::CodonChange
        };
        self.with_position(exon, coding, tag, effects)
    }
}

//! Effects computed by each kind of feature.
//!
//! [`compute_effect`] dispatches on [`FeatureKind`]. Genes descend into
//! their transcripts, transcripts into exons, UTRs and introns, and exons
//! and introns into their splice sites, so only top-level features need to
//! come out of the spatial index.

use varfx_core::models::{Region, Variant, VariantType};

use crate::codon::{complement, is_start};
use crate::codon_change::CodonChange;
use crate::config::PredictorConfig;
use crate::effect_type::{EffectImpact, EffectType};
use crate::errors::ErrorWarningType;
use crate::genome::{Feature, FeatureId, FeatureKind, Genome, SpliceSiteKind, TranscriptView};
use crate::variant_effects::VariantEffects;

///
/// Add the effects of `variant` on feature `id` to `effects`.
///
/// Returns true when the feature produced an annotation. Chromosomes never
/// do: the predictor handles them.
///
pub fn compute_effect(
    genome: &Genome,
    config: &PredictorConfig,
    id: FeatureId,
    variant: &Variant,
    effects: &mut VariantEffects,
) -> bool {
    let ctx = EffectContext {
        genome,
        config,
        variant,
    };
    ctx.compute(id, effects)
}

struct EffectContext<'a> {
    genome: &'a Genome,
    config: &'a PredictorConfig,
    variant: &'a Variant,
}

impl EffectContext<'_> {
    fn region(&self) -> &Region {
        &self.variant.region
    }

    fn compute(&self, id: FeatureId, effects: &mut VariantEffects) -> bool {
        let feature = self.genome.feature(id);
        if !feature.region.intersects(self.region()) {
            return false;
        }

        if self.config.only_regulation
            && !matches!(
                feature.kind,
                FeatureKind::Regulation { .. } | FeatureKind::Motif { .. }
            )
        {
            return false;
        }

        match &feature.kind {
            FeatureKind::Chromosome => false,
            FeatureKind::Gene(_) => self.gene(id, effects),
            FeatureKind::Transcript(_) => self.transcript(id, effects),
            FeatureKind::Exon(_) => self.exon(id, effects),
            FeatureKind::Intron(_) => self.intron(id, effects),
            FeatureKind::Utr5 | FeatureKind::Utr3 => self.utr(id, effects),
            FeatureKind::SpliceSite(_) => self.splice_site(id, effects),
            FeatureKind::Upstream | FeatureKind::Downstream => self.flank(id, effects),
            FeatureKind::Intergenic => {
                effects.add(self.variant, Some(self.genome.link(id)), EffectType::Intergenic, "");
                true
            }
            FeatureKind::Regulation { name, .. } => {
                self.marker(id, EffectType::Regulation, name, effects)
            }
            FeatureKind::Motif { pwm_id, .. } => {
                let tag = if self.variant.is_del() && self.region().includes(&feature.region) {
                    EffectType::MotifDeleted
                } else {
                    EffectType::Motif
                };
                self.marker(id, tag, pwm_id, effects)
            }
            FeatureKind::NextProt {
                name,
                highly_conserved,
            } => self.next_prot(feature, id, name, *highly_conserved, effects),
            FeatureKind::Custom { label, .. } => self.marker(id, EffectType::Custom, label, effects),
        }
    }

    fn gene(&self, id: FeatureId, effects: &mut VariantEffects) -> bool {
        let feature = self.genome.feature(id);
        let Some(data) = feature.gene() else {
            return false;
        };

        if self.variant.is_structural() && self.region().includes(&feature.region) {
            let tag = match self.variant.variant_type {
                VariantType::Del => Some(EffectType::GeneDeleted),
                VariantType::Dup => Some(EffectType::GeneDuplication),
                VariantType::Inv => Some(EffectType::GeneInversion),
                _ => None,
            };
            if let Some(tag) = tag {
                effects.add(self.variant, Some(self.genome.link(id)), tag, "");
            }
        }

        let mut hit = false;
        for tid in &data.transcripts {
            if self.genome.feature(*tid).region.intersects(self.region()) {
                hit = true;
                self.transcript(*tid, effects);
            }
        }

        if !hit {
            effects.add(self.variant, Some(self.genome.link(id)), EffectType::Intragenic, "");
        }
        true
    }

    fn transcript(&self, id: FeatureId, effects: &mut VariantEffects) -> bool {
        let tr = self.genome.transcript(id);
        let region = self.region();
        if !tr.feature().region.intersects(region) {
            return false;
        }

        if self.variant.is_structural() && region.includes(&tr.feature().region) {
            CodonChange::new(self.genome, self.config, id, self.variant).transcript_structural(effects);
            return true;
        }

        let hit_exons: Vec<FeatureId> = tr
            .exons()
            .filter(|(_, exon)| exon.region.intersects(region))
            .map(|(eid, _)| eid)
            .collect();

        let several = self.variant.is_structural() || self.variant.is_mixed() || self.variant.is_mnp();
        if several && hit_exons.len() > 1 {
            CodonChange::new(self.genome, self.config, id, self.variant).multi_exon(&hit_exons, effects);
            return true;
        }

        let mut exon_annotated = false;
        for eid in &hit_exons {
            exon_annotated |= self.exon(*eid, effects);
        }

        let mut included = false;
        for uid in &tr.data().utrs {
            let utr = self.genome.feature(*uid);
            if utr.region.intersects(region) {
                self.utr(*uid, effects);
                included |= utr.region.includes(region);
            }
        }
        if included {
            return true;
        }

        for iid in &tr.data().introns {
            let intron = self.genome.feature(*iid);
            if intron.region.intersects(region) {
                self.intron(*iid, effects);
                included |= intron.region.includes(region);
            }
        }
        if included {
            return true;
        }

        if !exon_annotated {
            effects.add(self.variant, Some(self.genome.link(id)), EffectType::Transcript, "");
        }
        true
    }

    fn exon(&self, id: FeatureId, effects: &mut VariantEffects) -> bool {
        let exon = self.genome.feature(id);
        let (Some(data), Some(tid)) = (exon.exon(), exon.parent) else {
            return false;
        };
        let tr = self.genome.transcript(tid);
        let coding = tr.is_protein_coding() || self.config.treat_all_as_protein_coding;

        let mut annotated = false;
        if !coding || !self.variant.is_variant() {
            effects.add(self.variant, Some(self.genome.link(id)), EffectType::Exon, "");
            annotated = true;
        } else if tr.is_cds(self.region()) {
            CodonChange::new(self.genome, self.config, tid, self.variant).exon(id, effects);
            annotated = true;
        }

        for site in &data.splice_sites {
            self.splice_site(*site, effects);
        }
        annotated
    }

    fn intron(&self, id: FeatureId, effects: &mut VariantEffects) -> bool {
        let intron = self.genome.feature(id);
        if let FeatureKind::Intron(data) = &intron.kind {
            for site in &data.splice_sites {
                self.splice_site(*site, effects);
            }
        }
        effects.add_or_extend(self.variant, self.genome.link(id), EffectType::Intron);
        true
    }

    fn splice_site(&self, id: FeatureId, effects: &mut VariantEffects) -> bool {
        let site = self.genome.feature(id);
        let Some(data) = site.splice_site() else {
            return false;
        };
        if !site.region.intersects(self.region()) {
            return false;
        }
        let tag = match data.kind {
            SpliceSiteKind::Acceptor => EffectType::SpliceSiteAcceptor,
            SpliceSiteKind::Donor => EffectType::SpliceSiteDonor,
            SpliceSiteKind::Region => EffectType::SpliceSiteRegion,
        };
        effects.add_or_extend(self.variant, self.genome.link(id), tag);
        true
    }

    fn utr(&self, id: FeatureId, effects: &mut VariantEffects) -> bool {
        let utr = self.genome.feature(id);
        let Some(tid) = self.genome.link(id).transcript else {
            return false;
        };
        let tr = self.genome.transcript(tid);
        let five_prime = matches!(utr.kind, FeatureKind::Utr5);

        let tag = match (five_prime, self.variant.is_del() && self.region().includes(&utr.region)) {
            (true, true) => EffectType::Utr5Deleted,
            (true, false) => EffectType::Utr5Prime,
            (false, true) => EffectType::Utr3Deleted,
            (false, false) => EffectType::Utr3Prime,
        };

        let distance = utr
            .region
            .intersect(self.region())
            .and_then(|r| utr_distance(&tr, &r, five_prime));
        let effect = effects.add_or_extend(self.variant, self.genome.link(id), tag);
        if effect.distance.is_none() {
            effect.distance = distance;
        }

        if five_prime && self.variant.is_snp() && start_gained(&tr, self.variant) {
            effects.add_or_extend(self.variant, self.genome.link(id), EffectType::StartGained);
        }
        true
    }

    fn flank(&self, id: FeatureId, effects: &mut VariantEffects) -> bool {
        let feature = self.genome.feature(id);
        let Some(tid) = feature.parent else {
            return false;
        };
        let tr = self.genome.transcript(tid);
        let (tag, distance) = match feature.kind {
            FeatureKind::Upstream => (EffectType::Upstream, tr.distance_to_start(self.region())),
            _ => (EffectType::Downstream, tr.distance_to_end(self.region())),
        };
        let effect = effects.add(self.variant, Some(self.genome.link(id)), tag, "");
        effect.distance = Some(distance);
        true
    }

    fn marker(&self, id: FeatureId, tag: EffectType, message: &str, effects: &mut VariantEffects) -> bool {
        effects.add(self.variant, Some(self.genome.link(id)), tag, message);
        self.check_duplicate(id, effects);
        true
    }

    fn check_duplicate(&self, id: FeatureId, effects: &mut VariantEffects) {
        if self.genome.is_duplicate_id(&self.genome.feature(id).id) {
            effects.add_error_warning(self.variant, ErrorWarningType::WarningDuplicateId);
        }
    }

    ///
    /// NextProt annotations look at the effects already computed on their
    /// transcript: a protein change raises the impact, more so on highly
    /// conserved positions.
    ///
    fn next_prot(
        &self,
        feature: &Feature,
        id: FeatureId,
        name: &str,
        highly_conserved: bool,
        effects: &mut VariantEffects,
    ) -> bool {
        let transcript = feature.parent;
        let protein_change = effects.iter().any(|e| {
            transcript.is_some()
                && e.transcript() == transcript
                && (e.has_effect_type(EffectType::NonSynonymousCoding)
                    || (!e.aa_ref.is_empty() && e.aa_ref != e.aa_alt))
        });

        let impact = match (protein_change, highly_conserved) {
            (true, true) => EffectImpact::High,
            (true, false) => EffectImpact::Moderate,
            (false, _) => EffectImpact::Modifier,
        };
        effects.add_with_impact(
            self.variant,
            Some(self.genome.link(id)),
            EffectType::NextProt,
            impact,
            name,
        );
        self.check_duplicate(id, effects);
        true
    }
}

///
/// Spliced distance between a UTR base range and the coding region.
///
fn utr_distance(tr: &TranscriptView<'_>, r: &Region, five_prime: bool) -> Option<u32> {
    let (cds_start, cds_end) = tr.data().cds?;
    let (closest, anchor) = match (five_prime, tr.is_plus()) {
        (true, true) => (r.end, cds_start),
        (true, false) => (r.start, cds_end),
        (false, true) => (r.start, cds_end),
        (false, false) => (r.end, cds_start),
    };
    let closest = tr.mrna_position(closest)?;
    let anchor = tr.mrna_position(anchor)?;
    if five_prime {
        anchor.checked_sub(closest)
    } else {
        closest.checked_sub(anchor)
    }
}

///
/// Does a SNP create a start codon in the 5' UTR? Needs the sequence of
/// every exon carrying 5' UTR bases.
///
fn start_gained(tr: &TranscriptView<'_>, variant: &Variant) -> bool {
    let Some((cds_start, cds_end)) = tr.data().cds else {
        return false;
    };
    let Some(&alt) = variant.alt.as_bytes().first() else {
        return false;
    };

    let mut bases = Vec::new();
    let mut at = None;
    for (_, exon) in tr.exons() {
        let region = &exon.region;
        let utr = if tr.is_plus() {
            (region.start < cds_start).then(|| (region.start, region.end.min(cds_start - 1)))
        } else {
            (region.end > cds_end).then(|| (region.start.max(cds_end + 1), region.end))
        };
        let Some((start, end)) = utr else {
            continue;
        };
        let Some(seq) = exon.exon().and_then(|d| d.sequence.as_deref()) else {
            return false;
        };
        let seq = seq.as_bytes();

        let positions: Box<dyn Iterator<Item = u32>> = if tr.is_plus() {
            Box::new(start..=end)
        } else {
            Box::new((start..=end).rev())
        };
        for pos in positions {
            let Some(&base) = seq.get((pos - region.start) as usize) else {
                return false;
            };
            if pos == variant.start() {
                at = Some(bases.len());
            }
            bases.push(if tr.is_plus() { base } else { complement(base) });
        }
    }

    let Some(at) = at else {
        return false;
    };
    let mut changed = bases.clone();
    changed[at] = if tr.is_plus() { alt } else { complement(alt) };

    (at.saturating_sub(2)..=at)
        .filter(|i| i + 3 <= bases.len())
        .any(|i| {
            let old = String::from_utf8_lossy(&bases[i..i + 3]);
            let new = String::from_utf8_lossy(&changed[i..i + 3]);
            is_start(&new) && !is_start(&old)
        })
}

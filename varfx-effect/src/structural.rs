//! Effects of structural variants spanning several genes, and the gene
//! fusions they create.

use log::debug;
use varfx_core::models::{Region, Variant, VariantType};

use crate::codon::CODON_SIZE;
use crate::effect_type::EffectType;
use crate::genome::{FeatureId, Genome, TranscriptView};
use crate::variant_effect::{EffectDetail, FusionDetail, VariantEffect};

///
/// Summary of a structural variant over the genes it touches.
///
/// Genes are bucketed by breakpoint: "left" genes contain the variant
/// start, "right" genes contain its end (or the partner position of a
/// translocation). Each gene is counted once, either as whole (included in
/// the variant) or partial. Other features at the breakpoints (markers,
/// intergenic, upstream and downstream regions) are kept apart: they only
/// take part in translocation fusions.
///
#[derive(Debug, Clone)]
pub struct StructuralVariantEffect {
    effect: VariantEffect,
    genes_left: Vec<FeatureId>,
    genes_right: Vec<FeatureId>,
    features_left: Vec<FeatureId>,
    features_right: Vec<FeatureId>,
    genes: Vec<FeatureId>,
    count_whole: usize,
    count_partial: usize,
}

impl StructuralVariantEffect {
    ///
    /// Build the summary from the features hit by `variant`.
    ///
    pub fn new(genome: &Genome, variant: &Variant, hits: &[FeatureId]) -> Self {
        let mut hits = hits.to_vec();
        hits.sort();
        hits.dedup();

        let (right_chr, right_pos) = match &variant.breakend {
            Some(breakend) if variant.is_bnd() => (breakend.chr.as_str(), breakend.pos),
            _ => (variant.chr(), variant.end()),
        };
        let is_left = |region: &Region| region.chr == variant.chr() && region.intersects_pos(variant.start());
        let is_right = |region: &Region| region.chr == right_chr && region.intersects_pos(right_pos);

        let mut genes = Vec::new();
        let mut genes_left = Vec::new();
        let mut genes_right = Vec::new();
        let mut features_left = Vec::new();
        let mut features_right = Vec::new();
        let mut count_whole = 0;
        let mut count_partial = 0;
        for id in hits {
            let feature = genome.feature(id);
            let region = &feature.region;
            if feature.is_gene() {
                if is_left(region) {
                    genes_left.push(id);
                }
                if is_right(region) {
                    genes_right.push(id);
                }
                if variant.region.includes(region) {
                    count_whole += 1;
                } else {
                    count_partial += 1;
                }
                genes.push(id);
            } else if !feature.is_chromosome() {
                if is_left(region) {
                    features_left.push(id);
                }
                if is_right(region) {
                    features_right.push(id);
                }
            }
        }

        let tag = match variant.variant_type {
            VariantType::Del if count_whole > 1 => EffectType::GeneDeleted,
            VariantType::Dup if count_whole > 0 => EffectType::GeneDuplication,
            VariantType::Inv if count_whole > 0 => EffectType::GeneInversion,
            VariantType::Bnd if count_partial > 1 => EffectType::GeneFusion,
            _ => EffectType::None,
        };

        let gene = genes_left
            .first()
            .or(genes_right.first())
            .or(genes.first())
            .copied();
        let mut effect = VariantEffect::new(variant);
        effect.set(gene.map(|g| genome.link(g)), tag, tag.impact(), "");

        debug!(
            "Structural {} over {} genes: {} whole, {} partial -> {}",
            variant.variant_type,
            genes.len(),
            count_whole,
            count_partial,
            tag
        );

        StructuralVariantEffect {
            effect,
            genes_left,
            genes_right,
            features_left,
            features_right,
            genes,
            count_whole,
            count_partial,
        }
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect.effect_type()
    }

    pub fn effect(&self) -> &VariantEffect {
        &self.effect
    }

    pub fn genes_left(&self) -> &[FeatureId] {
        &self.genes_left
    }

    pub fn genes_right(&self) -> &[FeatureId] {
        &self.genes_right
    }

    /// Features other than genes and chromosomes at the left breakpoint.
    pub fn features_left(&self) -> &[FeatureId] {
        &self.features_left
    }

    pub fn features_right(&self) -> &[FeatureId] {
        &self.features_right
    }

    /// Every gene touched, sorted by handle.
    pub fn genes(&self) -> &[FeatureId] {
        &self.genes
    }

    pub fn count_whole_genes(&self) -> usize {
        self.count_whole
    }

    pub fn count_partial_genes(&self) -> usize {
        self.count_partial
    }

    ///
    /// One fusion per (left, right) pair of breakpoint features.
    ///
    /// Translocations pair every feature at one breakpoint with every
    /// feature at the other, other variants only pair genes. A feature is
    /// never paired with itself, and pairs whose overlap contains the whole
    /// variant are a change inside both, not a fusion. When any gene-gene
    /// fusion exists,
    /// fusions involving a non-gene feature are dropped. A translocation
    /// whose partner lands on bare DNA gives one half fusion per gene at the
    /// other breakpoint.
    ///
    pub fn fusions(&self, genome: &Genome) -> Vec<GeneFusionEffect> {
        let variant = self.effect.variant();
        let bnd = variant.is_bnd();
        let side = |genes: &[FeatureId], features: &[FeatureId]| -> Vec<FeatureId> {
            let others = if bnd { features } else { &[][..] };
            genes.iter().chain(others).copied().collect()
        };

        let lefts = side(&self.genes_left, &self.features_left);
        let rights = side(&self.genes_right, &self.features_right);

        if bnd && (lefts.is_empty() || rights.is_empty()) {
            let halves = self.genes_left.iter().map(|g| (Some(*g), None::<FeatureId>));
            let halves = halves.chain(self.genes_right.iter().map(|g| (None, Some(*g))));
            return halves
                .map(|(left, right)| GeneFusionEffect::new(genome, variant, left, right))
                .collect();
        }

        let mut fusions = Vec::new();
        for &left in &lefts {
            for &right in &rights {
                if left == right {
                    continue;
                }
                let (l, r) = (genome.feature(left), genome.feature(right));
                if l.region
                    .intersect(&r.region)
                    .is_some_and(|overlap| overlap.includes(&variant.region))
                {
                    continue;
                }
                fusions.push(GeneFusionEffect::new(genome, variant, Some(left), Some(right)));
            }
        }

        if fusions.iter().any(GeneFusionEffect::is_gene_gene) {
            fusions.retain(GeneFusionEffect::is_gene_gene);
        }
        fusions
    }

    pub fn into_effect(self) -> VariantEffect {
        let mut effect = self.effect;
        effect.detail = Some(EffectDetail::Structural {
            genes_left: self.genes_left,
            genes_right: self.genes_right,
            genes: self.genes,
            count_whole: self.count_whole,
            count_partial: self.count_partial,
        });
        effect
    }
}

///
/// Translocation fusion tag, by which partners are genes.
///
fn fusion_tag(gene_left: bool, gene_right: bool) -> EffectType {
    match (gene_left, gene_right) {
        (true, true) => EffectType::GeneFusion,
        (true, false) | (false, true) => EffectType::GeneFusionHalf,
        (false, false) => EffectType::FeatureFusion,
    }
}

///
/// Fusion of two features joined by a structural variant. Gene partners
/// are described through their canonical transcripts. Only translocations
/// have non-gene partners or a missing partner.
///
#[derive(Debug, Clone)]
pub struct GeneFusionEffect {
    effect: VariantEffect,
}

impl GeneFusionEffect {
    pub fn new(
        genome: &Genome,
        variant: &Variant,
        left: Option<FeatureId>,
        right: Option<FeatureId>,
    ) -> Self {
        let gene = |id: Option<FeatureId>| id.filter(|id| genome.feature(*id).is_gene());
        let other = |id: Option<FeatureId>| id.filter(|id| !genome.feature(*id).is_gene());
        let mut detail = FusionDetail {
            gene_left: gene(left),
            gene_right: gene(right),
            feature_left: other(left),
            feature_right: other(right),
            transcript_left: gene(left).and_then(|g| genome.canonical_transcript(g)),
            transcript_right: gene(right).and_then(|g| genome.canonical_transcript(g)),
            ..FusionDetail::default()
        };

        let same_strand = match (detail.gene_left, detail.gene_right) {
            (Some(l), Some(r)) => genome.feature(l).strand == genome.feature(r).strand,
            _ => true,
        };
        let mut effect = VariantEffect::new(variant);

        match (&variant.variant_type, &variant.breakend) {
            (VariantType::Bnd, Some(breakend)) => {
                let tag = match fusion_tag(detail.gene_left.is_some(), detail.gene_right.is_some()) {
                    EffectType::GeneFusion => match (breakend.left, breakend.before) {
                        (false, false) | (true, true) if same_strand => EffectType::GeneFusion,
                        (true, false) | (false, true) if !same_strand => EffectType::GeneFusion,
                        _ => EffectType::GeneFusionReverse,
                    },
                    tag => tag,
                };
                let link = detail
                    .transcript_left
                    .or(detail.transcript_right)
                    .or(left)
                    .or(right);
                effect.set(link.map(|id| genome.link(id)), tag, tag.impact(), "");

                let coding = |id: Option<FeatureId>| {
                    id.map(|id| genome.transcript(id))
                        .filter(|tr| tr.is_protein_coding())
                };
                let (tl, tr) = (coding(detail.transcript_left), coding(detail.transcript_right));
                let sides = FusionSides::new(tl.as_ref(), tr.as_ref(), variant, breakend.left, breakend.before, breakend.pos);
                detail.aa_left = sides.aa_left();
                detail.aa_right = sides.aa_right();
                if tag == EffectType::GeneFusion && sides.in_frame() == Some(false) {
                    effect.add_effect(EffectType::FrameShift);
                }
            }
            (VariantType::Inv, _) => {
                let tag = if same_strand {
                    EffectType::GeneFusionReverse
                } else {
                    EffectType::GeneFusion
                };
                effect.set(left.map(|id| genome.link(id)), tag, tag.impact(), "");
            }
            _ => {
                let tag = if same_strand {
                    EffectType::GeneFusion
                } else {
                    EffectType::GeneFusionReverse
                };
                effect.set(left.map(|id| genome.link(id)), tag, tag.impact(), "");
            }
        }

        effect.detail = Some(EffectDetail::Fusion(detail));
        GeneFusionEffect { effect }
    }

    fn detail(&self) -> Option<&FusionDetail> {
        match &self.effect.detail {
            Some(EffectDetail::Fusion(detail)) => Some(detail),
            _ => None,
        }
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect.effect_type()
    }

    pub fn effect(&self) -> &VariantEffect {
        &self.effect
    }

    /// Both partners are genes.
    pub fn is_gene_gene(&self) -> bool {
        self.gene_left().is_some() && self.gene_right().is_some()
    }

    pub fn gene_left(&self) -> Option<FeatureId> {
        self.detail().and_then(|d| d.gene_left)
    }

    pub fn gene_right(&self) -> Option<FeatureId> {
        self.detail().and_then(|d| d.gene_right)
    }

    pub fn transcript_left(&self) -> Option<FeatureId> {
        self.detail().and_then(|d| d.transcript_left)
    }

    pub fn transcript_right(&self) -> Option<FeatureId> {
        self.detail().and_then(|d| d.transcript_right)
    }

    /// First and last amino acid kept from the left partner.
    pub fn aa_left(&self) -> Option<(u32, u32)> {
        self.detail().and_then(|d| d.aa_left)
    }

    pub fn aa_right(&self) -> Option<(u32, u32)> {
        self.detail().and_then(|d| d.aa_right)
    }

    pub fn into_effect(self) -> VariantEffect {
        self.effect
    }
}

/// CDS coordinates of the coding sides of a translocation breakpoint.
struct FusionSides<'a> {
    left: Option<(&'a TranscriptView<'a>, u32)>,
    right: Option<(&'a TranscriptView<'a>, u32)>,
    bracket_left: bool,
    before: bool,
}

impl<'a> FusionSides<'a> {
    fn new(
        left: Option<&'a TranscriptView<'a>>,
        right: Option<&'a TranscriptView<'a>>,
        variant: &Variant,
        bracket_left: bool,
        before: bool,
        partner_pos: u32,
    ) -> Self {
        // inside an intron, take the exonic base before it on the left side
        let prev_left = left.is_some_and(|tl| tl.is_plus() != before);
        FusionSides {
            left: left.map(|tl| (tl, nearest_cds_base(tl, variant.start(), prev_left))),
            right: right.map(|tr| (tr, nearest_cds_base(tr, partner_pos, !prev_left))),
            bracket_left,
            before,
        }
    }

    fn aa_left(&self) -> Option<(u32, u32)> {
        self.left
            .map(|(tl, base)| aa_range(tl, base, tl.is_plus() != self.before))
    }

    fn aa_right(&self) -> Option<(u32, u32)> {
        self.right
            .map(|(tr, base)| aa_range(tr, base, tr.is_plus() == self.bracket_left))
    }

    /// Does the base after the junction continue the reading frame?
    fn in_frame(&self) -> Option<bool> {
        let ((tl, base_left), (_, base_right)) = self.left.zip(self.right)?;
        let frame_left = base_left % CODON_SIZE;
        let frame_right = base_right % CODON_SIZE;
        Some(if self.before != tl.is_plus() {
            (frame_left + 1) % CODON_SIZE == frame_right
        } else {
            (frame_right + 1) % CODON_SIZE == frame_left
        })
    }
}

fn aa_range(tr: &TranscriptView<'_>, base: u32, keeps_start: bool) -> (u32, u32) {
    let codon = base / CODON_SIZE;
    if keeps_start {
        (0, codon)
    } else {
        (codon, tr.protein_length().saturating_sub(1))
    }
}

///
/// CDS base number of `pos`, or of the closest coding base before
/// (`prev`) or after it in transcript order when `pos` is not coding.
///
fn nearest_cds_base(tr: &TranscriptView<'_>, pos: u32, prev: bool) -> u32 {
    if let Some(base) = tr.cds_base_number(pos) {
        return base;
    }
    let positions = tr.cds_positions();
    let upstream = |p: u32| if tr.is_plus() { p < pos } else { p > pos };
    let found = if prev {
        positions.iter().rposition(|p| upstream(*p))
    } else {
        positions.iter().position(|p| !upstream(*p))
    };
    match found {
        Some(i) => i as u32,
        None if prev => 0,
        None => positions.len().saturating_sub(1) as u32,
    }
}

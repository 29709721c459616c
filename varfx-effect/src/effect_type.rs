//! Severity-ordered effect taxonomy.
//!
//! Variants of [`EffectType`] are declared from most to least severe, so the
//! derived `Ord` is the severity rank: `a < b` means `a` is more severe.
//! [`EffectImpact`] follows the same convention.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EffectParseError;

/// Putative impact of an effect, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectImpact {
    High,
    Moderate,
    Low,
    Modifier,
}

impl Display for EffectImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectImpact::High => "HIGH",
            EffectImpact::Moderate => "MODERATE",
            EffectImpact::Low => "LOW",
            EffectImpact::Modifier => "MODIFIER",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectType {
    // high impact
    ChromosomeLargeDeletion,
    ChromosomeLargeInversion,
    ChromosomeLargeDuplication,
    GeneRearrangement,
    GeneDeleted,
    TranscriptDeleted,
    ExonDeleted,
    ExonDeletedPartial,
    GeneFusion,
    GeneFusionReverse,
    GeneFusionHalf,
    FrameShift,
    StopGained,
    StopLost,
    StartLost,
    SpliceSiteAcceptor,
    SpliceSiteDonor,
    RareAminoAcid,
    ExonDuplication,
    ExonDuplicationPartial,
    ExonInversion,
    ExonInversionPartial,
    ProteinProteinInteractionLocus,
    ProteinStructuralInteractionLocus,

    // moderate impact
    NonSynonymousCoding,
    NonSynonymousStop,
    NonSynonymousStart,
    GeneDuplication,
    TranscriptDuplication,
    Utr5Deleted,
    Utr3Deleted,
    SpliceSiteBranchU12,
    SpliceSiteRegion,
    SpliceSiteBranch,
    SynonymousCoding,
    SynonymousStart,
    SynonymousStop,
    GeneInversion,
    TranscriptInversion,
    CodonChange,
    CodonInsertion,
    CodonChangePlusCodonInsertion,
    CodonDeletion,
    CodonChangePlusCodonDeletion,

    // low impact
    Utr5Prime,
    Utr3Prime,
    StartGained,
    Motif,
    MotifDeleted,
    Regulation,
    MicroRna,
    FeatureFusion,
    Upstream,
    Downstream,

    // modifiers
    NextProt,
    IntronConserved,
    Intron,
    Intragenic,
    IntergenicConserved,
    Intergenic,
    Cds,
    Exon,
    Transcript,
    Gene,
    Sequence,
    ChromosomeElongation,
    Custom,
    Chromosome,
    Genome,
    None,
}

impl EffectType {
    /// Every tag, most severe first.
    pub const ALL: [EffectType; 70] = [
        EffectType::ChromosomeLargeDeletion,
        EffectType::ChromosomeLargeInversion,
        EffectType::ChromosomeLargeDuplication,
        EffectType::GeneRearrangement,
        EffectType::GeneDeleted,
        EffectType::TranscriptDeleted,
        EffectType::ExonDeleted,
        EffectType::ExonDeletedPartial,
        EffectType::GeneFusion,
        EffectType::GeneFusionReverse,
        EffectType::GeneFusionHalf,
        EffectType::FrameShift,
        EffectType::StopGained,
        EffectType::StopLost,
        EffectType::StartLost,
        EffectType::SpliceSiteAcceptor,
        EffectType::SpliceSiteDonor,
        EffectType::RareAminoAcid,
        EffectType::ExonDuplication,
        EffectType::ExonDuplicationPartial,
        EffectType::ExonInversion,
        EffectType::ExonInversionPartial,
        EffectType::ProteinProteinInteractionLocus,
        EffectType::ProteinStructuralInteractionLocus,
        EffectType::NonSynonymousCoding,
        EffectType::NonSynonymousStop,
        EffectType::NonSynonymousStart,
        EffectType::GeneDuplication,
        EffectType::TranscriptDuplication,
        EffectType::Utr5Deleted,
        EffectType::Utr3Deleted,
        EffectType::SpliceSiteBranchU12,
        EffectType::SpliceSiteRegion,
        EffectType::SpliceSiteBranch,
        EffectType::SynonymousCoding,
        EffectType::SynonymousStart,
        EffectType::SynonymousStop,
        EffectType::GeneInversion,
        EffectType::TranscriptInversion,
        EffectType::CodonChange,
        EffectType::CodonInsertion,
        EffectType::CodonChangePlusCodonInsertion,
        EffectType::CodonDeletion,
        EffectType::CodonChangePlusCodonDeletion,
        EffectType::Utr5Prime,
        EffectType::Utr3Prime,
        EffectType::StartGained,
        EffectType::Motif,
        EffectType::MotifDeleted,
        EffectType::Regulation,
        EffectType::MicroRna,
        EffectType::FeatureFusion,
        EffectType::Upstream,
        EffectType::Downstream,
        EffectType::NextProt,
        EffectType::IntronConserved,
        EffectType::Intron,
        EffectType::Intragenic,
        EffectType::IntergenicConserved,
        EffectType::Intergenic,
        EffectType::Cds,
        EffectType::Exon,
        EffectType::Transcript,
        EffectType::Gene,
        EffectType::Sequence,
        EffectType::ChromosomeElongation,
        EffectType::Custom,
        EffectType::Chromosome,
        EffectType::Genome,
        EffectType::None,
    ];

    ///
    /// Default impact of this tag.
    ///
    pub fn impact(&self) -> EffectImpact {
        use EffectType::*;
        match self {
            ChromosomeLargeDeletion
            | ExonDeleted
            | ExonDeletedPartial
            | ExonDuplication
            | ExonDuplicationPartial
            | ExonInversion
            | ExonInversionPartial
            | FrameShift
            | GeneDeleted
            | GeneFusion
            | GeneFusionReverse
            | GeneFusionHalf
            | GeneRearrangement
            | ProteinProteinInteractionLocus
            | ProteinStructuralInteractionLocus
            | RareAminoAcid
            | SpliceSiteAcceptor
            | SpliceSiteDonor
            | StartLost
            | StopGained
            | StopLost
            | TranscriptDeleted => EffectImpact::High,

            ChromosomeLargeInversion
            | CodonChangePlusCodonDeletion
            | CodonChangePlusCodonInsertion
            | CodonDeletion
            | CodonInsertion
            | GeneDuplication
            | GeneInversion
            | NonSynonymousCoding
            | SpliceSiteBranchU12
            | TranscriptDuplication
            | TranscriptInversion
            | Utr3Deleted
            | Utr5Deleted => EffectImpact::Moderate,

            ChromosomeLargeDuplication
            | CodonChange
            | FeatureFusion
            | NonSynonymousStart
            | NonSynonymousStop
            | SpliceSiteRegion
            | SpliceSiteBranch
            | StartGained
            | SynonymousCoding
            | SynonymousStart
            | SynonymousStop
            | Motif
            | MotifDeleted => EffectImpact::Low,

            Cds | Chromosome | ChromosomeElongation | Custom | Downstream | Exon | Gene
            | Genome | Intragenic | Intergenic | IntergenicConserved | Intron
            | IntronConserved | MicroRna | None | Regulation | Sequence | Transcript
            | Upstream | Utr3Prime | Utr5Prime | NextProt => EffectImpact::Modifier,
        }
    }

    pub fn is_fusion(&self) -> bool {
        matches!(
            self,
            EffectType::GeneFusion
                | EffectType::GeneFusionReverse
                | EffectType::GeneFusionHalf
                | EffectType::FeatureFusion
        )
    }

    ///
    /// Coarse genomic region the tag belongs to (e.g. every coding tag maps
    /// to `Exon`). Used for summary counts.
    ///
    pub fn gene_region(&self) -> EffectType {
        use EffectType::*;
        match self {
            None | Chromosome | ChromosomeLargeDeletion | ChromosomeLargeDuplication
            | ChromosomeLargeInversion | ChromosomeElongation | Custom | Sequence => Chromosome,
            Intergenic | IntergenicConserved | FeatureFusion => Intergenic,
            Upstream => Upstream,
            Utr5Prime | Utr5Deleted | StartGained => Utr5Prime,
            SpliceSiteAcceptor => SpliceSiteAcceptor,
            SpliceSiteBranchU12 | SpliceSiteBranch => SpliceSiteBranch,
            SpliceSiteDonor => SpliceSiteDonor,
            SpliceSiteRegion => SpliceSiteRegion,
            TranscriptDeleted | TranscriptDuplication | TranscriptInversion | Intragenic
            | NextProt | Transcript | Cds => Transcript,
            Gene | GeneDeleted | GeneDuplication | GeneFusion | GeneFusionHalf
            | GeneFusionReverse | GeneInversion | GeneRearrangement => Gene,
            Exon | ExonDeleted | ExonDeletedPartial | ExonDuplication | ExonDuplicationPartial
            | ExonInversion | ExonInversionPartial | NonSynonymousStart | NonSynonymousCoding
            | SynonymousCoding | SynonymousStart | FrameShift | CodonChange | CodonInsertion
            | CodonChangePlusCodonInsertion | CodonDeletion | CodonChangePlusCodonDeletion
            | StartLost | StopGained | SynonymousStop | NonSynonymousStop | StopLost
            | RareAminoAcid | ProteinProteinInteractionLocus
            | ProteinStructuralInteractionLocus => Exon,
            Intron | IntronConserved => Intron,
            Utr3Prime | Utr3Deleted => Utr3Prime,
            Downstream => Downstream,
            Regulation => Regulation,
            Motif | MotifDeleted => Motif,
            MicroRna => MicroRna,
            Genome => Genome,
        }
    }

    ///
    /// Sequence Ontology term. `is_variant` distinguishes exon hits of real
    /// variants from plain intervals. Multi-term values use `&`.
    ///
    pub fn so_term(&self, is_variant: bool) -> &'static str {
        use EffectType::*;
        match self {
            Cds | CodonChange => "coding_sequence_variant",
            ChromosomeLargeDeletion => "chromosome_number_variation",
            ChromosomeLargeDuplication
            | ExonDuplication
            | ExonDuplicationPartial
            | GeneDuplication
            | TranscriptDuplication => "duplication",
            ChromosomeLargeInversion
            | ExonInversion
            | ExonInversionPartial
            | GeneInversion
            | TranscriptInversion => "inversion",
            Chromosome => "chromosome",
            ChromosomeElongation => "feature_elongation",
            CodonChangePlusCodonInsertion => "disruptive_inframe_insertion",
            CodonChangePlusCodonDeletion => "disruptive_inframe_deletion",
            CodonDeletion => "conservative_inframe_deletion",
            CodonInsertion => "conservative_inframe_insertion",
            Downstream => "downstream_gene_variant",
            Exon if !is_variant => "exon_region",
            Exon => "non_coding_transcript_exon_variant",
            ExonDeleted | ExonDeletedPartial => "exon_loss_variant",
            FeatureFusion => "feature_fusion",
            FrameShift => "frameshift_variant",
            Gene => "gene_variant",
            GeneDeleted => "feature_ablation",
            GeneFusion | GeneFusionHalf => "gene_fusion",
            GeneFusionReverse => "bidirectional_gene_fusion",
            GeneRearrangement => "rearranged_at_DNA_level",
            Intergenic => "intergenic_region",
            IntergenicConserved => "conserved_intergenic_variant",
            Intron => "intron_variant",
            IntronConserved => "conserved_intron_variant",
            Intragenic => "intragenic_variant",
            MicroRna => "miRNA",
            Motif => "TF_binding_site_variant",
            MotifDeleted => "TFBS_ablation",
            NextProt => "sequence_feature",
            NonSynonymousCoding => "missense_variant",
            NonSynonymousStart => "initiator_codon_variant",
            NonSynonymousStop | SynonymousStop => "stop_retained_variant",
            ProteinProteinInteractionLocus => "protein_protein_contact",
            ProteinStructuralInteractionLocus => "structural_interaction_variant",
            RareAminoAcid => "rare_amino_acid_variant",
            Regulation => "regulatory_region_variant",
            SpliceSiteAcceptor => "splice_acceptor_variant",
            SpliceSiteDonor => "splice_donor_variant",
            SpliceSiteRegion => "splice_region_variant",
            SpliceSiteBranch | SpliceSiteBranchU12 => "splice_branch_variant",
            StartLost => "start_lost",
            StartGained => "5_prime_UTR_premature_start_codon_gain_variant",
            StopGained => "stop_gained",
            StopLost => "stop_lost",
            SynonymousCoding => "synonymous_variant",
            SynonymousStart => "initiator_codon_variant&non_canonical_start_codon",
            Transcript => "non_coding_transcript_variant",
            TranscriptDeleted => "transcript_ablation",
            Upstream => "upstream_gene_variant",
            Utr3Prime => "3_prime_UTR_variant",
            Utr3Deleted => "3_prime_UTR_truncation&exon_loss_variant",
            Utr5Prime => "5_prime_UTR_variant",
            Utr5Deleted => "5_prime_UTR_truncation&exon_loss_variant",
            Custom => "custom",
            None | Genome | Sequence => "",
        }
    }

    /// Upper snake case name, e.g. `SPLICE_SITE_DONOR`.
    pub fn name(&self) -> &'static str {
        use EffectType::*;
        match self {
            ChromosomeLargeDeletion => "CHROMOSOME_LARGE_DELETION",
            ChromosomeLargeInversion => "CHROMOSOME_LARGE_INVERSION",
            ChromosomeLargeDuplication => "CHROMOSOME_LARGE_DUPLICATION",
            GeneRearrangement => "GENE_REARRANGEMENT",
            GeneDeleted => "GENE_DELETED",
            TranscriptDeleted => "TRANSCRIPT_DELETED",
            ExonDeleted => "EXON_DELETED",
            ExonDeletedPartial => "EXON_DELETED_PARTIAL",
            GeneFusion => "GENE_FUSION",
            GeneFusionReverse => "GENE_FUSION_REVERSE",
            GeneFusionHalf => "GENE_FUSION_HALF",
            FrameShift => "FRAME_SHIFT",
            StopGained => "STOP_GAINED",
            StopLost => "STOP_LOST",
            StartLost => "START_LOST",
            SpliceSiteAcceptor => "SPLICE_SITE_ACCEPTOR",
            SpliceSiteDonor => "SPLICE_SITE_DONOR",
            RareAminoAcid => "RARE_AMINO_ACID",
            ExonDuplication => "EXON_DUPLICATION",
            ExonDuplicationPartial => "EXON_DUPLICATION_PARTIAL",
            ExonInversion => "EXON_INVERSION",
            ExonInversionPartial => "EXON_INVERSION_PARTIAL",
            ProteinProteinInteractionLocus => "PROTEIN_PROTEIN_INTERACTION_LOCUS",
            ProteinStructuralInteractionLocus => "PROTEIN_STRUCTURAL_INTERACTION_LOCUS",
            NonSynonymousCoding => "NON_SYNONYMOUS_CODING",
            NonSynonymousStop => "NON_SYNONYMOUS_STOP",
            NonSynonymousStart => "NON_SYNONYMOUS_START",
            GeneDuplication => "GENE_DUPLICATION",
            TranscriptDuplication => "TRANSCRIPT_DUPLICATION",
            Utr5Deleted => "UTR_5_DELETED",
            Utr3Deleted => "UTR_3_DELETED",
            SpliceSiteBranchU12 => "SPLICE_SITE_BRANCH_U12",
            SpliceSiteRegion => "SPLICE_SITE_REGION",
            SpliceSiteBranch => "SPLICE_SITE_BRANCH",
            SynonymousCoding => "SYNONYMOUS_CODING",
            SynonymousStart => "SYNONYMOUS_START",
            SynonymousStop => "SYNONYMOUS_STOP",
            GeneInversion => "GENE_INVERSION",
            TranscriptInversion => "TRANSCRIPT_INVERSION",
            CodonChange => "CODON_CHANGE",
            CodonInsertion => "CODON_INSERTION",
            CodonChangePlusCodonInsertion => "CODON_CHANGE_PLUS_CODON_INSERTION",
            CodonDeletion => "CODON_DELETION",
            CodonChangePlusCodonDeletion => "CODON_CHANGE_PLUS_CODON_DELETION",
            Utr5Prime => "UTR_5_PRIME",
            Utr3Prime => "UTR_3_PRIME",
            StartGained => "START_GAINED",
            Motif => "MOTIF",
            MotifDeleted => "MOTIF_DELETED",
            Regulation => "REGULATION",
            MicroRna => "MICRO_RNA",
            FeatureFusion => "FEATURE_FUSION",
            Upstream => "UPSTREAM",
            Downstream => "DOWNSTREAM",
            NextProt => "NEXT_PROT",
            IntronConserved => "INTRON_CONSERVED",
            Intron => "INTRON",
            Intragenic => "INTRAGENIC",
            IntergenicConserved => "INTERGENIC_CONSERVED",
            Intergenic => "INTERGENIC",
            Cds => "CDS",
            Exon => "EXON",
            Transcript => "TRANSCRIPT",
            Gene => "GENE",
            Sequence => "SEQUENCE",
            ChromosomeElongation => "CHROMOSOME_ELONGATION",
            Custom => "CUSTOM",
            Chromosome => "CHROMOSOME",
            Genome => "GENOME",
            None => "NONE",
        }
    }
}

impl Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EffectType {
    type Err = EffectParseError;

    /// Accepts either the tag name (`INTRON`) or a Sequence Ontology term
    /// (`intron_variant`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectType::ALL
            .iter()
            .find(|t| t.name() == s)
            .or_else(|| {
                EffectType::ALL
                    .iter()
                    .find(|t| !s.is_empty() && (t.so_term(true) == s || t.so_term(false) == s))
            })
            .copied()
            .ok_or_else(|| EffectParseError::UnknownEffectType(s.to_string()))
    }
}

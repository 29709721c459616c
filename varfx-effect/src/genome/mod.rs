//! Genome feature graph.
//!
//! Features live in one arena owned by [`Genome`] and refer to their parent
//! through a [`FeatureId`]. The graph is assembled by a [`GenomeBuilder`]
//! and is read-only afterwards, so a built genome can be shared freely
//! between threads.

pub mod builder;
pub mod transcript;

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display};

use varfx_core::models::{Region, Strand};

use crate::index::FeatureIndex;

pub use self::builder::{ExonSpec, GeneSpec, GenomeBuilder, MarkerSpec, TranscriptSpec};
pub use self::transcript::TranscriptView;

/// Handle of a feature inside its [`Genome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub(crate) u32);

impl FeatureId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpliceSiteKind {
    Acceptor,
    Donor,
    Region,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneData {
    pub name: String,
    pub biotype: Option<String>,
    pub protein_coding: bool,
    pub transcripts: Vec<FeatureId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptData {
    pub biotype: Option<String>,
    pub protein_coding: bool,
    /// Transcript support level, lower is better supported.
    pub support_level: Option<u8>,
    pub canonical: bool,
    /// Genomic bounds of the coding region, start codon to stop codon.
    pub cds: Option<(u32, u32)>,
    /// Sorted 5' to 3' on the transcript strand.
    pub exons: Vec<FeatureId>,
    /// Sorted 5' to 3' on the transcript strand.
    pub introns: Vec<FeatureId>,
    pub utrs: Vec<FeatureId>,
    pub upstream: Option<FeatureId>,
    pub downstream: Option<FeatureId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExonData {
    pub rank: u32,
    /// Positive strand sequence of the exon, when known.
    pub sequence: Option<String>,
    pub splice_sites: Vec<FeatureId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntronData {
    pub rank: u32,
    pub splice_sites: Vec<FeatureId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpliceSiteData {
    pub kind: SpliceSiteKind,
    /// Conserved dinucleotide next to the exon, only for acceptors and donors.
    pub core: Option<Region>,
}

///
/// Closed set of feature kinds. Effect computation dispatches on this
/// enum (see [`crate::feature_effect`]).
///
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Chromosome,
    Gene(GeneData),
    Transcript(TranscriptData),
    Exon(ExonData),
    Intron(IntronData),
    Utr5,
    Utr3,
    SpliceSite(SpliceSiteData),
    Upstream,
    Downstream,
    Intergenic,
    Regulation { name: String, cell_type: Option<String> },
    Motif { pwm_id: String, pwm_name: String },
    NextProt { name: String, highly_conserved: bool },
    Custom { label: String, score: Option<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub region: Region,
    pub strand: Strand,
    pub parent: Option<FeatureId>,
    pub kind: FeatureKind,
}

impl Feature {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FeatureKind::Chromosome => "chromosome",
            FeatureKind::Gene(_) => "gene",
            FeatureKind::Transcript(_) => "transcript",
            FeatureKind::Exon(_) => "exon",
            FeatureKind::Intron(_) => "intron",
            FeatureKind::Utr5 => "utr5",
            FeatureKind::Utr3 => "utr3",
            FeatureKind::SpliceSite(_) => "splice_site",
            FeatureKind::Upstream => "upstream",
            FeatureKind::Downstream => "downstream",
            FeatureKind::Intergenic => "intergenic",
            FeatureKind::Regulation { .. } => "regulation",
            FeatureKind::Motif { .. } => "motif",
            FeatureKind::NextProt { .. } => "next_prot",
            FeatureKind::Custom { .. } => "custom",
        }
    }

    ///
    /// Deferred features need the effects of every other feature before
    /// they can classify a variant.
    ///
    pub fn is_deferred(&self) -> bool {
        matches!(self.kind, FeatureKind::NextProt { .. })
    }

    pub fn is_gene(&self) -> bool {
        matches!(self.kind, FeatureKind::Gene(_))
    }

    pub fn is_chromosome(&self) -> bool {
        matches!(self.kind, FeatureKind::Chromosome)
    }

    pub fn gene(&self) -> Option<&GeneData> {
        match &self.kind {
            FeatureKind::Gene(data) => Some(data),
            _ => None,
        }
    }

    pub fn transcript(&self) -> Option<&TranscriptData> {
        match &self.kind {
            FeatureKind::Transcript(data) => Some(data),
            _ => None,
        }
    }

    pub fn exon(&self) -> Option<&ExonData> {
        match &self.kind {
            FeatureKind::Exon(data) => Some(data),
            _ => None,
        }
    }

    pub fn splice_site(&self) -> Option<&SpliceSiteData> {
        match &self.kind {
            FeatureKind::SpliceSite(data) => Some(data),
            _ => None,
        }
    }
}

///
/// A feature together with its enclosing transcript and gene, resolved
/// once through the parent chain.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureLink {
    pub feature: FeatureId,
    pub transcript: Option<FeatureId>,
    pub gene: Option<FeatureId>,
}

#[derive(Debug)]
pub struct Genome {
    pub(crate) name: String,
    pub(crate) features: Vec<Feature>,
    pub(crate) chromosome_lengths: HashMap<String, u32>,
    /// Chromosome features, only for chromosomes with a non-zero length.
    pub(crate) chromosomes: HashMap<String, FeatureId>,
    /// Genes per chromosome, sorted by start.
    pub(crate) genes: HashMap<String, Vec<FeatureId>>,
    pub(crate) ids: HashMap<String, FeatureId>,
    pub(crate) duplicate_ids: HashSet<String>,
    pub(crate) index: FeatureIndex,
}

impl Genome {
    pub fn name(&self) -> &str {
        &self.name
    }

    ///
    /// Get a feature by handle.
    ///
    /// # Panics
    /// When the handle does not belong to this genome.
    ///
    pub fn feature(&self, id: FeatureId) -> &Feature {
        &self.features[id.index()]
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &Feature)> {
        self.features
            .iter()
            .enumerate()
            .map(|(i, f)| (FeatureId(i as u32), f))
    }

    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    pub fn chromosome_id(&self, name: &str) -> Option<FeatureId> {
        self.chromosomes.get(name).copied()
    }

    pub fn chromosome_length(&self, name: &str) -> Option<u32> {
        self.chromosome_lengths.get(name).copied()
    }

    /// Genes on a chromosome, sorted by start.
    pub fn genes(&self, chr: &str) -> &[FeatureId] {
        self.genes.get(chr).map_or(&[], |g| g.as_slice())
    }

    /// Look up a gene, transcript or marker by identifier.
    pub fn find_by_id(&self, id: &str) -> Option<FeatureId> {
        self.ids.get(id).copied()
    }

    /// Was this identifier used by more than one feature?
    pub fn is_duplicate_id(&self, id: &str) -> bool {
        self.duplicate_ids.contains(id)
    }

    ///
    /// Walk up the parent chain and return the first ancestor (or the
    /// feature itself) matching `pred`.
    ///
    pub fn find_ancestor(
        &self,
        id: FeatureId,
        pred: impl Fn(&Feature) -> bool,
    ) -> Option<FeatureId> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let feature = self.feature(cur);
            if pred(feature) {
                return Some(cur);
            }
            current = feature.parent;
        }
        None
    }

    pub fn link(&self, id: FeatureId) -> FeatureLink {
        FeatureLink {
            feature: id,
            transcript: self.find_ancestor(id, |f| f.transcript().is_some()),
            gene: self.find_ancestor(id, |f| f.is_gene()),
        }
    }

    ///
    /// View a transcript feature with its coordinate arithmetic.
    ///
    /// # Panics
    /// When `id` is not a transcript.
    ///
    pub fn transcript(&self, id: FeatureId) -> TranscriptView<'_> {
        TranscriptView::new(self, id)
    }

    /// Canonical transcript of a gene, if the gene has transcripts.
    pub fn canonical_transcript(&self, gene: FeatureId) -> Option<FeatureId> {
        self.feature(gene).gene().and_then(|g| {
            g.transcripts
                .iter()
                .copied()
                .find(|t| self.feature(*t).transcript().is_some_and(|d| d.canonical))
        })
    }

    pub fn is_protein_coding_gene(&self, gene: FeatureId) -> bool {
        self.feature(gene).gene().is_some_and(|g| g.protein_coding)
    }
}

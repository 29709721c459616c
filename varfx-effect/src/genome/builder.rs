use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use varfx_core::models::{Region, Strand};

use crate::config::PredictorConfig;
use crate::errors::{GenomeError, GenomeResult};
use crate::genome::{
    ExonData, Feature, FeatureId, FeatureKind, GeneData, Genome, IntronData, SpliceSiteData,
    SpliceSiteKind, TranscriptData,
};
use crate::index::FeatureIndex;

/// Bases of the conserved splice dinucleotide.
pub const CORE_SPLICE_SITE_SIZE: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneSpec {
    pub id: String,
    pub name: String,
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    pub biotype: Option<String>,
}

impl GeneSpec {
    pub fn new(id: &str, chr: &str, start: u32, end: u32, strand: Strand) -> Self {
        GeneSpec {
            id: id.to_string(),
            name: id.to_string(),
            chr: chr.to_string(),
            start,
            end,
            strand,
            biotype: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_biotype(mut self, biotype: &str) -> Self {
        self.biotype = Some(biotype.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExonSpec {
    pub start: u32,
    pub end: u32,
    /// Positive strand sequence, `end - start + 1` bases long.
    pub sequence: Option<String>,
}

///
/// A transcript with its exons. The transcript range is the span of its
/// exons and its strand is the gene's strand.
///
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSpec {
    pub id: String,
    pub gene_id: String,
    pub biotype: Option<String>,
    pub protein_coding: Option<bool>,
    pub support_level: Option<u8>,
    pub cds: Option<(u32, u32)>,
    pub exons: Vec<ExonSpec>,
}

impl TranscriptSpec {
    pub fn new(id: &str, gene_id: &str) -> Self {
        TranscriptSpec {
            id: id.to_string(),
            gene_id: gene_id.to_string(),
            biotype: None,
            protein_coding: None,
            support_level: None,
            cds: None,
            exons: Vec::new(),
        }
    }

    pub fn with_exon(mut self, start: u32, end: u32) -> Self {
        self.exons.push(ExonSpec {
            start,
            end,
            sequence: None,
        });
        self
    }

    pub fn with_exon_sequence(mut self, start: u32, end: u32, sequence: &str) -> Self {
        self.exons.push(ExonSpec {
            start,
            end,
            sequence: Some(sequence.to_ascii_uppercase()),
        });
        self
    }

    /// Genomic bounds of the coding region (start and stop codons included).
    pub fn with_cds(mut self, start: u32, end: u32) -> Self {
        self.cds = Some((start, end));
        self
    }

    pub fn with_biotype(mut self, biotype: &str) -> Self {
        self.biotype = Some(biotype.to_string());
        self
    }

    pub fn with_support_level(mut self, level: u8) -> Self {
        self.support_level = Some(level);
        self
    }

    pub fn with_protein_coding(mut self, protein_coding: bool) -> Self {
        self.protein_coding = Some(protein_coding);
        self
    }

    fn is_protein_coding(&self) -> bool {
        match (self.protein_coding, self.biotype.as_deref()) {
            (Some(pc), _) => pc,
            (None, Some(biotype)) => biotype == "protein_coding",
            (None, None) => self.cds.is_some(),
        }
    }

    fn span(&self) -> Option<(u32, u32)> {
        let start = self.exons.iter().map(|e| e.start).min()?;
        let end = self.exons.iter().map(|e| e.end).max()?;
        Some((start, end))
    }

    fn cds_length(&self) -> u32 {
        let Some((cs, ce)) = self.cds else {
            return 0;
        };
        self.exons
            .iter()
            .filter(|e| e.start <= ce && cs <= e.end)
            .map(|e| e.end.min(ce) - e.start.max(cs) + 1)
            .sum()
    }

    fn mrna_length(&self) -> u32 {
        self.exons.iter().map(|e| e.end - e.start + 1).sum()
    }
}

/// A simple marker (regulatory region, motif, custom interval...).
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: String,
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
}

impl MarkerSpec {
    pub fn new(id: &str, chr: &str, start: u32, end: u32) -> Self {
        MarkerSpec {
            id: id.to_string(),
            chr: chr.to_string(),
            start,
            end,
            strand: Strand::Plus,
        }
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum MarkerKind {
    Regulation {
        name: String,
        cell_type: Option<String>,
    },
    Motif {
        pwm_id: String,
        pwm_name: String,
    },
    NextProt {
        transcript_id: String,
        name: String,
        highly_conserved: bool,
    },
    Custom {
        label: String,
        score: Option<f64>,
    },
}

///
/// Collects chromosomes, genes, transcripts and markers, then derives the
/// rest of the feature graph in [`GenomeBuilder::build`].
///
/// Transcript filters only exist here, before the genome is built.
///
#[derive(Debug, Default)]
pub struct GenomeBuilder {
    name: String,
    chromosomes: Vec<(String, u32)>,
    genes: Vec<GeneSpec>,
    transcripts: Vec<TranscriptSpec>,
    markers: Vec<(MarkerSpec, MarkerKind)>,
    ids: HashSet<String>,
}

impl GenomeBuilder {
    pub fn new(name: &str) -> Self {
        GenomeBuilder {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_chromosome(&mut self, name: &str, length: u32) -> GenomeResult<&mut Self> {
        if self.chromosomes.iter().any(|(chr, _)| chr == name) {
            return Err(GenomeError::DuplicateChromosome(name.to_string()));
        }
        self.chromosomes.push((name.to_string(), length));
        Ok(self)
    }

    fn chromosome_length(&self, chr: &str) -> GenomeResult<u32> {
        self.chromosomes
            .iter()
            .find(|(name, _)| name == chr)
            .map(|(_, len)| *len)
            .ok_or_else(|| GenomeError::UnknownChromosome(chr.to_string()))
    }

    fn check_range(&self, id: &str, chr: &str, start: u32, end: u32) -> GenomeResult<()> {
        let length = self.chromosome_length(chr)?;
        if start > end {
            return Err(GenomeError::InvalidRange {
                id: id.to_string(),
                start,
                end,
            });
        }
        if end >= length {
            return Err(GenomeError::OutsideParent {
                child: id.to_string(),
                parent: chr.to_string(),
                start,
                end,
            });
        }
        Ok(())
    }

    pub fn add_gene(&mut self, gene: GeneSpec) -> GenomeResult<&mut Self> {
        self.check_range(&gene.id, &gene.chr, gene.start, gene.end)?;
        if !self.ids.insert(gene.id.clone()) {
            return Err(GenomeError::DuplicateId {
                kind: "gene",
                id: gene.id,
            });
        }
        self.genes.push(gene);
        Ok(self)
    }

    pub fn add_transcript(&mut self, transcript: TranscriptSpec) -> GenomeResult<&mut Self> {
        let Some(gene) = self.genes.iter().find(|g| g.id == transcript.gene_id) else {
            return Err(GenomeError::UnknownParent {
                kind: "gene",
                id: transcript.gene_id,
            });
        };

        let Some((start, end)) = transcript.span() else {
            return Err(GenomeError::InvalidRange {
                id: transcript.id,
                start: 0,
                end: 0,
            });
        };
        if start < gene.start || end > gene.end {
            return Err(GenomeError::OutsideParent {
                child: transcript.id,
                parent: gene.id.clone(),
                start,
                end,
            });
        }

        for exon in &transcript.exons {
            if exon.start > exon.end {
                return Err(GenomeError::InvalidRange {
                    id: transcript.id.clone(),
                    start: exon.start,
                    end: exon.end,
                });
            }
            if let Some(seq) = &exon.sequence {
                let expected = exon.end - exon.start + 1;
                if seq.len() != expected as usize {
                    return Err(GenomeError::SequenceLength {
                        id: transcript.id.clone(),
                        expected,
                        found: seq.len(),
                    });
                }
                if let Some(base) = seq.chars().find(|c| !matches!(c, 'A' | 'C' | 'G' | 'T' | 'N')) {
                    return Err(GenomeError::InvalidBase {
                        id: transcript.id.clone(),
                        base,
                    });
                }
            }
        }

        if let Some((cs, ce)) = transcript.cds {
            if cs > ce || cs < start || ce > end {
                return Err(GenomeError::InvalidRange {
                    id: transcript.id,
                    start: cs,
                    end: ce,
                });
            }
        }

        if !self.ids.insert(transcript.id.clone()) {
            return Err(GenomeError::DuplicateId {
                kind: "transcript",
                id: transcript.id,
            });
        }
        self.transcripts.push(transcript);
        Ok(self)
    }

    fn add_marker(&mut self, marker: MarkerSpec, kind: MarkerKind) -> GenomeResult<&mut Self> {
        self.check_range(&marker.id, &marker.chr, marker.start, marker.end)?;
        self.markers.push((marker, kind));
        Ok(self)
    }

    pub fn add_regulation(
        &mut self,
        marker: MarkerSpec,
        name: &str,
        cell_type: Option<&str>,
    ) -> GenomeResult<&mut Self> {
        self.add_marker(
            marker,
            MarkerKind::Regulation {
                name: name.to_string(),
                cell_type: cell_type.map(str::to_string),
            },
        )
    }

    pub fn add_motif(
        &mut self,
        marker: MarkerSpec,
        pwm_id: &str,
        pwm_name: &str,
    ) -> GenomeResult<&mut Self> {
        self.add_marker(
            marker,
            MarkerKind::Motif {
                pwm_id: pwm_id.to_string(),
                pwm_name: pwm_name.to_string(),
            },
        )
    }

    ///
    /// A NextProt annotation on a transcript. Highly conserved annotations
    /// get a high impact when the protein sequence changes.
    ///
    pub fn add_next_prot(
        &mut self,
        marker: MarkerSpec,
        transcript_id: &str,
        name: &str,
        highly_conserved: bool,
    ) -> GenomeResult<&mut Self> {
        if !self.transcripts.iter().any(|t| t.id == transcript_id) {
            return Err(GenomeError::UnknownParent {
                kind: "transcript",
                id: transcript_id.to_string(),
            });
        }
        self.add_marker(
            marker,
            MarkerKind::NextProt {
                transcript_id: transcript_id.to_string(),
                name: name.to_string(),
                highly_conserved,
            },
        )
    }

    pub fn add_custom(
        &mut self,
        marker: MarkerSpec,
        label: &str,
        score: Option<f64>,
    ) -> GenomeResult<&mut Self> {
        self.add_marker(
            marker,
            MarkerKind::Custom {
                label: label.to_string(),
                score,
            },
        )
    }

    fn retain(&mut self, keep: impl Fn(&TranscriptSpec) -> bool) -> usize {
        let before = self.transcripts.len();
        let mut removed = Vec::new();
        self.transcripts.retain(|t| {
            let kept = keep(t);
            if !kept {
                removed.push(t.id.clone());
            }
            kept
        });
        for id in &removed {
            self.ids.remove(id);
        }
        // annotations on removed transcripts go with them
        self.markers.retain(|(_, kind)| match kind {
            MarkerKind::NextProt { transcript_id, .. } => !removed.contains(transcript_id),
            _ => true,
        });
        before - self.transcripts.len()
    }

    ///
    /// Remove transcripts whose support level is missing or worse than
    /// `max_level`. Returns the number of transcripts removed.
    ///
    pub fn filter_transcript_support_level(&mut self, max_level: u8) -> usize {
        let removed = self.retain(|t| t.support_level.is_some_and(|l| l <= max_level));
        debug!("Removed {} transcripts with support level above {}", removed, max_level);
        removed
    }

    pub fn keep_protein_coding(&mut self) -> usize {
        let removed = self.retain(|t| t.is_protein_coding());
        debug!("Removed {} non protein coding transcripts", removed);
        removed
    }

    pub fn retain_transcripts(&mut self, ids: &HashSet<String>) -> usize {
        let removed = self.retain(|t| ids.contains(&t.id));
        debug!("Removed {} transcripts not in the list", removed);
        removed
    }

    ///
    /// Build the genome: derive introns, UTRs, splice sites, upstream and
    /// downstream regions, intergenic regions, mark canonical transcripts
    /// and index everything.
    ///
    pub fn build(self, config: &PredictorConfig) -> GenomeResult<Genome> {
        config.validate()?;

        let mut features: Vec<Feature> = Vec::new();
        let mut chromosome_lengths = HashMap::new();
        let mut chromosomes = HashMap::new();
        let mut ids = HashMap::new();

        for (name, length) in &self.chromosomes {
            chromosome_lengths.insert(name.clone(), *length);
            if *length == 0 {
                warn!("Chromosome '{}' has zero length", name);
                continue;
            }
            let id = push(
                &mut features,
                Feature {
                    id: name.clone(),
                    region: Region::new(name, 0, length - 1),
                    strand: Strand::Plus,
                    parent: None,
                    kind: FeatureKind::Chromosome,
                },
            );
            chromosomes.insert(name.clone(), id);
        }

        let mut by_gene: HashMap<&str, Vec<&TranscriptSpec>> = HashMap::new();
        for tr in &self.transcripts {
            by_gene.entry(tr.gene_id.as_str()).or_default().push(tr);
        }

        let mut genes: HashMap<String, Vec<FeatureId>> = HashMap::new();
        for gene in &self.genes {
            let transcripts = by_gene.remove(gene.id.as_str()).unwrap_or_default();
            let chr_len = chromosome_lengths.get(&gene.chr).copied().unwrap_or(0);
            let gid = add_gene(&mut features, gene, &transcripts, chr_len, config);

            ids.insert(gene.id.clone(), gid);
            if let Some(data) = features[gid.index()].gene() {
                for tid in &data.transcripts {
                    ids.insert(features[tid.index()].id.clone(), *tid);
                }
            }
            genes.entry(gene.chr.clone()).or_default().push(gid);
        }

        for list in genes.values_mut() {
            list.sort_by(|a, b| {
                let (a, b) = (&features[a.index()], &features[b.index()]);
                a.region.cmp(&b.region).then(a.id.cmp(&b.id))
            });
        }

        for (chr, list) in &genes {
            if let Some(parent) = chromosomes.get(chr) {
                add_intergenic(&mut features, list, *parent);
            }
        }

        let mut seen = HashSet::new();
        let mut duplicate_ids = HashSet::new();
        for (marker, kind) in self.markers {
            if !seen.insert(marker.id.clone()) || ids.contains_key(&marker.id) {
                warn!("Duplicate identifier '{}'", marker.id);
                duplicate_ids.insert(marker.id.clone());
            }

            let (parent, kind) = match kind {
                MarkerKind::Regulation { name, cell_type } => (
                    chromosomes.get(&marker.chr).copied(),
                    FeatureKind::Regulation { name, cell_type },
                ),
                MarkerKind::Motif { pwm_id, pwm_name } => (
                    chromosomes.get(&marker.chr).copied(),
                    FeatureKind::Motif { pwm_id, pwm_name },
                ),
                MarkerKind::NextProt {
                    transcript_id,
                    name,
                    highly_conserved,
                } => (
                    ids.get(&transcript_id).copied(),
                    FeatureKind::NextProt {
                        name,
                        highly_conserved,
                    },
                ),
                MarkerKind::Custom { label, score } => (
                    chromosomes.get(&marker.chr).copied(),
                    FeatureKind::Custom { label, score },
                ),
            };

            let id = push(
                &mut features,
                Feature {
                    region: Region::new(&marker.chr, marker.start, marker.end),
                    id: marker.id.clone(),
                    strand: marker.strand,
                    parent,
                    kind,
                },
            );
            ids.entry(marker.id).or_insert(id);
        }

        let index = FeatureIndex::build(&features);

        info!(
            "Built genome '{}': {} chromosomes, {} genes, {} transcripts, {} features",
            self.name,
            chromosome_lengths.len(),
            self.genes.len(),
            self.transcripts.len(),
            features.len()
        );

        Ok(Genome {
            name: self.name,
            features,
            chromosome_lengths,
            chromosomes,
            genes,
            ids,
            duplicate_ids,
            index,
        })
    }
}

fn push(features: &mut Vec<Feature>, feature: Feature) -> FeatureId {
    let id = FeatureId(features.len() as u32);
    features.push(feature);
    id
}

fn add_gene(
    features: &mut Vec<Feature>,
    gene: &GeneSpec,
    transcripts: &[&TranscriptSpec],
    chr_len: u32,
    config: &PredictorConfig,
) -> FeatureId {
    let protein_coding = if transcripts.is_empty() {
        gene.biotype.as_deref() == Some("protein_coding")
    } else {
        transcripts.iter().any(|t| t.is_protein_coding())
    };

    let gid = push(
        features,
        Feature {
            id: gene.id.clone(),
            region: Region::new(&gene.chr, gene.start, gene.end),
            strand: gene.strand,
            parent: None,
            kind: FeatureKind::Gene(GeneData {
                name: gene.name.clone(),
                biotype: gene.biotype.clone(),
                protein_coding,
                transcripts: Vec::new(),
            }),
        },
    );

    let canonical = canonical_transcript(transcripts, protein_coding);

    let mut tids = Vec::with_capacity(transcripts.len());
    for tr in transcripts {
        let is_canonical = canonical == Some(tr.id.as_str());
        tids.push(add_transcript(
            features,
            gene,
            gid,
            tr,
            is_canonical,
            chr_len,
            config,
        ));
    }

    if let FeatureKind::Gene(data) = &mut features[gid.index()].kind {
        data.transcripts = tids;
    }
    gid
}

///
/// Longest protein coding CDS for protein coding genes, longest mRNA
/// otherwise. Ties go to the smallest identifier.
///
fn canonical_transcript<'a>(transcripts: &[&'a TranscriptSpec], protein_coding: bool) -> Option<&'a str> {
    transcripts
        .iter()
        .filter(|t| !protein_coding || t.is_protein_coding())
        .max_by_key(|t| {
            let length = if protein_coding {
                t.cds_length()
            } else {
                t.mrna_length()
            };
            (length, Reverse(t.id.as_str()))
        })
        .map(|t| t.id.as_str())
}

fn add_transcript(
    features: &mut Vec<Feature>,
    gene: &GeneSpec,
    gid: FeatureId,
    tr: &TranscriptSpec,
    canonical: bool,
    chr_len: u32,
    config: &PredictorConfig,
) -> FeatureId {
    let chr = gene.chr.as_str();
    let strand = gene.strand;
    let (start, end) = tr.span().unwrap_or((gene.start, gene.end));

    let tid = push(
        features,
        Feature {
            id: tr.id.clone(),
            region: Region::new(chr, start, end),
            strand,
            parent: Some(gid),
            kind: FeatureKind::Transcript(TranscriptData {
                biotype: tr.biotype.clone(),
                protein_coding: tr.is_protein_coding(),
                support_level: tr.support_level,
                canonical,
                cds: tr.cds,
                exons: Vec::new(),
                introns: Vec::new(),
                utrs: Vec::new(),
                upstream: None,
                downstream: None,
            }),
        },
    );

    if tr.is_protein_coding() && tr.cds_length() % 3 != 0 {
        warn!(
            "Transcript '{}' has a CDS of {} bases, not a multiple of three",
            tr.id,
            tr.cds_length()
        );
    }

    // exons, 5' to 3'
    let mut exon_specs: Vec<&ExonSpec> = tr.exons.iter().collect();
    exon_specs.sort_by_key(|e| (e.start, e.end));
    if strand.is_minus() {
        exon_specs.reverse();
    }

    let mut exons = Vec::with_capacity(exon_specs.len());
    for (i, exon) in exon_specs.iter().enumerate() {
        let rank = i as u32 + 1;
        exons.push(push(
            features,
            Feature {
                id: format!("{}.exon{}", tr.id, rank),
                region: Region::new(chr, exon.start, exon.end),
                strand,
                parent: Some(tid),
                kind: FeatureKind::Exon(ExonData {
                    rank,
                    sequence: exon.sequence.clone(),
                    splice_sites: Vec::new(),
                }),
            },
        ));
    }

    let mut introns = Vec::new();
    for (i, pair) in exons.windows(2).enumerate() {
        let (first, second) = (&features[pair[0].index()].region, &features[pair[1].index()].region);
        let (left, right) = if strand.is_plus() {
            (first.clone(), second.clone())
        } else {
            (second.clone(), first.clone())
        };
        if left.end + 1 >= right.start {
            continue;
        }

        let rank = i as u32 + 1;
        let region = Region::new(chr, left.end + 1, right.start - 1);
        let iid = push(
            features,
            Feature {
                id: format!("{}.intron{}", tr.id, rank),
                region,
                strand,
                parent: Some(tid),
                kind: FeatureKind::Intron(IntronData {
                    rank,
                    splice_sites: Vec::new(),
                }),
            },
        );
        introns.push(iid);

        let (left_exon, right_exon) = if strand.is_plus() {
            (pair[0], pair[1])
        } else {
            (pair[1], pair[0])
        };
        add_splice_sites(features, iid, left_exon, right_exon, config);
    }

    let mut utrs = Vec::new();
    if let Some((cs, ce)) = tr.cds {
        for eid in &exons {
            let region = features[eid.index()].region.clone();
            if region.start < cs {
                let utr = Region::new(chr, region.start, region.end.min(cs - 1));
                let kind = if strand.is_plus() {
                    FeatureKind::Utr5
                } else {
                    FeatureKind::Utr3
                };
                utrs.push(push_utr(features, &tr.id, utr, strand, *eid, kind));
            }
            if region.end > ce {
                let utr = Region::new(chr, region.start.max(ce + 1), region.end);
                let kind = if strand.is_plus() {
                    FeatureKind::Utr3
                } else {
                    FeatureKind::Utr5
                };
                utrs.push(push_utr(features, &tr.id, utr, strand, *eid, kind));
            }
        }
    }

    let flank = config.up_down_stream_length;
    let mut left_flank = None;
    let mut right_flank = None;
    if flank > 0 && start > 0 {
        left_flank = Some(Region::new(chr, start.saturating_sub(flank), start - 1));
    }
    if flank > 0 && end + 1 < chr_len {
        right_flank = Some(Region::new(
            chr,
            end + 1,
            end.saturating_add(flank).min(chr_len - 1),
        ));
    }
    let (up, down) = if strand.is_plus() {
        (left_flank, right_flank)
    } else {
        (right_flank, left_flank)
    };
    let upstream = up.map(|region| {
        push(
            features,
            Feature {
                id: format!("{}.upstream", tr.id),
                region,
                strand,
                parent: Some(tid),
                kind: FeatureKind::Upstream,
            },
        )
    });
    let downstream = down.map(|region| {
        push(
            features,
            Feature {
                id: format!("{}.downstream", tr.id),
                region,
                strand,
                parent: Some(tid),
                kind: FeatureKind::Downstream,
            },
        )
    });

    if let FeatureKind::Transcript(data) = &mut features[tid.index()].kind {
        data.exons = exons;
        data.introns = introns;
        data.utrs = utrs;
        data.upstream = upstream;
        data.downstream = downstream;
    }
    tid
}

fn push_utr(
    features: &mut Vec<Feature>,
    transcript_id: &str,
    region: Region,
    strand: Strand,
    exon: FeatureId,
    kind: FeatureKind,
) -> FeatureId {
    let prefix = if matches!(kind, FeatureKind::Utr5) {
        "utr5"
    } else {
        "utr3"
    };
    push(
        features,
        Feature {
            id: format!("{}.{}.{}", transcript_id, prefix, region.start),
            region,
            strand,
            parent: Some(exon),
            kind,
        },
    )
}

///
/// Splice sites around one intron. `left_exon` and `right_exon` are in
/// genomic order. Donors sit at the 5' end of the intron, acceptors at the
/// 3' end; splice regions cover a few exonic and intronic bases on both
/// sides.
///
fn add_splice_sites(
    features: &mut Vec<Feature>,
    intron: FeatureId,
    left_exon: FeatureId,
    right_exon: FeatureId,
    config: &PredictorConfig,
) {
    let intron_feature = features[intron.index()].clone();
    let Region { chr, start, end } = intron_feature.region.clone();
    let strand = intron_feature.strand;
    let size = config.splice_site_size;

    let left_site = Region::new(&chr, start, end.min(start + size - 1));
    let right_site = Region::new(&chr, start.max((end + 1).saturating_sub(size)), end);
    let left_core = Region::new(&chr, start, end.min(start + CORE_SPLICE_SITE_SIZE - 1));
    let right_core = Region::new(
        &chr,
        start.max((end + 1).saturating_sub(CORE_SPLICE_SITE_SIZE)),
        end,
    );

    let (donor, donor_core, acceptor, acceptor_core) = if strand.is_plus() {
        (left_site, left_core, right_site, right_core)
    } else {
        (right_site, right_core, left_site, left_core)
    };

    let mut intron_sites = Vec::new();
    for (kind, region, core, name) in [
        (SpliceSiteKind::Donor, donor, donor_core, "donor"),
        (SpliceSiteKind::Acceptor, acceptor, acceptor_core, "acceptor"),
    ] {
        let core = region.intersect(&core);
        intron_sites.push(push(
            features,
            Feature {
                id: format!("{}.{}", intron_feature.id, name),
                region,
                strand,
                parent: Some(intron),
                kind: FeatureKind::SpliceSite(SpliceSiteData { kind, core }),
            },
        ));
    }

    // intronic part of the splice region, both ends
    let (min, max) = (config.splice_region_intron_min, config.splice_region_intron_max);
    if min > 0 && start + min - 1 <= end {
        let region = Region::new(&chr, start + min - 1, end.min(start + max - 1));
        intron_sites.push(push_region(features, &intron_feature, "region_left", region, intron));
    }
    if min > 0 && end >= start + min - 1 {
        let region = Region::new(&chr, start.max(end.saturating_sub(max - 1)), end - (min - 1));
        intron_sites.push(push_region(features, &intron_feature, "region_right", region, intron));
    }

    // exonic part of the splice region
    let exon_size = config.splice_region_exon_size;
    let mut exon_sites = Vec::new();
    if exon_size > 0 {
        let left = features[left_exon.index()].region.clone();
        let region = Region::new(&chr, left.start.max((left.end + 1).saturating_sub(exon_size)), left.end);
        exon_sites.push((
            left_exon,
            push_region(features, &intron_feature, "region_exon_left", region, left_exon),
        ));

        let right = features[right_exon.index()].region.clone();
        let region = Region::new(&chr, right.start, right.end.min(right.start + exon_size - 1));
        exon_sites.push((
            right_exon,
            push_region(features, &intron_feature, "region_exon_right", region, right_exon),
        ));
    }

    if let FeatureKind::Intron(data) = &mut features[intron.index()].kind {
        data.splice_sites = intron_sites;
    }
    for (exon, site) in exon_sites {
        if let FeatureKind::Exon(data) = &mut features[exon.index()].kind {
            data.splice_sites.push(site);
        }
    }
}

fn push_region(
    features: &mut Vec<Feature>,
    intron: &Feature,
    suffix: &str,
    region: Region,
    parent: FeatureId,
) -> FeatureId {
    push(
        features,
        Feature {
            id: format!("{}.{}", intron.id, suffix),
            region,
            strand: intron.strand,
            parent: Some(parent),
            kind: FeatureKind::SpliceSite(SpliceSiteData {
                kind: SpliceSiteKind::Region,
                core: None,
            }),
        },
    )
}

///
/// Intergenic regions between consecutive (possibly overlapping) genes of
/// one chromosome. `genes` must be sorted by start.
///
fn add_intergenic(features: &mut Vec<Feature>, genes: &[FeatureId], chromosome: FeatureId) {
    let mut previous: Option<(u32, String)> = None;
    let mut regions = Vec::new();

    for gid in genes {
        let gene = &features[gid.index()];
        let name = gene.gene().map_or(gene.id.clone(), |g| g.name.clone());
        match &previous {
            Some((prev_end, prev_name)) if gene.region.start > prev_end + 1 => {
                regions.push((
                    Region::new(&gene.region.chr, prev_end + 1, gene.region.start - 1),
                    format!("{}-{}", prev_name, name),
                ));
                previous = Some((gene.region.end, name));
            }
            Some((prev_end, _)) if gene.region.end <= *prev_end => {}
            _ => previous = Some((gene.region.end, name)),
        }
    }

    for (region, id) in regions {
        push(
            features,
            Feature {
                id,
                region,
                strand: Strand::Plus,
                parent: Some(chromosome),
                kind: FeatureKind::Intergenic,
            },
        );
    }
}

//! End-to-end prediction tests: build a genome through the public API,
//! predict variants and check the resulting effect sets.
//!
//! Per-feature and codon level rules are unit tested next to their code.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

use varfx_core::models::{Strand, Variant, VariantType};
use varfx_effect::{
    EffectDetail, EffectType, GeneSpec, Genome, GenomeBuilder, MarkerSpec, PredictorConfig, TranscriptSpec,
    VariantEffectPredictor, VariantEffects,
};

///
/// chr1 (20 Mb): two coding genes, `gA` with three exons and `gB` with two.
/// chr2 (1 Mb): one non-coding gene `gC`, custom sites `siteX` and `siteY`.
///
fn build_genome(config: &PredictorConfig) -> Result<Genome> {
    let mut builder = GenomeBuilder::new("integration");
    builder.add_chromosome("chr1", 20_000_000)?;
    builder.add_chromosome("chr2", 1_000_000)?;

    builder.add_gene(GeneSpec::new("gA", "chr1", 1_000_000, 1_049_999, Strand::Plus).with_name("GENEA"))?;
    builder.add_transcript(
        TranscriptSpec::new("tA", "gA")
            .with_exon(1_000_000, 1_000_999)
            .with_exon(1_020_000, 1_020_999)
            .with_exon(1_040_000, 1_049_999)
            .with_cds(1_000_500, 1_040_500),
    )?;

    builder.add_gene(GeneSpec::new("gB", "chr1", 1_060_000, 1_099_999, Strand::Plus).with_name("GENEB"))?;
    builder.add_transcript(
        TranscriptSpec::new("tB", "gB")
            .with_exon(1_060_000, 1_060_999)
            .with_exon(1_090_000, 1_099_999)
            .with_cds(1_060_100, 1_090_099),
    )?;

    builder.add_gene(GeneSpec::new("gC", "chr2", 4000, 6999, Strand::Plus))?;
    builder.add_transcript(TranscriptSpec::new("tC", "gC").with_exon(4000, 4999).with_exon(6000, 6999))?;
    builder.add_custom(MarkerSpec::new("siteX", "chr2", 500_000, 500_999), "site", None)?;
    builder.add_custom(MarkerSpec::new("siteY", "chr2", 800_000, 800_999), "site", None)?;

    Ok(builder.build(config)?)
}

#[fixture]
fn genome() -> Genome {
    build_genome(&PredictorConfig::default()).unwrap()
}

fn feature_id<'g>(genome: &'g Genome, effects: &VariantEffects, i: usize) -> Option<&'g str> {
    let effect = effects.get(i)?;
    effect.feature().map(|id| genome.feature(id).id.as_str())
}

fn count(effects: &VariantEffects, tag: EffectType) -> usize {
    effects.iter().filter(|e| e.has_effect_type(tag)).count()
}

#[rstest]
fn test_intron_snp(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let effects = predictor.predict(&Variant::new("chr1", 1_010_000, "A", "G"));
    assert_eq!(effects.len(), 1);
    let effect = effects.current().unwrap();
    assert_eq!(effect.effect_type(), EffectType::Intron);
    assert_eq!(effect.transcript(), genome.find_by_id("tA"));
    assert_eq!(effect.gene(), genome.find_by_id("gA"));
    assert_eq!(feature_id(&genome, &effects, 0), Some("tA.intron1"));
    Ok(())
}

#[rstest]
fn test_two_gene_deletion(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    // 120 kb, well under the huge threshold on a 20 Mb chromosome
    let variant = Variant::structural("chr1", 990_000, 1_110_000, VariantType::Del);
    let effects = predictor.predict(&variant);

    let summary = effects.get(0).unwrap();
    assert_eq!(summary.effect_type(), EffectType::GeneDeleted);
    match &summary.detail {
        Some(EffectDetail::Structural {
            count_whole,
            count_partial,
            genes,
            ..
        }) => {
            assert_eq!(*count_whole, 2);
            assert_eq!(*count_partial, 0);
            assert_eq!(genes.len(), 2);
        }
        other => panic!("Unexpected detail {:?}", other),
    }

    // summary plus one per gene
    assert_eq!(count(&effects, EffectType::GeneDeleted), 3);
    assert_eq!(count(&effects, EffectType::TranscriptDeleted), 2);
    assert!(!effects.iter().any(|e| e.has_effect_type(EffectType::GeneFusion)));
    Ok(())
}

#[rstest]
fn test_huge_deletion(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let variant = Variant::structural("chr1", 0, 4_999_999, VariantType::Del);
    let effects = predictor.predict(&variant);

    let tags: Vec<EffectType> = effects.iter().map(|e| e.effect_type()).collect();
    assert_eq!(
        tags,
        vec![
            EffectType::ChromosomeLargeDeletion,
            EffectType::GeneDeleted,
            EffectType::TranscriptDeleted,
            EffectType::GeneDeleted,
            EffectType::TranscriptDeleted,
            EffectType::GeneDeleted,
        ]
    );
    assert_eq!(feature_id(&genome, &effects, 0), Some("chr1"));
    assert_eq!(feature_id(&genome, &effects, 1), Some("gA"));
    assert_eq!(feature_id(&genome, &effects, 4), Some("tB"));
    Ok(())
}

#[rstest]
fn test_huge_inversion_partial_exon(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    // ends inside the first exon of tB
    let variant = Variant::structural("chr1", 0, 1_060_500, VariantType::Inv);
    let effects = predictor.predict(&variant);

    assert_eq!(effects.get(0).unwrap().effect_type(), EffectType::ChromosomeLargeInversion);
    assert_eq!(count(&effects, EffectType::TranscriptInversion), 1);
    assert_eq!(count(&effects, EffectType::ExonInversionPartial), 1);
    Ok(())
}

#[rstest]
fn test_translocation_fusion(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let variant = Variant::from_alleles("chr1", 1_010_000, "T", "T[chr2:5501[")?;
    let effects = predictor.predict(&variant);

    assert_eq!(effects.len(), 1);
    let fusion = effects.current().unwrap();
    assert_eq!(fusion.effect_type(), EffectType::GeneFusion);
    assert_eq!(fusion.transcript(), genome.find_by_id("tA"));
    match &fusion.detail {
        Some(EffectDetail::Fusion(detail)) => {
            assert_eq!(detail.gene_left, genome.find_by_id("gA"));
            assert_eq!(detail.gene_right, genome.find_by_id("gC"));
            // non-coding partner
            assert_eq!(detail.aa_right, None);
        }
        other => panic!("Unexpected detail {:?}", other),
    }
    Ok(())
}

#[rstest]
fn test_translocation_half_fusion(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let variant = Variant::from_alleles("chr1", 1_010_000, "T", "T[chr2:500501[")?;
    let effects = predictor.predict(&variant);

    assert_eq!(effects.len(), 1);
    let fusion = effects.current().unwrap();
    assert_eq!(fusion.effect_type(), EffectType::GeneFusionHalf);
    assert_eq!(fusion.transcript(), genome.find_by_id("tA"));
    match &fusion.detail {
        Some(EffectDetail::Fusion(detail)) => {
            assert_eq!(detail.gene_left, genome.find_by_id("gA"));
            assert_eq!(detail.gene_right, None);
            assert_eq!(detail.feature_right, genome.find_by_id("siteX"));
            assert!(detail.aa_left.is_some());
        }
        other => panic!("Unexpected detail {:?}", other),
    }

    // no feature at all at the partner position
    let variant = Variant::from_alleles("chr1", 1_010_000, "T", "T[chr2:300001[")?;
    let effects = predictor.predict(&variant);
    assert_eq!(effects.len(), 1);
    let fusion = effects.current().unwrap();
    assert_eq!(fusion.effect_type(), EffectType::GeneFusionHalf);
    assert_eq!(fusion.gene(), genome.find_by_id("gA"));
    match &fusion.detail {
        Some(EffectDetail::Fusion(detail)) => {
            assert_eq!(detail.gene_right, None);
            assert_eq!(detail.feature_right, None);
        }
        other => panic!("Unexpected detail {:?}", other),
    }

    // neither breakpoint on a feature
    let variant = Variant::from_alleles("chr2", 300_000, "A", "A[chr2:400001[")?;
    assert!(predictor.predict(&variant).is_empty());
    Ok(())
}

#[rstest]
fn test_translocation_feature_fusion(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let variant = Variant::from_alleles("chr2", 500_500, "A", "A[chr2:800501[")?;
    let effects = predictor.predict(&variant);

    assert_eq!(effects.len(), 1);
    let fusion = effects.current().unwrap();
    assert_eq!(fusion.effect_type(), EffectType::FeatureFusion);
    assert_eq!(feature_id(&genome, &effects, 0), Some("siteX"));
    assert_eq!(fusion.gene(), None);
    match &fusion.detail {
        Some(EffectDetail::Fusion(detail)) => {
            assert_eq!(detail.feature_left, genome.find_by_id("siteX"));
            assert_eq!(detail.feature_right, genome.find_by_id("siteY"));
        }
        other => panic!("Unexpected detail {:?}", other),
    }
    Ok(())
}

#[rstest]
fn test_deletion_and_inversion_differ(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let del = predictor.predict(&Variant::structural("chr1", 1_019_900, 1_021_100, VariantType::Del));
    let inv = predictor.predict(&Variant::structural("chr1", 1_019_900, 1_021_100, VariantType::Inv));

    assert_eq!(count(&del, EffectType::ExonDeleted), 1);
    assert_eq!(count(&del, EffectType::ExonInversion), 0);
    assert_eq!(count(&inv, EffectType::ExonInversion), 1);
    assert_eq!(count(&inv, EffectType::ExonDeleted), 0);
    assert!(del.highest_impact() <= inv.highest_impact());
    Ok(())
}

#[rstest]
fn test_structural_summary_short_circuits_inversion(genome: Genome) -> Result<()> {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    // whole gB, starting and ending between genes
    let inv = predictor.predict(&Variant::structural("chr1", 1_055_000, 1_105_000, VariantType::Inv));
    assert_eq!(inv.len(), 1);
    assert_eq!(inv.current().unwrap().effect_type(), EffectType::GeneInversion);

    // duplications go on to the per-feature analysis
    let dup = predictor.predict(&Variant::structural("chr1", 1_055_000, 1_105_000, VariantType::Dup));
    assert!(dup.len() > 1);
    assert_eq!(dup.get(0).unwrap().effect_type(), EffectType::GeneDuplication);
    assert_eq!(count(&dup, EffectType::GeneDuplication), 2);
    assert_eq!(count(&dup, EffectType::TranscriptDuplication), 1);
    Ok(())
}

#[rstest]
#[case(Variant::new("chr1", 10_000_000, "A", "G"), vec![EffectType::Intergenic])]
#[case(
    Variant::new("chr1", 1_052_000, "A", "G"),
    vec![EffectType::Downstream, EffectType::Intergenic]
)]
fn test_intergenic(genome: Genome, #[case] variant: Variant, #[case] expected: Vec<EffectType>) {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let mut effects = predictor.predict(&variant);
    effects.sort(&genome);
    let tags: Vec<EffectType> = effects.iter().map(|e| e.effect_type()).collect();
    assert_eq!(tags, expected);
}

#[rstest]
fn test_chromosome_edges(genome: Genome) {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let effects = predictor.predict(&Variant::new("chr1", 20_000_000, "", "A"));
    assert_eq!(effects.current().unwrap().effect_type(), EffectType::ChromosomeElongation);

    let effects = predictor.predict(&Variant::new("chrZ", 100, "A", "G"));
    assert_eq!(effects.len(), 1);
    assert!(effects.current().unwrap().has_error());
    assert_eq!(effects.current().unwrap().error_string(), "ERROR_CHROMOSOME_NOT_FOUND");
}

#[rstest]
fn test_effects_overlap_variant(genome: Genome) {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let variants = [
        Variant::new("chr1", 1_000_700, "C", "T"),
        Variant::new("chr1", 1_020_998, "GTA", "G"),
        Variant::new("chr1", 1_052_000, "A", "G"),
        Variant::new("chr1", 1_099_998, "A", "AT"),
        Variant::structural("chr1", 1_019_900, 1_021_100, VariantType::Dup),
        Variant::structural("chr1", 990_000, 1_110_000, VariantType::Del),
        Variant::new("chr1", 20_000_000, "", "A"),
    ];
    for variant in &variants {
        for effect in &predictor.predict(variant) {
            if let Some(id) = effect.feature() {
                assert!(
                    genome.feature(id).region.intersects(&variant.region),
                    "{} does not overlap {}",
                    genome.feature(id).id,
                    variant
                );
            }
        }
    }
}

#[rstest]
fn test_sort_is_stable(genome: Genome) {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);

    let mut effects = predictor.predict(&Variant::structural("chr1", 990_000, 1_110_000, VariantType::Del));
    effects.sort(&genome);
    let first: Vec<(EffectType, Option<String>)> = effects
        .iter()
        .map(|e| (e.effect_type(), e.feature().map(|id| genome.feature(id).id.clone())))
        .collect();

    assert!(
        effects
            .iter()
            .zip(effects.iter().skip(1))
            .all(|(a, b)| a.effect_impact() <= b.effect_impact())
    );

    effects.sort(&genome);
    let second: Vec<(EffectType, Option<String>)> = effects
        .iter()
        .map(|e| (e.effect_type(), e.feature().map(|id| genome.feature(id).id.clone())))
        .collect();
    assert_eq!(first, second);
}

fn config_from(path: &Path) -> Result<PredictorConfig> {
    Ok(PredictorConfig::try_from(path)?)
}

#[rstest]
fn test_config_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "error_on_chromosome_miss = false")?;
    writeln!(file, "up_down_stream_length = 0")?;
    let config = config_from(file.path())?;
    assert!(config.error_on_missing_chromosome);

    let genome = build_genome(&config)?;
    let predictor = VariantEffectPredictor::new(&genome, &config);

    // past the end of chr2, nothing recorded
    let effects = predictor.predict(&Variant::new("chr2", 2_000_000, "A", "G"));
    assert!(effects.is_empty());

    // no flanking features
    let effects = predictor.predict(&Variant::new("chr1", 1_052_000, "A", "G"));
    assert_eq!(effects.len(), 1);
    assert_eq!(effects.current().unwrap().effect_type(), EffectType::Intergenic);
    Ok(())
}

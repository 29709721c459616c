//! Loss of function calls over predicted effects.

use anyhow::Result;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

use varfx_core::models::{Strand, Variant, VariantType};
use varfx_effect::{
    EffectType, GeneSpec, Genome, GenomeBuilder, LossOfFunction, PredictorConfig, TranscriptSpec,
    VariantEffectPredictor,
};

///
/// One plus strand gene with two coding exons and a 3003 base CDS: 1000
/// codons plus the stop codon.
///
fn build_genome() -> Result<Genome> {
    let mut builder = GenomeBuilder::new("lof");
    builder.add_chromosome("chr3", 100_000)?;
    builder.add_gene(GeneSpec::new("gL", "chr3", 10_000, 19_999, Strand::Plus).with_name("LOFG"))?;
    builder.add_transcript(
        TranscriptSpec::new("tL", "gL")
            .with_exon(10_000, 11_999)
            .with_exon(15_000, 16_999)
            .with_cds(10_000, 16_002),
    )?;
    Ok(builder.build(&PredictorConfig::default())?)
}

#[fixture]
fn genome() -> Genome {
    build_genome().unwrap()
}

#[rstest]
#[case(10_030, 10, false)]
#[case(11_500, 500, true)]
#[case(16_000, 1000, false)]
fn test_frame_shift_position(
    genome: Genome,
    #[case] pos: u32,
    #[case] codon_num: u32,
    #[case] expected: bool,
) {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);
    let effects = predictor.predict(&Variant::new("chr3", pos, "", "A"));

    let frame_shift = effects
        .iter()
        .find(|e| e.has_effect_type(EffectType::FrameShift))
        .unwrap();
    assert_eq!(frame_shift.codon_num, Some(codon_num));
    assert_eq!(frame_shift.aa_length(&genome), Some(1000));

    let report = LossOfFunction::new(&genome, &config).classify(&effects);
    assert_eq!(report.is_lof, expected);
    assert!(!report.is_nmd);
}

#[rstest]
fn test_first_exon_deletion(genome: Genome) {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);
    let effects = predictor.predict(&Variant::structural("chr3", 9_000, 12_500, VariantType::Del));
    assert!(effects.iter().any(|e| e.has_effect_type(EffectType::ExonDeleted)));

    let report = LossOfFunction::new(&genome, &config).classify(&effects);
    assert!(report.is_lof);
    assert_eq!(report.lof.len(), 1);
    assert_eq!(report.lof[0].gene_name, "LOFG");
    assert_eq!(report.lof[0].fraction, 1.0);
}

#[rstest]
fn test_deletion_threshold_monotonic(genome: Genome) {
    // in frame, a third of the coding bases, inside the first exon
    let variant = Variant::structural("chr3", 10_300, 11_301, VariantType::Del);

    let mut calls = Vec::new();
    for threshold in [0.9, 0.5, 0.4, 0.3, 0.2, 0.0] {
        let config = PredictorConfig {
            lof_delete_fraction: threshold,
            ..PredictorConfig::default()
        };
        let predictor = VariantEffectPredictor::new(&genome, &config);
        let effects = predictor.predict(&variant);
        calls.push(LossOfFunction::new(&genome, &config).classify(&effects).is_lof);
    }
    // lowering the threshold never removes a call
    assert!(calls.windows(2).all(|w| !w[0] || w[1]));
    assert_eq!(calls, vec![false, false, false, true, true, true]);
}

#[rstest]
fn test_intron_is_not_lof(genome: Genome) {
    let config = PredictorConfig::default();
    let predictor = VariantEffectPredictor::new(&genome, &config);
    let effects = predictor.predict(&Variant::new("chr3", 13_000, "A", "G"));

    let report = LossOfFunction::new(&genome, &config).classify(&effects);
    assert!(!report.is_lof);
    assert!(!report.is_nmd);
    assert!(report.lof.is_empty());
}

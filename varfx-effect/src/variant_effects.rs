use varfx_core::models::Variant;

use crate::effect_type::{EffectImpact, EffectType};
use crate::errors::ErrorWarningType;
use crate::genome::{FeatureLink, Genome};
use crate::variant_effect::VariantEffect;

///
/// Effects of one variant, in the order they were added. The "current"
/// effect is the last one.
///
#[derive(Debug, Clone, Default)]
pub struct VariantEffects {
    effects: Vec<VariantEffect>,
}

impl VariantEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new effect on a feature.
    pub fn add(
        &mut self,
        variant: &Variant,
        link: Option<FeatureLink>,
        effect_type: EffectType,
        message: &str,
    ) -> &mut VariantEffect {
        self.add_with_impact(variant, link, effect_type, effect_type.impact(), message)
    }

    pub fn add_with_impact(
        &mut self,
        variant: &Variant,
        link: Option<FeatureLink>,
        effect_type: EffectType,
        impact: EffectImpact,
        message: &str,
    ) -> &mut VariantEffect {
        let mut effect = VariantEffect::new(variant);
        effect.set(link, effect_type, impact, message);
        self.add_effect(effect)
    }

    pub fn add_effect(&mut self, effect: VariantEffect) -> &mut VariantEffect {
        self.effects.push(effect);
        let last = self.effects.len() - 1;
        &mut self.effects[last]
    }

    fn can_extend(&self, variant: &Variant, link: &FeatureLink) -> bool {
        let Some(current) = self.effects.last() else {
            return false;
        };
        if current.variant().genotype != variant.genotype {
            return false;
        }
        match (current.transcript(), link.transcript) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    ///
    /// Add a tag to the current effect when it concerns the same
    /// transcript and genotype, otherwise start a new effect.
    ///
    pub fn add_or_extend(
        &mut self,
        variant: &Variant,
        link: FeatureLink,
        effect_type: EffectType,
    ) -> &mut VariantEffect {
        if self.can_extend(variant, &link) {
            let last = self.effects.len() - 1;
            let current = &mut self.effects[last];
            current.add_effect(effect_type);
            return current;
        }
        self.add(variant, Some(link), effect_type, "")
    }

    ///
    /// Attach a diagnostic to the current effect, or to a placeholder
    /// effect when there is none.
    ///
    pub fn add_error_warning(&mut self, variant: &Variant, kind: ErrorWarningType) {
        match self.effects.last_mut() {
            Some(current) => current.add_error_warning(kind),
            None => {
                let mut effect = VariantEffect::new(variant);
                effect.add_error_warning(kind);
                self.effects.push(effect);
            }
        }
    }

    pub fn current(&self) -> Option<&VariantEffect> {
        self.effects.last()
    }

    pub fn get(&self, i: usize) -> Option<&VariantEffect> {
        self.effects.get(i)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariantEffect> {
        self.effects.iter()
    }

    pub fn highest_impact(&self) -> Option<EffectImpact> {
        self.effects.iter().map(|e| e.effect_impact()).min()
    }

    pub fn sort(&mut self, genome: &Genome) {
        self.effects.sort_by(|a, b| a.compare(b, genome));
    }
}

impl IntoIterator for VariantEffects {
    type Item = VariantEffect;
    type IntoIter = std::vec::IntoIter<VariantEffect>;

    fn into_iter(self) -> Self::IntoIter {
        self.effects.into_iter()
    }
}

impl<'a> IntoIterator for &'a VariantEffects {
    type Item = &'a VariantEffect;
    type IntoIter = std::slice::Iter<'a, VariantEffect>;

    fn into_iter(self) -> Self::IntoIter {
        self.effects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::FeatureId;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn variant() -> Variant {
        Variant::new("chr1", 100, "A", "G")
    }

    fn link(feature: u32, transcript: Option<u32>) -> FeatureLink {
        FeatureLink {
            feature: FeatureId(feature),
            transcript: transcript.map(FeatureId),
            gene: Some(FeatureId(0)),
        }
    }

    #[rstest]
    fn test_add_or_extend_same_transcript(variant: Variant) {
        let mut effects = VariantEffects::new();
        effects.add_or_extend(&variant, link(2, Some(1)), EffectType::Exon);
        effects.add_or_extend(&variant, link(3, Some(1)), EffectType::SpliceSiteRegion);
        assert_eq!(effects.len(), 1);
        assert_eq!(
            effects.current().unwrap().effect_type(),
            EffectType::SpliceSiteRegion
        );
        // keeps the first feature
        assert_eq!(effects.current().unwrap().feature(), Some(FeatureId(2)));
    }

    #[rstest]
    fn test_add_or_extend_other_transcript(variant: Variant) {
        let mut effects = VariantEffects::new();
        effects.add_or_extend(&variant, link(2, Some(1)), EffectType::Intron);
        effects.add_or_extend(&variant, link(5, Some(4)), EffectType::Intron);
        effects.add_or_extend(&variant, link(6, None), EffectType::Intron);
        assert_eq!(effects.len(), 3);
    }

    #[rstest]
    fn test_add_or_extend_other_genotype(variant: Variant) {
        let mut effects = VariantEffects::new();
        effects.add_or_extend(&variant, link(2, Some(1)), EffectType::Intron);
        let other = variant.clone().with_genotype("1");
        effects.add_or_extend(&other, link(2, Some(1)), EffectType::Intron);
        assert_eq!(effects.len(), 2);
    }

    #[rstest]
    fn test_error_warning_placeholder(variant: Variant) {
        let mut effects = VariantEffects::new();
        effects.add_error_warning(&variant, ErrorWarningType::ErrorChromosomeNotFound);
        assert_eq!(effects.len(), 1);
        let placeholder = effects.current().unwrap();
        assert_eq!(placeholder.effect_type(), EffectType::None);
        assert_eq!(placeholder.error_string(), "ERROR_CHROMOSOME_NOT_FOUND");

        effects.add(&variant, None, EffectType::Intergenic, "");
        effects.add_error_warning(&variant, ErrorWarningType::WarningDuplicateId);
        assert_eq!(effects.len(), 2);
        assert_eq!(effects.current().unwrap().warning_string(), "WARNING_DUPLICATE_ID");
    }

    #[rstest]
    fn test_highest_impact(variant: Variant) {
        let mut effects = VariantEffects::new();
        assert_eq!(effects.highest_impact(), None);
        effects.add(&variant, None, EffectType::Intron, "");
        effects.add(&variant, None, EffectType::SynonymousCoding, "");
        effects.add(&variant, None, EffectType::Upstream, "");
        assert_eq!(effects.highest_impact(), Some(EffectImpact::Low));
    }
}

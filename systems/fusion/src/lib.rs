#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure fusion system that matches owned units against upgrade recipes.
//!
//! Matching is greedy and order dependent: units are scanned in insertion
//! order and each one is claimed by the first still-unmatched occurrence of
//! its archetype. The resolver never searches for an optimal subset, so two
//! boards holding the same multiset of units in a different order may consume
//! different instances. The world performs the mutation; the resolver only
//! decides.

use code_defence_core::{ArchetypeName, Recipe, UnitId};

/// Outcome of a successful match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FusionPlan {
    consumed: Vec<UnitId>,
    result: ArchetypeName,
}

impl FusionPlan {
    /// Units claimed by the recipe, in scan order.
    #[must_use]
    pub fn consumed(&self) -> &[UnitId] {
        &self.consumed
    }

    /// Archetype that should be instantiated once the units are removed.
    #[must_use]
    pub fn result(&self) -> &ArchetypeName {
        &self.result
    }

    /// Consumes the plan, yielding the claimed units and the result archetype.
    #[must_use]
    pub fn into_parts(self) -> (Vec<UnitId>, ArchetypeName) {
        (self.consumed, self.result)
    }
}

/// Archetype occurrences still unmatched after every unit was scanned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingComponents {
    missing: Vec<ArchetypeName>,
}

impl MissingComponents {
    /// Unmatched occurrences in recipe order.
    #[must_use]
    pub fn missing(&self) -> &[ArchetypeName] {
        &self.missing
    }

    /// Consumes the report, yielding the unmatched occurrences.
    #[must_use]
    pub fn into_vec(self) -> Vec<ArchetypeName> {
        self.missing
    }
}

/// Stateless resolver deciding which unit instances a recipe consumes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FusionResolver;

impl FusionResolver {
    /// Creates a new resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Matches `units`, given in insertion order, against the recipe.
    ///
    /// Either every required occurrence is matched and the claimed units are
    /// returned, or nothing is claimed and the unmatched occurrences are
    /// reported.
    pub fn resolve<'a, I>(
        &self,
        recipe: &Recipe,
        units: I,
    ) -> Result<FusionPlan, MissingComponents>
    where
        I: IntoIterator<Item = (UnitId, &'a ArchetypeName)>,
    {
        let mut remaining: Vec<&ArchetypeName> = recipe.required.iter().collect();
        let mut consumed = Vec::with_capacity(remaining.len());

        for (unit, archetype) in units {
            if remaining.is_empty() {
                break;
            }

            if let Some(index) = remaining.iter().position(|needed| *needed == archetype) {
                let _ = remaining.remove(index);
                consumed.push(unit);
            }
        }

        if !remaining.is_empty() {
            return Err(MissingComponents {
                missing: remaining.into_iter().cloned().collect(),
            });
        }

        Ok(FusionPlan {
            consumed,
            result: recipe.result.clone(),
        })
    }
}

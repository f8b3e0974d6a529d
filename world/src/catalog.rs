//! Validated registry of unit archetypes.

use std::collections::HashMap;

use code_defence_core::{ArchetypeName, RandomSource, Recipe, UnitArchetype};
use thiserror::Error;

/// Reasons a set of archetype definitions cannot form a catalog.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two definitions share a name.
    #[error("unit archetype `{0}` is defined more than once")]
    DuplicateArchetype(ArchetypeName),
    /// A recipe produces an archetype that is not defined.
    #[error("recipe on `{owner}` produces unknown archetype `{result}`")]
    UnknownRecipeResult {
        /// Archetype declaring the recipe.
        owner: ArchetypeName,
        /// Undefined archetype named as the result.
        result: ArchetypeName,
    },
    /// A recipe consumes an archetype that is not defined.
    #[error("recipe on `{owner}` requires unknown archetype `{required}`")]
    UnknownRecipeComponent {
        /// Archetype declaring the recipe.
        owner: ArchetypeName,
        /// Undefined archetype named as a component.
        required: ArchetypeName,
    },
    /// A recipe consumes nothing.
    #[error("recipe on `{owner}` producing `{result}` requires no units")]
    EmptyRecipe {
        /// Archetype declaring the recipe.
        owner: ArchetypeName,
        /// Archetype the recipe produces.
        result: ArchetypeName,
    },
    /// Generation would have nothing to draw from.
    #[error("catalog defines no grade-one archetype")]
    NoGradeOneArchetype,
}

/// Immutable registry of unit archetypes, validated on construction.
#[derive(Clone, Debug)]
pub struct Catalog {
    archetypes: Vec<UnitArchetype>,
    index: HashMap<ArchetypeName, usize>,
    grade_one: Vec<usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting definitions that reference unknown archetypes.
    pub fn new(archetypes: Vec<UnitArchetype>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(archetypes.len());
        for (position, archetype) in archetypes.iter().enumerate() {
            if index.insert(archetype.name.clone(), position).is_some() {
                return Err(CatalogError::DuplicateArchetype(archetype.name.clone()));
            }
        }

        for archetype in &archetypes {
            for recipe in &archetype.upgrades {
                validate_recipe(&archetype.name, recipe, &index)?;
            }
        }

        let grade_one: Vec<usize> = archetypes
            .iter()
            .enumerate()
            .filter(|(_, archetype)| archetype.grade == 1)
            .map(|(position, _)| position)
            .collect();
        if grade_one.is_empty() {
            return Err(CatalogError::NoGradeOneArchetype);
        }

        Ok(Self {
            archetypes,
            index,
            grade_one,
        })
    }

    /// Looks up an archetype by name.
    #[must_use]
    pub fn get(&self, name: &ArchetypeName) -> Option<&UnitArchetype> {
        self.index
            .get(name)
            .and_then(|position| self.archetypes.get(*position))
    }

    /// Reports whether an archetype with the provided name exists.
    #[must_use]
    pub fn contains(&self, name: &ArchetypeName) -> bool {
        self.index.contains_key(name)
    }

    /// Iterator over every archetype in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitArchetype> {
        self.archetypes.iter()
    }

    /// Iterator over the archetypes generation draws from, in definition order.
    pub fn grade_one(&self) -> impl Iterator<Item = &UnitArchetype> {
        self.grade_one
            .iter()
            .map(move |position| &self.archetypes[*position])
    }

    /// Iterator over every recipe offered by the catalog.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.archetypes
            .iter()
            .flat_map(|archetype| archetype.upgrades.iter())
    }

    /// Reports whether some archetype offers this recipe.
    ///
    /// Components are compared as a multiset, so their order is irrelevant.
    #[must_use]
    pub fn offers(&self, recipe: &Recipe) -> bool {
        let wanted = sorted_components(recipe);
        self.recipes().any(|offered| {
            offered.result == recipe.result && sorted_components(offered) == wanted
        })
    }

    /// Money credited when a unit of the archetype is sold.
    #[must_use]
    pub fn resale_value(&self, name: &ArchetypeName) -> Option<u64> {
        self.get(name).map(|archetype| archetype.resale_value)
    }

    /// Draws a grade-one archetype uniformly through the provided source.
    pub(crate) fn draw_grade_one(&self, random: &mut dyn RandomSource) -> &UnitArchetype {
        let slot = random.pick(self.grade_one.len()) % self.grade_one.len();
        &self.archetypes[self.grade_one[slot]]
    }
}

fn sorted_components(recipe: &Recipe) -> Vec<&ArchetypeName> {
    let mut components: Vec<&ArchetypeName> = recipe.required.iter().collect();
    components.sort_unstable();
    components
}

fn validate_recipe(
    owner: &ArchetypeName,
    recipe: &Recipe,
    index: &HashMap<ArchetypeName, usize>,
) -> Result<(), CatalogError> {
    if !index.contains_key(&recipe.result) {
        return Err(CatalogError::UnknownRecipeResult {
            owner: owner.clone(),
            result: recipe.result.clone(),
        });
    }

    if recipe.required.is_empty() {
        return Err(CatalogError::EmptyRecipe {
            owner: owner.clone(),
            result: recipe.result.clone(),
        });
    }

    if let Some(required) = recipe
        .required
        .iter()
        .find(|required| !index.contains_key(*required))
    {
        return Err(CatalogError::UnknownRecipeComponent {
            owner: owner.clone(),
            required: required.clone(),
        });
    }

    Ok(())
}

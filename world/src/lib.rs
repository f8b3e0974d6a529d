#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Code Defence.
//!
//! The world owns the game status, the unit arena and the selection slot.
//! Every mutation arrives as a [`Command`] through [`apply`], runs to
//! completion, and is reported as [`Event`] values. Refused operations leave
//! the state untouched and surface as [`Event::OperationRejected`].

mod catalog;
mod units;

use std::time::Duration;

use code_defence_core::{
    upgrade_cost, Command, Event, GameStatus, PlacementProvider, Position, RandomSource, Recipe,
    Rejection, Rules, UnitId, UpgradeableStat, WELCOME_BANNER,
};
use code_defence_system_fusion::FusionResolver;
use tracing::{debug, warn};

pub use catalog::{Catalog, CatalogError};
use units::UnitRegistry;

/// External collaborators consulted while applying commands.
pub struct Services<'a> {
    /// Provides board positions for new units.
    pub placement: &'a mut dyn PlacementProvider,
    /// Draws archetypes for generated units.
    pub random: &'a mut dyn RandomSource,
}

/// Represents the authoritative Code Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    catalog: Catalog,
    rules: Rules,
    status: GameStatus,
    units: UnitRegistry,
    selected: Option<UnitId>,
    resolver: FusionResolver,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates a world with the opening game status.
    #[must_use]
    pub fn new(catalog: Catalog, rules: Rules) -> Self {
        Self::with_status(catalog, rules, GameStatus::default())
    }

    /// Creates a world starting from the provided game status.
    #[must_use]
    pub fn with_status(catalog: Catalog, rules: Rules, status: GameStatus) -> Self {
        Self {
            banner: WELCOME_BANNER,
            catalog,
            rules,
            status,
            units: UnitRegistry::new(),
            selected: None,
            resolver: FusionResolver::new(),
            tick_index: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn ensure_affordable(&self, cost: u64) -> Result<(), Rejection> {
        if self.status.money < cost {
            return Err(Rejection::InsufficientFunds {
                required: cost,
                available: self.status.money,
            });
        }
        Ok(())
    }

    fn accrue_income(&mut self, out_events: &mut Vec<Event>) {
        let amount = self.status.income();
        self.status.money = self.status.money.saturating_add(amount);
        out_events.push(Event::IncomeAccrued {
            amount,
            balance: self.status.money,
        });
    }

    fn upgrade_status(
        &mut self,
        stat: UpgradeableStat,
        out_events: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        let cost = upgrade_cost(stat, self.status.stat_level(stat));
        self.ensure_affordable(cost)?;

        self.status.money -= cost;
        let level = self.status.stat_level_mut(stat);
        *level = level.saturating_add(1);
        let level = *level;
        debug!(?stat, level, cost, "status upgraded");
        out_events.push(Event::StatusUpgraded { stat, level, cost });
        Ok(())
    }

    fn generate_unit(
        &mut self,
        services: &mut Services<'_>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        let cost = self.rules.generation_cost;
        self.ensure_affordable(cost)?;
        if self.units.len() > self.rules.unit_limit {
            return Err(Rejection::UnitLimitExceeded {
                limit: self.rules.unit_limit,
            });
        }

        let archetype = self.catalog.draw_grade_one(services.random).name.clone();
        let position = services
            .placement
            .find_open_placement(&self.units.snapshots())
            .ok_or(Rejection::NoOpenPlacement)?;

        self.status.money -= cost;
        let unit = self.units.insert(archetype.clone(), position);
        debug!(?unit, %archetype, ?position, "unit generated");
        out_events.push(Event::UnitGenerated {
            unit,
            archetype,
            position,
            cost,
        });
        Ok(())
    }

    fn select_unit(
        &mut self,
        unit: Option<UnitId>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        if let Some(unit) = unit {
            if !self.units.contains(unit) {
                return Err(Rejection::StalePlacementRequest { unit });
            }
        }

        self.selected = unit;
        out_events.push(Event::UnitSelected { unit });
        Ok(())
    }

    fn clear_selection(&mut self, out_events: &mut Vec<Event>) {
        if self.selected.take().is_some() {
            out_events.push(Event::UnitSelected { unit: None });
        }
    }

    fn relocate_selected_unit(
        &mut self,
        position: Position,
        out_events: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        let Some(unit) = self.selected else {
            return Ok(());
        };
        let Some(state) = self.units.get_mut(unit) else {
            return Err(Rejection::StalePlacementRequest { unit });
        };

        let from = state.position;
        state.position = position;
        debug!(?unit, ?from, to = ?position, "unit relocated");
        out_events.push(Event::UnitRelocated {
            unit,
            from,
            to: position,
        });
        self.clear_selection(out_events);
        Ok(())
    }

    fn sell_selected_unit(&mut self, out_events: &mut Vec<Event>) -> Result<(), Rejection> {
        let Some(unit) = self.selected else {
            return Ok(());
        };
        let Some(state) = self.units.remove(unit) else {
            return Err(Rejection::StalePlacementRequest { unit });
        };

        let refund = self.catalog.resale_value(&state.archetype).unwrap_or(0);
        self.status.money = self.status.money.saturating_add(refund);
        debug!(?unit, archetype = %state.archetype, refund, "unit sold");
        out_events.push(Event::UnitSold {
            unit,
            archetype: state.archetype,
            refund,
        });
        self.clear_selection(out_events);
        Ok(())
    }

    fn upgrade_unit(
        &mut self,
        recipe: &Recipe,
        services: &mut Services<'_>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), Rejection> {
        if !self.catalog.contains(&recipe.result) {
            return Err(Rejection::UnknownArchetype {
                name: recipe.result.clone(),
            });
        }
        if !self.catalog.offers(recipe) {
            return Err(Rejection::UnknownRecipe {
                result: recipe.result.clone(),
            });
        }

        let plan = self
            .resolver
            .resolve(
                recipe,
                self.units.iter().map(|(unit, state)| (unit, &state.archetype)),
            )
            .map_err(|missing| Rejection::MissingFusionComponents {
                missing: missing.into_vec(),
            })?;
        let position = services
            .placement
            .find_open_placement(&self.units.snapshots())
            .ok_or(Rejection::NoOpenPlacement)?;

        let (consumed, archetype) = plan.into_parts();
        for unit in &consumed {
            // Plans are resolved from a scan of live units.
            let removed = self.units.remove(*unit);
            debug_assert!(removed.is_some(), "fusion plan named a dead unit");
        }
        let unit = self.units.insert(archetype.clone(), position);
        debug!(?unit, %archetype, consumed = consumed.len(), "units fused");
        out_events.push(Event::UnitsFused {
            consumed,
            unit,
            archetype,
            position,
        });
        self.clear_selection(out_events);
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(
    world: &mut World,
    command: Command,
    services: &mut Services<'_>,
    out_events: &mut Vec<Event>,
) {
    let outcome = match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            Ok(())
        }
        Command::AccrueIncome => {
            world.accrue_income(out_events);
            Ok(())
        }
        Command::UpgradeStatus { stat } => world.upgrade_status(stat, out_events),
        Command::GenerateUnit => world.generate_unit(services, out_events),
        Command::SelectUnit { unit } => world.select_unit(unit, out_events),
        Command::RelocateSelectedUnit { position } => {
            world.relocate_selected_unit(position, out_events)
        }
        Command::SellSelectedUnit => world.sell_selected_unit(out_events),
        Command::UpgradeUnit { recipe } => world.upgrade_unit(&recipe, services, out_events),
    };

    if let Err(reason) = outcome {
        warn!(%reason, "operation rejected");
        out_events.push(Event::OperationRejected { reason });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use code_defence_core::{GameStatus, Recipe, UnitId, UnitSnapshot, UnitView};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures the current game status.
    #[must_use]
    pub fn status(world: &World) -> GameStatus {
        world.status
    }

    /// Captures a read-only view of the units in insertion order.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.snapshots())
    }

    /// Captures a single unit, if it exists.
    #[must_use]
    pub fn unit(world: &World, unit: UnitId) -> Option<UnitSnapshot> {
        world.units.snapshot(unit)
    }

    /// Number of active units.
    #[must_use]
    pub fn unit_count(world: &World) -> usize {
        world.units.len()
    }

    /// Currently selected unit, if any.
    #[must_use]
    pub fn selected_unit(world: &World) -> Option<UnitId> {
        world.selected
    }

    /// Catalog recipes the owned units currently satisfy.
    #[must_use]
    pub fn satisfiable_recipes(world: &World) -> Vec<Recipe> {
        world
            .catalog
            .recipes()
            .filter(|recipe| {
                world
                    .resolver
                    .resolve(
                        recipe,
                        world.units.iter().map(|(unit, state)| (unit, &state.archetype)),
                    )
                    .is_ok()
            })
            .cloned()
            .collect()
    }

    /// Total simulated time applied through ticks.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

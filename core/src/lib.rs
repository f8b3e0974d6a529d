#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Code Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable snapshots, and
//! respond exclusively with new command batches or outbound notifications.

use std::{fmt, time::Duration};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Code Defence.";

/// Duration of every stage of the wave sequence.
pub const DEFAULT_STAGE_DURATION: Duration = Duration::from_secs(10);

/// Cadence at which the economy accrues income.
pub const DEFAULT_INCOME_INTERVAL: Duration = Duration::from_millis(100);

/// Money debited for every generated unit.
pub const DEFAULT_GENERATION_COST: u64 = 10;

/// Number of units beyond which generation is refused.
pub const DEFAULT_UNIT_LIMIT: usize = 100;

slotmap::new_key_type! {
    /// Unique identifier allocated to a unit by the world.
    pub struct UnitId;
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Credits one income payment equal to the current money level.
    AccrueIncome,
    /// Requests that an upgradeable status be raised by one level.
    UpgradeStatus {
        /// Status that should be raised.
        stat: UpgradeableStat,
    },
    /// Requests a new unit drawn from the grade-one archetypes.
    GenerateUnit,
    /// Selects the provided unit, or clears the selection when `None`.
    SelectUnit {
        /// Unit that should become selected.
        unit: Option<UnitId>,
    },
    /// Moves the selected unit to the provided position.
    RelocateSelectedUnit {
        /// Destination already validated by the placement provider.
        position: Position,
    },
    /// Sells the selected unit for its archetype's resale value.
    SellSelectedUnit,
    /// Fuses owned units into a higher-grade unit following the recipe.
    UpgradeUnit {
        /// Recipe describing the consumed archetypes and the result.
        recipe: Recipe,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an income payment was credited.
    IncomeAccrued {
        /// Money credited by the payment.
        amount: u64,
        /// Balance after the payment.
        balance: u64,
    },
    /// Confirms that a status was raised by one level.
    StatusUpgraded {
        /// Status that was raised.
        stat: UpgradeableStat,
        /// Level reached after the upgrade.
        level: u32,
        /// Money debited for the upgrade.
        cost: u64,
    },
    /// Confirms that a unit was generated and placed.
    UnitGenerated {
        /// Identifier allocated to the unit.
        unit: UnitId,
        /// Archetype drawn for the unit.
        archetype: ArchetypeName,
        /// Position assigned by the placement provider.
        position: Position,
        /// Money debited for the generation.
        cost: u64,
    },
    /// Announces the new selection state.
    UnitSelected {
        /// Selected unit, `None` when the selection was cleared.
        unit: Option<UnitId>,
    },
    /// Confirms that the selected unit was moved.
    UnitRelocated {
        /// Identifier of the moved unit.
        unit: UnitId,
        /// Position occupied before the move.
        from: Position,
        /// Position occupied after the move.
        to: Position,
    },
    /// Confirms that a unit was sold.
    UnitSold {
        /// Identifier of the sold unit.
        unit: UnitId,
        /// Archetype of the sold unit.
        archetype: ArchetypeName,
        /// Money credited for the sale.
        refund: u64,
    },
    /// Confirms that a fusion consumed units and produced a new one.
    UnitsFused {
        /// Units consumed by the fusion, in scan order.
        consumed: Vec<UnitId>,
        /// Identifier allocated to the produced unit.
        unit: UnitId,
        /// Archetype of the produced unit.
        archetype: ArchetypeName,
        /// Position assigned to the produced unit.
        position: Position,
    },
    /// Reports that a player operation was refused without changing state.
    OperationRejected {
        /// Specific reason the operation failed.
        reason: Rejection,
    },
}

/// Reasons a player operation may be refused by the world.
///
/// The `Display` output is the message surfaced to the player.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The balance does not cover the operation's cost.
    #[error("Not enough money")]
    InsufficientFunds {
        /// Money the operation requires.
        required: u64,
        /// Money available when the operation was attempted.
        available: u64,
    },
    /// The number of active units already exceeds the configured limit.
    #[error("You cannot generate units more than {limit}.")]
    UnitLimitExceeded {
        /// Configured unit limit.
        limit: usize,
    },
    /// Owned units do not satisfy the fusion recipe.
    #[error("Need More Units")]
    MissingFusionComponents {
        /// Archetype occurrences that could not be matched.
        missing: Vec<ArchetypeName>,
    },
    /// The referenced unit no longer exists.
    #[error("The selected unit no longer exists")]
    StalePlacementRequest {
        /// Identifier that failed to resolve.
        unit: UnitId,
    },
    /// The placement provider reported no open position.
    #[error("There is no room left for another unit")]
    NoOpenPlacement,
    /// The requested archetype is absent from the catalog.
    #[error("Unknown unit `{name}`")]
    UnknownArchetype {
        /// Name that failed to resolve.
        name: ArchetypeName,
    },
    /// The recipe is not offered by any catalog archetype.
    #[error("That fusion is not available")]
    UnknownRecipe {
        /// Archetype the recipe claims to produce.
        result: ArchetypeName,
    },
}

/// Name identifying a unit archetype in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeName(String);

impl ArchetypeName {
    /// Creates a new archetype name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the textual representation of the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchetypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name identifying a mob archetype handled by the downstream spawner.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MobName(String);

impl MobName {
    /// Creates a new mob name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the textual representation of the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Board coordinate assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: u32,
    y: u32,
}

impl Position {
    /// Creates a new board position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Horizontal board coordinate.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Vertical board coordinate.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Attack behaviour of a unit archetype.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    /// Single-target attack.
    #[default]
    Basic,
}

/// Fusion recipe producing one unit from a multiset of owned units.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipe {
    /// Archetype produced by the fusion.
    pub result: ArchetypeName,
    /// Archetypes consumed by the fusion; repeated names require repeated units.
    pub required: Vec<ArchetypeName>,
}

impl Recipe {
    /// Creates a new recipe.
    #[must_use]
    pub fn new(result: ArchetypeName, required: Vec<ArchetypeName>) -> Self {
        Self { result, required }
    }
}

/// Immutable definition of a unit type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitArchetype {
    /// Unique name of the archetype.
    pub name: ArchetypeName,
    /// Human readable label.
    #[serde(default)]
    pub description: String,
    /// Grade of the archetype; generation draws from grade one.
    pub grade: u8,
    /// Attack behaviour of the archetype.
    #[serde(default)]
    pub attack_type: AttackType,
    /// Damage dealt per attack.
    pub damage: u32,
    /// Attack speed.
    pub speed: u32,
    /// Reload time between attacks.
    pub reload: u32,
    /// Recipes that consume this archetype.
    #[serde(default)]
    pub upgrades: Vec<Recipe>,
    /// Money credited when a unit of this archetype is sold.
    pub resale_value: u64,
}

/// Group of mobs emitted together when a stage elapses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobBatch {
    /// Mob archetype to spawn.
    pub mob: MobName,
    /// Multiplicity the downstream spawner un-rolls.
    pub count: u32,
}

/// One phase of the wave sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Batches emitted when the stage elapses, in order.
    pub batches: Vec<MobBatch>,
}

/// Mob spawn request produced by the wave scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MobSpawnEvent {
    /// Zero-based index of the stage that produced the batch.
    pub stage: usize,
    /// Mob archetype to spawn.
    pub mob: MobName,
    /// Multiplicity the downstream spawner un-rolls.
    pub count: u32,
    /// Scheduler clock value of the stage boundary that produced the batch.
    pub emitted_at: Duration,
}

/// Statuses the player may raise with money.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeableStat {
    /// Damage bonus applied to every unit.
    Power,
    /// Attack speed bonus applied to every unit.
    Speed,
    /// Reload bonus applied to every unit.
    Reload,
    /// Income credited on each economy tick.
    MoneyLevel,
}

impl UpgradeableStat {
    /// Every upgradeable status in display order.
    pub const ALL: [Self; 4] = [Self::Power, Self::Speed, Self::Reload, Self::MoneyLevel];

    const fn base_cost(self) -> u64 {
        match self {
            Self::Power | Self::Speed | Self::Reload => 10,
            Self::MoneyLevel => 20,
        }
    }
}

/// Money required to raise `stat` from `current_level` to the next level.
#[must_use]
pub fn upgrade_cost(stat: UpgradeableStat, current_level: u32) -> u64 {
    stat.base_cost()
        .saturating_mul(u64::from(current_level).saturating_add(1))
}

/// Economic and progression state of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameStatus {
    /// Current game level.
    pub level: u32,
    /// Remaining player life.
    pub life: u32,
    /// Spendable balance.
    pub money: u64,
    /// Income credited on each economy tick.
    pub money_level: u32,
    /// Purchased power upgrades.
    pub power: u32,
    /// Purchased speed upgrades.
    pub speed: u32,
    /// Purchased reload upgrades.
    pub reload: u32,
}

impl GameStatus {
    /// Current level of the provided upgradeable status.
    #[must_use]
    pub const fn stat_level(&self, stat: UpgradeableStat) -> u32 {
        match stat {
            UpgradeableStat::Power => self.power,
            UpgradeableStat::Speed => self.speed,
            UpgradeableStat::Reload => self.reload,
            UpgradeableStat::MoneyLevel => self.money_level,
        }
    }

    /// Mutable access to the provided upgradeable status.
    pub fn stat_level_mut(&mut self, stat: UpgradeableStat) -> &mut u32 {
        match stat {
            UpgradeableStat::Power => &mut self.power,
            UpgradeableStat::Speed => &mut self.speed,
            UpgradeableStat::Reload => &mut self.reload,
            UpgradeableStat::MoneyLevel => &mut self.money_level,
        }
    }

    /// Income credited on each economy tick.
    #[must_use]
    pub const fn income(&self) -> u64 {
        self.money_level as u64
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self {
            level: 1,
            life: 100,
            money: 1,
            money_level: 1,
            power: 0,
            speed: 0,
            reload: 0,
        }
    }
}

/// Constants fixed when the simulation starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    /// Duration shared by every stage of the wave sequence.
    pub stage_duration: Duration,
    /// Cadence of income payments.
    pub income_interval: Duration,
    /// Money debited for every generated unit.
    pub generation_cost: u64,
    /// Number of units beyond which generation is refused.
    pub unit_limit: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            stage_duration: DEFAULT_STAGE_DURATION,
            income_interval: DEFAULT_INCOME_INTERVAL,
            generation_cost: DEFAULT_GENERATION_COST,
            unit_limit: DEFAULT_UNIT_LIMIT,
        }
    }
}

/// Immutable representation of a single unit used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    /// Unique identifier allocated to the unit.
    pub id: UnitId,
    /// Archetype of the unit.
    pub archetype: ArchetypeName,
    /// Board position of the unit.
    pub position: Position,
}

/// Read-only snapshot describing all units in insertion order.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from snapshots already in insertion order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<UnitSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Source of board coordinates for new units.
pub trait PlacementProvider {
    /// Finds an open position given the units currently on the board.
    fn find_open_placement(&mut self, existing: &[UnitSnapshot]) -> Option<Position>;
}

/// Outbound channel surfacing rejections to the player.
pub trait MessageChannel {
    /// Delivers a message; no acknowledgment is expected.
    fn report(&mut self, message: &str);
}

impl MessageChannel for Vec<String> {
    fn report(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}

/// Downstream consumer of mob spawn requests.
pub trait MobSpawnConsumer {
    /// Receives a spawn request; no acknowledgment is expected.
    fn receive(&mut self, event: MobSpawnEvent);
}

impl MobSpawnConsumer for Vec<MobSpawnEvent> {
    fn receive(&mut self, event: MobSpawnEvent) {
        self.push(event);
    }
}

/// Injectable source of uniform draws used for archetype selection.
pub trait RandomSource {
    /// Returns an index uniformly drawn from `0..upper`; `upper` is never zero.
    fn pick(&mut self, upper: usize) -> usize;
}

impl RandomSource for ChaCha8Rng {
    fn pick(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }
}

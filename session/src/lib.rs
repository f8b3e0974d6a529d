#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Facade wiring the Code Defence world to its systems.
//!
//! A [`Session`] owns the world, the economy clock, the wave scheduler and the
//! notifier. Player operations are applied immediately and return the
//! rejection, if any, after it has been reported through the configured
//! [`MessageChannel`]. [`Session::advance`] applies a tick, lets the systems
//! react to the elapsed time, and applies the commands they emit before
//! returning.

mod config;
mod placement;

use std::{fmt, time::Duration};

use code_defence_core::{
    Command, Event, GameStatus, MessageChannel, MobSpawnConsumer, MobSpawnEvent,
    PlacementProvider, Position, RandomSource, Recipe, Rejection, UnitId, UnitView,
    UpgradeableStat,
};
use code_defence_system_economy::{Config as EconomyConfig, EconomyClock};
use code_defence_system_notifications::Notifier;
use code_defence_system_waves::{Config as WavesConfig, WaveScheduler};
use code_defence_world::{self as world, query, Services, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

pub use code_defence_system_waves::WavePhase;
pub use config::{BoardSize, ConfigError, GameConfig, SUPPORTED_CONFIG_VERSION};
pub use placement::GridPlacement;

/// External collaborators a session delegates to.
pub struct Collaborators {
    /// Provides board positions for new units.
    pub placement: Box<dyn PlacementProvider>,
    /// Draws archetypes for generated units.
    pub random: Box<dyn RandomSource>,
    /// Receives player-facing rejection messages.
    pub messages: Box<dyn MessageChannel>,
}

impl Collaborators {
    /// Grid placement over the configured board and a seeded generator.
    #[must_use]
    pub fn seeded(config: &GameConfig, seed: u64, messages: Box<dyn MessageChannel>) -> Self {
        let placement = GridPlacement::new(config.board());
        debug!(cells = placement.capacity(), seed, "seeded collaborators");
        Self {
            placement: Box::new(placement),
            random: Box::new(ChaCha8Rng::seed_from_u64(seed)),
            messages,
        }
    }
}

/// Running game wired to its systems.
pub struct Session {
    world: World,
    economy: EconomyClock,
    waves: WaveScheduler,
    notifier: Notifier,
    collaborators: Collaborators,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("world", &self.world)
            .field("economy", &self.economy)
            .field("waves", &self.waves)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session with stopped timers from a validated configuration.
    #[must_use]
    pub fn new(config: &GameConfig, collaborators: Collaborators) -> Self {
        let rules = config.rules();
        let world = World::with_status(config.catalog().clone(), rules, config.status());
        info!(
            archetypes = config.catalog().iter().count(),
            stages = config.stages().len(),
            "session created"
        );

        Self {
            world,
            economy: EconomyClock::new(EconomyConfig::new(rules.income_interval)),
            waves: WaveScheduler::new(
                WavesConfig::new(rules.stage_duration),
                config.stages().to_vec(),
            ),
            notifier: Notifier::new(),
            collaborators,
        }
    }

    /// Welcome banner adapters may display when the game opens.
    #[must_use]
    pub fn welcome_banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Starts income accrual, replacing any running timer.
    pub fn start_economy(&mut self) {
        self.economy.start();
    }

    /// Stops income accrual.
    pub fn stop_economy(&mut self) {
        self.economy.stop();
    }

    /// Starts the wave sequence, or resumes it after a stop.
    pub fn start_waves(&mut self) {
        self.waves.start();
    }

    /// Pauses the wave sequence.
    pub fn stop_waves(&mut self) {
        self.waves.stop();
    }

    /// Advances simulated time, delivering every spawn burst that came due.
    pub fn advance(&mut self, dt: Duration, spawns: &mut dyn MobSpawnConsumer) {
        let events = self.execute(Command::Tick { dt });

        let mut commands = Vec::new();
        self.economy.handle(&events, &mut commands);
        let mut bursts: Vec<MobSpawnEvent> = Vec::new();
        self.waves.handle(&events, &mut bursts);

        for command in commands {
            let _ = self.execute(command);
        }
        for burst in bursts {
            debug!(stage = burst.stage, mob = %burst.mob, count = burst.count, "spawning mobs");
            spawns.receive(burst);
        }
    }

    /// Raises an upgradeable status if the balance covers its cost.
    pub fn upgrade_status(&mut self, stat: UpgradeableStat) -> Result<(), Rejection> {
        self.perform(Command::UpgradeStatus { stat })
    }

    /// Buys a randomly drawn grade-one unit.
    pub fn generate_unit(&mut self) -> Result<(), Rejection> {
        self.perform(Command::GenerateUnit)
    }

    /// Selects a unit, or clears the selection with `None`.
    pub fn select_unit(&mut self, unit: Option<UnitId>) -> Result<(), Rejection> {
        self.perform(Command::SelectUnit { unit })
    }

    /// Moves the selected unit to the provided cell.
    pub fn relocate_selected_unit(&mut self, x: u32, y: u32) -> Result<(), Rejection> {
        self.perform(Command::RelocateSelectedUnit {
            position: Position::new(x, y),
        })
    }

    /// Sells the selected unit for its archetype's resale value.
    pub fn sell_selected_unit(&mut self) -> Result<(), Rejection> {
        self.perform(Command::SellSelectedUnit)
    }

    /// Fuses owned units into the recipe's result.
    pub fn upgrade_unit(&mut self, recipe: Recipe) -> Result<(), Rejection> {
        self.perform(Command::UpgradeUnit { recipe })
    }

    /// Snapshot of the game status.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        query::status(&self.world)
    }

    /// Snapshot of the units in insertion order.
    #[must_use]
    pub fn units(&self) -> UnitView {
        query::unit_view(&self.world)
    }

    /// Currently selected unit, if any.
    #[must_use]
    pub fn selected_unit(&self) -> Option<UnitId> {
        query::selected_unit(&self.world)
    }

    /// Recipes the owned units currently satisfy.
    #[must_use]
    pub fn satisfiable_recipes(&self) -> Vec<Recipe> {
        query::satisfiable_recipes(&self.world)
    }

    /// Progression state of the wave sequence.
    #[must_use]
    pub fn wave_phase(&self) -> WavePhase {
        self.waves.phase()
    }

    /// Reports whether income is currently accruing.
    #[must_use]
    pub fn economy_running(&self) -> bool {
        self.economy.is_running()
    }

    /// Total simulated time applied through [`Session::advance`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        query::elapsed(&self.world)
    }

    /// Number of rejection messages delivered so far.
    #[must_use]
    pub fn messages_delivered(&self) -> u64 {
        self.notifier.delivered()
    }

    fn perform(&mut self, command: Command) -> Result<(), Rejection> {
        let events = self.execute(command);
        match events.into_iter().find_map(|event| match event {
            Event::OperationRejected { reason } => Some(reason),
            _ => None,
        }) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    fn execute(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        let mut services = Services {
            placement: self.collaborators.placement.as_mut(),
            random: self.collaborators.random.as_mut(),
        };
        world::apply(&mut self.world, command, &mut services, &mut events);
        self.notifier
            .handle(&events, self.collaborators.messages.as_mut());
        events
    }
}

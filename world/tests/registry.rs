use std::collections::VecDeque;

use code_defence_core::{
    ArchetypeName, AttackType, Command, Event, GameStatus, PlacementProvider, Position,
    RandomSource, Recipe, Rejection, Rules, UnitArchetype, UnitSnapshot,
};
use code_defence_world::{self as world, query, Catalog, Services, World};

/// Replays a fixed sequence of archetype draws, repeating the last one.
struct ScriptedDraw {
    picks: VecDeque<usize>,
    last: usize,
}

impl ScriptedDraw {
    fn new(picks: &[usize]) -> Self {
        Self {
            picks: picks.iter().copied().collect(),
            last: 0,
        }
    }
}

impl RandomSource for ScriptedDraw {
    fn pick(&mut self, _upper: usize) -> usize {
        if let Some(pick) = self.picks.pop_front() {
            self.last = pick;
        }
        self.last
    }
}

/// Places units on the first free cell of a single row.
struct Row {
    width: u32,
}

impl PlacementProvider for Row {
    fn find_open_placement(&mut self, existing: &[UnitSnapshot]) -> Option<Position> {
        (0..self.width)
            .map(|x| Position::new(x, 0))
            .find(|cell| existing.iter().all(|unit| unit.position != *cell))
    }
}

struct Harness {
    world: World,
    placement: Row,
    random: ScriptedDraw,
}

impl Harness {
    fn new(money: u64, rules: Rules) -> Self {
        let status = GameStatus {
            money,
            ..GameStatus::default()
        };
        Self {
            world: World::with_status(catalog(), rules, status),
            placement: Row { width: 64 },
            random: ScriptedDraw::new(&[0]),
        }
    }

    fn run(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        let mut services = Services {
            placement: &mut self.placement,
            random: &mut self.random,
        };
        world::apply(&mut self.world, command, &mut services, &mut events);
        events
    }

    fn money(&self) -> u64 {
        query::status(&self.world).money
    }

    fn unit_count(&self) -> usize {
        query::unit_count(&self.world)
    }
}

fn name(value: &str) -> ArchetypeName {
    ArchetypeName::new(value)
}

fn archetype(value: &str, grade: u8, upgrades: Vec<Recipe>, resale_value: u64) -> UnitArchetype {
    UnitArchetype {
        name: name(value),
        description: value.to_owned(),
        grade,
        attack_type: AttackType::Basic,
        damage: 1,
        speed: u32::from(grade),
        reload: 1,
        upgrades,
        resale_value,
    }
}

fn typescript_recipe() -> Recipe {
    Recipe::new(name("typescript"), vec![name("javascript"), name("javascript")])
}

fn web_recipe() -> Recipe {
    Recipe::new(name("web"), vec![name("html"), name("css")])
}

fn catalog() -> Catalog {
    Catalog::new(vec![
        archetype("javascript", 1, vec![typescript_recipe()], 5),
        archetype("html", 1, vec![web_recipe()], 3),
        archetype("css", 1, Vec::new(), 4),
        archetype("typescript", 2, Vec::new(), 12),
        archetype("web", 2, Vec::new(), 15),
    ])
    .expect("catalog is valid")
}

fn rejections(events: &[Event]) -> Vec<Rejection> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::OperationRejected { reason } => Some(reason.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn generate_then_fuse_into_typescript() {
    let mut harness = Harness::new(20, Rules::default());

    let _ = harness.run(Command::GenerateUnit);
    let _ = harness.run(Command::GenerateUnit);
    assert_eq!(harness.money(), 0);
    assert_eq!(harness.unit_count(), 2);

    let events = harness.run(Command::UpgradeUnit {
        recipe: typescript_recipe(),
    });

    let units = query::unit_view(&harness.world).into_vec();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].archetype, name("typescript"));
    assert_eq!(harness.money(), 0, "fusion is free");
    assert!(matches!(
        &events[0],
        Event::UnitsFused { consumed, .. } if consumed.len() == 2
    ));
}

#[test]
fn generation_is_refused_without_funds() {
    let mut harness = Harness::new(9, Rules::default());

    let events = harness.run(Command::GenerateUnit);

    assert_eq!(
        rejections(&events),
        vec![Rejection::InsufficientFunds {
            required: 10,
            available: 9
        }]
    );
    assert_eq!(harness.money(), 9);
    assert_eq!(harness.unit_count(), 0);
}

#[test]
fn generation_at_the_limit_succeeds_once_more() {
    let rules = Rules {
        unit_limit: 2,
        ..Rules::default()
    };
    let mut harness = Harness::new(100, rules);

    for _ in 0..2 {
        assert!(rejections(&harness.run(Command::GenerateUnit)).is_empty());
    }
    assert_eq!(harness.unit_count(), 2);

    let at_limit = harness.run(Command::GenerateUnit);
    assert!(
        rejections(&at_limit).is_empty(),
        "the limit blocks only once it is exceeded"
    );
    assert_eq!(harness.unit_count(), 3);

    let beyond = harness.run(Command::GenerateUnit);
    assert_eq!(
        rejections(&beyond),
        vec![Rejection::UnitLimitExceeded { limit: 2 }]
    );
    assert_eq!(harness.unit_count(), 3);
    assert_eq!(harness.money(), 70);
}

#[test]
fn missing_placement_keeps_money() {
    let mut harness = Harness::new(30, Rules::default());
    harness.placement = Row { width: 1 };

    let _ = harness.run(Command::GenerateUnit);
    let events = harness.run(Command::GenerateUnit);

    assert_eq!(rejections(&events), vec![Rejection::NoOpenPlacement]);
    assert_eq!(harness.money(), 20, "money is debited only after placement");
    assert_eq!(harness.unit_count(), 1);
}

#[test]
fn generation_draws_through_the_random_source() {
    let mut harness = Harness::new(30, Rules::default());
    harness.random = ScriptedDraw::new(&[2, 1, 0]);

    for _ in 0..3 {
        let _ = harness.run(Command::GenerateUnit);
    }

    let archetypes: Vec<ArchetypeName> = query::unit_view(&harness.world)
        .iter()
        .map(|unit| unit.archetype.clone())
        .collect();
    assert_eq!(
        archetypes,
        vec![name("css"), name("html"), name("javascript")],
        "typescript is grade two and never drawn"
    );
}

#[test]
fn selling_credits_the_archetype_resale_value() {
    let mut harness = Harness::new(10, Rules::default());
    harness.random = ScriptedDraw::new(&[2]);
    let _ = harness.run(Command::GenerateUnit);
    let unit = query::unit_view(&harness.world).into_vec()[0].id;

    let _ = harness.run(Command::SelectUnit { unit: Some(unit) });
    let events = harness.run(Command::SellSelectedUnit);

    assert_eq!(harness.money(), 4, "css resells for four");
    assert_eq!(harness.unit_count(), 0);
    assert_eq!(query::selected_unit(&harness.world), None);
    assert!(events.contains(&Event::UnitSold {
        unit,
        archetype: name("css"),
        refund: 4,
    }));
}

#[test]
fn selling_without_selection_changes_nothing() {
    let mut harness = Harness::new(5, Rules::default());

    let events = harness.run(Command::SellSelectedUnit);

    assert!(events.is_empty(), "no success and no failure is reported");
    assert_eq!(harness.money(), 5);
}

#[test]
fn relocation_moves_the_unit_and_clears_selection() {
    let mut harness = Harness::new(10, Rules::default());
    let _ = harness.run(Command::GenerateUnit);
    let unit = query::unit_view(&harness.world).into_vec()[0].id;

    let _ = harness.run(Command::SelectUnit { unit: Some(unit) });
    let events = harness.run(Command::RelocateSelectedUnit {
        position: Position::new(7, 9),
    });

    let moved = query::unit(&harness.world, unit).expect("unit still exists");
    assert_eq!(moved.position, Position::new(7, 9));
    assert_eq!(query::selected_unit(&harness.world), None);
    assert_eq!(
        events,
        vec![
            Event::UnitRelocated {
                unit,
                from: Position::new(0, 0),
                to: Position::new(7, 9),
            },
            Event::UnitSelected { unit: None },
        ]
    );
}

#[test]
fn relocation_without_selection_is_silent() {
    let mut harness = Harness::new(10, Rules::default());
    let _ = harness.run(Command::GenerateUnit);

    let events = harness.run(Command::RelocateSelectedUnit {
        position: Position::new(7, 9),
    });

    assert!(events.is_empty());
    let unit = &query::unit_view(&harness.world).into_vec()[0];
    assert_eq!(unit.position, Position::new(0, 0));
}

#[test]
fn selecting_a_sold_unit_is_stale() {
    let mut harness = Harness::new(10, Rules::default());
    let _ = harness.run(Command::GenerateUnit);
    let unit = query::unit_view(&harness.world).into_vec()[0].id;
    let _ = harness.run(Command::SelectUnit { unit: Some(unit) });
    let _ = harness.run(Command::SellSelectedUnit);

    let events = harness.run(Command::SelectUnit { unit: Some(unit) });

    assert_eq!(
        rejections(&events),
        vec![Rejection::StalePlacementRequest { unit }]
    );
    assert_eq!(query::selected_unit(&harness.world), None);
}

#[test]
fn failed_fusion_is_idempotent() {
    let mut harness = Harness::new(10, Rules::default());
    let _ = harness.run(Command::GenerateUnit);
    let before = query::unit_view(&harness.world).into_vec();

    let first = harness.run(Command::UpgradeUnit {
        recipe: typescript_recipe(),
    });
    let second = harness.run(Command::UpgradeUnit {
        recipe: typescript_recipe(),
    });

    let expected = vec![Rejection::MissingFusionComponents {
        missing: vec![name("javascript")],
    }];
    assert_eq!(rejections(&first), expected);
    assert_eq!(rejections(&second), expected);
    assert_eq!(query::unit_view(&harness.world).into_vec(), before);
    assert_eq!(harness.money(), 0);
}

#[test]
fn fusion_consumes_first_matches_and_keeps_the_rest() {
    let mut harness = Harness::new(40, Rules::default());
    harness.random = ScriptedDraw::new(&[0, 1, 0, 0]);
    for _ in 0..4 {
        let _ = harness.run(Command::GenerateUnit);
    }
    let before = query::unit_view(&harness.world).into_vec();

    let events = harness.run(Command::UpgradeUnit {
        recipe: typescript_recipe(),
    });

    let after = query::unit_view(&harness.world).into_vec();
    assert_eq!(after.len(), before.len() - 2 + 1);
    assert_eq!(after[0].id, before[1].id, "html survives");
    assert_eq!(after[1].id, before[3].id, "the last javascript survives");
    assert_eq!(after[2].archetype, name("typescript"));
    match &events[0] {
        Event::UnitsFused { consumed, .. } => {
            assert_eq!(consumed, &vec![before[0].id, before[2].id]);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn fusion_rejects_recipes_outside_the_catalog() {
    let mut harness = Harness::new(10, Rules::default());

    let unknown_result = harness.run(Command::UpgradeUnit {
        recipe: Recipe::new(name("rust"), vec![name("javascript")]),
    });
    let free_unit = harness.run(Command::UpgradeUnit {
        recipe: Recipe::new(name("typescript"), Vec::new()),
    });

    assert_eq!(
        rejections(&unknown_result),
        vec![Rejection::UnknownArchetype { name: name("rust") }]
    );
    assert_eq!(
        rejections(&free_unit),
        vec![Rejection::UnknownRecipe {
            result: name("typescript")
        }]
    );
    assert_eq!(harness.unit_count(), 0);
}

#[test]
fn fusion_clears_selection() {
    let mut harness = Harness::new(20, Rules::default());
    let _ = harness.run(Command::GenerateUnit);
    let _ = harness.run(Command::GenerateUnit);
    let unit = query::unit_view(&harness.world).into_vec()[0].id;
    let _ = harness.run(Command::SelectUnit { unit: Some(unit) });

    let _ = harness.run(Command::UpgradeUnit {
        recipe: typescript_recipe(),
    });

    assert_eq!(query::selected_unit(&harness.world), None);
    assert!(query::unit(&harness.world, unit).is_none());
}

#[test]
fn satisfiable_recipes_follow_the_board() {
    let mut harness = Harness::new(20, Rules::default());
    let _ = harness.run(Command::GenerateUnit);
    assert!(query::satisfiable_recipes(&harness.world).is_empty());

    let _ = harness.run(Command::GenerateUnit);
    assert_eq!(
        query::satisfiable_recipes(&harness.world),
        vec![typescript_recipe()]
    );
}

#[test]
fn fusion_accepts_components_in_any_order() {
    let mut harness = Harness::new(20, Rules::default());
    harness.random = ScriptedDraw::new(&[1, 2]);
    let _ = harness.run(Command::GenerateUnit);
    let _ = harness.run(Command::GenerateUnit);

    let events = harness.run(Command::UpgradeUnit {
        recipe: Recipe::new(name("web"), vec![name("css"), name("html")]),
    });

    assert!(rejections(&events).is_empty());
    let units = query::unit_view(&harness.world).into_vec();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].archetype, name("web"));
}

#[test]
fn fusion_without_placement_consumes_nothing() {
    let mut harness = Harness::new(20, Rules::default());
    harness.placement = Row { width: 2 };
    let _ = harness.run(Command::GenerateUnit);
    let _ = harness.run(Command::GenerateUnit);
    let before = query::unit_view(&harness.world).into_vec();
    let _ = harness.run(Command::SelectUnit {
        unit: Some(before[0].id),
    });

    let events = harness.run(Command::UpgradeUnit {
        recipe: typescript_recipe(),
    });

    assert_eq!(
        events,
        vec![Event::OperationRejected {
            reason: Rejection::NoOpenPlacement
        }]
    );
    assert_eq!(query::unit_view(&harness.world).into_vec(), before);
    assert_eq!(query::selected_unit(&harness.world), Some(before[0].id));
    assert_eq!(harness.money(), 0);
}

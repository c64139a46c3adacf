use std::time::Duration;

use tick_tactics_core::{Command, Direction, EntityId, Event};
use tick_tactics_world::{self as world, query, GameConfig, Level, World};

fn build(rows: &[&str]) -> World {
    let level = Level::from_rows("session", rows).expect("valid level");
    World::new(&level, GameConfig::default())
}

fn submit(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn tick(world: &mut World) -> Vec<Event> {
    submit(
        world,
        Command::Tick {
            dt: Duration::from_millis(500),
        },
    )
}

fn count(events: &[Event], expected: &Event) -> usize {
    events.iter().filter(|event| *event == expected).count()
}

fn slot(world: &World, index: usize) -> EntityId {
    query::session(world).selectable[index].expect("player slot")
}

#[test]
fn collecting_every_coin_wins_once_then_finishes() {
    let mut world = build(&["1cc"]);
    let player = slot(&world, 0);
    for _ in 0..2 {
        let _ = submit(
            &mut world,
            Command::QueueMove {
                entity: player,
                direction: Direction::East,
            },
        );
    }

    let events = tick(&mut world);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::CoinCollected { remaining: 1, .. })));
    assert!(!query::is_won(&world));

    let events = tick(&mut world);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::CoinCollected { remaining: 0, .. })));
    assert_eq!(events.last(), Some(&Event::LevelWon));
    assert!(query::is_won(&world));

    let mut later = Vec::new();
    for _ in 0..10 {
        later.extend(tick(&mut world));
    }
    assert_eq!(count(&later, &Event::LevelWon), 0);
    assert_eq!(count(&later, &Event::LevelFinished), 1);
    assert!(query::session(&world).level_finished);
}

#[test]
fn level_finishes_after_the_win_delay() {
    let mut world = build(&["1c"]);
    let player = slot(&world, 0);
    let _ = submit(
        &mut world,
        Command::QueueMove {
            entity: player,
            direction: Direction::East,
        },
    );
    let events = tick(&mut world);
    assert!(events.contains(&Event::LevelWon));

    for _ in 0..3 {
        assert_eq!(count(&tick(&mut world), &Event::LevelFinished), 0);
    }
    assert_eq!(count(&tick(&mut world), &Event::LevelFinished), 1);
}

#[test]
fn level_without_coins_is_never_won() {
    let mut world = build(&["1a"]);
    for _ in 0..10 {
        let events = tick(&mut world);
        assert_eq!(count(&events, &Event::LevelWon), 0);
    }
    assert!(!query::is_won(&world));
}

#[test]
fn losing_one_player_selects_the_survivor_and_losing_both_ends_the_game() {
    let mut world = build(&["1a2", "sas"]);
    let first = slot(&world, 0);
    let second = slot(&world, 1);
    let _ = submit(
        &mut world,
        Command::QueueMove {
            entity: first,
            direction: Direction::South,
        },
    );

    let _ = tick(&mut world);
    let events = tick(&mut world);
    assert!(events.contains(&Event::SelectionChanged {
        entity: Some(second)
    }));
    assert_eq!(query::selected_entity(&world), Some(second));
    assert!(!query::is_game_over(&world));
    assert_eq!(query::session(&world).selectable, vec![None, Some(second)]);

    let events = submit(&mut world, Command::SelectSlot { slot: 0 });
    assert!(events.is_empty());

    let _ = submit(
        &mut world,
        Command::QueueMove {
            entity: second,
            direction: Direction::South,
        },
    );
    let mut later = Vec::new();
    for _ in 0..12 {
        later.extend(tick(&mut world));
    }
    assert_eq!(count(&later, &Event::GameOver), 1);
    assert!(query::is_game_over(&world));
    assert_eq!(query::selected_entity(&world), None);
    assert_eq!(query::session(&world).selectable, vec![None, None]);
}

#[test]
fn selecting_slots_routes_input_between_players() {
    let mut world = build(&["1a2"]);
    let second = slot(&world, 1);

    let events = submit(&mut world, Command::SelectSlot { slot: 1 });
    assert_eq!(
        events,
        vec![Event::SelectionChanged {
            entity: Some(second)
        }]
    );
    assert!(submit(&mut world, Command::SelectSlot { slot: 1 }).is_empty());
    assert!(submit(&mut world, Command::SelectSlot { slot: 4 }).is_empty());
}

#[test]
fn pause_freezes_the_level_clock() {
    let mut world = build(&["1a"]);
    let _ = tick(&mut world);

    let events = submit(&mut world, Command::SetPaused { paused: true });
    assert_eq!(events, vec![Event::PauseChanged { paused: true }]);
    assert!(tick(&mut world).is_empty());
    assert_eq!(query::level_time(&world), Duration::from_millis(500));

    let _ = submit(&mut world, Command::SetPaused { paused: false });
    let _ = tick(&mut world);
    assert_eq!(query::level_time(&world), Duration::from_secs(1));
}

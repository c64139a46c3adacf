use std::time::Duration;

use tick_tactics_core::{CellCoord, Command, Direction, Event};
use tick_tactics_system_overlay::{Overlay, PushHint, PushMarker};
use tick_tactics_world::{self as world, query, GameConfig, Level, World};

fn submit(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

#[test]
fn overlay_reflects_the_live_world() {
    let level = Level::from_rows("overlay", &["waaa", "w1ta", "wwaa"]).expect("valid level");
    let mut world = World::new(&level, GameConfig::default());
    let player = query::selected_entity(&world).expect("player");

    let _ = submit(
        &mut world,
        Command::QueuePush {
            entity: player,
            direction: Direction::East,
        },
    );
    let _ = submit(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(250),
        },
    );

    let snapshot = query::entity(&world, player).expect("player snapshot");
    let frame = Overlay::build(&snapshot, query::level_time(&world), &world);

    assert_eq!(
        frame.pushes,
        vec![PushMarker {
            from: CellCoord::new(2, 1),
            to: CellCoord::new(3, 1),
            beneficial: true,
        }]
    );
    assert_eq!(frame.hint(Direction::East), PushHint::Beneficial);
    assert_eq!(frame.hint(Direction::West), PushHint::Blocked);
    assert_eq!(frame.hint(Direction::South), PushHint::Blocked);
    assert_eq!(frame.hint(Direction::North), PushHint::Allowed);
    assert_eq!(frame.completes_at, Duration::from_millis(500));
    assert!(!frame.stalled);
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Tick Tactics levels headlessly.

mod render;
mod script;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use script::Step;
use tick_tactics_core::{Command, Event};
use tick_tactics_system_campaign::{Campaign, Transition};
use tick_tactics_world::{self as world, query, GameConfig, Level, World};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Headless driver for Tick Tactics levels.
#[derive(Debug, Parser)]
#[command(name = "tick-tactics", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays the levels in order, feeding each one the scripted inputs.
    Run(RunArgs),
    /// Loads every level file and reports the first authoring error.
    Validate {
        /// Level description files.
        #[arg(required = true)]
        levels: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Level description files, played in order.
    #[arg(required = true)]
    levels: Vec<PathBuf>,
    /// Timing configuration overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Scripted inputs, one `--script` per level in order.
    #[arg(long)]
    script: Vec<String>,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    dt_ms: u64,
    /// Ticks a level may run after its script before the driver gives up.
    #[arg(long, default_value_t = 2_000)]
    max_ticks: u32,
    /// Prints the board and the selected player's plan after every wait.
    #[arg(long)]
    board: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        CliCommand::Run(args) => run(&args),
        CliCommand::Validate { levels } => validate(&levels),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_level(path: &Path) -> Result<Level> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    Level::from_toml_str(&contents)
        .with_context(|| format!("invalid level file {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    GameConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid config file {}", path.display()))
}

fn validate(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let level = load_level(path)?;
        println!(
            "{}: `{}` {}x{}, {} player(s), {} coin(s)",
            path.display(),
            level.name(),
            level.columns(),
            level.rows(),
            level.player_slots(),
            level.coin_count()
        );
    }
    Ok(())
}

fn run(args: &RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let levels = args
        .levels
        .iter()
        .map(|path| load_level(path))
        .collect::<Result<Vec<_>>>()?;
    let scripts = args
        .script
        .iter()
        .enumerate()
        .map(|(index, source)| {
            script::parse(source).with_context(|| format!("invalid script #{}", index + 1))
        })
        .collect::<Result<Vec<_>>>()?;

    let dt = Duration::from_millis(args.dt_ms);
    let mut campaign = Campaign::new(levels.len());
    while let Some(level) = levels.get(campaign.current_level()) {
        let index = campaign.current_level();
        let steps = scripts.get(index).map_or(&[][..], Vec::as_slice);
        let mut driver = Driver::new(level, config.clone(), dt, args.board);
        tracing::info!(level = level.name(), index, "playing level");

        match driver.play(steps, args.max_ticks, &mut campaign) {
            Some(Transition::Advance { level }) => {
                println!("level {} finished, advancing to level {}", index + 1, level + 1);
            }
            Some(Transition::Completed) => {
                println!("campaign complete");
                return Ok(());
            }
            Some(Transition::Restart { level }) => {
                println!("game over on level {}", level + 1);
                return Ok(());
            }
            None => {
                println!(
                    "level {} unresolved after {} extra ticks",
                    index + 1,
                    args.max_ticks
                );
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Feeds scripted inputs and ticks into one world, logging every event.
struct Driver {
    world: World,
    dt: Duration,
    board: bool,
    transition: Option<Transition>,
}

impl Driver {
    fn new(level: &Level, config: GameConfig, dt: Duration, board: bool) -> Self {
        Self {
            world: World::new(level, config),
            dt,
            board,
            transition: None,
        }
    }

    fn play(
        &mut self,
        steps: &[Step],
        max_ticks: u32,
        campaign: &mut Campaign,
    ) -> Option<Transition> {
        if self.board {
            self.show();
        }
        for step in steps {
            self.perform(*step, campaign);
            if self.transition.is_some() {
                return self.transition;
            }
        }
        for _ in 0..max_ticks {
            self.tick(campaign);
            if self.transition.is_some() {
                break;
            }
        }
        if self.board {
            self.show();
        }
        self.transition
    }

    fn perform(&mut self, step: Step, campaign: &mut Campaign) {
        let selected = query::selected_entity(&self.world);
        let command = match step {
            Step::Wait(ticks) => {
                for _ in 0..ticks {
                    self.tick(campaign);
                    if self.transition.is_some() {
                        return;
                    }
                }
                if self.board {
                    self.show();
                }
                return;
            }
            Step::Select(slot) => Command::SelectSlot { slot },
            Step::TogglePause => Command::SetPaused {
                paused: !query::session(&self.world).paused,
            },
            Step::Move(direction) => match selected {
                Some(entity) => Command::QueueMove { entity, direction },
                None => return,
            },
            Step::Push(direction) => match selected {
                Some(entity) => Command::QueuePush { entity, direction },
                None => return,
            },
            Step::Undo => match selected {
                Some(entity) => Command::PopLastAction { entity },
                None => return,
            },
            Step::Clear => match selected {
                Some(entity) => Command::ClearActions { entity },
                None => return,
            },
        };
        let _ = self.submit(command);
    }

    fn tick(&mut self, campaign: &mut Campaign) {
        let events = self.submit(Command::Tick { dt: self.dt });
        if let Some(transition) = campaign.handle(&events) {
            self.transition = Some(transition);
        }
    }

    fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        let clock = query::level_time(&self.world).as_secs_f32();
        for event in events
            .iter()
            .filter(|event| !matches!(event, Event::TimeAdvanced { .. }))
        {
            println!("[{clock:>8.3}s] {event:?}");
        }
        events
    }

    fn show(&self) {
        print!("{}", render::board(&self.world));
        if let Some(plan) = render::plan(&self.world) {
            println!("{plan}");
        }
    }
}

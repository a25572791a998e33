#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Mine Hunt in the terminal.

mod layout_transfer;

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use mine_hunt_core::{Command, Direction, Event, Stage, Winner};
use mine_hunt_system_generation::{self as generation, Generation, Population};
use mine_hunt_system_turn::{self as turn, Turn};
use mine_hunt_world::{self as world, query, World};
use serde::Serialize;

use crate::layout_transfer::BoardLayout;

/// Command-line arguments accepted by the Mine Hunt binary.
#[derive(Debug, Parser)]
#[command(
    name = "mine-hunt",
    about = "Arm every mine before the pursuers catch you"
)]
struct CliArgs {
    /// Number of board columns.
    #[arg(long, default_value_t = 10)]
    width: u32,
    /// Number of board rows.
    #[arg(long, default_value_t = 10)]
    height: u32,
    /// Unarmed mines scattered over the board.
    #[arg(long, default_value_t = 5)]
    mines: u32,
    /// Asteroids blocking movement.
    #[arg(long, default_value_t = 10)]
    asteroids: u32,
    /// Pursuing robots.
    #[arg(long, default_value_t = 3)]
    robots: u32,
    /// Seed for board generation and robot tie-breaking.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Layout code printed by an earlier game; replaces random generation.
    #[arg(long, value_name = "CODE")]
    layout: Option<String>,
    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Final state reported once a game ends.
#[derive(Debug, Serialize)]
struct Summary {
    winner: Winner,
    reason: &'static str,
    round: u32,
    inactive_mines: usize,
    robots: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Input {
    Move(Direction),
    Quit,
}

/// Entry point for the Mine Hunt command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = CliArgs::parse();
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(&args, stdin.lock(), stdout.lock())
}

fn run<R: BufRead, W: Write>(args: &CliArgs, input: R, mut output: W) -> Result<()> {
    let mut world = World::new();
    writeln!(output, "{}", query::welcome_banner(&world))?;

    prepare_board(&mut world, args)?;
    let layout = BoardLayout::capture(&world);
    writeln!(output, "Layout code: {}", layout.encode()?)?;

    let mut events = Vec::new();
    world::apply(&mut world, Command::BeginPlay, &mut events);
    ensure_setup_accepted(&events)?;

    let mut turn = Turn::new(turn::Config::new(args.seed));
    let mut lines = input.lines();
    while query::stage(&world) == Stage::Playing {
        render(&world, &mut output)?;
        write!(output, "move (w/a/s/d, q to quit)> ")?;
        output.flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            log::info!("input closed, ending the game");
            world::apply(&mut world, Command::EndEarly, &mut events);
            break;
        };
        let line = line.context("failed to read from stdin")?;

        events.clear();
        match parse_input(&line) {
            Some(Input::Move(direction)) => turn.play_round(&mut world, direction, &mut events),
            Some(Input::Quit) => world::apply(&mut world, Command::EndEarly, &mut events),
            None => {
                writeln!(
                    output,
                    "Invalid key '{}', use w, a, s, d or q",
                    line.trim()
                )?;
                continue;
            }
        }

        for event in &events {
            if let Event::MoveRejected { reason, .. } = event {
                writeln!(output, "Move rejected: {reason}")?;
            }
        }
    }

    report(&world, args.json, &mut output)
}

fn prepare_board(world: &mut World, args: &CliArgs) -> Result<()> {
    let mut events = Vec::new();

    if let Some(code) = &args.layout {
        let layout = BoardLayout::decode(code).context("invalid --layout code")?;
        for command in layout.commands() {
            world::apply(world, command, &mut events);
        }
        return ensure_setup_accepted(&events);
    }

    world::apply(
        world,
        Command::ConfigureBoard {
            width: args.width,
            height: args.height,
        },
        &mut events,
    );
    ensure_setup_accepted(&events)?;

    let population = Population {
        units: 1,
        devices: args.mines,
        obstacles: args.asteroids,
        pursuers: args.robots,
    };
    let mut commands = Vec::new();
    Generation::new(generation::Config::new(args.seed)).handle(world, population, &mut commands);
    if commands.is_empty() {
        bail!(
            "a {}x{} board cannot hold {} entities",
            args.width,
            args.height,
            population.total()
        );
    }

    log::info!("generated board with seed {}", args.seed);
    for command in commands {
        world::apply(world, command, &mut events);
    }
    ensure_setup_accepted(&events)
}

fn ensure_setup_accepted(events: &[Event]) -> Result<()> {
    for event in events {
        if let Event::SetupRejected { reason } = event {
            bail!("board setup rejected: {reason}");
        }
    }
    Ok(())
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim() {
        "w" => Some(Input::Move(Direction::North)),
        "a" => Some(Input::Move(Direction::West)),
        "s" => Some(Input::Move(Direction::South)),
        "d" => Some(Input::Move(Direction::East)),
        "q" => Some(Input::Quit),
        _ => None,
    }
}

fn render<W: Write>(world: &World, output: &mut W) -> Result<()> {
    let stats = query::stats(world);
    write!(output, "{}", query::dump(world))?;
    writeln!(
        output,
        "Round {} | inactive mines {} | robots {}",
        stats.round, stats.unarmed_devices, stats.pursuers
    )?;
    Ok(())
}

fn report<W: Write>(world: &World, json: bool, output: &mut W) -> Result<()> {
    let stats = query::stats(world);
    let summary = Summary {
        winner: query::winner(world),
        reason: query::win_reason(world),
        round: stats.round,
        inactive_mines: stats.unarmed_devices,
        robots: stats.pursuers,
    };

    if json {
        let encoded =
            serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        writeln!(output, "{encoded}")?;
        return Ok(());
    }

    write!(output, "{}", query::dump(world))?;
    writeln!(output, "{}", winner_label(summary.winner))?;
    writeln!(output, "{}", summary.reason)?;
    Ok(())
}

fn winner_label(winner: Winner) -> &'static str {
    match winner {
        Winner::Unresolved => "The game is undecided.",
        Winner::UnitWins => "You win!",
        Winner::PursuersWin => "The robots win!",
        Winner::Draw => "It's a draw.",
    }
}

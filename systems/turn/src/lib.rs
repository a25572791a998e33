#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round driver that sequences the unit, the pursuers and end-state checks.

use mine_hunt_core::{Command, Direction, EntityKind, Event, Stage};
use mine_hunt_system_pursuit::Pursuit;
use mine_hunt_world::{self as world, query, World};

/// Configuration parameters required to construct the round driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    pursuit: mine_hunt_system_pursuit::Config,
}

impl Config {
    /// Creates a configuration whose pursuers break ties using `rng_seed`.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            pursuit: mine_hunt_system_pursuit::Config::new(rng_seed),
        }
    }
}

/// Plays complete rounds against a world.
#[derive(Debug)]
pub struct Turn {
    pursuit: Pursuit,
}

impl Turn {
    /// Creates a new round driver using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            pursuit: Pursuit::new(config.pursuit),
        }
    }

    /// Plays one round: the unit moves, every pursuer acts, then the round closes.
    ///
    /// Pursuers act in board-scan order as it stood when the round began; a
    /// pursuer destroyed earlier in the round is skipped. The round closes
    /// even when the unit's move was rejected, as long as the game was in
    /// progress when the round started.
    pub fn play_round(
        &mut self,
        world: &mut World,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) {
        let playing = query::stage(world) == Stage::Playing;
        world::apply(world, Command::MoveUnit { direction }, out_events);
        if !playing {
            return;
        }

        let pursuers: Vec<_> = query::obtain(world, EntityKind::Pursuer)
            .into_iter()
            .map(|pursuer| pursuer.id)
            .collect();

        for pursuer in pursuers {
            if query::stage(world) != Stage::Playing {
                break;
            }
            if query::entity(world, pursuer).is_none() {
                continue;
            }

            world::apply(world, Command::SweepPursuer { pursuer }, out_events);
            if query::entity(world, pursuer).is_none() {
                continue;
            }

            let mut commands = Vec::new();
            self.pursuit.handle(world, pursuer, &mut commands);
            for command in commands {
                world::apply(world, command, out_events);
            }
        }

        world::apply(world, Command::CompleteRound, out_events);
        log::debug!("round {} ready", query::round(world));
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

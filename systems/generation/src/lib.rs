#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random board population for quick games.

use mine_hunt_core::{CellCoord, Command, Placement};
use mine_hunt_world::{query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the generation system.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration that seeds tile selection with `rng_seed`.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// How many entities of each kind a generated board receives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Population {
    /// Units to place; every unit after the first replaces its predecessor.
    pub units: u32,
    /// Unarmed devices to place.
    pub devices: u32,
    /// Obstacles to place.
    pub obstacles: u32,
    /// Pursuers to place.
    pub pursuers: u32,
}

impl Population {
    /// Total number of entities requested.
    #[must_use]
    pub fn total(&self) -> u64 {
        u64::from(self.units)
            + u64::from(self.devices)
            + u64::from(self.obstacles)
            + u64::from(self.pursuers)
    }

    fn placements(&self) -> impl Iterator<Item = Placement> {
        let units = std::iter::repeat(Placement::Unit).take(count(self.units));
        let devices =
            std::iter::repeat(Placement::Device { armed: false }).take(count(self.devices));
        let obstacles = std::iter::repeat(Placement::Obstacle).take(count(self.obstacles));
        let pursuers = std::iter::repeat(Placement::Pursuer).take(count(self.pursuers));
        units.chain(devices).chain(obstacles).chain(pursuers)
    }
}

/// Pure system that scatters entities over empty tiles.
#[derive(Debug)]
pub struct Generation {
    rng: ChaCha8Rng,
}

impl Generation {
    /// Creates a new generation system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Emits placement commands that put the requested population on empty tiles.
    ///
    /// Units go down first, then devices, obstacles and pursuers. Nothing is
    /// emitted when the board lacks enough empty tiles for everyone.
    pub fn handle(&mut self, world: &World, population: Population, out: &mut Vec<Command>) {
        let mut free = empty_cells(world);
        let available = u64::try_from(free.len()).unwrap_or(u64::MAX);
        if population.total() > available {
            log::warn!(
                "cannot place {} entities on {available} empty tiles",
                population.total()
            );
            return;
        }

        for placement in population.placements() {
            if free.is_empty() {
                break;
            }
            let index = self.rng.gen_range(0..free.len());
            let cell = free.swap_remove(index);
            out.push(Command::PlaceEntity { placement, cell });
        }
    }
}

fn empty_cells(world: &World) -> Vec<CellCoord> {
    let (width, height) = query::dimensions(world);
    (0..height)
        .flat_map(|row| (0..width).map(move |column| CellCoord::new(column, row)))
        .filter(|&cell| query::tile(world, cell).is_some_and(|tile| tile.is_empty()))
        .collect()
}

fn count(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

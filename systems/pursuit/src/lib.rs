#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuer decision making.
//!
//! Each round every surviving pursuer picks exactly one destination. Nearby
//! targets are taken directly; otherwise the pursuer follows the first step of
//! an A* route, detouring through unarmed devices when the unit looks well
//! protected.

use mine_hunt_core::{CellCoord, Command, EntityId, EntityKind, NavigationPolicy};
use mine_hunt_world::{query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the pursuit system.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration that seeds random tie-breaking with `rng_seed`.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that decides where pursuers step next.
#[derive(Debug)]
pub struct Pursuit {
    rng: ChaCha8Rng,
}

impl Pursuit {
    /// Creates a new pursuit system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Emits the step the provided pursuer should take this round, if any.
    ///
    /// The pursuer must already have survived its sweep for armed devices.
    pub fn handle(&mut self, world: &World, pursuer: EntityId, out: &mut Vec<Command>) {
        let Some(snapshot) = query::entity(world, pursuer) else {
            return;
        };
        if snapshot.kind() != EntityKind::Pursuer {
            return;
        }
        let Some(unit) = query::unit(world) else {
            return;
        };

        let here = snapshot.cell;
        let surrounding = query::neighbourhood(world, here, 1);

        let unit_cells = cells_where(world, &surrounding, |tile| tile.contains(EntityKind::Unit));
        if let Some(to) = self.choose(&unit_cells) {
            log::debug!("pursuer {pursuer:?} lunges at the unit on {to:?}");
            out.push(Command::StepPursuer { pursuer, to });
            return;
        }

        let device_cells = cells_where(world, &surrounding, |tile| tile.has_unarmed_device());
        if let Some(to) = self.choose(&device_cells) {
            log::debug!("pursuer {pursuer:?} heads for the device on {to:?}");
            out.push(Command::StepPursuer { pursuer, to });
            return;
        }

        if here == unit.cell {
            return;
        }

        let route = plan_route(world, here, unit.cell);
        if let Some(&to) = route.first() {
            out.push(Command::StepPursuer { pursuer, to });
        } else {
            log::debug!("pursuer {pursuer:?} has nowhere to go");
        }
    }

    fn choose(&mut self, cells: &[CellCoord]) -> Option<CellCoord> {
        if cells.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..cells.len());
        cells.get(index).copied()
    }
}

/// Route towards the unit, or towards an unarmed device when the unit is guarded.
fn plan_route(world: &World, from: CellCoord, unit: CellCoord) -> Vec<CellCoord> {
    let unarmed = query::unarmed_devices(world);
    if is_guarded(world, unit) && unarmed.len() > 1 {
        for device in &unarmed {
            let route = query::find_path(world, from, device.cell, NavigationPolicy::Pursuit);
            if !route.is_empty() {
                return route;
            }
        }
    }

    query::find_path(world, from, unit, NavigationPolicy::Pursuit)
}

/// The unit stands on a device or next to an armed one.
fn is_guarded(world: &World, unit: CellCoord) -> bool {
    let on_device =
        query::tile(world, unit).is_some_and(|tile| tile.contains(EntityKind::Device));
    let near_armed = query::neighbourhood(world, unit, 1)
        .into_iter()
        .filter_map(|cell| query::tile(world, cell))
        .any(|tile| tile.has_armed_device());
    on_device || near_armed
}

fn cells_where<F>(world: &World, cells: &[CellCoord], mut predicate: F) -> Vec<CellCoord>
where
    F: FnMut(&query::TileView<'_>) -> bool,
{
    cells
        .iter()
        .copied()
        .filter(|&cell| query::tile(world, cell).is_some_and(|tile| predicate(&tile)))
        .collect()
}

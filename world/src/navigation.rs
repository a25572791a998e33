//! A* route planning over the board.

use mine_hunt_core::{CellCoord, EntityKind, NavigationPolicy};

use super::World;

/// Extra cost charged for stepping onto, or next to, an armed device.
const ARMED_DEVICE_PENALTY: f64 = 10.0;
/// Discount for stepping onto an unarmed device.
const UNARMED_DEVICE_BONUS: f64 = 3.0;
/// Discount for stepping next to an unarmed device.
const NEARBY_UNARMED_DEVICE_BONUS: f64 = 2.0;

/// Search node stored in the arena; parents are arena indices.
#[derive(Clone, Copy, Debug)]
struct PathNode {
    cell: CellCoord,
    g: f64,
    f: f64,
    parent: Option<usize>,
}

/// Plans a route from `start` to `goal`, excluding `start`.
///
/// The open set is scanned linearly for the lowest `f`, the first entry
/// winning ties. Selecting a node drops every other open entry for the same
/// cell and closes it for good. A neighbour is only queued when no open entry
/// for that cell already reaches it as cheaply.
pub(crate) fn find_path(
    world: &World,
    start: CellCoord,
    goal: CellCoord,
    policy: NavigationPolicy,
) -> Vec<CellCoord> {
    if start == goal || !world.contains_cell(start) || !world.contains_cell(goal) {
        return Vec::new();
    }

    let mut closed = vec![false; world.tiles.len()];
    let mut arena = vec![PathNode {
        cell: start,
        g: 0.0,
        f: 0.0,
        parent: None,
    }];
    let mut open: Vec<usize> = vec![0];

    while let Some(&first) = open.first() {
        let mut selected = first;
        for &candidate in &open {
            if arena[candidate].f < arena[selected].f {
                selected = candidate;
            }
        }

        let current = arena[selected];
        open.retain(|&entry| arena[entry].cell != current.cell);
        if let Some(index) = world.index(current.cell) {
            closed[index] = true;
        }

        if current.cell == goal {
            return reconstruct(&arena, selected);
        }

        for neighbour in expansion(world, current.cell, policy) {
            let Some(index) = world.index(neighbour) else {
                continue;
            };
            if closed[index] || !is_expandable(world, neighbour, policy) {
                continue;
            }

            let g = current.g + step_cost(world, current.cell, neighbour, policy);
            let already_open = open
                .iter()
                .any(|&entry| arena[entry].cell == neighbour && arena[entry].g <= g);
            if already_open {
                continue;
            }

            arena.push(PathNode {
                cell: neighbour,
                g,
                f: g + neighbour.euclidean_distance(goal),
                parent: Some(selected),
            });
            open.push(arena.len() - 1);
        }
    }

    log::debug!("no route from {start:?} to {goal:?} under {policy:?}");
    Vec::new()
}

fn reconstruct(arena: &[PathNode], goal: usize) -> Vec<CellCoord> {
    let mut route = Vec::new();
    let mut cursor = Some(goal);
    while let Some(index) = cursor {
        let node = arena[index];
        if node.parent.is_none() {
            break;
        }
        route.push(node.cell);
        cursor = node.parent;
    }
    route.reverse();
    route
}

fn expansion(world: &World, cell: CellCoord, policy: NavigationPolicy) -> Vec<CellCoord> {
    match policy {
        NavigationPolicy::Orthogonal => orthogonal_neighbours(world, cell),
        NavigationPolicy::Pursuit => world.neighbourhood(cell, 1),
    }
}

/// Left, right, up, down; clipped to the board.
fn orthogonal_neighbours(world: &World, cell: CellCoord) -> Vec<CellCoord> {
    let candidates = [
        cell.column()
            .checked_sub(1)
            .map(|column| CellCoord::new(column, cell.row())),
        cell.column()
            .checked_add(1)
            .map(|column| CellCoord::new(column, cell.row())),
        cell.row()
            .checked_sub(1)
            .map(|row| CellCoord::new(cell.column(), row)),
        cell.row()
            .checked_add(1)
            .map(|row| CellCoord::new(cell.column(), row)),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter(|candidate| world.contains_cell(*candidate))
        .collect()
}

fn is_expandable(world: &World, cell: CellCoord, policy: NavigationPolicy) -> bool {
    let Some(tile) = world.tile(cell) else {
        return false;
    };

    match policy {
        NavigationPolicy::Orthogonal => tile.is_joinable(),
        NavigationPolicy::Pursuit => tile.is_joinable() && !tile.contains(EntityKind::Pursuer),
    }
}

fn step_cost(world: &World, from: CellCoord, to: CellCoord, policy: NavigationPolicy) -> f64 {
    let base = from.euclidean_distance(to);
    if policy == NavigationPolicy::Orthogonal {
        return base;
    }

    let Some(tile) = world.tile(to) else {
        return base;
    };

    let surroundings: Vec<_> = world
        .neighbourhood(to, 1)
        .into_iter()
        .filter_map(|cell| world.tile(cell))
        .collect();

    let mut cost = base;
    if tile.has_armed_device() {
        cost += ARMED_DEVICE_PENALTY;
    }
    if surroundings.iter().any(|nearby| nearby.has_armed_device()) {
        cost += ARMED_DEVICE_PENALTY;
    }
    if tile.has_unarmed_device() {
        cost -= UNARMED_DEVICE_BONUS;
    }
    if surroundings.iter().any(|nearby| nearby.has_unarmed_device()) {
        cost -= NEARBY_UNARMED_DEVICE_BONUS;
    }
    cost
}

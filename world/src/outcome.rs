//! End-of-game detection and winner classification.

use mine_hunt_core::{CellCoord, EndReason, EntityKind, NavigationPolicy, Winner};

use super::{navigation, World};

/// Reports the first end condition that holds, in priority order.
pub(crate) fn check_end(world: &World) -> Option<EndReason> {
    let Some(unit) = living_unit(world) else {
        return Some(EndReason::UnitCaught);
    };

    let pursuers: Vec<_> = world
        .entities_of(EntityKind::Pursuer)
        .map(|pursuer| pursuer.cell)
        .collect();
    if pursuers.is_empty() {
        return Some(EndReason::PursuersDestroyed);
    }

    let unarmed: Vec<_> = world
        .entities_of(EntityKind::Device)
        .filter(|device| device.state.is_unarmed_device())
        .map(|device| device.cell)
        .collect();
    if unarmed.is_empty() {
        return Some(EndReason::MinesExhausted);
    }

    let unit_can_reach_device = unarmed.iter().any(|&device| {
        !navigation::find_path(world, unit, device, NavigationPolicy::Orthogonal).is_empty()
    });
    if !unit_can_reach_device {
        return Some(EndReason::UnitStuck);
    }

    let pursuer_can_reach_unit = pursuers.iter().any(|&pursuer| {
        !navigation::find_path(world, pursuer, unit, NavigationPolicy::Pursuit).is_empty()
    });
    if !pursuer_can_reach_unit {
        return Some(EndReason::PursuersStuck);
    }

    None
}

/// Decides who won once the game is known to be over.
pub(crate) fn classify(world: &World) -> Winner {
    let unit_alive = living_unit(world).is_some();
    let pursuers_remain = world.entities_of(EntityKind::Pursuer).next().is_some();

    match (unit_alive, pursuers_remain) {
        (true, false) => Winner::UnitWins,
        (false, true) => Winner::PursuersWin,
        _ => Winner::Draw,
    }
}

fn living_unit(world: &World) -> Option<CellCoord> {
    world
        .entities_of(EntityKind::Unit)
        .next()
        .map(|unit| unit.cell)
}

#[cfg(test)]
mod tests {
    use mine_hunt_core::{Command, Placement};

    use super::*;
    use crate::{apply, query};

    fn board(width: u32, height: u32, placements: &[(Placement, u32, u32)]) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureBoard { width, height },
            &mut events,
        );
        for &(placement, column, row) in placements {
            apply(
                &mut world,
                Command::PlaceEntity {
                    placement,
                    cell: CellCoord::new(column, row),
                },
                &mut events,
            );
        }
        world
    }

    #[test]
    fn open_board_is_not_over() {
        let world = board(
            5,
            5,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Device { armed: false }, 2, 2),
                (Placement::Pursuer, 4, 4),
            ],
        );

        assert_eq!(check_end(&world), None);
        assert_eq!(query::find_winner(&world), None);
    }

    #[test]
    fn missing_unit_with_pursuers_is_a_pursuer_win() {
        let world = board(
            3,
            3,
            &[
                (Placement::Device { armed: false }, 1, 1),
                (Placement::Pursuer, 2, 2),
            ],
        );

        assert_eq!(check_end(&world), Some(EndReason::UnitCaught));
        assert_eq!(classify(&world), Winner::PursuersWin);
    }

    #[test]
    fn no_pursuers_is_a_unit_win() {
        let world = board(
            3,
            3,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Device { armed: false }, 1, 1),
            ],
        );

        assert_eq!(check_end(&world), Some(EndReason::PursuersDestroyed));
        assert_eq!(classify(&world), Winner::UnitWins);
    }

    #[test]
    fn exhausted_devices_are_a_draw() {
        let world = board(
            3,
            3,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Device { armed: true }, 1, 1),
                (Placement::Pursuer, 2, 2),
            ],
        );

        assert_eq!(check_end(&world), Some(EndReason::MinesExhausted));
        assert_eq!(classify(&world), Winner::Draw);
        assert_eq!(
            EndReason::MinesExhausted.description(),
            "All inactive mines have been activated."
        );
    }

    #[test]
    fn unreachable_device_strands_the_unit() {
        let world = board(
            5,
            3,
            &[
                (Placement::Unit, 0, 1),
                (Placement::Obstacle, 2, 0),
                (Placement::Obstacle, 2, 1),
                (Placement::Obstacle, 2, 2),
                (Placement::Device { armed: false }, 4, 1),
                (Placement::Pursuer, 1, 0),
            ],
        );

        assert_eq!(check_end(&world), Some(EndReason::UnitStuck));
        assert_eq!(classify(&world), Winner::Draw);
    }

    #[test]
    fn walled_off_pursuers_are_stuck() {
        let world = board(
            5,
            3,
            &[
                (Placement::Unit, 0, 1),
                (Placement::Device { armed: false }, 1, 1),
                (Placement::Obstacle, 2, 0),
                (Placement::Obstacle, 2, 1),
                (Placement::Obstacle, 2, 2),
                (Placement::Pursuer, 4, 1),
            ],
        );

        assert_eq!(check_end(&world), Some(EndReason::PursuersStuck));
        assert_eq!(classify(&world), Winner::Draw);
    }

    #[test]
    fn pursuer_removed_by_a_blast_no_longer_counts() {
        let mut world = board(
            5,
            3,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Device { armed: false }, 0, 2),
                (Placement::Pursuer, 3, 1),
                (Placement::Device { armed: true }, 4, 1),
            ],
        );
        assert_eq!(check_end(&world), None);

        let trigger = CellCoord::new(4, 1);
        let device = query::tile(&world, trigger).expect("tile").find(EntityKind::Device)[0].id;
        let mut events = Vec::new();
        world.detonate(vec![(device, trigger)], &mut events);

        let survivor = query::tile(&world, CellCoord::new(3, 1)).expect("tile");
        assert!(!survivor.contains(EntityKind::Pursuer));
        assert_eq!(check_end(&world), Some(EndReason::PursuersDestroyed));
        assert_eq!(classify(&world), Winner::UnitWins);
    }
}

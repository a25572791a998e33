//! Movement rules for the unit and pursuers.

use mine_hunt_core::{
    CellCoord, Direction, EndReason, EntityId, EntityKind, EntityState, Event, MoveError, Stage,
};

use super::World;

/// Radius scanned by a pursuer for armed devices after it acts.
const PURSUER_SCAN_RADIUS: u32 = 1;

impl World {
    /// Moves the unit one tile, arming devices it lands on.
    pub(crate) fn move_unit(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.stage != Stage::Playing {
            reject_move(None, None, MoveError::InvalidStage, out_events);
            return;
        }

        let Some(unit) = self.entities_of(EntityKind::Unit).next().copied() else {
            reject_move(None, None, MoveError::MissingEntity, out_events);
            return;
        };

        let from = unit.cell;
        let target = from.step(direction);
        let Some(to) = target.filter(|cell| self.contains_cell(*cell)) else {
            reject_move(Some(unit.id), target, MoveError::OutOfBounds, out_events);
            return;
        };

        if let Err(reason) = self.check_destination(to, false) {
            reject_move(Some(unit.id), Some(to), reason, out_events);
            return;
        }

        self.relocate(unit.id, from, to);
        out_events.push(Event::UnitMoved {
            unit: unit.id,
            from,
            to,
        });

        let mut caught = false;
        if let Some(tile) = self.tile_mut(to) {
            for device in tile.find_mut(EntityKind::Device) {
                if let EntityState::Device { armed, .. } = &mut device.state {
                    if !*armed {
                        *armed = true;
                        log::debug!("device {:?} armed at {:?}", device.id, to);
                        out_events.push(Event::DeviceArmed {
                            device: device.id,
                            cell: to,
                        });
                    }
                }
            }
            caught = tile.contains(EntityKind::Pursuer);
        }

        if caught {
            self.catch_unit(unit.id, to, out_events);
        }
    }

    /// Detonates armed devices next to a pursuer before it acts.
    pub(crate) fn sweep_pursuer(&mut self, pursuer: EntityId, out_events: &mut Vec<Event>) {
        if self.stage != Stage::Playing {
            reject_move(Some(pursuer), None, MoveError::InvalidStage, out_events);
            return;
        }

        let Some(entity) = self.locate_pursuer(pursuer) else {
            reject_move(Some(pursuer), None, MoveError::MissingEntity, out_events);
            return;
        };

        self.detonate_surroundings(pursuer, entity.cell, out_events);
    }

    /// Moves a pursuer onto a neighbouring tile and resolves what it finds there.
    pub(crate) fn step_pursuer(
        &mut self,
        pursuer: EntityId,
        to: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        if self.stage != Stage::Playing {
            reject_move(Some(pursuer), Some(to), MoveError::InvalidStage, out_events);
            return;
        }

        let Some(entity) = self.locate_pursuer(pursuer) else {
            reject_move(Some(pursuer), Some(to), MoveError::MissingEntity, out_events);
            return;
        };

        let from = entity.cell;
        if !self.contains_cell(to) {
            reject_move(Some(pursuer), Some(to), MoveError::OutOfBounds, out_events);
            return;
        }

        if from.chebyshev_distance(to) != 1 {
            reject_move(Some(pursuer), Some(to), MoveError::NotAdjacent, out_events);
            return;
        }

        if let Err(reason) = self.check_destination(to, true) {
            reject_move(Some(pursuer), Some(to), reason, out_events);
            return;
        }

        self.relocate(pursuer, from, to);
        out_events.push(Event::PursuerMoved { pursuer, from, to });

        let unit = self
            .tile(to)
            .and_then(|tile| tile.find(EntityKind::Unit).next().copied());
        if let Some(unit) = unit {
            self.catch_unit(unit.id, to, out_events);
        }

        let (armed, unarmed) = self.tile(to).map_or((Vec::new(), false), |tile| {
            let armed: Vec<_> = tile
                .find(EntityKind::Device)
                .filter(|device| device.state.is_armed_device())
                .map(|device| (device.id, device.cell))
                .collect();
            (armed, tile.has_unarmed_device())
        });

        if !armed.is_empty() {
            self.detonate(armed, out_events);
            self.destroy_pursuer(pursuer, out_events);
            return;
        }

        if unarmed {
            if let Some(tile) = self.tile_mut(to) {
                let count = tile.disarm();
                log::debug!("pursuer {pursuer:?} disarmed {count} device(s) at {to:?}");
                out_events.push(Event::DevicesDisarmed { cell: to, count });
            }
        }

        self.detonate_surroundings(pursuer, to, out_events);
    }

    /// Detonates every armed device around `cell`; the pursuer standing there dies.
    fn detonate_surroundings(
        &mut self,
        pursuer: EntityId,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) {
        let mut armed = Vec::new();
        for neighbour in self.neighbourhood(cell, PURSUER_SCAN_RADIUS) {
            if let Some(tile) = self.tile(neighbour) {
                armed.extend(
                    tile.find(EntityKind::Device)
                        .filter(|device| device.state.is_armed_device())
                        .map(|device| (device.id, device.cell)),
                );
            }
        }

        if armed.is_empty() {
            return;
        }

        log::debug!(
            "pursuer {pursuer:?} disturbed {} armed device(s) near {cell:?}",
            armed.len()
        );
        self.detonate(armed, out_events);
        self.destroy_pursuer(pursuer, out_events);
    }

    fn check_destination(&self, cell: CellCoord, pursuer: bool) -> Result<(), MoveError> {
        let tile = self.tile(cell).ok_or(MoveError::OutOfBounds)?;
        if !tile.is_joinable() {
            return Err(MoveError::Blocked);
        }
        if pursuer && tile.contains(EntityKind::Pursuer) {
            return Err(MoveError::PursuerPresent);
        }
        Ok(())
    }

    fn locate_pursuer(&self, pursuer: EntityId) -> Option<super::Entity> {
        self.locate(pursuer)
            .filter(|entity| entity.kind() == EntityKind::Pursuer)
    }

    /// Moves an entity between tiles, keeping its stored cell in sync.
    fn relocate(&mut self, id: EntityId, from: CellCoord, to: CellCoord) {
        let Some(mut entity) = self.tile_mut(from).and_then(|tile| tile.remove(id)) else {
            return;
        };

        entity.cell = to;
        if let Some(tile) = self.tile_mut(to) {
            tile.add(entity);
        }
    }

    fn catch_unit(&mut self, unit: EntityId, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(tile) = self.tile_mut(cell) else {
            return;
        };

        if tile.remove(unit).is_some() {
            log::info!("unit {unit:?} caught at {cell:?}");
            out_events.push(Event::UnitCaught { unit, cell });
            self.end_reason = Some(EndReason::UnitCaught);
            self.set_stage(Stage::Ended, out_events);
        }
    }

    /// Kills a pursuer if it is still on the board.
    fn destroy_pursuer(&mut self, pursuer: EntityId, out_events: &mut Vec<Event>) {
        let Some(entity) = self.locate_pursuer(pursuer) else {
            return;
        };

        if let Some(tile) = self.tile_mut(entity.cell) {
            if tile.remove(pursuer).is_some() {
                log::debug!("pursuer {pursuer:?} destroyed at {:?}", entity.cell);
                out_events.push(Event::PursuerDestroyed {
                    pursuer,
                    cell: entity.cell,
                });
            }
        }
    }
}

fn reject_move(
    entity: Option<EntityId>,
    target: Option<CellCoord>,
    reason: MoveError,
    out_events: &mut Vec<Event>,
) {
    log::debug!("move rejected for {entity:?} towards {target:?}: {reason}");
    out_events.push(Event::MoveRejected {
        entity,
        target,
        reason,
    });
}

#[cfg(test)]
mod tests {
    use mine_hunt_core::{Command, Placement, Winner};

    use super::*;
    use crate::{apply, query};

    fn playing(width: u32, height: u32, placements: &[(Placement, u32, u32)]) -> World {
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
        apply(&mut world, Command::BeginPlay, &mut events);
        assert_eq!(query::stage(&world), Stage::Playing, "{events:?}");
        world
    }

    fn occupants(world: &World, column: u32, row: u32) -> Vec<EntityKind> {
        query::tile(world, CellCoord::new(column, row))
            .expect("tile on board")
            .occupants()
            .map(|entity| entity.kind())
            .collect()
    }

    #[test]
    fn unit_cannot_enter_obstacle() {
        let mut world = playing(
            5,
            3,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Obstacle, 1, 0),
                (Placement::Device { armed: false }, 4, 2),
                (Placement::Pursuer, 4, 0),
            ],
        );
        let before_source = occupants(&world, 0, 0);
        let before_target = occupants(&world, 1, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveUnit {
                direction: Direction::East,
            },
            &mut events,
        );

        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected {
                reason: MoveError::Blocked,
                ..
            }]
        ));
        assert_eq!(occupants(&world, 0, 0), before_source);
        assert_eq!(occupants(&world, 1, 0), before_target);
    }

    #[test]
    fn unit_cannot_leave_the_board() {
        let mut world = playing(
            4,
            1,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Device { armed: false }, 2, 0),
                (Placement::Pursuer, 3, 0),
            ],
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveUnit {
                direction: Direction::West,
            },
            &mut events,
        );

        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected {
                target: None,
                reason: MoveError::OutOfBounds,
                ..
            }]
        ));
        let unit = query::unit(&world).expect("unit on board");
        assert_eq!(unit.cell, CellCoord::new(0, 0));
    }

    #[test]
    fn unit_arms_every_device_it_lands_on() {
        let mut world = playing(
            5,
            1,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Device { armed: false }, 1, 0),
                (Placement::Device { armed: false }, 3, 0),
                (Placement::Pursuer, 4, 0),
            ],
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveUnit {
                direction: Direction::East,
            },
            &mut events,
        );

        let unit = query::unit(&world).expect("unit on board");
        assert_eq!(unit.cell, CellCoord::new(1, 0));
        let devices = query::tile(&world, CellCoord::new(1, 0))
            .expect("tile")
            .find(EntityKind::Device);
        assert_eq!(devices.len(), 1);
        assert!(devices[0].state.is_armed_device());
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::DeviceArmed { .. })));
    }

    #[test]
    fn unit_walking_into_pursuer_is_caught() {
        let mut world = playing(
            4,
            1,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Pursuer, 1, 0),
                (Placement::Device { armed: false }, 3, 0),
            ],
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveUnit {
                direction: Direction::East,
            },
            &mut events,
        );

        assert!(query::unit(&world).is_none());
        assert_eq!(query::stage(&world), Stage::Ended);
        assert_eq!(query::end_reason(&world), Some(EndReason::UnitCaught));

        apply(&mut world, Command::CompleteRound, &mut events);
        assert_eq!(query::winner(&world), Winner::PursuersWin);
    }

    #[test]
    fn pursuer_cannot_stack_on_pursuer() {
        let mut world = playing(
            4,
            3,
            &[
                (Placement::Unit, 0, 2),
                (Placement::Pursuer, 2, 0),
                (Placement::Pursuer, 3, 0),
                (Placement::Device { armed: false }, 0, 0),
            ],
        );
        let pursuers = query::obtain(&world, EntityKind::Pursuer);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPursuer {
                pursuer: pursuers[1].id,
                to: CellCoord::new(2, 0),
            },
            &mut events,
        );

        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected {
                reason: MoveError::PursuerPresent,
                ..
            }]
        ));
        assert_eq!(query::obtain(&world, EntityKind::Pursuer), pursuers);
    }

    #[test]
    fn pursuer_cannot_enter_obstacle() {
        let mut world = playing(
            5,
            3,
            &[
                (Placement::Unit, 0, 2),
                (Placement::Obstacle, 3, 0),
                (Placement::Pursuer, 4, 0),
                (Placement::Device { armed: false }, 0, 0),
            ],
        );
        let pursuer = query::obtain(&world, EntityKind::Pursuer)[0];
        let before_source = occupants(&world, 4, 0);
        let before_target = occupants(&world, 3, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPursuer {
                pursuer: pursuer.id,
                to: CellCoord::new(3, 0),
            },
            &mut events,
        );

        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected {
                reason: MoveError::Blocked,
                ..
            }]
        ));
        assert_eq!(occupants(&world, 4, 0), before_source);
        assert_eq!(occupants(&world, 3, 0), before_target);
        assert_eq!(query::entity(&world, pursuer.id), Some(pursuer));
    }

    #[test]
    fn pursuer_steps_must_be_adjacent() {
        let mut world = playing(
            5,
            1,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Device { armed: false }, 1, 0),
                (Placement::Pursuer, 4, 0),
            ],
        );
        let pursuer = query::obtain(&world, EntityKind::Pursuer)[0].id;

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPursuer {
                pursuer,
                to: CellCoord::new(2, 0),
            },
            &mut events,
        );

        assert!(matches!(
            events.as_slice(),
            [Event::MoveRejected {
                reason: MoveError::NotAdjacent,
                ..
            }]
        ));
    }

    #[test]
    fn pursuer_disarms_unarmed_devices_and_survives() {
        let mut world = playing(
            5,
            3,
            &[
                (Placement::Unit, 0, 2),
                (Placement::Device { armed: false }, 3, 0),
                (Placement::Device { armed: false }, 0, 0),
                (Placement::Pursuer, 4, 0),
            ],
        );
        let pursuer = query::obtain(&world, EntityKind::Pursuer)[0].id;

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPursuer {
                pursuer,
                to: CellCoord::new(3, 0),
            },
            &mut events,
        );

        assert_eq!(occupants(&world, 3, 0), vec![EntityKind::Pursuer]);
        assert!(events.contains(&Event::DevicesDisarmed {
            cell: CellCoord::new(3, 0),
            count: 1
        }));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::DeviceDetonated { .. })));
        assert!(query::entity(&world, pursuer).is_some());
    }

    #[test]
    fn pursuer_landing_on_armed_device_detonates_and_dies() {
        let mut world = playing(
            6,
            3,
            &[
                (Placement::Unit, 0, 2),
                (Placement::Device { armed: true }, 4, 0),
                (Placement::Device { armed: false }, 0, 0),
                (Placement::Pursuer, 5, 0),
                (Placement::Pursuer, 1, 1),
            ],
        );
        let pursuer = query::obtain(&world, EntityKind::Pursuer)[1].id;

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPursuer {
                pursuer,
                to: CellCoord::new(4, 0),
            },
            &mut events,
        );

        assert!(query::entity(&world, pursuer).is_none());
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::DeviceDetonated { .. })));
        assert!(events.contains(&Event::PursuerDestroyed {
            pursuer,
            cell: CellCoord::new(4, 0)
        }));
        assert_eq!(occupants(&world, 4, 0), Vec::new());
    }

    #[test]
    fn pursuer_next_to_armed_device_detonates_it() {
        let mut world = playing(
            6,
            3,
            &[
                (Placement::Unit, 0, 2),
                (Placement::Device { armed: true }, 3, 1),
                (Placement::Device { armed: false }, 0, 0),
                (Placement::Pursuer, 5, 0),
            ],
        );
        let pursuer = query::obtain(&world, EntityKind::Pursuer)[0].id;

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPursuer {
                pursuer,
                to: CellCoord::new(4, 0),
            },
            &mut events,
        );

        assert!(query::entity(&world, pursuer).is_none());
        assert!(query::tile(&world, CellCoord::new(3, 1))
            .expect("tile")
            .is_empty());
    }

    #[test]
    fn pursuer_reaching_unit_catches_it() {
        let mut world = playing(
            4,
            1,
            &[
                (Placement::Unit, 0, 0),
                (Placement::Pursuer, 1, 0),
                (Placement::Device { armed: false }, 3, 0),
            ],
        );
        let pursuer = query::obtain(&world, EntityKind::Pursuer)[0].id;

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StepPursuer {
                pursuer,
                to: CellCoord::new(0, 0),
            },
            &mut events,
        );

        assert!(events.iter().any(|event| matches!(event, Event::UnitCaught { .. })));
        assert!(query::unit(&world).is_none());
        assert_eq!(occupants(&world, 0, 0), vec![EntityKind::Pursuer]);
    }

    #[test]
    fn sweep_destroys_pursuer_next_to_armed_device() {
        let mut world = playing(
            5,
            3,
            &[
                (Placement::Unit, 0, 2),
                (Placement::Device { armed: true }, 3, 1),
                (Placement::Device { armed: false }, 0, 0),
                (Placement::Pursuer, 4, 0),
                (Placement::Pursuer, 1, 0),
            ],
        );
        let pursuers = query::obtain(&world, EntityKind::Pursuer);
        let near = pursuers
            .iter()
            .find(|pursuer| pursuer.cell == CellCoord::new(4, 0))
            .expect("pursuer near device")
            .id;

        let mut events = Vec::new();
        apply(&mut world, Command::SweepPursuer { pursuer: near }, &mut events);

        assert!(query::entity(&world, near).is_none());
        assert_eq!(query::obtain(&world, EntityKind::Pursuer).len(), 1);
    }
}

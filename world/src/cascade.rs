//! Chain-reaction detonation of devices.

use std::collections::{HashSet, VecDeque};

use mine_hunt_core::{CellCoord, EntityId, EntityKind, EntityState, Event, DEFAULT_BLAST_RADIUS};

use super::World;

impl World {
    /// Detonates the provided devices and everything their blasts reach.
    ///
    /// Pending detonations are processed first-in first-out. A device is
    /// claimed the moment it is queued, so no device ever explodes twice and
    /// mutually adjacent devices cannot re-trigger one another. Devices that
    /// share a tile with an exploding device but were never claimed are
    /// removed without detonating.
    pub(crate) fn detonate(
        &mut self,
        devices: Vec<(EntityId, CellCoord)>,
        out_events: &mut Vec<Event>,
    ) {
        let mut claimed: HashSet<EntityId> = HashSet::new();
        let mut pending: VecDeque<(EntityId, CellCoord, u32)> = VecDeque::new();

        for (device, cell) in devices {
            if claimed.insert(device) {
                let radius = self.blast_radius(device, cell);
                pending.push_back((device, cell, radius));
            }
        }

        while let Some((device, cell, radius)) = pending.pop_front() {
            log::debug!("device {device:?} detonated at {cell:?}");
            out_events.push(Event::DeviceDetonated { device, cell });

            let cleared = self.tile_mut(cell).map_or(0, |tile| {
                tile.remove_devices()
                    .iter()
                    .filter(|removed| !claimed.contains(&removed.id))
                    .count()
            });
            if cleared > 0 {
                out_events.push(Event::DevicesCleared {
                    cell,
                    count: u32::try_from(cleared).unwrap_or(u32::MAX),
                });
            }

            for blast_cell in self.neighbourhood(cell, radius) {
                let Some(tile) = self.tile_mut(blast_cell) else {
                    continue;
                };

                for chained in tile.find_mut(EntityKind::Device) {
                    if let EntityState::Device {
                        exploded,
                        blast_radius,
                        ..
                    } = &mut chained.state
                    {
                        if !*exploded && claimed.insert(chained.id) {
                            *exploded = true;
                            pending.push_back((chained.id, blast_cell, *blast_radius));
                        }
                    }
                }

                for destroyed in tile.strip_destroyable() {
                    match destroyed.kind() {
                        EntityKind::Pursuer => {
                            log::debug!("pursuer {:?} caught in blast", destroyed.id);
                            out_events.push(Event::PursuerDestroyed {
                                pursuer: destroyed.id,
                                cell: blast_cell,
                            });
                        }
                        EntityKind::Obstacle => out_events.push(Event::ObstacleDestroyed {
                            obstacle: destroyed.id,
                            cell: blast_cell,
                        }),
                        EntityKind::Device | EntityKind::Unit => {}
                    }
                }
            }
        }
    }

    fn blast_radius(&mut self, device: EntityId, cell: CellCoord) -> u32 {
        let Some(tile) = self.tile_mut(cell) else {
            return DEFAULT_BLAST_RADIUS;
        };

        tile.find_mut(EntityKind::Device)
            .find(|entity| entity.id == device)
            .and_then(|entity| match &mut entity.state {
                EntityState::Device {
                    exploded,
                    blast_radius,
                    ..
                } => {
                    *exploded = true;
                    Some(*blast_radius)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_BLAST_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use mine_hunt_core::{Command, Placement, Stage};

    use super::*;
    use crate::{apply, query, tile::Entity};

    fn setup(width: u32, height: u32, placements: &[(Placement, u32, u32)]) -> World {
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

    fn device_at(world: &World, column: u32, row: u32) -> (EntityId, CellCoord) {
        let cell = CellCoord::new(column, row);
        let device = query::tile(world, cell)
            .expect("tile")
            .find(EntityKind::Device)[0]
            .id;
        (device, cell)
    }

    fn detonated(events: &[Event]) -> Vec<EntityId> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::DeviceDetonated { device, .. } => Some(*device),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn chain_of_adjacent_devices_detonates_each_once() {
        let mut world = setup(
            6,
            1,
            &[
                (Placement::Device { armed: true }, 0, 0),
                (Placement::Device { armed: true }, 1, 0),
                (Placement::Device { armed: true }, 2, 0),
                (Placement::Device { armed: true }, 3, 0),
                (Placement::Device { armed: true }, 4, 0),
            ],
        );
        let trigger = device_at(&world, 0, 0);

        let mut events = Vec::new();
        world.detonate(vec![trigger], &mut events);

        let mut exploded = detonated(&events);
        assert_eq!(exploded.len(), 5);
        exploded.sort();
        exploded.dedup();
        assert_eq!(exploded.len(), 5, "a device detonated twice: {events:?}");
        assert!(query::obtain(&world, EntityKind::Device).is_empty());
    }

    #[test]
    fn mutually_adjacent_devices_do_not_recurse_forever() {
        let mut world = setup(
            2,
            2,
            &[
                (Placement::Device { armed: true }, 0, 0),
                (Placement::Device { armed: true }, 1, 0),
                (Placement::Device { armed: true }, 0, 1),
                (Placement::Device { armed: true }, 1, 1),
            ],
        );
        let trigger = device_at(&world, 1, 1);

        let mut events = Vec::new();
        world.detonate(vec![trigger, trigger], &mut events);

        assert_eq!(detonated(&events).len(), 4);
    }

    #[test]
    fn blast_destroys_obstacles_and_pursuers_but_not_the_unit() {
        let mut world = setup(
            3,
            3,
            &[
                (Placement::Device { armed: true }, 1, 1),
                (Placement::Obstacle, 0, 0),
                (Placement::Pursuer, 2, 2),
                (Placement::Unit, 1, 0),
                (Placement::Obstacle, 2, 0),
            ],
        );
        let trigger = device_at(&world, 1, 1);

        let mut events = Vec::new();
        world.detonate(vec![trigger], &mut events);

        assert!(query::obtain(&world, EntityKind::Obstacle).is_empty());
        assert!(query::obtain(&world, EntityKind::Pursuer).is_empty());
        assert!(query::unit(&world).is_some());
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, Event::ObstacleDestroyed { .. }))
                .count(),
            2
        );
        assert_eq!(query::stage(&world), Stage::Setup);
    }

    #[test]
    fn blast_does_not_reach_beyond_its_radius() {
        let mut world = setup(
            4,
            1,
            &[
                (Placement::Device { armed: true }, 0, 0),
                (Placement::Obstacle, 2, 0),
                (Placement::Device { armed: false }, 3, 0),
            ],
        );
        let trigger = device_at(&world, 0, 0);

        let mut events = Vec::new();
        world.detonate(vec![trigger], &mut events);

        assert_eq!(detonated(&events), vec![trigger.0]);
        assert_eq!(query::obtain(&world, EntityKind::Obstacle).len(), 1);
        assert_eq!(query::unarmed_devices(&world).len(), 1);
    }

    #[test]
    fn unarmed_devices_inside_a_blast_chain_react() {
        let mut world = setup(
            3,
            1,
            &[
                (Placement::Device { armed: true }, 0, 0),
                (Placement::Device { armed: false }, 1, 0),
                (Placement::Obstacle, 2, 0),
            ],
        );
        let trigger = device_at(&world, 0, 0);

        let mut events = Vec::new();
        world.detonate(vec![trigger], &mut events);

        assert_eq!(detonated(&events).len(), 2);
        assert!(query::obtain(&world, EntityKind::Obstacle).is_empty());
    }

    #[test]
    fn devices_sharing_the_blast_tile_are_cleared_without_detonating() {
        let mut world = setup(
            3,
            1,
            &[
                (Placement::Device { armed: true }, 0, 0),
                (Placement::Unit, 2, 0),
            ],
        );
        let (trigger, cell) = device_at(&world, 0, 0);
        let bystander = world.allocate_id();
        world.tile_mut(cell).expect("tile").add(Entity::new(
            bystander,
            cell,
            Placement::Device { armed: false }.initial_state(),
        ));

        let mut events = Vec::new();
        world.detonate(vec![(trigger, cell)], &mut events);

        assert_eq!(detonated(&events), vec![trigger]);
        assert!(events.contains(&Event::DevicesCleared { cell, count: 1 }));
        assert!(query::obtain(&world, EntityKind::Device).is_empty());
        assert!(query::unit(&world).is_some());
    }
}

//! Tiles and the entity records they own.

use mine_hunt_core::{CellCoord, EntityId, EntityKind, EntitySnapshot, EntityState};

/// Entity stored on a tile.
///
/// The cell is a denormalised copy of the owning tile's position; the world
/// rewrites it on every relocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) cell: CellCoord,
    pub(crate) state: EntityState,
}

impl Entity {
    pub(crate) const fn new(id: EntityId, cell: CellCoord, state: EntityState) -> Self {
        Self { id, cell, state }
    }

    pub(crate) const fn kind(&self) -> EntityKind {
        self.state.kind()
    }

    pub(crate) const fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            cell: self.cell,
            state: self.state,
        }
    }
}

/// Single addressable grid cell and its occupants in arrival order.
///
/// Tiles never check bounds or joinability; the world is the only caller and
/// validates both before mutating.
#[derive(Clone, Debug)]
pub(crate) struct Tile {
    cell: CellCoord,
    entities: Vec<Entity>,
}

impl Tile {
    pub(crate) const fn new(cell: CellCoord) -> Self {
        Self {
            cell,
            entities: Vec::new(),
        }
    }

    pub(crate) const fn cell(&self) -> CellCoord {
        self.cell
    }

    pub(crate) fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Replaces every occupant with the provided entity, returning the evicted ones.
    pub(crate) fn spawn(&mut self, entity: Entity) -> Vec<Entity> {
        let evicted = std::mem::take(&mut self.entities);
        self.entities.push(entity);
        evicted
    }

    pub(crate) fn add(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|entity| entity.id == id)?;
        Some(self.entities.remove(index))
    }

    pub(crate) fn clear(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.entities)
    }

    pub(crate) fn contains(&self, kind: EntityKind) -> bool {
        self.entities.iter().any(|entity| entity.kind() == kind)
    }

    pub(crate) fn find(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .iter()
            .filter(move |entity| entity.kind() == kind)
    }

    pub(crate) fn find_mut(&mut self, kind: EntityKind) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities
            .iter_mut()
            .filter(move |entity| entity.kind() == kind)
    }

    /// True when no non-joinable entity occupies the tile.
    pub(crate) fn is_joinable(&self) -> bool {
        self.entities.iter().all(|entity| entity.kind().joinable())
    }

    pub(crate) fn has_armed_device(&self) -> bool {
        self.entities
            .iter()
            .any(|entity| entity.state.is_armed_device())
    }

    pub(crate) fn has_unarmed_device(&self) -> bool {
        self.entities
            .iter()
            .any(|entity| entity.state.is_unarmed_device())
    }

    /// Strips every unarmed device, returning how many were removed.
    pub(crate) fn disarm(&mut self) -> u32 {
        let before = self.entities.len();
        self.entities
            .retain(|entity| !entity.state.is_unarmed_device());
        u32::try_from(before - self.entities.len()).unwrap_or(u32::MAX)
    }

    /// Removes every device regardless of state.
    pub(crate) fn remove_devices(&mut self) -> Vec<Entity> {
        self.extract(|entity| entity.kind() == EntityKind::Device)
    }

    /// Removes every destroyable entity, leaving the survivors in arrival order.
    pub(crate) fn strip_destroyable(&mut self) -> Vec<Entity> {
        self.extract(|entity| entity.kind().destroyable())
    }

    /// Concatenated markers of the occupants, or `None` for an empty tile.
    pub(crate) fn markers(&self) -> Option<String> {
        if self.entities.is_empty() {
            return None;
        }

        Some(
            self.entities
                .iter()
                .map(|entity| entity.kind().marker())
                .collect(),
        )
    }

    fn extract<F>(&mut self, mut predicate: F) -> Vec<Entity>
    where
        F: FnMut(&Entity) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entities.len());
        for entity in self.entities.drain(..) {
            if predicate(&entity) {
                removed.push(entity);
            } else {
                kept.push(entity);
            }
        }
        self.entities = kept;
        removed
    }
}

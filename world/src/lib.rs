#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state management for Mine Hunt.

mod cascade;
mod movement;
mod navigation;
mod outcome;
mod tile;

use mine_hunt_core::{
    CellCoord, Command, EndReason, EntityId, EntityKind, Event, Placement, SetupError, Stage,
    Winner, MAX_BOARD_DIMENSION, WELCOME_BANNER,
};

use self::tile::{Entity, Tile};

const DEFAULT_BOARD_WIDTH: u32 = 10;
const DEFAULT_BOARD_HEIGHT: u32 = 10;

const FIRST_ROUND: u32 = 1;

/// Represents the authoritative Mine Hunt board.
///
/// The board owns every tile and, through them, every entity. Tiles are
/// stored row-major; whole-board queries walk them column by column, which is
/// the order pursuers act in.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    next_entity: u32,
    round: u32,
    stage: Stage,
    winner: Winner,
    end_reason: Option<EndReason>,
}

impl World {
    /// Creates an empty ten by ten board in the setup stage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_BOARD_WIDTH, DEFAULT_BOARD_HEIGHT)
    }

    fn with_dimensions(width: u32, height: u32) -> Self {
        let mut tiles = Vec::with_capacity(cell_capacity(width, height));
        for row in 0..height {
            for column in 0..width {
                tiles.push(Tile::new(CellCoord::new(column, row)));
            }
        }

        Self {
            banner: WELCOME_BANNER,
            width,
            height,
            tiles,
            next_entity: 0,
            round: FIRST_ROUND,
            stage: Stage::Setup,
            winner: Winner::Unresolved,
            end_reason: None,
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.width && cell.row() < self.height {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn contains_cell(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    fn tile(&self, cell: CellCoord) -> Option<&Tile> {
        self.index(cell).and_then(|index| self.tiles.get(index))
    }

    fn tile_mut(&mut self, cell: CellCoord) -> Option<&mut Tile> {
        self.index(cell).and_then(|index| self.tiles.get_mut(index))
    }

    /// Tiles in board-scan order: columns left to right, each top to bottom.
    fn scan_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        (0..self.width).flat_map(move |column| {
            (0..self.height).filter_map(move |row| self.tile(CellCoord::new(column, row)))
        })
    }

    fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.scan_tiles().flat_map(move |tile| tile.find(kind))
    }

    fn locate(&self, id: EntityId) -> Option<Entity> {
        self.tiles
            .iter()
            .flat_map(|tile| tile.entities().iter())
            .find(|entity| entity.id == id)
            .copied()
    }

    /// Cells within a square radius of `cell`, excluding `cell` itself.
    ///
    /// Cells are listed column by column and clipped to the board.
    fn neighbourhood(&self, cell: CellCoord, radius: u32) -> Vec<CellCoord> {
        if self.width == 0 || self.height == 0 {
            return Vec::new();
        }

        let first_column = cell.column().saturating_sub(radius);
        let last_column = cell.column().saturating_add(radius).min(self.width - 1);
        let first_row = cell.row().saturating_sub(radius);
        let last_row = cell.row().saturating_add(radius).min(self.height - 1);

        let mut cells = Vec::new();
        for column in first_column..=last_column {
            for row in first_row..=last_row {
                let candidate = CellCoord::new(column, row);
                if candidate != cell {
                    cells.push(candidate);
                }
            }
        }
        cells
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        id
    }

    fn set_stage(&mut self, stage: Stage, out_events: &mut Vec<Event>) {
        if self.stage == stage {
            return;
        }

        log::info!("stage changed from {:?} to {:?}", self.stage, stage);
        self.stage = stage;
        out_events.push(Event::StageChanged { stage });
    }

    fn configure(&mut self, width: u32, height: u32, out_events: &mut Vec<Event>) {
        if self.stage != Stage::Setup {
            reject_setup(SetupError::InvalidStage, out_events);
            return;
        }

        if width == 0 || height == 0 || width > MAX_BOARD_DIMENSION || height > MAX_BOARD_DIMENSION
        {
            log::warn!("rejected board dimensions {width}x{height}");
            out_events.push(Event::SetupRejected {
                reason: SetupError::InvalidDimensions,
            });
            return;
        }

        *self = Self::with_dimensions(width, height);
        out_events.push(Event::BoardConfigured { width, height });
    }

    fn place(&mut self, placement: Placement, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.stage != Stage::Setup {
            reject_setup(SetupError::InvalidStage, out_events);
            return;
        }

        if !self.contains_cell(cell) {
            reject_setup(SetupError::OutOfBounds, out_events);
            return;
        }

        if placement == Placement::Unit {
            let existing: Vec<Entity> = self.entities_of(EntityKind::Unit).copied().collect();
            for unit in existing {
                if let Some(tile) = self.tile_mut(unit.cell) {
                    if tile.remove(unit.id).is_some() {
                        out_events.push(Event::EntityRemoved {
                            entity: unit.id,
                            cell: unit.cell,
                        });
                    }
                }
            }
        }

        let id = self.allocate_id();
        let entity = Entity::new(id, cell, placement.initial_state());
        let Some(tile) = self.tile_mut(cell) else {
            return;
        };
        let evicted = tile.spawn(entity);

        for previous in evicted {
            out_events.push(Event::EntityRemoved {
                entity: previous.id,
                cell,
            });
        }

        log::debug!("placed {:?} at {:?}", placement, cell);
        out_events.push(Event::EntityPlaced {
            entity: id,
            kind: placement.kind(),
            cell,
        });
    }

    fn clear_tile(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.stage != Stage::Setup {
            reject_setup(SetupError::InvalidStage, out_events);
            return;
        }

        let Some(tile) = self.tile_mut(cell) else {
            reject_setup(SetupError::OutOfBounds, out_events);
            return;
        };

        for entity in tile.clear() {
            out_events.push(Event::EntityRemoved {
                entity: entity.id,
                cell,
            });
        }
    }

    fn begin_play(&mut self, out_events: &mut Vec<Event>) {
        if self.stage != Stage::Setup {
            reject_setup(SetupError::InvalidStage, out_events);
            return;
        }

        if self.entities_of(EntityKind::Unit).next().is_none() {
            reject_setup(SetupError::MissingUnit, out_events);
            return;
        }

        self.set_stage(Stage::Playing, out_events);
        self.resolve_outcome(out_events);
    }

    fn end_early(&mut self, out_events: &mut Vec<Event>) {
        if self.stage != Stage::Playing {
            reject_setup(SetupError::InvalidStage, out_events);
            return;
        }

        self.finish(Winner::Draw, EndReason::EndedEarly, out_events);
    }

    fn complete_round(&mut self, out_events: &mut Vec<Event>) {
        let decided_this_round = self.stage == Stage::Ended && self.winner == Winner::Unresolved;
        if self.stage != Stage::Playing && !decided_this_round {
            reject_setup(SetupError::InvalidStage, out_events);
            return;
        }

        self.round = self.round.saturating_add(1);
        out_events.push(Event::RoundCompleted { round: self.round });
        self.resolve_outcome(out_events);
    }

    fn resolve_outcome(&mut self, out_events: &mut Vec<Event>) {
        let Some(reason) = outcome::check_end(self) else {
            return;
        };

        let winner = outcome::classify(self);
        self.finish(winner, reason, out_events);
    }

    fn finish(&mut self, winner: Winner, reason: EndReason, out_events: &mut Vec<Event>) {
        self.winner = winner;
        self.end_reason = Some(reason);
        self.set_stage(Stage::Ended, out_events);
        log::info!("game ended: {:?} ({})", winner, reason.description());
        out_events.push(Event::GameEnded { winner, reason });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Invalid requests never change the board; they are reported through
/// rejection events instead.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureBoard { width, height } => world.configure(width, height, out_events),
        Command::PlaceEntity { placement, cell } => world.place(placement, cell, out_events),
        Command::ClearTile { cell } => world.clear_tile(cell, out_events),
        Command::BeginPlay => world.begin_play(out_events),
        Command::EndEarly => world.end_early(out_events),
        Command::MoveUnit { direction } => world.move_unit(direction, out_events),
        Command::SweepPursuer { pursuer } => world.sweep_pursuer(pursuer, out_events),
        Command::StepPursuer { pursuer, to } => world.step_pursuer(pursuer, to, out_events),
        Command::CompleteRound => world.complete_round(out_events),
    }
}

fn reject_setup(reason: SetupError, out_events: &mut Vec<Event>) {
    log::warn!("setup request rejected: {reason}");
    out_events.push(Event::SetupRejected { reason });
}

fn cell_capacity(width: u32, height: u32) -> usize {
    let capacity_u64 = u64::from(width) * u64::from(height);
    usize::try_from(capacity_u64).unwrap_or(0)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use mine_hunt_core::{
        BoardStats, CellCoord, EndReason, EntityId, EntityKind, EntitySnapshot, NavigationPolicy,
        Stage, Winner, EMPTY_TILE_MARKER,
    };

    use super::{navigation, outcome, tile::Tile, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Board dimensions as `(width, height)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.width, world.height)
    }

    /// Number of the active round, starting at one.
    #[must_use]
    pub fn round(world: &World) -> u32 {
        world.round
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn stage(world: &World) -> Stage {
        world.stage
    }

    /// Outcome recorded for the game.
    #[must_use]
    pub fn winner(world: &World) -> Winner {
        world.winner
    }

    /// Reason recorded when the game ended, if it has.
    #[must_use]
    pub fn end_reason(world: &World) -> Option<EndReason> {
        world.end_reason
    }

    /// Human-readable win reason, empty while the game is undecided.
    #[must_use]
    pub fn win_reason(world: &World) -> &'static str {
        world.end_reason.map_or("", EndReason::description)
    }

    /// Every entity of the provided kind in board-scan order.
    ///
    /// Board-scan order walks columns left to right and each column top to
    /// bottom; within a tile entities keep their arrival order.
    #[must_use]
    pub fn obtain(world: &World, kind: EntityKind) -> Vec<EntitySnapshot> {
        world.entities_of(kind).map(|entity| entity.snapshot()).collect()
    }

    /// Devices that have not been armed, in board-scan order.
    #[must_use]
    pub fn unarmed_devices(world: &World) -> Vec<EntitySnapshot> {
        world
            .entities_of(EntityKind::Device)
            .filter(|entity| entity.state.is_unarmed_device())
            .map(|entity| entity.snapshot())
            .collect()
    }

    /// The unit currently on the board, if any.
    #[must_use]
    pub fn unit(world: &World) -> Option<EntitySnapshot> {
        world
            .entities_of(EntityKind::Unit)
            .next()
            .map(|entity| entity.snapshot())
    }

    /// Looks up an entity by identifier.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<EntitySnapshot> {
        world.locate(id).map(|entity| entity.snapshot())
    }

    /// Read-only view of the tile at `cell`, or `None` outside the board.
    #[must_use]
    pub fn tile(world: &World, cell: CellCoord) -> Option<TileView<'_>> {
        world.tile(cell).map(|tile| TileView { tile })
    }

    /// Cells within the square `radius` around `cell`, excluding `cell`.
    #[must_use]
    pub fn neighbourhood(world: &World, cell: CellCoord, radius: u32) -> Vec<CellCoord> {
        world.neighbourhood(cell, radius)
    }

    /// A* route from `start` to `goal` under the provided policy.
    ///
    /// The route excludes `start` and ends at `goal`. An empty route means the
    /// goal is unreachable or equal to the start.
    #[must_use]
    pub fn find_path(
        world: &World,
        start: CellCoord,
        goal: CellCoord,
        policy: NavigationPolicy,
    ) -> Vec<CellCoord> {
        navigation::find_path(world, start, goal, policy)
    }

    /// Reports why the game is over, or `None` while it can continue.
    #[must_use]
    pub fn check_end(world: &World) -> Option<EndReason> {
        outcome::check_end(world)
    }

    /// Classifies the outcome once [`check_end`] reports an end state.
    #[must_use]
    pub fn find_winner(world: &World) -> Option<Winner> {
        outcome::check_end(world).map(|_| outcome::classify(world))
    }

    /// Counters presented to the player between rounds.
    #[must_use]
    pub fn stats(world: &World) -> BoardStats {
        BoardStats {
            round: world.round,
            unarmed_devices: unarmed_devices(world).len(),
            pursuers: world.entities_of(EntityKind::Pursuer).count(),
        }
    }

    /// Textual dump of the board used for debugging and snapshot comparison.
    ///
    /// Each board row becomes one newline-terminated line. Columns are
    /// separated by a single space and show the occupants' markers joined
    /// without separators, or `#` for an empty tile.
    #[must_use]
    pub fn dump(world: &World) -> String {
        let mut output = String::new();
        for row in 0..world.height {
            let line: Vec<String> = (0..world.width)
                .map(|column| {
                    world
                        .tile(CellCoord::new(column, row))
                        .and_then(Tile::markers)
                        .unwrap_or_else(|| EMPTY_TILE_MARKER.to_string())
                })
                .collect();
            output.push_str(&line.join(" "));
            output.push('\n');
        }
        output
    }

    /// Read-only view into a single tile.
    #[derive(Clone, Copy, Debug)]
    pub struct TileView<'a> {
        tile: &'a Tile,
    }

    impl<'a> TileView<'a> {
        /// Position of the tile.
        #[must_use]
        pub fn cell(&self) -> CellCoord {
            self.tile.cell()
        }

        /// Occupants in arrival order.
        pub fn occupants(&self) -> impl Iterator<Item = EntitySnapshot> + 'a {
            self.tile.entities().iter().map(|entity| entity.snapshot())
        }

        /// Reports whether any occupant has the provided kind.
        #[must_use]
        pub fn contains(&self, kind: EntityKind) -> bool {
            self.tile.contains(kind)
        }

        /// Occupants of the provided kind in arrival order.
        #[must_use]
        pub fn find(&self, kind: EntityKind) -> Vec<EntitySnapshot> {
            self.tile.find(kind).map(|entity| entity.snapshot()).collect()
        }

        /// Reports whether another entity may join the tile.
        #[must_use]
        pub fn is_joinable(&self) -> bool {
            self.tile.is_joinable()
        }

        /// Reports whether the tile holds an armed device.
        #[must_use]
        pub fn has_armed_device(&self) -> bool {
            self.tile.has_armed_device()
        }

        /// Reports whether the tile holds an unarmed device.
        #[must_use]
        pub fn has_unarmed_device(&self) -> bool {
            self.tile.has_unarmed_device()
        }

        /// Reports whether the tile has no occupants.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.tile.entities().is_empty()
        }
    }
}

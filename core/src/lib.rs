#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Mine Hunt engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative board, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! actually happened. Systems inspect the board through read-only queries and
//! respond exclusively with new commands.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Mine Hunt.";

/// Marker printed for an empty tile in the textual board dump.
pub const EMPTY_TILE_MARKER: char = '#';

/// Blast radius assigned to every device placed on the board.
pub const DEFAULT_BLAST_RADIUS: u32 = 1;

/// Largest accepted board edge, in tiles.
pub const MAX_BOARD_DIMENSION: u32 = 64;

/// Neighbour expansion and cost shaping applied by a path search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationPolicy {
    /// Four-connected search with unit step costs, used by the unit.
    Orthogonal,
    /// Eight-connected search that avoids armed devices and favours unarmed
    /// ones, used by pursuers.
    Pursuit,
}

/// Lifecycle stage of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Board authoring; entities may be placed and removed.
    Setup,
    /// Rounds are being played.
    Playing,
    /// The game has finished and no further rounds are accepted.
    Ended,
}

/// Outcome of a game once it has ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    /// The game has not been decided yet.
    Unresolved,
    /// The unit survived every pursuer.
    UnitWins,
    /// The pursuers caught the unit.
    PursuersWin,
    /// Neither side won.
    Draw,
}

/// Reason recorded when the game reaches an end state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// No living unit remains on the board.
    UnitCaught,
    /// Every pursuer has been destroyed.
    PursuersDestroyed,
    /// No unarmed device remains on the board.
    MinesExhausted,
    /// The unit cannot reach any unarmed device.
    UnitStuck,
    /// No pursuer can reach the unit.
    PursuersStuck,
    /// The player stopped the game before it was decided.
    EndedEarly,
}

impl EndReason {
    /// Human-readable explanation presented alongside the winner.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnitCaught => "The unit has been caught.",
            Self::PursuersDestroyed => "All pursuers have been destroyed.",
            Self::MinesExhausted => "All inactive mines have been activated.",
            Self::UnitStuck => "The unit has become stuck, inactive mine inaccessible.",
            Self::PursuersStuck => "Pursuers have become stuck.",
            Self::EndedEarly => "The game was ended early.",
        }
    }
}

/// Commands that express all permissible board mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Replaces the board with an empty grid of the provided dimensions.
    ConfigureBoard {
        /// Number of columns in the grid.
        width: u32,
        /// Number of rows in the grid.
        height: u32,
    },
    /// Spawns a new entity on a tile, replacing every current occupant.
    PlaceEntity {
        /// Entity to construct.
        placement: Placement,
        /// Tile receiving the entity.
        cell: CellCoord,
    },
    /// Removes every occupant from a tile.
    ClearTile {
        /// Tile to clear.
        cell: CellCoord,
    },
    /// Leaves the setup stage and starts playing rounds.
    BeginPlay,
    /// Ends a game in progress as a draw.
    EndEarly,
    /// Moves the unit one tile in the provided direction.
    MoveUnit {
        /// Direction of travel.
        direction: Direction,
    },
    /// Detonates armed devices surrounding a pursuer before it acts.
    SweepPursuer {
        /// Pursuer performing the check.
        pursuer: EntityId,
    },
    /// Moves a pursuer onto one of its neighbouring tiles.
    StepPursuer {
        /// Pursuer attempting to move.
        pursuer: EntityId,
        /// Destination tile.
        to: CellCoord,
    },
    /// Closes the current round and evaluates the end state.
    CompleteRound,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// The board was replaced with an empty grid.
    BoardConfigured {
        /// Number of columns in the grid.
        width: u32,
        /// Number of rows in the grid.
        height: u32,
    },
    /// A new entity was placed during setup.
    EntityPlaced {
        /// Identifier allocated to the entity.
        entity: EntityId,
        /// Kind of the placed entity.
        kind: EntityKind,
        /// Tile holding the entity.
        cell: CellCoord,
    },
    /// An existing entity was removed during setup.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
        /// Tile that held the entity.
        cell: CellCoord,
    },
    /// A setup request was rejected.
    SetupRejected {
        /// Specific reason the request failed.
        reason: SetupError,
    },
    /// The game moved into a new stage.
    StageChanged {
        /// Stage that became active.
        stage: Stage,
    },
    /// The unit moved between two tiles.
    UnitMoved {
        /// Identifier of the unit.
        unit: EntityId,
        /// Tile occupied before the move.
        from: CellCoord,
        /// Tile occupied after the move.
        to: CellCoord,
    },
    /// A pursuer moved between two tiles.
    PursuerMoved {
        /// Identifier of the pursuer.
        pursuer: EntityId,
        /// Tile occupied before the move.
        from: CellCoord,
        /// Tile occupied after the move.
        to: CellCoord,
    },
    /// A movement request was rejected without changing the board.
    MoveRejected {
        /// Entity that attempted to move, if it could be resolved.
        entity: Option<EntityId>,
        /// Requested destination, if it lies on the coordinate plane.
        target: Option<CellCoord>,
        /// Specific reason the move failed.
        reason: MoveError,
    },
    /// The unit armed a device by stepping on it.
    DeviceArmed {
        /// Identifier of the armed device.
        device: EntityId,
        /// Tile holding the device.
        cell: CellCoord,
    },
    /// A device exploded.
    DeviceDetonated {
        /// Identifier of the exploded device.
        device: EntityId,
        /// Tile that held the device.
        cell: CellCoord,
    },
    /// A pursuer removed unarmed devices from a tile without triggering them.
    DevicesDisarmed {
        /// Tile that held the devices.
        cell: CellCoord,
        /// Number of devices removed.
        count: u32,
    },
    /// Devices sharing a tile with an exploding device were removed without detonating.
    DevicesCleared {
        /// Tile that held the devices.
        cell: CellCoord,
        /// Number of devices removed.
        count: u32,
    },
    /// A pursuer was destroyed.
    PursuerDestroyed {
        /// Identifier of the destroyed pursuer.
        pursuer: EntityId,
        /// Tile that held the pursuer.
        cell: CellCoord,
    },
    /// An obstacle was destroyed by a blast.
    ObstacleDestroyed {
        /// Identifier of the destroyed obstacle.
        obstacle: EntityId,
        /// Tile that held the obstacle.
        cell: CellCoord,
    },
    /// The unit shared a tile with a pursuer and was caught.
    UnitCaught {
        /// Identifier of the caught unit.
        unit: EntityId,
        /// Tile where the unit was caught.
        cell: CellCoord,
    },
    /// A round finished.
    RoundCompleted {
        /// Number of the round that is now active.
        round: u32,
    },
    /// The game reached an end state.
    GameEnded {
        /// Classified outcome.
        winner: Winner,
        /// Reason the game ended.
        reason: EndReason,
    },
}

/// Reasons a movement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum MoveError {
    /// Rounds are not being played.
    #[error("moves are only accepted while playing")]
    InvalidStage,
    /// No entity of the required kind exists.
    #[error("the moving entity is not on the board")]
    MissingEntity,
    /// The destination lies outside the board.
    #[error("the destination lies outside the board")]
    OutOfBounds,
    /// The destination is more than one tile away.
    #[error("the destination is not adjacent to the mover")]
    NotAdjacent,
    /// The destination holds a non-joinable entity.
    #[error("the destination is blocked")]
    Blocked,
    /// The destination already holds a pursuer.
    #[error("pursuers cannot share a tile")]
    PursuerPresent,
}

/// Reasons a setup request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SetupError {
    /// The request is not valid in the current stage.
    #[error("the request is not valid in the current stage")]
    InvalidStage,
    /// The requested tile lies outside the board.
    #[error("the tile lies outside the board")]
    OutOfBounds,
    /// Play cannot begin without a unit on the board.
    #[error("the game must include a unit before play begins")]
    MissingUnit,
    /// The requested board dimensions are empty or too large.
    #[error("board dimensions must lie between 1 and 64 tiles")]
    InvalidDimensions,
}

/// Cardinal movement directions available to the unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Straight-line distance between two cells.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f64 {
        let dx = f64::from(self.column.abs_diff(other.column));
        let dy = f64::from(self.row.abs_diff(other.row));
        dx.hypot(dy)
    }

    /// Number of king moves separating two cells.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Neighbouring cell in the provided direction.
    ///
    /// Returns `None` when the step would leave the coordinate plane; the
    /// upper board bounds are checked by the world.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::East => self
                .column
                .checked_add(1)
                .map(|column| Self::new(column, self.row)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
        }
    }
}

/// Variant tag shared by every entity on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Static blocker that can be destroyed by blasts.
    Obstacle,
    /// Explosive device the unit arms and pursuers disarm.
    Device,
    /// Autonomous hunter.
    Pursuer,
    /// Player-directed unit.
    Unit,
}

impl EntityKind {
    /// Every kind in declaration order.
    pub const ALL: [EntityKind; 4] = [Self::Obstacle, Self::Device, Self::Pursuer, Self::Unit];

    /// Single-character identity used by the textual board dump.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::Obstacle => 'a',
            Self::Device => 'm',
            Self::Pursuer => 'r',
            Self::Unit => 'u',
        }
    }

    /// Reports whether other entities may share a tile with this kind.
    #[must_use]
    pub const fn joinable(self) -> bool {
        !matches!(self, Self::Obstacle)
    }

    /// Reports whether blasts remove this kind from the board.
    #[must_use]
    pub const fn destroyable(self) -> bool {
        !matches!(self, Self::Unit)
    }

    /// Reports whether this kind moves between tiles.
    #[must_use]
    pub const fn movable(self) -> bool {
        matches!(self, Self::Pursuer | Self::Unit)
    }
}

/// Kind-specific state carried by an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Static blocker.
    Obstacle,
    /// Explosive device.
    Device {
        /// Whether the device detonates when disturbed.
        armed: bool,
        /// Whether the device has already exploded.
        exploded: bool,
        /// Square radius affected by the explosion.
        blast_radius: u32,
    },
    /// Autonomous hunter; a destroyed pursuer leaves the board.
    Pursuer,
    /// Player-directed unit; a caught unit leaves the board.
    Unit,
}

impl EntityState {
    /// Variant tag describing the state.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Obstacle => EntityKind::Obstacle,
            Self::Device { .. } => EntityKind::Device,
            Self::Pursuer => EntityKind::Pursuer,
            Self::Unit => EntityKind::Unit,
        }
    }

    /// Reports whether the state describes an armed device.
    #[must_use]
    pub const fn is_armed_device(&self) -> bool {
        matches!(self, Self::Device { armed: true, .. })
    }

    /// Reports whether the state describes an unarmed device.
    #[must_use]
    pub const fn is_unarmed_device(&self) -> bool {
        matches!(self, Self::Device { armed: false, .. })
    }
}

/// Entity requested by a setup placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    /// Places an obstacle.
    Obstacle,
    /// Places a device in the provided armed state.
    Device {
        /// Whether the device starts armed.
        armed: bool,
    },
    /// Places a pursuer.
    Pursuer,
    /// Places the unit, removing any unit already on the board.
    Unit,
}

impl Placement {
    /// Initial state assigned to an entity created by this placement.
    #[must_use]
    pub const fn initial_state(self) -> EntityState {
        match self {
            Self::Obstacle => EntityState::Obstacle,
            Self::Device { armed } => EntityState::Device {
                armed,
                exploded: false,
                blast_radius: DEFAULT_BLAST_RADIUS,
            },
            Self::Pursuer => EntityState::Pursuer,
            Self::Unit => EntityState::Unit,
        }
    }

    /// Variant tag of the placed entity.
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        self.initial_state().kind()
    }
}

/// Immutable representation of a single entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Tile currently holding the entity.
    pub cell: CellCoord,
    /// Kind-specific state.
    pub state: EntityState,
}

impl EntitySnapshot {
    /// Variant tag of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.state.kind()
    }
}

/// Counters presented to the player between rounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStats {
    /// Number of the active round.
    pub round: u32,
    /// Devices that still need arming.
    pub unarmed_devices: usize,
    /// Pursuers left on the board.
    pub pursuers: usize,
}

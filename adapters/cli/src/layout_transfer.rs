use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use mine_hunt_core::{CellCoord, Command, EntityKind, EntityState, Placement};
use mine_hunt_world::{query, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_DOMAIN: &str = "mine";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "mine:v1";
/// Delimiter used to separate the prefix, board dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Setup-stage board captured as a single line that can be pasted back later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BoardLayout {
    /// Number of board columns.
    pub(crate) width: u32,
    /// Number of board rows.
    pub(crate) height: u32,
    /// Entities in board-scan order.
    pub(crate) entities: Vec<LayoutEntity>,
}

impl BoardLayout {
    /// Captures every entity currently on the board.
    ///
    /// Layouts are taken during setup, where each tile holds at most one
    /// entity, so replaying the placements rebuilds the board exactly.
    #[must_use]
    pub(crate) fn capture(world: &World) -> Self {
        let (width, height) = query::dimensions(world);
        let entities = EntityKind::ALL
            .iter()
            .flat_map(|&kind| query::obtain(world, kind))
            .filter_map(|snapshot| {
                placement_for(snapshot.state).map(|placement| LayoutEntity {
                    placement,
                    cell: snapshot.cell,
                })
            })
            .collect();

        Self {
            width,
            height,
            entities,
        }
    }

    /// Commands that rebuild the captured board on a fresh world.
    #[must_use]
    pub(crate) fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.entities.len() + 1);
        commands.push(Command::ConfigureBoard {
            width: self.width,
            height: self.height,
        });
        commands.extend(self.entities.iter().map(|entity| Command::PlaceEntity {
            placement: entity.placement,
            cell: entity.cell,
        }));
        commands
    }

    /// Encodes the layout into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let json =
            serde_json::to_vec(&self.entities).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{LAYOUT_HEADER}:{}x{}:{encoded}", self.width, self.height))
    }

    /// Decodes a layout from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (width, height) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let entities: Vec<LayoutEntity> =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        if let Some(outside) = entities
            .iter()
            .find(|entity| entity.cell.column() >= width || entity.cell.row() >= height)
        {
            return Err(LayoutTransferError::OutOfBounds(outside.cell));
        }

        Ok(Self {
            width,
            height,
            entities,
        })
    }
}

/// Entity description captured within a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LayoutEntity {
    /// Entity to place.
    pub(crate) placement: Placement,
    /// Tile receiving the entity.
    pub(crate) cell: CellCoord,
}

/// Errors that can occur while encoding or decoding layout strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout code was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded layout.
    #[error("layout code is missing the prefix")]
    MissingPrefix,
    /// The encoded layout did not contain a version segment.
    #[error("layout code is missing the version")]
    MissingVersion,
    /// The encoded layout did not include board dimensions.
    #[error("layout code is missing the board dimensions")]
    MissingDimensions,
    /// The encoded layout did not include the payload segment.
    #[error("layout code is missing the payload")]
    MissingPayload,
    /// The encoded layout used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The board dimensions could not be parsed from the encoded layout.
    #[error("could not parse board dimensions '{0}'")]
    InvalidDimensions(String),
    /// An entity lies outside the encoded board.
    #[error("layout places an entity outside the board at {0:?}")]
    OutOfBounds(CellCoord),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}

fn placement_for(state: EntityState) -> Option<Placement> {
    match state {
        EntityState::Obstacle => Some(Placement::Obstacle),
        EntityState::Device {
            armed,
            exploded: false,
            ..
        } => Some(Placement::Device { armed }),
        EntityState::Device { .. } => None,
        EntityState::Pursuer => Some(Placement::Pursuer),
        EntityState::Unit => Some(Placement::Unit),
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if width == 0 || height == 0 {
        return Err(LayoutTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((width, height))
}

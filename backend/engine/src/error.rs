//! Errors surfaced by the engine.
//!
//! [`ValidationError`]s are recoverable: the action is refused, nothing was mutated, and
//! the session keeps going. [`InvariantViolation`]s are fatal to a session, which must
//! then be reloaded from its last persisted snapshot.

use crate::card::TrainColor;
use crate::city::City;
use crate::player::PlayerId;

use thiserror::Error;

/// A refused action. The message is meant to be shown to the player as-is.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("It is not player {player}'s turn (player {current} is playing).")]
    NotYourTurn { player: PlayerId, current: PlayerId },
    #[error("Player {0} is not part of this game.")]
    PlayerNotFound(PlayerId),
    #[error("Route {0} does not exist.")]
    RouteNotFound(usize),
    #[error("The selected route between {0} and {1} is already claimed.")]
    RouteAlreadyClaimed(City, City),
    #[error("{0}")]
    ParallelRouteUnavailable(String),
    #[error("Invalid cards for this route: {0}.")]
    InvalidCardSet(String),
    #[error("{0}")]
    DrawLimitExceeded(String),
    #[error("Cannot keep only {selected} ticket(s), whilst the minimum is {minimum}.")]
    InsufficientSelection { selected: usize, minimum: usize },
    #[error("Cannot keep {selected} ticket(s), whilst the maximum is {maximum}.")]
    ExcessSelection { selected: usize, maximum: usize },
    #[error("{0}")]
    InvalidIndex(String),
    #[error("Cannot use {requested} {color} card(s), whilst having only {held}.")]
    InsufficientCards {
        color: TrainColor,
        requested: usize,
        held: u8,
    },
    #[error("Cannot claim a route of length {length}, whilst having only {trains} trains left.")]
    NotEnoughTrains { length: u8, trains: u8 },
    #[error("{0}")]
    IllegalAction(String),
    #[error("The game is over.")]
    GameOver,
    #[error("Invalid game configuration: {0}.")]
    InvalidConfig(String),
}

/// A broken engine invariant. The session that detected it is unusable afterwards.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("Ticket economy is unbalanced: expected {expected} tickets in circulation, found {found}.")]
    TicketEconomy { expected: usize, found: usize },
}

/// Every error an engine operation may return.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error("This session hit a broken invariant and must be reloaded from its last snapshot.")]
    SessionUnusable,
}

impl EngineError {
    /// Whether the error leaves the session usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

//! What a player can ask the engine to do.

use crate::card::TrainColor;
use crate::event::ConquestEvent;
use crate::map::RouteId;

use serde::{Deserialize, Serialize};

/// Where a drawn train card comes from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawSource {
    /// One of the face-up cards, by slot index.
    Display(usize),
    /// The top of the deck, blind.
    DrawPile,
}

/// One player request.
///
/// # JSON
/// Actions are internally tagged by `type`, in snake_case.
///
/// ```
/// use ticket_to_ride_engine::action::{Action, DrawSource};
///
/// let action: Action = serde_json::from_str(
///     r#"{"type": "draw_cards", "picks": [{"display": 2}, "draw_pile"]}"#,
/// ).unwrap();
/// assert_eq!(
///     action,
///     Action::DrawCards { picks: vec![DrawSource::Display(2), DrawSource::DrawPile] },
/// );
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Take one or two train cards. A face-up wild card counts as two.
    ///
    /// Picks can be split across calls: one card now, the second one later in the same turn.
    DrawCards { picks: Vec<DrawSource> },
    /// Build a route, paying with exactly `cards`.
    ClaimRoute { route: RouteId, cards: Vec<TrainColor> },
    /// Draw tickets, which must then be selected with [`Action::SelectTickets`].
    DrawTickets,
    /// Decide which pending tickets to keep, one flag per pending ticket in draw order.
    SelectTickets { keep: Vec<bool> },
    /// End the turn.
    Pass,
}

impl Action {
    /// Short name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::DrawCards { .. } => "draw_cards",
            Action::ClaimRoute { .. } => "claim_route",
            Action::DrawTickets => "draw_tickets",
            Action::SelectTickets { .. } => "select_tickets",
            Action::Pass => "pass",
        }
    }
}

/// What happened once an action succeeded.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionOutcome {
    /// Whether the turn moved on to the next player.
    pub turn_over: bool,
    /// Whether the game just ended.
    pub game_over: bool,
    /// The conquest published, for a successful claim.
    pub event: Option<ConquestEvent>,
}

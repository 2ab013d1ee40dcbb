//! A player picking random legal moves, used to simulate whole games.

use crate::registry::{RegistryError, SessionRegistry};
use crate::store::SessionId;

use log::{debug, warn};
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use strum::IntoEnumIterator;

use ticket_to_ride_engine::action::{Action, DrawSource};
use ticket_to_ride_engine::card::TrainColor;
use ticket_to_ride_engine::map::Route;
use ticket_to_ride_engine::player::{Player, PlayerId};
use ticket_to_ride_engine::scoring::FinalScores;
use ticket_to_ride_engine::session::GameSession;
use ticket_to_ride_engine::ticket::KeepRule;
use ticket_to_ride_engine::turn::{GamePhase, TurnPhase};

/// Odds of drawing tickets instead of train cards, when no route can be claimed.
const DRAW_TICKETS_PROBABILITY: f64 = 0.05;

/// The player expected to act next: during the initial ticket selection, the first one
/// who has not chosen yet.
pub fn next_player(session: &GameSession) -> PlayerId {
    let state = session.state();

    if state.game_phase == GamePhase::Starting {
        if let Some(player) = state
            .players
            .iter()
            .find(|player| player.has_pending_tickets())
        {
            return player.id();
        }
    }

    session.current_player()
}

/// Picks a random action for `player_id`, which the engine should accept.
pub fn choose_action<R: Rng>(session: &GameSession, player_id: PlayerId, rng: &mut R) -> Action {
    let state = session.state();
    let config = session.config();
    let player = match state.player(player_id) {
        Ok(player) => player,
        Err(_) => return Action::Pass,
    };

    if state.game_phase == GamePhase::Starting {
        return select_tickets(player, config.initial_keep, rng);
    }

    match state.turn.phase {
        TurnPhase::TicketsPending => select_tickets(player, config.mid_game_keep, rng),
        TurnPhase::CardsDrawnPartial { .. } => match draw_source(session, rng) {
            Some(source) => Action::DrawCards {
                picks: vec![source],
            },
            None => Action::Pass,
        },
        TurnPhase::AwaitingAction => {
            let claimable: Vec<(&Route, Vec<TrainColor>)> = state
                .map
                .routes()
                .iter()
                .filter(|route| state.map.check_claimable(route.id, player_id).is_ok())
                .filter(|route| route.length <= player.trains_remaining())
                .filter_map(|route| pay_for(route, player).map(|cards| (route, cards)))
                .collect();

            if let Some((route, cards)) = claimable.choose(rng) {
                return Action::ClaimRoute {
                    route: route.id,
                    cards: cards.clone(),
                };
            }

            if !state.tickets.is_empty() && rng.gen_bool(DRAW_TICKETS_PROBABILITY) {
                return Action::DrawTickets;
            }

            match draw_source(session, rng) {
                Some(source) => Action::DrawCards {
                    picks: vec![source],
                },
                None => Action::Pass,
            }
        }
        TurnPhase::TurnComplete => Action::Pass,
    }
}

/// Keeps a random subset of the pending tickets, as large as the rule requires.
fn select_tickets<R: Rng>(player: &Player, rule: KeepRule, rng: &mut R) -> Action {
    let offered = player.pending_tickets().len();
    let minimum = rule.minimum.min(offered);
    let maximum = rule.maximum.min(offered).max(minimum);
    let num_kept = rng.gen_range(minimum..=maximum);

    let mut keep: Vec<bool> = (0..offered).map(|index| index < num_kept).collect();
    keep.shuffle(rng);

    Action::SelectTickets { keep }
}

/// A face-up non-wild card, or the draw pile.
fn draw_source<R: Rng>(session: &GameSession, rng: &mut R) -> Option<DrawSource> {
    let display = &session.state().display;
    let face_up = display
        .slots()
        .iter()
        .enumerate()
        .filter(|(_, card)| matches!(card, Some(color) if color.is_not_wild()))
        .map(|(index, _)| DrawSource::Display(index))
        .choose(rng);

    match face_up {
        Some(source) if rng.gen_bool(0.5) || display.deck().is_exhausted() => Some(source),
        _ if !display.deck().is_exhausted() => Some(DrawSource::DrawPile),
        _ => None,
    }
}

/// Cards from the hand of `player` paying for `route`, colored cards first and wild ones last.
pub fn pay_for(route: &Route, player: &Player) -> Option<Vec<TrainColor>> {
    let length = route.length;
    let wild_cards = player.count_of(TrainColor::Wild);

    let candidates: Vec<TrainColor> = if route.color.is_wild() {
        TrainColor::iter().filter(TrainColor::is_not_wild).collect()
    } else {
        vec![route.color]
    };

    for color in candidates {
        let colored = player.count_of(color).min(length);
        if colored + wild_cards >= length {
            let mut cards = vec![color; colored as usize];
            cards.extend(std::iter::repeat(TrainColor::Wild).take((length - colored) as usize));
            return Some(cards);
        }
    }

    None
}

/// Plays random moves for every player until the game ends, or `max_actions` were played.
///
/// Refused moves are replaced by a pass. Returns the scores as they stand at the end.
pub fn play_session<R: Rng>(
    registry: &SessionRegistry,
    id: &SessionId,
    rng: &mut R,
    max_actions: usize,
) -> Result<FinalScores, RegistryError> {
    for _ in 0..max_actions {
        let (player_id, action, over) = registry.with_session(id, |session| {
            let player_id = next_player(session);
            (player_id, choose_action(session, player_id, rng), session.is_over())
        })?;

        if over {
            break;
        }

        match registry.apply(id, player_id, action) {
            Ok(_) => {}
            Err(e) if e.is_recoverable() => {
                debug!("Bot move refused in session {}: {}", id, e);
                registry.apply(id, player_id, Action::Pass)?;
            }
            Err(e) => return Err(e),
        }
    }

    registry.with_session(id, |session| {
        if !session.is_over() {
            warn!("Session {} did not finish within {} actions", id, max_actions);
        }
        session.final_scores()
    })
}

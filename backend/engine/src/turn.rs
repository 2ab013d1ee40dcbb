//! The turn state machine.
//!
//! Every action goes through the same fixed driver, [`TurnActionEngine::execute`]:
//!
//! 1. general validation, shared by all actions (game not over, known player, their turn);
//! 2. action validation, specific to each [`Action`];
//! 3. execution, on a draft copy of the [`GameState`], which replaces the state only if
//!    it fully succeeds;
//! 4. state update, which publishes the conquest of a claimed route;
//! 5. turn advance, which hands the turn to the next player and drives the end game.
//!
//! A failure at any step leaves the state exactly as it was.

use crate::action::{Action, ActionOutcome, DrawSource};
use crate::card::TrainColor;
use crate::error::ValidationError;
use crate::event::{ConquestEvent, ConquestEventBus};
use crate::map::RouteId;
use crate::observer::EndGameState;
use crate::player::PlayerId;
use crate::session::{GameConfig, GameState};
use crate::ticket::KeepRule;
use crate::validator::RouteCardValidator;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// At most two train cards are drawn per turn.
pub const MAX_DRAWN_CARDS: u8 = 2;

/// Phases of the games, which act as states in the game's finite-state machine.
///
/// # JSON
/// Phases are serialized in snake_case.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// When the game starts, players concurrently select their initial tickets.
    ///
    /// Once all have done so, we move to the turn-based game ([`GamePhase::Playing`]).
    Starting,
    /// The main phase of the game.
    Playing,
    /// Once a player is left with few trains, every player has one turn left.
    LastTurn,
    /// No actions can be taken at this point.
    Done,
}

/// Progress within the current player's turn.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Nothing was done yet this turn.
    AwaitingAction,
    /// Some train cards were drawn, and another one may follow.
    CardsDrawnPartial { drawn: u8 },
    /// Tickets were drawn and must be selected before the turn ends.
    TicketsPending,
    /// The last turn of the game is over.
    TurnComplete,
}

/// Whose turn it is, and how far along.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TurnState {
    pub current_player: PlayerId,
    /// Starts at 0 once every player selected their initial tickets, and increments after each turn.
    pub turn: u32,
    pub phase: TurnPhase,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            current_player: 0,
            turn: 0,
            phase: TurnPhase::AwaitingAction,
        }
    }
}

/// Everything the hooks need beside the state they mutate.
pub struct TurnContext<'a> {
    pub config: &'a GameConfig,
    pub bus: &'a ConquestEventBus,
    pub end_game: &'a Mutex<EndGameState>,
}

/// Outcome of the execution hook.
struct Effect {
    turn_over: bool,
    event: Option<ConquestEvent>,
}

impl Effect {
    fn end_turn() -> Self {
        Self {
            turn_over: true,
            event: None,
        }
    }

    fn continue_turn() -> Self {
        Self {
            turn_over: false,
            event: None,
        }
    }
}

/// Dispatches every [`Action`] through the same validate, execute, update and advance steps.
pub struct TurnActionEngine;

impl TurnActionEngine {
    /// Runs `action` for `player_id`.
    ///
    /// On error, `state` is untouched.
    pub fn execute(
        state: &mut GameState,
        ctx: &TurnContext,
        player_id: PlayerId,
        action: &Action,
    ) -> Result<ActionOutcome, ValidationError> {
        Self::validate_general(state, player_id, action)?;
        Self::validate_action(state, ctx, player_id, action)?;

        let mut draft = state.clone();
        let effect = Self::apply(&mut draft, ctx, player_id, action)?;
        *state = draft;
        debug!(
            "Player {} played {} on turn {}",
            player_id,
            action.kind(),
            state.turn.turn
        );

        Self::update_state(ctx, &effect);
        let game_over = Self::advance_turn(state, ctx, &effect);

        Ok(ActionOutcome {
            turn_over: effect.turn_over,
            game_over,
            event: effect.event,
        })
    }

    fn validate_general(
        state: &GameState,
        player_id: PlayerId,
        action: &Action,
    ) -> Result<(), ValidationError> {
        if state.game_phase == GamePhase::Done {
            return Err(ValidationError::GameOver);
        }

        if player_id >= state.players.len() {
            return Err(ValidationError::PlayerNotFound(player_id));
        }

        // Initial tickets are selected by everyone at once, before turns start.
        if state.game_phase == GamePhase::Starting {
            return match action {
                Action::SelectTickets { .. } => Ok(()),
                _ => Err(ValidationError::IllegalAction(String::from(
                    "Every player must select their initial tickets before the game starts.",
                ))),
            };
        }

        if player_id != state.turn.current_player {
            return Err(ValidationError::NotYourTurn {
                player: player_id,
                current: state.turn.current_player,
            });
        }

        Ok(())
    }

    fn validate_action(
        state: &GameState,
        ctx: &TurnContext,
        player_id: PlayerId,
        action: &Action,
    ) -> Result<(), ValidationError> {
        let player = &state.players[player_id];
        let phase = state.turn.phase;

        match action {
            Action::DrawCards { picks } => {
                let drawn = match phase {
                    TurnPhase::AwaitingAction => 0,
                    TurnPhase::CardsDrawnPartial { drawn } => drawn,
                    _ => {
                        return Err(ValidationError::IllegalAction(String::from(
                            "Cannot draw train cards at this point of the turn.",
                        )))
                    }
                };

                let allowed = MAX_DRAWN_CARDS.saturating_sub(drawn) as usize;
                if picks.is_empty() || picks.len() > allowed {
                    return Err(ValidationError::DrawLimitExceeded(format!(
                        "Can draw between 1 and {} train card(s) now, not {}.",
                        allowed,
                        picks.len()
                    )));
                }

                Ok(())
            }
            Action::ClaimRoute { route, cards } => {
                let route = state.map.check_claimable(*route, player_id)?;
                Self::expect_fresh_turn(phase, "claim a route")?;
                player.check_trains(route.length)?;

                if cards.len() != route.length as usize {
                    return Err(ValidationError::InvalidCardSet(format!(
                        "requires exactly {} card(s), got {}",
                        route.length,
                        cards.len()
                    )));
                }

                player.check_hand(cards)
            }
            Action::DrawTickets => {
                Self::expect_fresh_turn(phase, "draw tickets")?;

                if state.tickets.is_empty() {
                    return Err(ValidationError::IllegalAction(String::from(
                        "No tickets left to draw.",
                    )));
                }

                Ok(())
            }
            Action::SelectTickets { keep } => {
                if state.game_phase != GamePhase::Starting && phase != TurnPhase::TicketsPending {
                    return Err(ValidationError::IllegalAction(String::from(
                        "No tickets are waiting to be selected.",
                    )));
                }

                player.check_selection(keep, Self::keep_rule(state, ctx))
            }
            Action::Pass => {
                if phase == TurnPhase::TicketsPending {
                    return Err(ValidationError::IllegalAction(String::from(
                        "Select the drawn tickets before ending the turn.",
                    )));
                }

                Ok(())
            }
        }
    }

    fn expect_fresh_turn(phase: TurnPhase, what: &str) -> Result<(), ValidationError> {
        if phase != TurnPhase::AwaitingAction {
            return Err(ValidationError::IllegalAction(format!(
                "Cannot {} after another action this turn.",
                what
            )));
        }

        Ok(())
    }

    fn keep_rule(state: &GameState, ctx: &TurnContext) -> KeepRule {
        if state.game_phase == GamePhase::Starting {
            ctx.config.initial_keep
        } else {
            ctx.config.mid_game_keep
        }
    }

    /// Execution hook. Only ever called on a draft.
    fn apply(
        state: &mut GameState,
        ctx: &TurnContext,
        player_id: PlayerId,
        action: &Action,
    ) -> Result<Effect, ValidationError> {
        match action {
            Action::DrawCards { picks } => Self::draw_cards(state, player_id, picks),
            Action::ClaimRoute { route, cards } => {
                Self::claim_route(state, player_id, *route, cards)
            }
            Action::DrawTickets => {
                let tickets = state.tickets.draw_set(ctx.config.tickets_per_draw);
                state.players[player_id].offer_tickets(tickets);
                state.turn.phase = TurnPhase::TicketsPending;

                Ok(Effect::continue_turn())
            }
            Action::SelectTickets { keep } => {
                let rule = Self::keep_rule(state, ctx);
                let returned = state.players[player_id].select_tickets(keep, rule)?;
                state.tickets.return_unchosen(returned);

                if state.game_phase != GamePhase::Starting {
                    return Ok(Effect::end_turn());
                }

                if state.players.iter().all(|player| !player.has_pending_tickets()) {
                    state.game_phase = GamePhase::Playing;
                    info!(
                        "Every player selected their tickets, player {} starts",
                        state.turn.current_player
                    );
                }

                Ok(Effect::continue_turn())
            }
            Action::Pass => Ok(Effect::end_turn()),
        }
    }

    fn draw_cards(
        state: &mut GameState,
        player_id: PlayerId,
        picks: &[DrawSource],
    ) -> Result<Effect, ValidationError> {
        let mut drawn = match state.turn.phase {
            TurnPhase::CardsDrawnPartial { drawn } => drawn,
            _ => 0,
        };
        let last_pick = picks.len().saturating_sub(1);

        for (position, pick) in picks.iter().enumerate() {
            let (card, cost) = match *pick {
                DrawSource::Display(index) => {
                    let card = state.display.peek(index)?;

                    if card.is_wild() && drawn > 0 {
                        return Err(ValidationError::DrawLimitExceeded(String::from(
                            "A face-up wild card cannot be drawn as a second card.",
                        )));
                    }
                    if card.is_wild() && position < last_pick {
                        return Err(ValidationError::DrawLimitExceeded(String::from(
                            "Drawing a face-up wild card ends the turn.",
                        )));
                    }

                    let cost = if card.is_wild() { MAX_DRAWN_CARDS } else { 1 };
                    (state.display.take_slot(index)?, cost)
                }
                DrawSource::DrawPile => {
                    let card = state.display.take_from_draw_pile().ok_or_else(|| {
                        ValidationError::IllegalAction(String::from(
                            "No train cards left to draw.",
                        ))
                    })?;
                    (card, 1)
                }
            };

            drawn += cost;
            state.players[player_id].add_card(card);
        }

        if drawn >= MAX_DRAWN_CARDS || !state.display.can_draw_again() {
            return Ok(Effect::end_turn());
        }

        state.turn.phase = TurnPhase::CardsDrawnPartial { drawn };
        Ok(Effect::continue_turn())
    }

    fn claim_route(
        state: &mut GameState,
        player_id: PlayerId,
        route_id: RouteId,
        cards: &[TrainColor],
    ) -> Result<Effect, ValidationError> {
        let route = state.map.route(route_id)?.clone();

        let validation = RouteCardValidator::validate(&route, cards);
        if !validation.valid {
            return Err(ValidationError::InvalidCardSet(
                validation.reason.unwrap_or_default(),
            ));
        }

        let player = &mut state.players[player_id];
        player.spend(cards)?;
        let trains_remaining_after = player.build_route(route.id, route.length)?;
        state.map.claim(route.id, player_id)?;
        state.display.discard(cards.to_vec());

        Ok(Effect {
            turn_over: true,
            event: Some(ConquestEvent {
                player: player_id,
                route: route.id,
                length: route.length,
                points_awarded: route.points(),
                trains_remaining_after,
                turn: state.turn.turn,
            }),
        })
    }

    /// State update hook: observers see the conquest before the turn moves on.
    fn update_state(ctx: &TurnContext, effect: &Effect) {
        if let Some(event) = &effect.event {
            info!(
                "Player {} claimed route {} for {} points, {} trains left",
                event.player, event.route, event.points_awarded, event.trains_remaining_after
            );
            ctx.bus.publish(event);
        }
    }

    /// Turn advance hook. Returns whether the game is over.
    fn advance_turn(state: &mut GameState, ctx: &TurnContext, effect: &Effect) -> bool {
        if !effect.turn_over {
            return false;
        }

        let mut end_game = ctx
            .end_game
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        end_game.complete_turn(state.turn.turn);

        if end_game.is_over() {
            state.game_phase = GamePhase::Done;
            state.turn.phase = TurnPhase::TurnComplete;
            info!("Game over after turn {}", state.turn.turn);
            return true;
        }

        if end_game.triggered && state.game_phase == GamePhase::Playing {
            state.game_phase = GamePhase::LastTurn;
            debug!("Last round: {} turns to go", end_game.turns_remaining);
        }

        state.turn.turn += 1;
        state.turn.current_player = (state.turn.current_player + 1) % state.players.len();
        state.turn.phase = TurnPhase::AwaitingAction;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::card::TrainColor::*;
    use crate::city::City;
    use crate::deck::Deck;
    use crate::display::{OpenDisplay, ResetRule};
    use pretty_assertions::assert_eq;

    struct Fixture {
        state: GameState,
        config: GameConfig,
        bus: ConquestEventBus,
        end_game: Mutex<EndGameState>,
    }

    impl Fixture {
        /// Two players, past the initial ticket selection.
        fn playing() -> Self {
            let config = GameConfig::default();
            let state = GameState::new(vec![String::from("Ada"), String::from("Grace")], &config).unwrap();
            let mut fixture = Self {
                state,
                config,
                bus: ConquestEventBus::new(),
                end_game: Mutex::new(EndGameState::default()),
            };

            for player_id in 0..2 {
                fixture
                    .execute(player_id, Action::SelectTickets { keep: vec![true; 3] })
                    .unwrap();
            }
            assert_eq!(fixture.state.game_phase, GamePhase::Playing);
            fixture
        }

        fn execute(&mut self, player_id: PlayerId, action: Action) -> Result<ActionOutcome, ValidationError> {
            let ctx = TurnContext {
                config: &self.config,
                bus: &self.bus,
                end_game: &self.end_game,
            };
            TurnActionEngine::execute(&mut self.state, &ctx, player_id, &action)
        }

        /// Replaces the display and the deck behind it. The last card of `deck` is on top.
        fn stack_display(&mut self, slots: [Option<TrainColor>; 5], deck: Vec<TrainColor>) {
            self.state.display = OpenDisplay::from_parts(slots, Deck::stacked(deck, 0), ResetRule::Never);
        }

        fn snapshot(&self) -> String {
            serde_json::to_string(&self.state).unwrap()
        }

        fn route_between(&self, a: City, b: City) -> RouteId {
            self.state.map.routes_between(a, b).next().unwrap().id
        }
    }

    #[test]
    fn game_phase_to_json() -> serde_json::Result<()> {
        assert_eq!(serde_json::to_string(&GamePhase::Starting)?, r#""starting""#);
        assert_eq!(serde_json::to_string(&GamePhase::LastTurn)?, r#""last_turn""#);
        assert_eq!(
            serde_json::from_str::<GamePhase>(r#""done""#)?,
            GamePhase::Done
        );
        assert!(serde_json::from_str::<GamePhase>(r#""in_lobby""#).is_err());

        Ok(())
    }

    #[test]
    fn turn_phase_to_json() -> serde_json::Result<()> {
        assert_eq!(
            serde_json::to_string(&TurnPhase::CardsDrawnPartial { drawn: 1 })?,
            r#"{"cards_drawn_partial":{"drawn":1}}"#
        );
        Ok(())
    }

    #[test]
    fn only_ticket_selection_while_starting() {
        let config = GameConfig::default();
        let mut state = GameState::new(vec![String::from("Ada"), String::from("Grace")], &config).unwrap();
        let bus = ConquestEventBus::new();
        let end_game = Mutex::new(EndGameState::default());
        let ctx = TurnContext {
            config: &config,
            bus: &bus,
            end_game: &end_game,
        };

        assert!(matches!(
            TurnActionEngine::execute(&mut state, &ctx, 0, &Action::Pass),
            Err(ValidationError::IllegalAction(_))
        ));

        // The second player may select first.
        let outcome = TurnActionEngine::execute(
            &mut state,
            &ctx,
            1,
            &Action::SelectTickets {
                keep: vec![true, true, false],
            },
        )
        .unwrap();
        assert!(!outcome.turn_over);
        assert_eq!(state.game_phase, GamePhase::Starting);

        // Initial selections keep at least two tickets.
        assert_eq!(
            TurnActionEngine::execute(
                &mut state,
                &ctx,
                0,
                &Action::SelectTickets {
                    keep: vec![false, false, true],
                },
            ),
            Err(ValidationError::InsufficientSelection {
                selected: 1,
                minimum: 2
            })
        );

        TurnActionEngine::execute(
            &mut state,
            &ctx,
            0,
            &Action::SelectTickets {
                keep: vec![true, true, true],
            },
        )
        .unwrap();
        assert_eq!(state.game_phase, GamePhase::Playing);
        assert_eq!(state.players[0].tickets().len(), 3);
        assert_eq!(state.players[1].tickets().len(), 2);
    }

    #[test]
    fn not_your_turn_leaves_state_unchanged() {
        let mut fixture = Fixture::playing();
        let before = fixture.snapshot();

        for action in [
            Action::Pass,
            Action::DrawTickets,
            Action::DrawCards {
                picks: vec![DrawSource::DrawPile],
            },
            Action::ClaimRoute {
                route: 0,
                cards: vec![Wild, Wild],
            },
        ] {
            assert_eq!(
                fixture.execute(1, action),
                Err(ValidationError::NotYourTurn {
                    player: 1,
                    current: 0
                })
            );
        }

        assert_eq!(fixture.snapshot(), before);
    }

    #[test]
    fn unknown_player() {
        let mut fixture = Fixture::playing();
        assert_eq!(
            fixture.execute(7, Action::Pass),
            Err(ValidationError::PlayerNotFound(7))
        );
    }

    #[test]
    fn single_draw_keeps_the_turn() {
        let mut fixture = Fixture::playing();
        fixture.stack_display(
            [Some(Red), Some(Blue), Some(Green), Some(Black), Some(White)],
            vec![Pink, Orange, Yellow],
        );
        let hand_size = fixture.state.players[0].num_train_cards();

        let outcome = fixture
            .execute(0, Action::DrawCards { picks: vec![DrawSource::Display(1)] })
            .unwrap();
        assert!(!outcome.turn_over);
        assert_eq!(fixture.state.turn.phase, TurnPhase::CardsDrawnPartial { drawn: 1 });
        assert_eq!(fixture.state.turn.current_player, 0);
        // The slot is refilled from the top of the deck.
        assert_eq!(fixture.state.display.peek(1), Ok(Yellow));

        // Only one more card this turn.
        assert!(matches!(
            fixture.execute(
                0,
                Action::DrawCards {
                    picks: vec![DrawSource::DrawPile, DrawSource::DrawPile]
                }
            ),
            Err(ValidationError::DrawLimitExceeded(_))
        ));

        let oranges = fixture.state.players[0].count_of(Orange);
        let outcome = fixture
            .execute(0, Action::DrawCards { picks: vec![DrawSource::DrawPile] })
            .unwrap();
        assert!(outcome.turn_over);
        assert_eq!(fixture.state.players[0].num_train_cards(), hand_size + 2);
        assert_eq!(fixture.state.players[0].count_of(Orange), oranges + 1);
        assert_eq!(fixture.state.turn.current_player, 1);
        assert_eq!(fixture.state.turn.turn, 1);
        assert_eq!(fixture.state.turn.phase, TurnPhase::AwaitingAction);
    }

    #[test]
    fn face_up_wild_ends_the_turn() {
        let mut fixture = Fixture::playing();
        fixture.stack_display(
            [Some(Wild), Some(Blue), Some(Green), Some(Black), Some(White)],
            vec![Pink, Orange, Yellow],
        );
        let wild_cards = fixture.state.players[0].count_of(Wild);

        let outcome = fixture
            .execute(0, Action::DrawCards { picks: vec![DrawSource::Display(0)] })
            .unwrap();
        assert!(outcome.turn_over);
        assert_eq!(fixture.state.players[0].count_of(Wild), wild_cards + 1);
        assert_eq!(fixture.state.turn.current_player, 1);
    }

    #[test]
    fn face_up_wild_as_second_card() {
        let mut fixture = Fixture::playing();
        fixture.stack_display(
            [Some(Wild), Some(Blue), Some(Green), Some(Black), Some(White)],
            vec![Pink, Orange, Yellow],
        );
        let before = fixture.snapshot();

        assert!(matches!(
            fixture.execute(
                0,
                Action::DrawCards {
                    picks: vec![DrawSource::Display(1), DrawSource::Display(0)]
                }
            ),
            Err(ValidationError::DrawLimitExceeded(_))
        ));
        assert!(matches!(
            fixture.execute(
                0,
                Action::DrawCards {
                    picks: vec![DrawSource::Display(0), DrawSource::DrawPile]
                }
            ),
            Err(ValidationError::DrawLimitExceeded(_))
        ));
        // The first pick of a rejected action is rolled back as well.
        assert_eq!(fixture.snapshot(), before);
    }

    #[test]
    fn draw_from_empty_slot() {
        let mut fixture = Fixture::playing();
        fixture.stack_display([Some(Red), None, None, None, None], Vec::new());
        let before = fixture.snapshot();

        assert!(matches!(
            fixture.execute(0, Action::DrawCards { picks: vec![DrawSource::Display(3)] }),
            Err(ValidationError::InvalidIndex(_))
        ));
        assert!(matches!(
            fixture.execute(0, Action::DrawCards { picks: vec![DrawSource::DrawPile] }),
            Err(ValidationError::IllegalAction(_))
        ));
        assert_eq!(fixture.snapshot(), before);
    }

    #[test]
    fn single_draw_ends_the_turn_when_nothing_else_can_be_drawn() {
        let mut fixture = Fixture::playing();
        fixture.stack_display([Some(Red), Some(Wild), None, None, None], Vec::new());

        let outcome = fixture
            .execute(0, Action::DrawCards { picks: vec![DrawSource::Display(0)] })
            .unwrap();
        assert!(outcome.turn_over);
    }

    #[test]
    fn claim_route() {
        let mut fixture = Fixture::playing();
        let route = fixture.route_between(City::Montreal, City::NewYork);
        for _ in 0..3 {
            fixture.state.players[0].add_card(Blue);
        }
        let blue_cards = fixture.state.players[0].count_of(Blue);
        let discarded = fixture.state.display.deck().discard_len();

        let outcome = fixture
            .execute(
                0,
                Action::ClaimRoute {
                    route,
                    cards: vec![Blue, Blue, Blue],
                },
            )
            .unwrap();

        assert_eq!(
            outcome.event,
            Some(ConquestEvent {
                player: 0,
                route,
                length: 3,
                points_awarded: 4,
                trains_remaining_after: 42,
                turn: 0,
            })
        );
        assert!(outcome.turn_over);
        assert_eq!(fixture.state.map.routes()[route].owner(), Some(0));
        assert_eq!(fixture.state.players[0].count_of(Blue), blue_cards - 3);
        assert_eq!(fixture.state.players[0].trains_remaining(), 42);
        assert_eq!(fixture.state.display.deck().discard_len(), discarded + 3);
        assert_eq!(fixture.state.turn.current_player, 1);
    }

    #[test]
    fn claim_route_with_invalid_cards() {
        let mut fixture = Fixture::playing();
        let route = fixture.route_between(City::Montreal, City::NewYork);
        for card in [Blue, Blue, Red] {
            fixture.state.players[0].add_card(card);
        }
        let before = fixture.snapshot();

        assert_eq!(
            fixture.execute(
                0,
                Action::ClaimRoute {
                    route,
                    cards: vec![Blue, Blue, Red],
                },
            ),
            Err(ValidationError::InvalidCardSet(String::from(
                "route requires blue cards"
            )))
        );
        assert_eq!(fixture.snapshot(), before);
    }

    #[test]
    fn claim_route_without_the_cards() {
        let mut fixture = Fixture::playing();
        let route = fixture.route_between(City::Portland, City::SaltLakeCity);
        let held = fixture.state.players[0].count_of(Blue);

        assert_eq!(
            fixture.execute(
                0,
                Action::ClaimRoute {
                    route,
                    cards: vec![Blue; 6],
                },
            ),
            Err(ValidationError::InsufficientCards {
                color: Blue,
                requested: 6,
                held
            })
        );
    }

    #[test]
    fn claim_route_with_too_many_cards() {
        let mut fixture = Fixture::playing();
        let route = fixture.route_between(City::Montreal, City::NewYork);
        let before = fixture.snapshot();

        assert_eq!(
            fixture.execute(
                0,
                Action::ClaimRoute {
                    route,
                    cards: vec![Blue; 256],
                },
            ),
            Err(ValidationError::InvalidCardSet(String::from(
                "requires exactly 3 card(s), got 256"
            )))
        );
        assert_eq!(fixture.snapshot(), before);
    }

    #[test]
    fn claim_after_drawing() {
        let mut fixture = Fixture::playing();
        fixture.stack_display(
            [Some(Red), Some(Blue), Some(Green), Some(Black), Some(White)],
            vec![Pink, Orange, Yellow],
        );
        fixture
            .execute(0, Action::DrawCards { picks: vec![DrawSource::Display(0)] })
            .unwrap();

        let route = fixture.route_between(City::Atlanta, City::Nashville);
        fixture.state.players[0].add_card(Red);
        assert!(matches!(
            fixture.execute(0, Action::ClaimRoute { route, cards: vec![Red] }),
            Err(ValidationError::IllegalAction(_))
        ));

        // Passing ends the turn after a single card.
        assert!(fixture.execute(0, Action::Pass).unwrap().turn_over);
    }

    #[test]
    fn claimed_route_cannot_be_claimed_again() {
        let mut fixture = Fixture::playing();
        let route = fixture.route_between(City::Atlanta, City::Nashville);
        fixture.state.players[0].add_card(Red);
        fixture.state.players[1].add_card(Red);

        fixture
            .execute(0, Action::ClaimRoute { route, cards: vec![Red] })
            .unwrap();
        assert_eq!(
            fixture.execute(1, Action::ClaimRoute { route, cards: vec![Red] }),
            Err(ValidationError::RouteAlreadyClaimed(City::Atlanta, City::Nashville))
        );
        assert_eq!(
            fixture.execute(1, Action::ClaimRoute { route: 500, cards: vec![Red] }),
            Err(ValidationError::RouteNotFound(500))
        );
    }

    #[test]
    fn draw_and_select_tickets() {
        let mut fixture = Fixture::playing();
        let deck_size = fixture.state.tickets.len();

        let outcome = fixture.execute(0, Action::DrawTickets).unwrap();
        assert!(!outcome.turn_over);
        assert_eq!(fixture.state.turn.phase, TurnPhase::TicketsPending);
        assert_eq!(fixture.state.players[0].pending_tickets().len(), 3);
        assert_eq!(fixture.state.tickets.len(), deck_size - 3);

        assert!(matches!(
            fixture.execute(0, Action::Pass),
            Err(ValidationError::IllegalAction(_))
        ));
        assert_eq!(
            fixture.execute(0, Action::SelectTickets { keep: vec![false; 3] }),
            Err(ValidationError::InsufficientSelection {
                selected: 0,
                minimum: 1
            })
        );

        let outcome = fixture
            .execute(0, Action::SelectTickets { keep: vec![false, true, false] })
            .unwrap();
        assert!(outcome.turn_over);
        assert_eq!(fixture.state.players[0].tickets().len(), 4);
        assert_eq!(fixture.state.tickets.len(), deck_size - 1);
        assert_eq!(fixture.state.turn.current_player, 1);
    }

    #[test]
    fn select_tickets_without_drawing() {
        let mut fixture = Fixture::playing();
        assert!(matches!(
            fixture.execute(0, Action::SelectTickets { keep: vec![true] }),
            Err(ValidationError::IllegalAction(_))
        ));
    }

    #[test]
    fn end_game_countdown() {
        let mut fixture = Fixture::playing();
        // Both players get one more turn once the end game is triggered on turn 0.
        fixture.end_game.lock().unwrap().trigger(0, 0, 2);

        fixture.execute(0, Action::Pass).unwrap();
        assert_eq!(fixture.state.game_phase, GamePhase::LastTurn);

        let outcome = fixture.execute(1, Action::Pass).unwrap();
        assert!(!outcome.game_over);
        assert_eq!(fixture.state.game_phase, GamePhase::LastTurn);

        let outcome = fixture.execute(0, Action::Pass).unwrap();
        assert!(outcome.game_over);
        assert_eq!(fixture.state.game_phase, GamePhase::Done);
        assert_eq!(fixture.state.turn.phase, TurnPhase::TurnComplete);

        assert_eq!(fixture.execute(1, Action::Pass), Err(ValidationError::GameOver));
    }
}

//! A single game: its configuration, its state, and the observers wired to it.

use crate::action::{Action, ActionOutcome};
use crate::card::all_train_cards;
use crate::deck::Deck;
use crate::display::{OpenDisplay, ResetRule};
use crate::error::{EngineError, InvariantViolation, ValidationError};
use crate::event::{ConquestEventBus, ConquestObserver};
use crate::map::Map;
use crate::observer::{
    EndCondition, EndGameObserver, EndGameState, ScoreLedger, ScoreObserver,
};
use crate::player::{Player, PlayerId, NUM_OF_TRAINS};
use crate::scoring::{FinalScores, FinalScoringCalculator};
use crate::ticket::{us_tickets, KeepRule, TicketDeck, NUM_DRAWN_TICKETS};
use crate::turn::{GamePhase, TurnActionEngine, TurnContext, TurnState};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 5;

/// Rules of a session, fixed when it is created.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seeds every deck of the session. The same seed and the same actions replay the same game.
    pub seed: u64,
    pub reset_rule: ResetRule,
    pub end_condition: EndCondition,
    pub tickets_per_draw: usize,
    pub initial_keep: KeepRule,
    pub mid_game_keep: KeepRule,
    pub initial_hand_size: usize,
    pub trains_per_player: u8,
    pub longest_path_bonus: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            reset_rule: ResetRule::default(),
            end_condition: EndCondition::default(),
            tickets_per_draw: NUM_DRAWN_TICKETS,
            initial_keep: KeepRule::INITIAL,
            mid_game_keep: KeepRule::MID_GAME,
            initial_hand_size: 4,
            trains_per_player: NUM_OF_TRAINS,
            longest_path_bonus: 10,
        }
    }
}

impl GameConfig {
    /// Rejects rules under which a game could not progress.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tickets_per_draw == 0 {
            return Err(ValidationError::InvalidConfig(String::from(
                "at least one ticket must be drawn at a time",
            )));
        }

        for (name, rule) in [
            ("initial", self.initial_keep),
            ("mid-game", self.mid_game_keep),
        ] {
            if rule.minimum > rule.maximum {
                return Err(ValidationError::InvalidConfig(format!(
                    "the {} keep rule asks for at least {} ticket(s) but at most {}",
                    name, rule.minimum, rule.maximum
                )));
            }
        }

        Ok(())
    }
}

/// Everything the turn engine mutates.
///
/// Cloning it is how actions are made all-or-nothing: they run on a copy, which
/// replaces the original only on success.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GameState {
    /// In registration order, which is also the turn order.
    pub players: Vec<Player>,
    pub map: Map,
    /// The face-up cards, and the train card deck behind them.
    pub display: OpenDisplay,
    pub tickets: TicketDeck,
    pub turn: TurnState,
    pub game_phase: GamePhase,
}

impl GameState {
    /// Deals a new game: every player gets their initial train cards and tickets to choose from.
    pub fn new(names: Vec<String>, config: &GameConfig) -> Result<Self, ValidationError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&names.len()) {
            return Err(ValidationError::IllegalAction(format!(
                "A game needs between {} and {} players, not {}.",
                MIN_PLAYERS,
                MAX_PLAYERS,
                names.len()
            )));
        }
        config.validate()?;

        let mut display = OpenDisplay::new(
            Deck::new(all_train_cards(), config.seed),
            config.reset_rule,
        );
        let mut tickets = TicketDeck::new(us_tickets(), config.seed.wrapping_add(1));
        let num_players = names.len();

        let mut players = Vec::with_capacity(num_players);
        for (id, name) in names.into_iter().enumerate() {
            let mut player = Player::new(id, name, config.trains_per_player);

            for card in std::iter::from_fn(|| display.take_from_draw_pile())
                .take(config.initial_hand_size)
            {
                player.add_card(card);
            }
            player.offer_tickets(tickets.draw_set(config.tickets_per_draw));

            players.push(player);
        }
        display.initialize();

        Ok(Self {
            players,
            map: Map::new(num_players),
            display,
            tickets,
            turn: TurnState::default(),
            game_phase: GamePhase::Starting,
        })
    }

    pub fn player(&self, player_id: PlayerId) -> Result<&Player, ValidationError> {
        self.players
            .get(player_id)
            .ok_or(ValidationError::PlayerNotFound(player_id))
    }

    /// Tickets in the deck, held, or pending selection.
    pub fn tickets_in_circulation(&self) -> usize {
        self.tickets.len()
            + self
                .players
                .iter()
                .map(|player| player.tickets().len() + player.pending_tickets().len())
                .sum::<usize>()
    }
}

/// Plain data capturing a whole session, observers aside.
///
/// [`GameSession::restore`] rebuilds a session which plays on exactly as the original would.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Snapshot {
    pub config: GameConfig,
    pub state: GameState,
    pub ledger: ScoreLedger,
    pub end_game: EndGameState,
    pub poisoned: bool,
    /// Tickets in circulation since the game was dealt.
    pub total_tickets: usize,
}

/// One game, and the single entry point for the actions played in it.
pub struct GameSession {
    config: GameConfig,
    state: GameState,
    bus: ConquestEventBus,
    ledger: Arc<Mutex<ScoreLedger>>,
    end_game: Arc<Mutex<EndGameState>>,
    end_game_observer: Arc<EndGameObserver>,
    total_tickets: usize,
    /// Set once an invariant broke. The session refuses every action afterwards.
    poisoned: bool,
}

impl GameSession {
    /// Deals a new game for the given players, in turn order.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::action::Action;
    /// use ticket_to_ride_engine::session::{GameConfig, GameSession};
    ///
    /// let mut session = GameSession::new(
    ///     vec![String::from("Ada"), String::from("Grace")],
    ///     GameConfig::default(),
    /// ).unwrap();
    ///
    /// for player_id in 0..2 {
    ///     session.apply(player_id, Action::SelectTickets { keep: vec![true, true, false] }).unwrap();
    /// }
    /// assert!(session.apply(0, Action::Pass).unwrap().turn_over);
    /// assert_eq!(session.current_player(), 1);
    /// ```
    pub fn new(names: Vec<String>, config: GameConfig) -> Result<Self, EngineError> {
        let state = GameState::new(names, &config)?;
        let total_tickets = state.tickets_in_circulation();
        info!(
            "New game for {} players with seed {}",
            state.players.len(),
            config.seed
        );

        Ok(Self::wire(
            config,
            state,
            ScoreLedger::default(),
            EndGameState::default(),
            false,
            total_tickets,
        ))
    }

    /// Rebuilds a session from a snapshot, with the default observers subscribed.
    pub fn restore(snapshot: Snapshot) -> Self {
        Self::wire(
            snapshot.config,
            snapshot.state,
            snapshot.ledger,
            snapshot.end_game,
            snapshot.poisoned,
            snapshot.total_tickets,
        )
    }

    fn wire(
        config: GameConfig,
        state: GameState,
        ledger: ScoreLedger,
        end_game: EndGameState,
        poisoned: bool,
        total_tickets: usize,
    ) -> Self {
        let ledger = Arc::new(Mutex::new(ledger));
        let end_game = Arc::new(Mutex::new(end_game));
        let end_game_observer = Arc::new(EndGameObserver::new(
            end_game.clone(),
            config.end_condition,
            state.players.len(),
        ));

        let mut bus = ConquestEventBus::new();
        bus.subscribe(Arc::new(ScoreObserver::new(ledger.clone())));
        bus.subscribe(end_game_observer.clone());

        Self {
            config,
            state,
            bus,
            ledger,
            end_game,
            end_game_observer,
            total_tickets,
            poisoned,
        }
    }

    /// Deals a new game for the same players, keeping the subscribed observers.
    pub fn restart(&mut self, seed: u64) -> Result<(), EngineError> {
        let names = self
            .state
            .players
            .iter()
            .map(|player| player.name().to_string())
            .collect();
        let config = GameConfig {
            seed,
            ..self.config.clone()
        };
        let state = GameState::new(names, &config)?;

        self.total_tickets = state.tickets_in_circulation();
        self.state = state;
        self.config = config;
        self.poisoned = false;
        *self.ledger.lock().unwrap_or_else(PoisonError::into_inner) = ScoreLedger::default();
        self.end_game_observer.reset();
        info!("Game restarted with seed {}", seed);

        Ok(())
    }

    /// Adds an observer notified of every conquest, after the default ones.
    pub fn subscribe(&mut self, observer: Arc<dyn ConquestObserver>) {
        self.bus.subscribe(observer);
    }

    pub fn unsubscribe(&mut self, observer: &Arc<dyn ConquestObserver>) {
        self.bus.unsubscribe(observer);
    }

    /// Plays `action` for `player_id`.
    ///
    /// A [`ValidationError`] leaves the session as it was. An [`InvariantViolation`]
    /// leaves it unusable: every later action fails with [`EngineError::SessionUnusable`].
    pub fn apply(
        &mut self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<ActionOutcome, EngineError> {
        if self.poisoned {
            return Err(EngineError::SessionUnusable);
        }

        let ctx = TurnContext {
            config: &self.config,
            bus: &self.bus,
            end_game: &self.end_game,
        };
        let outcome = TurnActionEngine::execute(&mut self.state, &ctx, player_id, &action)?;

        if matches!(action, Action::DrawTickets | Action::SelectTickets { .. }) {
            self.check_ticket_economy()?;
        }

        Ok(outcome)
    }

    /// Every ticket is either in the deck or with a player, and none ever appears or vanishes.
    fn check_ticket_economy(&mut self) -> Result<(), InvariantViolation> {
        let found = self.state.tickets_in_circulation();
        if found == self.total_tickets {
            return Ok(());
        }

        self.poisoned = true;
        let violation = InvariantViolation::TicketEconomy {
            expected: self.total_tickets,
            found,
        };
        warn!("Session is now unusable: {}", violation);
        Err(violation)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_player(&self) -> PlayerId {
        self.state.turn.current_player
    }

    pub fn num_players(&self) -> usize {
        self.state.players.len()
    }

    /// Route points credited so far to `player_id`.
    pub fn score(&self, player_id: PlayerId) -> i32 {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .points_of(player_id)
    }

    pub fn end_game(&self) -> EndGameState {
        *self.end_game.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_over(&self) -> bool {
        self.state.game_phase == GamePhase::Done
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn observer_count(&self) -> usize {
        self.bus.observer_count()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            config: self.config.clone(),
            state: self.state.clone(),
            ledger: self
                .ledger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            end_game: self.end_game(),
            poisoned: self.poisoned,
            total_tickets: self.total_tickets,
        }
    }

    /// Scores as they stand, including tickets and the longest path bonus.
    pub fn final_scores(&self) -> FinalScores {
        let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        FinalScoringCalculator::calculate(
            &self.state.players,
            &self.state.map,
            &ledger,
            self.config.longest_path_bonus,
        )
    }
}

//! The two observers every session subscribes: route scoring and end-game detection.

use crate::event::{ConquestEvent, ConquestObserver};
use crate::player::PlayerId;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Route points credited to each player so far.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScoreLedger {
    points: BTreeMap<PlayerId, i32>,
}

impl ScoreLedger {
    pub fn credit(&mut self, player_id: PlayerId, points: i32) {
        *self.points.entry(player_id).or_insert(0) += points;
    }

    /// Points of `player_id`, zero if nothing was credited yet.
    pub fn points_of(&self, player_id: PlayerId) -> i32 {
        self.points.get(&player_id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &i32)> {
        self.points.iter()
    }
}

/// Credits the points of every conquest to the attached [`ScoreLedger`].
pub struct ScoreObserver {
    ledger: Option<Arc<Mutex<ScoreLedger>>>,
}

impl ScoreObserver {
    pub fn new(ledger: Arc<Mutex<ScoreLedger>>) -> Self {
        Self {
            ledger: Some(ledger),
        }
    }

    /// An observer without a ledger, which ignores every event.
    pub fn detached() -> Self {
        Self { ledger: None }
    }
}

impl ConquestObserver for ScoreObserver {
    fn on_conquest(&self, event: &ConquestEvent) {
        if let Some(ledger) = &self.ledger {
            ledger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .credit(event.player, event.points_awarded as i32);
        }
    }

    fn name(&self) -> &str {
        "score"
    }
}

/// When the last round starts.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EndCondition {
    /// The end game triggers once a player is left with this many trains or fewer.
    pub train_threshold: u8,
    /// Turns played after the triggering one.
    /// `None` gives every player, including the one who triggered it, one last turn.
    pub final_turns: Option<u32>,
}

impl Default for EndCondition {
    fn default() -> Self {
        Self {
            train_threshold: 2,
            final_turns: None,
        }
    }
}

impl EndCondition {
    #[inline]
    pub fn is_met(&self, trains_remaining: u8) -> bool {
        trains_remaining <= self.train_threshold
    }

    pub fn final_turns_for(&self, num_players: usize) -> u32 {
        self.final_turns.unwrap_or(num_players as u32)
    }
}

/// Progress of the end game. Once triggered, it stays triggered.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EndGameState {
    pub triggered: bool,
    pub trigger_player: Option<PlayerId>,
    pub trigger_turn: Option<u32>,
    pub turns_remaining: u32,
}

impl EndGameState {
    /// Records the trigger, unless the end game already started.
    /// Returns whether this call triggered it.
    pub fn trigger(&mut self, player_id: PlayerId, turn: u32, final_turns: u32) -> bool {
        if self.triggered {
            return false;
        }

        self.triggered = true;
        self.trigger_player = Some(player_id);
        self.trigger_turn = Some(turn);
        self.turns_remaining = final_turns;
        true
    }

    /// Counts down once `turn`, a turn played after the triggering one, is over.
    pub fn complete_turn(&mut self, turn: u32) {
        match self.trigger_turn {
            Some(trigger_turn) if turn > trigger_turn => {
                self.turns_remaining = self.turns_remaining.saturating_sub(1);
            }
            _ => {}
        }
    }

    /// Whether the last round is being played.
    pub fn is_counting_down(&self) -> bool {
        self.triggered && self.turns_remaining > 0
    }

    pub fn is_over(&self) -> bool {
        self.triggered && self.turns_remaining == 0
    }
}

/// Starts the end game on the first conquest leaving a player short of trains.
pub struct EndGameObserver {
    state: Arc<Mutex<EndGameState>>,
    condition: EndCondition,
    final_turns: u32,
}

impl EndGameObserver {
    pub fn new(state: Arc<Mutex<EndGameState>>, condition: EndCondition, num_players: usize) -> Self {
        Self {
            state,
            condition,
            final_turns: condition.final_turns_for(num_players),
        }
    }

    /// Forgets the trigger. Only meant for a brand new game.
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = EndGameState::default();
    }
}

impl ConquestObserver for EndGameObserver {
    fn on_conquest(&self, event: &ConquestEvent) {
        if !self.condition.is_met(event.trains_remaining_after) {
            return;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.trigger(event.player, event.turn, self.final_turns) {
            log::info!(
                "Player {} has {} trains left: end game triggered on turn {}, {} turns to go",
                event.player,
                event.trains_remaining_after,
                event.turn,
                self.final_turns
            );
        }
    }

    fn name(&self) -> &str {
        "end-game"
    }
}

//! The five face-up train cards, and the deck behind them.

use crate::card::{count_wild, TrainColor};
use crate::deck::Deck;
use crate::error::ValidationError;

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Number of face-up train cards.
pub const NUM_OPEN_TRAIN_CARDS: usize = 5;
/// Default number of face-up locomotives that forces a reset of the display.
pub const WILD_CARD_LIMIT: usize = 3;

/// Decides whether the face-up cards must be discarded and dealt again.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetRule {
    /// Reset once at least this many wild cards are face up.
    Threshold(usize),
    /// Never reset.
    Never,
}

impl Default for ResetRule {
    fn default() -> Self {
        ResetRule::Threshold(WILD_CARD_LIMIT)
    }
}

impl ResetRule {
    /// Whether the given face-up cards call for a reset.
    pub fn should_reset(&self, cards: &[TrainColor]) -> bool {
        match self {
            ResetRule::Threshold(threshold) => count_wild(cards) >= *threshold,
            ResetRule::Never => false,
        }
    }
}

type Slots = SmallVec<[Option<TrainColor>; NUM_OPEN_TRAIN_CARDS]>;

/// Owns the train card [`Deck`] and the face-up display dealt from it.
///
/// Slots are `None` only when the deck and its discard pile ran dry.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OpenDisplay {
    slots: Slots,
    deck: Deck<TrainColor>,
    rule: ResetRule,
    /// How many times the display was discarded and dealt again.
    resets: u32,
}

impl OpenDisplay {
    /// Wraps `deck`. The display is empty until [`OpenDisplay::initialize`] is called.
    pub fn new(deck: Deck<TrainColor>, rule: ResetRule) -> Self {
        Self {
            slots: SmallVec::from_elem(None, NUM_OPEN_TRAIN_CARDS),
            deck,
            rule,
            resets: 0,
        }
    }

    /// Builds a display with the exact given slots, then settles the reset rule.
    pub fn from_parts(
        slots: [Option<TrainColor>; NUM_OPEN_TRAIN_CARDS],
        deck: Deck<TrainColor>,
        rule: ResetRule,
    ) -> Self {
        let mut display = Self {
            slots: SmallVec::from(slots),
            deck,
            rule,
            resets: 0,
        };
        display.settle();
        display
    }

    /// Deals every empty slot from the deck, then applies the reset rule.
    ///
    /// If fewer than five cards are left across the draw and discard piles,
    /// the display simply holds fewer cards.
    pub fn initialize(&mut self) {
        self.refill();
        self.settle();
    }

    /// Takes the face-up card at `index`, and replaces it from the deck.
    ///
    /// Returns `InvalidIndex` if the index is out of bounds or the slot is empty.
    /// When no replacement exists, the slot stays empty.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::card::all_train_cards;
    /// use ticket_to_ride_engine::deck::Deck;
    /// use ticket_to_ride_engine::display::{OpenDisplay, ResetRule};
    ///
    /// let mut display = OpenDisplay::new(Deck::new(all_train_cards(), 1), ResetRule::default());
    /// display.initialize();
    ///
    /// assert!(display.take_slot(2).is_ok());
    /// assert!(display.take_slot(5).is_err());
    /// ```
    pub fn take_slot(&mut self, index: usize) -> Result<TrainColor, ValidationError> {
        let card = self.peek(index)?;

        self.slots[index] = self.deck.draw();
        self.settle();

        Ok(card)
    }

    /// Draws blind from the top of the deck, bypassing the display.
    pub fn take_from_draw_pile(&mut self) -> Option<TrainColor> {
        self.deck.draw()
    }

    /// The card at `index`, without taking it.
    pub fn peek(&self, index: usize) -> Result<TrainColor, ValidationError> {
        if index >= NUM_OPEN_TRAIN_CARDS {
            return Err(ValidationError::InvalidIndex(format!(
                "Card looked up at index {} is out of bounds (size {}).",
                index, NUM_OPEN_TRAIN_CARDS
            )));
        }

        self.slots[index].ok_or_else(|| {
            ValidationError::InvalidIndex(format!("No cards found at index {}.", index))
        })
    }

    /// Sends cards spent on a route to the discard pile.
    pub fn discard(&mut self, cards: Vec<TrainColor>) {
        self.deck.discard_all(cards);

        // A display that shrank for lack of cards is dealt again as soon as possible.
        if self.slots.iter().any(Option::is_none) {
            self.refill();
            self.settle();
        }
    }

    /// Whether a player who already drew one card this turn could draw another.
    ///
    /// False when no card is left anywhere, or when only face-up wild cards remain:
    /// those cannot be taken as a second card.
    pub fn can_draw_again(&self) -> bool {
        !self.deck.is_exhausted()
            || self
                .slots
                .iter()
                .any(|card| matches!(card, Some(color) if color.is_not_wild()))
    }

    /// The face-up slots, in order.
    pub fn slots(&self) -> &[Option<TrainColor>] {
        &self.slots
    }

    /// The face-up cards, skipping empty slots.
    pub fn cards(&self) -> Vec<TrainColor> {
        self.slots.iter().flatten().copied().collect()
    }

    pub fn wild_count(&self) -> usize {
        count_wild(&self.cards())
    }

    pub fn deck(&self) -> &Deck<TrainColor> {
        &self.deck
    }

    pub fn rule(&self) -> ResetRule {
        self.rule
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Total train cards held by the display, the draw pile and the discard pile.
    pub fn pool_size(&self) -> usize {
        self.cards().len() + self.deck.len() + self.deck.discard_len()
    }

    fn refill(&mut self) {
        for slot in self.slots.iter_mut().filter(|slot| slot.is_none()) {
            match self.deck.draw() {
                Some(card) => *slot = Some(card),
                None => break,
            }
        }
    }

    /// Whether some deal from the current pool would satisfy the reset rule.
    /// If not, resetting could go on forever, so we keep the display as is.
    fn can_settle(&self) -> bool {
        let pool = self.cards().into_iter().chain(self.deck.iter().copied());
        let (mut best_case, wild): (Vec<_>, Vec<_>) = pool.partition(TrainColor::is_not_wild);
        best_case.truncate(NUM_OPEN_TRAIN_CARDS);
        best_case.extend(wild.into_iter().take(NUM_OPEN_TRAIN_CARDS - best_case.len()));

        !self.rule.should_reset(&best_case)
    }

    /// Applies the reset rule until the display satisfies it, the pool cannot satisfy it,
    /// or we made enough attempts. Returns whether the display was reset at least once.
    fn settle(&mut self) -> bool {
        let max_attempts = self.pool_size() * NUM_OPEN_TRAIN_CARDS;
        let mut reset = false;

        for _ in 0..max_attempts {
            if !self.rule.should_reset(&self.cards()) || !self.can_settle() {
                break;
            }

            let face_up: Vec<_> = self.slots.iter_mut().filter_map(Option::take).collect();
            debug!(
                "Resetting the open display ({} wild cards face up).",
                count_wild(&face_up)
            );
            self.deck.discard_all(face_up);
            self.refill();

            self.resets += 1;
            reset = true;
        }

        reset
    }
}

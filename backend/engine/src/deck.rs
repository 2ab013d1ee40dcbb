//! A generic shuffled stack of cards with a discard pile.
//!
//! The draw pile is a [`VecDeque`] whose *back* is the top of the deck: drawing pops from
//! the back, while putting a card at the bottom pushes it to the front.
//!
//! Exhaustion is never an error. Once both piles are empty, [`Deck::draw`] returns `None`
//! and callers decide what that means for the game.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Shuffled draw pile backed by a discard pile.
///
/// Every deck owns its RNG, so the order of future reshuffles is part of its state and
/// survives a snapshot round-trip.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Deck<T> {
    draw_pile: VecDeque<T>,
    discard_pile: Vec<T>,
    rng: ChaCha8Rng,
}

impl<T> Deck<T> {
    /// Creates a deck holding `items`, shuffled with an RNG seeded from `seed`.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::deck::Deck;
    ///
    /// let mut deck = Deck::new(vec![1, 2, 3], 42);
    /// assert_eq!(deck.len(), 3);
    /// assert!(deck.draw().is_some());
    /// ```
    pub fn new(items: Vec<T>, seed: u64) -> Self {
        let mut deck = Self::stacked(items, seed);
        deck.shuffle();
        deck
    }

    /// Creates a deck without shuffling: the last item of `items` is the top card.
    pub fn stacked(items: Vec<T>, seed: u64) -> Self {
        Self {
            draw_pile: VecDeque::from(items),
            discard_pile: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Removes and returns the top card.
    ///
    /// If the draw pile is empty, the discard pile is first shuffled back in.
    /// Returns `None` only when both piles are empty.
    pub fn draw(&mut self) -> Option<T> {
        if self.draw_pile.is_empty() {
            self.reshuffle_from_discard();
        }

        self.draw_pile.pop_back()
    }

    /// Puts `item` at the bottom of the draw pile if `at_bottom`, or onto the discard pile
    /// otherwise.
    pub fn add(&mut self, item: T, at_bottom: bool) {
        if at_bottom {
            self.draw_pile.push_front(item);
        } else {
            self.discard_pile.push(item);
        }
    }

    /// Moves all the given items onto the discard pile.
    pub fn discard_all<I: IntoIterator<Item = T>>(&mut self, items: I) {
        // Insertion order in the discard pile does not matter.
        self.discard_pile.extend(items);
    }

    /// When the draw pile is empty, turns the discard pile into a freshly shuffled draw pile.
    ///
    /// No-op if the draw pile still has cards, or if the discard pile is empty.
    pub fn reshuffle_from_discard(&mut self) {
        if !self.draw_pile.is_empty() || self.discard_pile.is_empty() {
            return;
        }

        self.discard_pile.shuffle(&mut self.rng);
        self.draw_pile.extend(self.discard_pile.drain(..));
    }

    /// Shuffles the draw pile in place.
    pub fn shuffle(&mut self) {
        self.draw_pile.make_contiguous().shuffle(&mut self.rng);
    }

    /// Cards left in the draw pile.
    #[inline]
    pub fn len(&self) -> usize {
        self.draw_pile.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draw_pile.is_empty()
    }

    /// Cards in the discard pile.
    #[inline]
    pub fn discard_len(&self) -> usize {
        self.discard_pile.len()
    }

    /// Whether neither pile can yield a card anymore.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.draw_pile.is_empty() && self.discard_pile.is_empty()
    }

    /// Draw pile (bottom first) followed by the discard pile.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.draw_pile.iter().chain(self.discard_pile.iter())
    }

    /// The draw pile, bottom first.
    pub fn draw_pile(&self) -> &VecDeque<T> {
        &self.draw_pile
    }

    /// The discard pile.
    pub fn discard_pile(&self) -> &[T] {
        &self.discard_pile
    }
}

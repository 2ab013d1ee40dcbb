use serde::{Deserialize, Serialize};
use std::iter::repeat;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Number of train cards of each non-wild color.
pub const NUM_NON_WILD_CARDS: usize = 12;
/// Number of locomotives.
pub const NUM_WILD_CARDS: usize = 14;
/// Size of the full train card deck.
pub const NUM_TRAIN_CARDS: usize = 8 * NUM_NON_WILD_CARDS + NUM_WILD_CARDS;

/// Represents the different variants of train cards.
///
/// The same palette colors routes, where [`TrainColor::Wild`] stands for a gray route
/// which any single color can claim.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrainColor {
    /// Also known as the *Hopper train*.
    Black,
    /// Also known as the *Tanker train*.
    Blue,
    /// Also known as the *Caboose train*.
    Green,
    /// Also known as the *Freight train*.
    Orange,
    /// Also known as the *Box train*.
    Pink,
    /// Also known as the *Coal train*.
    Red,
    /// Also known as the *Passenger train*.
    White,
    /// Also known as the *Locomotive*.
    /// This is a special train that matches with any color.
    Wild,
    /// Also known as the *Reefer train*.
    Yellow,
}

/// A train card is fully described by its color.
pub type Card = TrainColor;

impl TrainColor {
    /// Whether the current color is wild, i.e. matches with any color.
    ///
    /// # Examples:
    /// ```
    /// use ticket_to_ride_engine::card::TrainColor;
    ///
    /// assert!(!TrainColor::Black.is_wild());
    /// assert!(TrainColor::Wild.is_wild());
    /// ```
    #[inline]
    pub fn is_wild(&self) -> bool {
        *self == TrainColor::Wild
    }

    /// The opposite of `is_wild`.
    #[inline]
    pub fn is_not_wild(&self) -> bool {
        !self.is_wild()
    }
}

/// Every train card of a fresh game, in palette order.
/// Callers shuffle it through [`crate::deck::Deck::new`].
pub fn all_train_cards() -> Vec<TrainColor> {
    let mut all_train_cards = Vec::with_capacity(NUM_TRAIN_CARDS);

    for color in TrainColor::iter() {
        let num_of_train_cards_per_color = if color.is_wild() {
            NUM_WILD_CARDS
        } else {
            NUM_NON_WILD_CARDS
        };
        all_train_cards.extend(repeat(color).take(num_of_train_cards_per_color));
    }

    all_train_cards
}

/// Counts how many wild cards are in the given slice.
#[inline]
pub fn count_wild(cards: &[TrainColor]) -> usize {
    cards.iter().filter(|card| card.is_wild()).count()
}

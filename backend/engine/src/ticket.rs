use crate::city::{City, CityId, CityToCity};
use crate::deck::Deck;
use crate::error::ValidationError;

use serde::{Deserialize, Serialize};

/// Number of tickets drawn at once, both for the initial deal and during the game.
pub const NUM_DRAWN_TICKETS: usize = 3;
/// Number of tickets in the US deck.
pub const NUM_TICKETS: usize = 30;

/// Encapsulates information about a destination ticket.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Ticket {
    pub origin: CityId,
    pub destination: CityId,
    /// How many points are granted once this ticket is fulfilled.
    /// If not fulfilled, the same amount will rather be substracted.
    pub points: u8,
}

impl Ticket {
    pub fn cities(&self) -> CityToCity {
        (self.origin, self.destination)
    }
}

/// Convenience macro to generate a ticket.
macro_rules! ticket {
    ($origin:expr, $destination:expr, $points:literal) => {
        Ticket {
            origin: $origin,
            destination: $destination,
            points: $points,
        }
    };
}

/// All the tickets of the US board, in printed order.
pub fn us_tickets() -> Vec<Ticket> {
    vec![
        ticket! {City::Boston, City::Miami, 12},
        ticket! {City::Calgary, City::Phoenix, 13},
        ticket! {City::Calgary, City::SaltLakeCity, 7},
        ticket! {City::Chicago, City::NewOrleans, 7},
        ticket! {City::Chicago, City::SantaFe, 9},
        ticket! {City::Dallas, City::NewYork, 11},
        ticket! {City::Denver, City::ElPaso, 4},
        ticket! {City::Denver, City::Pittsburgh, 11},
        ticket! {City::Duluth, City::ElPaso, 10},
        ticket! {City::Duluth, City::Houston, 8},
        ticket! {City::Helena, City::LosAngeles, 8},
        ticket! {City::KansasCity, City::Houston, 5},
        ticket! {City::LosAngeles, City::Chicago, 16},
        ticket! {City::LosAngeles, City::Miami, 20},
        ticket! {City::LosAngeles, City::NewYork, 21},
        ticket! {City::Montreal, City::Atlanta, 9},
        ticket! {City::Montreal, City::NewOrleans, 13},
        ticket! {City::NewYork, City::Atlanta, 6},
        ticket! {City::Portland, City::Nashville, 17},
        ticket! {City::Portland, City::Phoenix, 11},
        ticket! {City::SanFrancisco, City::Atlanta, 17},
        ticket! {City::SaultStMarie, City::Nashville, 8},
        ticket! {City::SaultStMarie, City::OklahomaCity, 9},
        ticket! {City::Seattle, City::LosAngeles, 9},
        ticket! {City::Seattle, City::NewYork, 22},
        ticket! {City::Toronto, City::Miami, 10},
        ticket! {City::Vancouver, City::Montreal, 20},
        ticket! {City::Vancouver, City::SantaFe, 13},
        ticket! {City::Winnipeg, City::Houston, 12},
        ticket! {City::Winnipeg, City::LittleRock, 11},
    ]
}

/// How many of the drawn tickets a player must, and may, keep.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct KeepRule {
    pub minimum: usize,
    pub maximum: usize,
}

impl KeepRule {
    /// When the game starts, at least two of the three dealt tickets are kept.
    pub const INITIAL: KeepRule = KeepRule {
        minimum: 2,
        maximum: NUM_DRAWN_TICKETS,
    };
    /// During the game, at least one of the drawn tickets is kept.
    pub const MID_GAME: KeepRule = KeepRule {
        minimum: 1,
        maximum: NUM_DRAWN_TICKETS,
    };

    /// Checks both bounds. The minimum never exceeds the number of tickets offered,
    /// since fewer tickets may be drawn from a nearly empty deck.
    pub fn validate(&self, selected: usize, offered: usize) -> Result<(), ValidationError> {
        validate_min_keep(selected, self.minimum.min(offered))?;
        validate_max_keep(selected, self.maximum)
    }
}

pub fn validate_min_keep(selected: usize, minimum: usize) -> Result<(), ValidationError> {
    if selected < minimum {
        return Err(ValidationError::InsufficientSelection { selected, minimum });
    }

    Ok(())
}

pub fn validate_max_keep(selected: usize, maximum: usize) -> Result<(), ValidationError> {
    if selected > maximum {
        return Err(ValidationError::ExcessSelection { selected, maximum });
    }

    Ok(())
}

/// Deck of tickets.
///
/// Tickets are never discarded: the ones a player declines go back under the deck, so
/// every ticket is either in the deck or in a player's hand.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TicketDeck {
    deck: Deck<Ticket>,
}

impl TicketDeck {
    pub fn new(tickets: Vec<Ticket>, seed: u64) -> Self {
        Self {
            deck: Deck::new(tickets, seed),
        }
    }

    /// Draws up to `n` tickets from the top of the deck.
    /// Fewer are returned if the deck runs out, none at all if it is empty.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::ticket::{us_tickets, TicketDeck};
    ///
    /// let mut ticket_deck = TicketDeck::new(us_tickets(), 0);
    /// assert_eq!(ticket_deck.draw_set(3).len(), 3);
    /// assert_eq!(ticket_deck.len(), 27);
    /// ```
    pub fn draw_set(&mut self, n: usize) -> Vec<Ticket> {
        std::iter::from_fn(|| self.deck.draw()).take(n).collect()
    }

    /// Puts the given tickets at the bottom of the deck, in order.
    pub fn return_unchosen<I: IntoIterator<Item = Ticket>>(&mut self, tickets: I) {
        for ticket in tickets {
            self.deck.add(ticket, true);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deck.len() + self.deck.discard_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deck.is_exhausted()
    }

    /// Tickets in draw order from the bottom.
    pub fn iter(&self) -> impl Iterator<Item = &Ticket> {
        self.deck.iter()
    }
}

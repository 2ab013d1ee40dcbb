use crate::card::TrainColor;
use crate::error::ValidationError;
use crate::map::RouteId;
use crate::ticket::{KeepRule, Ticket};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Every player starts the game with 45 trains.
pub const NUM_OF_TRAINS: u8 = 45;

/// Position of the player in the roster, which is also the turn order.
pub type PlayerId = usize;

/// Every player has their own color.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerColor {
    Black,
    Blue,
    Green,
    Orange,
    Pink,
    Red,
    Yellow,
    White,
}

impl PlayerColor {
    /// Colors are handed out in registration order.
    pub fn for_player(id: PlayerId) -> Self {
        let colors: Vec<_> = PlayerColor::iter().collect();
        colors[id % colors.len()]
    }
}

/// Encapsulates all the player information.
///
/// A [`Player`] is not aware of turns nor of other players: the turn engine decides
/// whether an action is allowed, and the player only checks that it can afford it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    color: PlayerColor,
    /// How many of a train color a player has.
    /// It is guaranteed that the map has at all times key-value pairs for all train colors.
    hand: BTreeMap<TrainColor, u8>,
    /// Tickets the player has committed to.
    tickets: Vec<Ticket>,
    /// After having drawn tickets, we place them in this "pending" state.
    /// The player will subsequently have to select which ones they want to keep, which are then
    /// moved to [`Player::tickets`].
    pending_tickets: Vec<Ticket>,
    trains_remaining: u8,
    claimed_routes: Vec<RouteId>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, trains: u8) -> Self {
        Self {
            id,
            name,
            color: PlayerColor::for_player(id),
            hand: TrainColor::iter().map(|color| (color, 0)).collect(),
            tickets: Vec::new(),
            pending_tickets: Vec::new(),
            trains_remaining: trains,
            claimed_routes: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn color(&self) -> PlayerColor {
        self.color
    }

    /// Trains left to build routes with.
    #[inline]
    pub fn trains_remaining(&self) -> u8 {
        self.trains_remaining
    }

    pub fn hand(&self) -> &BTreeMap<TrainColor, u8> {
        &self.hand
    }

    /// How many cards of the given color the player holds.
    #[inline]
    pub fn count_of(&self, color: TrainColor) -> u8 {
        self.hand.get(&color).copied().unwrap_or(0)
    }

    /// Total number of train cards in hand.
    pub fn num_train_cards(&self) -> usize {
        self.hand.values().map(|count| *count as usize).sum()
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn pending_tickets(&self) -> &[Ticket] {
        &self.pending_tickets
    }

    pub fn claimed_routes(&self) -> &[RouteId] {
        &self.claimed_routes
    }

    pub fn add_card(&mut self, card: TrainColor) {
        *self.hand.entry(card).or_insert(0) += 1;
    }

    /// Verifies that the hand holds every card of `cards`, counting duplicates.
    pub fn check_hand(&self, cards: &[TrainColor]) -> Result<(), ValidationError> {
        let mut requested: BTreeMap<TrainColor, usize> = BTreeMap::new();
        for card in cards {
            *requested.entry(*card).or_insert(0) += 1;
        }

        for (color, requested) in requested {
            let held = self.count_of(color);
            if requested > held as usize {
                return Err(ValidationError::InsufficientCards {
                    color,
                    requested,
                    held,
                });
            }
        }

        Ok(())
    }

    /// Removes `cards` from the hand, all of them or none.
    pub fn spend(&mut self, cards: &[TrainColor]) -> Result<(), ValidationError> {
        self.check_hand(cards)?;

        for card in cards {
            if let Some(count) = self.hand.get_mut(card) {
                *count -= 1;
            }
        }

        Ok(())
    }

    /// Verifies that enough trains are left for a route of `length`.
    pub fn check_trains(&self, length: u8) -> Result<(), ValidationError> {
        if length > self.trains_remaining {
            return Err(ValidationError::NotEnoughTrains {
                length,
                trains: self.trains_remaining,
            });
        }

        Ok(())
    }

    /// Spends trains on a claimed route, and returns how many are left.
    pub fn build_route(&mut self, route_id: RouteId, length: u8) -> Result<u8, ValidationError> {
        self.check_trains(length)?;

        self.trains_remaining -= length;
        self.claimed_routes.push(route_id);
        Ok(self.trains_remaining)
    }

    /// Hands freshly drawn tickets to the player, who must then choose among them.
    pub fn offer_tickets(&mut self, tickets: Vec<Ticket>) {
        self.pending_tickets.extend(tickets);
    }

    #[inline]
    pub fn has_pending_tickets(&self) -> bool {
        !self.pending_tickets.is_empty()
    }

    /// Keeps the pending tickets flagged in `keep`, one flag per pending ticket.
    ///
    /// Returns the tickets that were not kept, to be put back in the deck.
    /// Nothing changes if the selection is rejected.
    pub fn select_tickets(
        &mut self,
        keep: &[bool],
        rule: KeepRule,
    ) -> Result<Vec<Ticket>, ValidationError> {
        self.check_selection(keep, rule)?;

        let mut returned = Vec::with_capacity(keep.len());
        for (ticket, kept) in self.pending_tickets.drain(..).zip(keep) {
            if *kept {
                self.tickets.push(ticket);
            } else {
                returned.push(ticket);
            }
        }

        Ok(returned)
    }

    /// Verifies a ticket selection without applying it.
    pub fn check_selection(&self, keep: &[bool], rule: KeepRule) -> Result<(), ValidationError> {
        if !self.has_pending_tickets() {
            return Err(ValidationError::IllegalAction(String::from(
                "No tickets are waiting to be selected.",
            )));
        }

        if keep.len() != self.pending_tickets.len() {
            return Err(ValidationError::IllegalAction(format!(
                "Expected a decision for each of the {} pending tickets, got {}.",
                self.pending_tickets.len(),
                keep.len()
            )));
        }

        let selected = keep.iter().filter(|kept| **kept).count();
        rule.validate(selected, self.pending_tickets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;
    use pretty_assertions::assert_eq;

    fn player_with_cards(cards: &[TrainColor]) -> Player {
        let mut player = Player::new(0, String::from("Ada"), NUM_OF_TRAINS);
        for card in cards {
            player.add_card(*card);
        }
        player
    }

    fn tickets() -> Vec<Ticket> {
        vec![
            Ticket {
                origin: City::Boston,
                destination: City::Miami,
                points: 12,
            },
            Ticket {
                origin: City::Denver,
                destination: City::ElPaso,
                points: 4,
            },
            Ticket {
                origin: City::Dallas,
                destination: City::NewYork,
                points: 11,
            },
        ]
    }

    #[test]
    fn new_player() {
        let player = Player::new(1, String::from("Grace"), NUM_OF_TRAINS);

        assert_eq!(player.color(), PlayerColor::Blue);
        assert_eq!(player.trains_remaining(), 45);
        assert_eq!(player.num_train_cards(), 0);
        assert_eq!(player.hand().len(), 9);
        assert!(player.tickets().is_empty());
    }

    #[test]
    fn player_colors_wrap_around() {
        assert_eq!(PlayerColor::for_player(0), PlayerColor::Black);
        assert_eq!(PlayerColor::for_player(8), PlayerColor::Black);
    }

    #[test]
    fn spend_cards() {
        use TrainColor::*;
        let mut player = player_with_cards(&[Red, Red, Wild, Blue]);

        assert_eq!(player.spend(&[Red, Wild]), Ok(()));
        assert_eq!(player.count_of(Red), 1);
        assert_eq!(player.count_of(Wild), 0);
        assert_eq!(player.num_train_cards(), 2);
    }

    #[test]
    fn spend_missing_cards_is_all_or_nothing() {
        use TrainColor::*;
        let mut player = player_with_cards(&[Red, Red, Blue]);
        let before = player.clone();

        assert_eq!(
            player.spend(&[Blue, Red, Red, Red]),
            Err(ValidationError::InsufficientCards {
                color: Red,
                requested: 3,
                held: 2
            })
        );
        assert_eq!(player, before);
    }

    #[test]
    fn check_hand_counts_past_a_byte() {
        use TrainColor::*;
        let player = player_with_cards(&[Blue; 3]);

        assert_eq!(
            player.check_hand(&[Blue; 256]),
            Err(ValidationError::InsufficientCards {
                color: Blue,
                requested: 256,
                held: 3
            })
        );
        assert_eq!(player.check_hand(&[Blue; 3]), Ok(()));
    }

    #[test]
    fn build_route_uses_trains() {
        let mut player = Player::new(0, String::from("Ada"), 4);

        assert_eq!(player.build_route(12, 3), Ok(1));
        assert_eq!(player.claimed_routes(), &[12]);
        assert_eq!(
            player.build_route(13, 2),
            Err(ValidationError::NotEnoughTrains {
                length: 2,
                trains: 1
            })
        );
        assert_eq!(player.trains_remaining(), 1);
    }

    #[test]
    fn select_tickets() {
        let mut player = Player::new(0, String::from("Ada"), NUM_OF_TRAINS);
        let offered = tickets();
        player.offer_tickets(offered.clone());

        let returned = player
            .select_tickets(&[true, false, true], KeepRule::INITIAL)
            .unwrap();

        assert_eq!(returned, vec![offered[1]]);
        assert_eq!(player.tickets(), &[offered[0], offered[2]]);
        assert!(!player.has_pending_tickets());
    }

    #[test]
    fn select_tickets_rejected() {
        let mut player = Player::new(0, String::from("Ada"), NUM_OF_TRAINS);
        player.offer_tickets(tickets());
        let before = player.clone();

        assert_eq!(
            player.select_tickets(&[true, false, false], KeepRule::INITIAL),
            Err(ValidationError::InsufficientSelection {
                selected: 1,
                minimum: 2
            })
        );
        assert!(matches!(
            player.select_tickets(&[true, true], KeepRule::INITIAL),
            Err(ValidationError::IllegalAction(_))
        ));
        assert_eq!(player, before);
    }

    #[test]
    fn select_without_pending_tickets() {
        let mut player = Player::new(0, String::from("Ada"), NUM_OF_TRAINS);

        assert!(matches!(
            player.select_tickets(&[], KeepRule::MID_GAME),
            Err(ValidationError::IllegalAction(_))
        ));
    }
}

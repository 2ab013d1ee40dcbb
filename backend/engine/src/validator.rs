//! Checks whether a set of train cards may pay for a route.

use crate::card::TrainColor;
use crate::map::Route;

use serde::{Deserialize, Serialize};

/// Outcome of [`RouteCardValidator::validate`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Human-readable explanation, present only when `valid` is false.
    pub reason: Option<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Matches proposed cards against the color and length of a route.
///
/// Nothing is mutated, so claims can be checked speculatively before they are committed.
pub struct RouteCardValidator;

impl RouteCardValidator {
    /// Verifies that `cards` can claim `route`:
    /// - exactly `route.length` cards are given;
    /// - on a colored route, every card is either that color or wild;
    /// - on a gray route (colored [`TrainColor::Wild`]), non-wild cards all share one color.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::card::TrainColor;
    /// use ticket_to_ride_engine::city::City;
    /// use ticket_to_ride_engine::map::Route;
    /// use ticket_to_ride_engine::validator::RouteCardValidator;
    ///
    /// let route = Route::new(0, (City::Denver, City::Omaha), TrainColor::Pink, 4);
    /// let cards = [TrainColor::Pink, TrainColor::Wild, TrainColor::Pink, TrainColor::Pink];
    /// assert!(RouteCardValidator::validate(&route, &cards).valid);
    /// assert!(!RouteCardValidator::validate(&route, &cards[..3]).valid);
    /// ```
    pub fn validate(route: &Route, cards: &[TrainColor]) -> ValidationResult {
        if cards.len() != route.length as usize {
            return ValidationResult::rejected(format!(
                "requires exactly {} card(s), got {}",
                route.length,
                cards.len()
            ));
        }

        if route.color.is_not_wild() {
            if cards
                .iter()
                .any(|card| card.is_not_wild() && *card != route.color)
            {
                return ValidationResult::rejected(format!(
                    "route requires {} cards",
                    route.color
                ));
            }

            return ValidationResult::ok();
        }

        let mut non_wild_cards = cards.iter().filter(|card| card.is_not_wild());
        if let Some(first_color) = non_wild_cards.next() {
            if non_wild_cards.any(|card| card != first_color) {
                return ValidationResult::rejected(String::from("cards must be same color"));
            }
        }

        ValidationResult::ok()
    }
}

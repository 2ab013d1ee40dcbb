//! End of game tally.

use crate::map::Map;
use crate::observer::ScoreLedger;
use crate::player::{Player, PlayerId};

use serde::{Deserialize, Serialize};

/// Breakdown of a player's final score.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerScore {
    pub player: PlayerId,
    pub name: String,
    /// Points credited for claimed routes during the game.
    pub route_points: i32,
    /// Fulfilled tickets add their points, the others subtract them.
    pub ticket_points: i32,
    pub completed_tickets: usize,
    pub longest_path: u16,
    pub longest_path_bonus: i32,
    pub total: i32,
}

/// Players sorted by total score, best first, and who won.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FinalScores {
    /// Ties keep the registration order.
    pub ranking: Vec<PlayerScore>,
    /// Every player sharing the top total.
    pub winners: Vec<PlayerId>,
}

pub struct FinalScoringCalculator;

impl FinalScoringCalculator {
    /// Tallies route points, tickets, and the longest path bonus.
    ///
    /// The bonus goes to every player tied for the longest path, as long as that path
    /// is not empty.
    pub fn calculate(
        players: &[Player],
        map: &Map,
        ledger: &ScoreLedger,
        longest_path_bonus: i32,
    ) -> FinalScores {
        let longest_paths: Vec<u16> = players
            .iter()
            .map(|player| map.longest_path(player.id()))
            .collect();
        let longest_overall = longest_paths.iter().copied().max().unwrap_or(0);

        let mut ranking: Vec<PlayerScore> = players
            .iter()
            .zip(longest_paths)
            .map(|(player, longest_path)| {
                let (ticket_points, completed_tickets) = Self::ticket_points(player, map);
                let route_points = ledger.points_of(player.id());
                let longest_path_bonus = if longest_overall > 0 && longest_path == longest_overall {
                    longest_path_bonus
                } else {
                    0
                };

                PlayerScore {
                    player: player.id(),
                    name: player.name().to_string(),
                    route_points,
                    ticket_points,
                    completed_tickets,
                    longest_path,
                    longest_path_bonus,
                    total: route_points + ticket_points + longest_path_bonus,
                }
            })
            .collect();

        // Stable sort: equal totals stay in registration order.
        ranking.sort_by(|a, b| b.total.cmp(&a.total));

        let winners = match ranking.first() {
            Some(best) => ranking
                .iter()
                .take_while(|score| score.total == best.total)
                .map(|score| score.player)
                .collect(),
            None => Vec::new(),
        };

        FinalScores { ranking, winners }
    }

    fn ticket_points(player: &Player, map: &Map) -> (i32, usize) {
        player
            .tickets()
            .iter()
            .fold((0, 0), |(points, completed), ticket| {
                if map.has_player_connected(ticket.cities(), player.id()) {
                    (points + ticket.points as i32, completed + 1)
                } else {
                    (points - ticket.points as i32, completed)
                }
            })
    }
}

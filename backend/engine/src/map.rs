//! The board: every route of the US map, who owns it, and graph queries over owned routes.

use crate::card::TrainColor;
use crate::card::TrainColor::*;
use crate::city::City::*;
use crate::city::{City, CityToCity, NUM_CITIES};
use crate::error::ValidationError;
use crate::player::PlayerId;

use array_init::array_init;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::max;
use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Mutex};
use threadpool::ThreadPool;

lazy_static! {
    static ref THREAD_POOL: Mutex<ThreadPool> = Mutex::new(ThreadPool::default());
    /// Unclaimed routes of the US board, shared by every session.
    static ref US_ROUTES: Vec<Route> = build_us_routes();
}

/// Index of a route in [`Map::routes`].
pub type RouteId = usize;

/// Number of routes on the US board, counting each parallel route.
pub const NUM_ROUTES: usize = 100;

// Denver and Pittsburgh have the most routes, counting parallel ones.
const MAX_ROUTES_PER_CITY: usize = 9;

/// Two cities, a length, and the colors of the one or two parallel routes joining them.
type Connection = (City, City, u8, &'static [TrainColor]);

/// The printed US board. `Wild` marks a gray route.
const US_CONNECTIONS: [Connection; 78] = [
    // Atlanta.
    (Atlanta, Charleston, 2, &[Wild]),
    (Atlanta, Miami, 5, &[Blue]),
    (Atlanta, Nashville, 1, &[Wild]),
    (Atlanta, NewOrleans, 5, &[Orange, Yellow]),
    (Atlanta, Raleigh, 2, &[Wild, Wild]),
    // Boston.
    (Boston, Montreal, 2, &[Wild, Wild]),
    (Boston, NewYork, 2, &[Yellow, Red]),
    // Calgary.
    (Calgary, Helena, 4, &[Wild]),
    (Calgary, Seattle, 4, &[Wild]),
    (Calgary, Vancouver, 3, &[Wild]),
    (Calgary, Winnipeg, 6, &[White]),
    // Charleston.
    (Charleston, Miami, 4, &[Pink]),
    (Charleston, Raleigh, 2, &[Wild]),
    // Chicago.
    (Chicago, Duluth, 3, &[Red]),
    (Chicago, Omaha, 4, &[Blue]),
    (Chicago, Pittsburgh, 3, &[Black, Orange]),
    (Chicago, SaintLouis, 2, &[Green, White]),
    (Chicago, Toronto, 4, &[White]),
    // Dallas.
    (Dallas, ElPaso, 4, &[Red]),
    (Dallas, Houston, 1, &[Wild, Wild]),
    (Dallas, LittleRock, 2, &[Wild]),
    (Dallas, OklahomaCity, 2, &[Wild, Wild]),
    // Denver.
    (Denver, Helena, 4, &[Green]),
    (Denver, KansasCity, 4, &[Black, Orange]),
    (Denver, OklahomaCity, 4, &[Red]),
    (Denver, Omaha, 4, &[Pink]),
    (Denver, Phoenix, 5, &[White]),
    (Denver, SaltLakeCity, 3, &[Red, Yellow]),
    (Denver, SantaFe, 2, &[Wild]),
    // Duluth.
    (Duluth, Helena, 6, &[Orange]),
    (Duluth, Omaha, 2, &[Wild, Wild]),
    (Duluth, SaultStMarie, 3, &[Wild]),
    (Duluth, Toronto, 6, &[Pink]),
    (Duluth, Winnipeg, 4, &[Black]),
    // ElPaso.
    (ElPaso, Houston, 6, &[Green]),
    (ElPaso, LosAngeles, 6, &[Black]),
    (ElPaso, OklahomaCity, 5, &[Yellow]),
    (ElPaso, Phoenix, 3, &[Wild]),
    (ElPaso, SantaFe, 2, &[Wild]),
    // Helena.
    (Helena, Omaha, 5, &[Red]),
    (Helena, SaltLakeCity, 3, &[Pink]),
    (Helena, Seattle, 6, &[Yellow]),
    (Helena, Winnipeg, 4, &[Blue]),
    // Houston.
    (Houston, NewOrleans, 2, &[Wild]),
    // KansasCity.
    (KansasCity, SaintLouis, 2, &[Blue, Pink]),
    (KansasCity, OklahomaCity, 2, &[Wild, Wild]),
    (KansasCity, Omaha, 1, &[Wild, Wild]),
    // LasVegas.
    (LasVegas, LosAngeles, 2, &[Wild]),
    (LasVegas, SaltLakeCity, 3, &[Orange]),
    // LittleRock.
    (LittleRock, Nashville, 3, &[White]),
    (LittleRock, NewOrleans, 3, &[Wild]),
    (LittleRock, OklahomaCity, 2, &[Wild]),
    (LittleRock, SaintLouis, 2, &[Wild]),
    // LosAngeles.
    (LosAngeles, Phoenix, 3, &[Wild]),
    (LosAngeles, SanFrancisco, 3, &[Pink, Yellow]),
    // Miami.
    (Miami, NewOrleans, 6, &[Red]),
    // Montreal.
    (Montreal, NewYork, 3, &[Blue]),
    (Montreal, SaultStMarie, 5, &[Black]),
    (Montreal, Toronto, 3, &[Wild]),
    // Nashville.
    (Nashville, Pittsburgh, 4, &[Yellow]),
    (Nashville, Raleigh, 3, &[Black]),
    (Nashville, SaintLouis, 2, &[Wild]),
    // NewYork.
    (NewYork, Pittsburgh, 2, &[Green, White]),
    (NewYork, Washington, 2, &[Black, Orange]),
    // OklahomaCity.
    (OklahomaCity, SantaFe, 3, &[Blue]),
    // Phoenix.
    (Phoenix, SantaFe, 3, &[Wild]),
    // Pittsburgh.
    (Pittsburgh, Raleigh, 2, &[Wild]),
    (Pittsburgh, SaintLouis, 5, &[Green]),
    (Pittsburgh, Toronto, 2, &[Wild]),
    (Pittsburgh, Washington, 2, &[Wild]),
    // Portland.
    (Portland, SaltLakeCity, 6, &[Blue]),
    (Portland, SanFrancisco, 5, &[Green, Pink]),
    // Raleigh.
    (Raleigh, Washington, 2, &[Wild, Wild]),
    // SaltLakeCity.
    (SaltLakeCity, SanFrancisco, 5, &[Orange, White]),
    // SaultStMarie.
    (SaultStMarie, Toronto, 2, &[Wild]),
    (SaultStMarie, Winnipeg, 6, &[Wild]),
    // Seattle.
    (Seattle, Portland, 1, &[Wild, Wild]),
    (Seattle, Vancouver, 1, &[Wild, Wild]),
];

fn build_us_routes() -> Vec<Route> {
    let mut routes = Vec::with_capacity(NUM_ROUTES);

    for (start, end, length, colors) in US_CONNECTIONS {
        for color in colors {
            routes.push(Route::new(routes.len(), (start, end), *color, length));
        }
    }

    routes
}

/// A single route between two cities.
///
/// Routes are value-like: they are copied freely, and only the [`Map`] holding the
/// authoritative copy can change their owner.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Route {
    pub id: RouteId,
    pub cities: CityToCity,
    /// The color of this specific route.
    /// The `Wild` color means that any color matches.
    pub color: TrainColor,
    /// The distance between two cities. This is analogous to the number of train cards needed to claim the route.
    pub length: u8,
    owner: Option<PlayerId>,
}

impl Route {
    /// Returns an unclaimed route.
    pub fn new(id: RouteId, cities: CityToCity, color: TrainColor, length: u8) -> Self {
        Self {
            id,
            cities,
            color,
            length,
            owner: None,
        }
    }

    /// The player owning this route, if any.
    #[inline]
    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Whether this route joins `a` and `b`, in any direction.
    #[inline]
    pub fn connects(&self, a: City, b: City) -> bool {
        self.cities == (a, b) || self.cities == (b, a)
    }

    /// How many points claiming this route is worth.
    #[inline]
    pub fn points(&self) -> u8 {
        Map::points_for_route_length(self.length)
    }
}

/// The authoritative state of the board, per game.
/// This can be mutated as players claim routes throughout the game.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Map {
    /// Indexed by [`RouteId`].
    routes: Vec<Route>,
    /// Depending on the number of players (>3), parallel routes might be claimed simultaneously.
    /// In all cases, parallel routes cannot be claimed by the same player.
    parallel_routes_allowed: bool,
}

impl Map {
    /// Generates the US board, with all routes unclaimed.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::map::{Map, NUM_ROUTES};
    ///
    /// let map = Map::new(2);
    /// assert_eq!(map.routes().len(), NUM_ROUTES);
    /// ```
    pub fn new(num_players: usize) -> Self {
        Self::from_routes(US_ROUTES.clone(), num_players > 3)
    }

    /// Builds a board from arbitrary routes. Route ids are reassigned to match their index.
    pub fn from_routes(mut routes: Vec<Route>, parallel_routes_allowed: bool) -> Self {
        for (id, route) in routes.iter_mut().enumerate() {
            route.id = id;
        }

        Self {
            routes,
            parallel_routes_allowed,
        }
    }

    /// Official scoring of a claimed route, based on its length.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::map::Map;
    ///
    /// assert_eq!(Map::points_for_route_length(3), 4);
    /// assert_eq!(Map::points_for_route_length(6), 15);
    /// ```
    pub fn points_for_route_length(length: u8) -> u8 {
        match length {
            1 => 1,
            2 => 2,
            3 => 4,
            4 => 7,
            5 => 10,
            6 => 15,
            _ => 0,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, id: RouteId) -> Result<&Route, ValidationError> {
        self.routes
            .get(id)
            .ok_or(ValidationError::RouteNotFound(id))
    }

    /// All the (one or two) routes joining two cities.
    pub fn routes_between(&self, a: City, b: City) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(move |route| route.connects(a, b))
    }

    /// The other route joining the same two cities, if there is one.
    pub fn parallel_route(&self, id: RouteId) -> Option<&Route> {
        let (start, end) = self.routes.get(id)?.cities;
        self.routes_between(start, end)
            .find(|route| route.id != id)
    }

    /// Routes owned by the given player.
    pub fn owned_by(&self, player_id: PlayerId) -> impl Iterator<Item = &Route> {
        self.routes
            .iter()
            .filter(move |route| route.owner == Some(player_id))
    }

    /// Verifies that `player_id` may claim the route, without claiming it.
    ///
    /// The cards used are verified separately, by [`crate::validator::RouteCardValidator`].
    pub fn check_claimable(
        &self,
        id: RouteId,
        player_id: PlayerId,
    ) -> Result<&Route, ValidationError> {
        let route = self.route(id)?;
        let (start, end) = route.cities;

        if route.owner.is_some() {
            return Err(ValidationError::RouteAlreadyClaimed(start, end));
        }

        match self.parallel_route(id).and_then(Route::owner) {
            Some(owner) if owner == player_id => {
                Err(ValidationError::ParallelRouteUnavailable(format!(
                    "Cannot claim more than one route between {} and {}.",
                    start, end
                )))
            }
            Some(_) if !self.parallel_routes_allowed => {
                Err(ValidationError::ParallelRouteUnavailable(format!(
                    "Another route is already claimed by someone else between {} and {}.",
                    start, end
                )))
            }
            _ => Ok(route),
        }
    }

    /// Marks the route as owned by `player_id`, once [`Map::check_claimable`] agrees.
    pub fn claim(&mut self, id: RouteId, player_id: PlayerId) -> Result<&Route, ValidationError> {
        self.check_claimable(id, player_id)?;

        let route = &mut self.routes[id];
        route.owner = Some(player_id);
        Ok(route)
    }

    /// Predicate that assess whether a given player has connected two cities on the map, based on their claimed routes.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::city::City;
    /// use ticket_to_ride_engine::map::Map;
    ///
    /// let mut map = Map::new(2);
    /// let player_id = 0;
    /// assert!(!map.has_player_connected((City::Raleigh, City::NewYork), player_id));
    ///
    /// let raleigh_washington = map.routes_between(City::Raleigh, City::Washington).next().unwrap().id;
    /// let washington_new_york = map.routes_between(City::Washington, City::NewYork).next().unwrap().id;
    /// map.claim(raleigh_washington, player_id).unwrap();
    /// assert!(!map.has_player_connected((City::Raleigh, City::NewYork), player_id));
    ///
    /// map.claim(washington_new_york, player_id).unwrap();
    /// assert!(map.has_player_connected((City::Raleigh, City::NewYork), player_id));
    /// ```
    pub fn has_player_connected(&self, (start, end): CityToCity, player_id: PlayerId) -> bool {
        if start == end {
            return true;
        }

        let adjacency = self.adjacency_of(player_id);
        let mut cities_visited = [false; NUM_CITIES];
        let mut cities_to_visit = VecDeque::with_capacity(NUM_CITIES);

        cities_visited[start.index()] = true;
        cities_to_visit.push_back(start);

        while let Some(city) = cities_to_visit.pop_front() {
            if city == end {
                return true;
            }

            for &(_, neighbor, _) in &adjacency[city.index()] {
                if !cities_visited[neighbor.index()] {
                    cities_visited[neighbor.index()] = true;
                    cities_to_visit.push_back(neighbor);
                }
            }
        }

        false
    }

    /// Length of the longest continuous path through the routes owned by `player_id`.
    pub fn longest_path(&self, player_id: PlayerId) -> u16 {
        Self::longest_path_of(
            self.owned_by(player_id)
                .map(|route| (route.cities.0, route.cities.1, route.length))
                .collect(),
        )
    }

    /// Returns the longest continuous path spanned by the given routes.
    ///
    /// Note that a continous path may visit a city multiple times, but may not go
    /// through a route twice.
    ///
    /// # Example
    /// ```
    /// use ticket_to_ride_engine::city::City;
    /// use ticket_to_ride_engine::map::Map;
    ///
    /// let routes = vec![(City::ElPaso, City::Phoenix, 3), (City::Denver, City::Phoenix, 5)];
    /// assert_eq!(Map::longest_path_of(routes), 8);
    /// ```
    pub fn longest_path_of(routes: Vec<(City, City, u8)>) -> u16 {
        let adjacency = Arc::new(Self::build_adjacency(routes.iter().copied()));
        let mut cities_to_visit: SmallVec<[City; NUM_CITIES]> = routes
            .iter()
            .flat_map(|&(start, end, _)| [start, end])
            .collect();
        cities_to_visit.sort();
        cities_to_visit.dedup();

        let thread_pool = match THREAD_POOL.lock() {
            Ok(pool) => pool.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let (tx, rx) = mpsc::channel();

        // Each city is explored by a separate job from the pool, which computes the
        // longest path starting at that city.
        for city in cities_to_visit {
            let adjacency = adjacency.clone();
            let tx = tx.clone();
            let num_routes = routes.len();

            thread_pool.execute(move || {
                let mut routes_visited = vec![false; num_routes];
                let _ = tx.send(Self::longest_path_from_city(
                    city,
                    &adjacency,
                    &mut routes_visited,
                ));
            });
        }
        drop(tx);

        rx.iter().max().unwrap_or(0)
    }

    fn longest_path_from_city(
        start: City,
        adjacency: &Adjacency,
        routes_visited: &mut [bool],
    ) -> u16 {
        let mut longest_path_from_city = 0;

        for &(route, end, length) in &adjacency[start.index()] {
            if routes_visited[route] {
                continue;
            }

            routes_visited[route] = true;
            longest_path_from_city = max(
                longest_path_from_city,
                length as u16 + Self::longest_path_from_city(end, adjacency, routes_visited),
            );
            routes_visited[route] = false;
        }

        longest_path_from_city
    }

    fn adjacency_of(&self, player_id: PlayerId) -> Adjacency {
        Self::build_adjacency(
            self.owned_by(player_id)
                .map(|route| (route.cities.0, route.cities.1, route.length)),
        )
    }

    /// Maps each city to the routes leaving it, as `(index, other city, length)`,
    /// where the index is the position of the route in `routes`.
    fn build_adjacency<I: Iterator<Item = (City, City, u8)>>(routes: I) -> Adjacency {
        let mut adjacency: Adjacency = array_init(|_| SmallVec::new());

        for (index, (start, end, length)) in routes.enumerate() {
            adjacency[start.index()].push((index, end, length));
            adjacency[end.index()].push((index, start, length));
        }

        adjacency
    }
}

type Adjacency = [SmallVec<[(usize, City, u8); MAX_ROUTES_PER_CITY]>; NUM_CITIES];

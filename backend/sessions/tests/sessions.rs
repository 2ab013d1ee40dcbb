use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use ticket_to_ride_engine::action::Action;
use ticket_to_ride_engine::card::TrainColor;
use ticket_to_ride_engine::city::City;
use ticket_to_ride_engine::error::{EngineError, InvariantViolation, ValidationError};
use ticket_to_ride_engine::observer::EndCondition;
use ticket_to_ride_engine::session::{GameConfig, GameSession, Snapshot};
use ticket_to_ride_engine::turn::GamePhase;
use ticket_to_ride_sessions::bot::play_session;
use ticket_to_ride_sessions::{
    JsonFileStore, MemoryStore, PersistenceError, RegistryError, SessionId, SessionRegistry,
    SnapshotStore,
};

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("player {}", i)).collect()
}

fn config(seed: u64) -> GameConfig {
    GameConfig {
        seed,
        ..GameConfig::default()
    }
}

/// Both players kept all of their initial tickets.
fn select_initial_tickets(registry: &SessionRegistry, id: &SessionId, num_players: usize) {
    for player_id in 0..num_players {
        registry
            .apply(id, player_id, Action::SelectTickets { keep: vec![true; 3] })
            .unwrap();
    }
}

fn snapshot_json(registry: &SessionRegistry, id: &SessionId) -> String {
    registry
        .with_session(id, |session| serde_json::to_string(&session.snapshot()))
        .unwrap()
        .unwrap()
}

#[test]
fn conquest_scores_and_triggers_the_end_game() {
    // Five trains each, so that a route of length 3 leaves two behind.
    let mut session = GameSession::new(
        names(2),
        GameConfig {
            trains_per_player: 5,
            end_condition: EndCondition::default(),
            ..config(11)
        },
    )
    .unwrap();
    for player_id in 0..2 {
        session
            .apply(player_id, Action::SelectTickets { keep: vec![true; 3] })
            .unwrap();
    }

    let mut snapshot = session.snapshot();
    for _ in 0..3 {
        snapshot.state.players[0].add_card(TrainColor::Blue);
    }

    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.save(&id, &snapshot).unwrap();
    let registry = SessionRegistry::new(Box::new(store));

    let route = registry
        .with_session(&id, |session| {
            session
                .state()
                .map
                .routes_between(City::Montreal, City::NewYork)
                .next()
                .map(|route| (route.id, route.color, route.length))
        })
        .unwrap()
        .unwrap();
    assert_eq!(route.1, TrainColor::Blue);
    assert_eq!(route.2, 3);

    let blue_before = registry
        .with_session(&id, |session| session.state().players[0].count_of(TrainColor::Blue))
        .unwrap();

    let outcome = registry
        .apply(
            &id,
            0,
            Action::ClaimRoute {
                route: route.0,
                cards: vec![TrainColor::Blue; 3],
            },
        )
        .unwrap();
    let event = outcome.event.unwrap();
    assert_eq!(event.player, 0);
    assert_eq!(event.points_awarded, 4);
    assert_eq!(event.trains_remaining_after, 2);
    assert!(outcome.turn_over);

    registry
        .with_session(&id, |session| {
            let player = &session.state().players[0];
            assert_eq!(session.score(0), 4);
            assert_eq!(player.trains_remaining(), 2);
            assert_eq!(player.count_of(TrainColor::Blue), blue_before - 3);

            let end_game = session.end_game();
            assert!(end_game.triggered);
            assert_eq!(end_game.trigger_player, Some(0));
            assert_eq!(session.state().game_phase, GamePhase::LastTurn);
        })
        .unwrap();

    // Player 1 still has five trains, which does not undo the trigger.
    registry.apply(&id, 1, Action::Pass).unwrap();
    assert!(registry
        .with_session(&id, |session| session.end_game().triggered)
        .unwrap());
}

#[test]
fn refused_action_is_not_persisted() {
    let registry = SessionRegistry::new(Box::new(MemoryStore::new()));
    let id = registry.create(names(3), config(5)).unwrap();
    select_initial_tickets(&registry, &id, 3);
    let before = snapshot_json(&registry, &id);

    let error = registry.apply(&id, 2, Action::Pass).unwrap_err();
    assert!(matches!(
        error,
        RegistryError::Engine(EngineError::Validation(ValidationError::NotYourTurn {
            player: 2,
            current: 0
        }))
    ));
    assert_eq!(snapshot_json(&registry, &id), before);

    // The store still holds the same game.
    registry.evict(&id);
    assert_eq!(snapshot_json(&registry, &id), before);
}

#[test]
fn sessions_progress_in_parallel() {
    let registry = SessionRegistry::new(Box::new(MemoryStore::new()));
    let ids: Vec<SessionId> = (0..4)
        .map(|seed| registry.create(names(2 + seed as usize % 3), config(seed)).unwrap())
        .collect();

    std::thread::scope(|scope| {
        for (seed, id) in ids.iter().enumerate() {
            let registry = &registry;
            scope.spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
                play_session(registry, id, &mut rng, 20_000).unwrap();
            });
        }
    });

    for id in &ids {
        assert!(registry.with_session(id, GameSession::is_over).unwrap());
    }
    assert_eq!(registry.len(), 4);
}

#[test]
fn actions_on_one_session_are_serialized() {
    let registry = SessionRegistry::new(Box::new(MemoryStore::new()));
    let id = registry.create(names(4), config(8)).unwrap();
    select_initial_tickets(&registry, &id, 4);
    let first_turn = registry
        .with_session(&id, |session| session.state().turn.turn)
        .unwrap();

    let passes = AtomicUsize::new(0);
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let current = registry
                        .with_session(&id, GameSession::current_player)
                        .unwrap();
                    match registry.apply(&id, current, Action::Pass) {
                        Ok(_) => {
                            passes.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => assert!(e.is_recoverable(), "{}", e),
                    }
                }
            });
        }
    });

    let passes = passes.load(Ordering::SeqCst);
    assert!(passes > 0);
    registry
        .with_session(&id, |session| {
            assert_eq!(session.state().turn.turn, first_turn + passes as u32);
            assert_eq!(session.current_player(), passes % 4);
        })
        .unwrap();
}

#[test]
fn snapshot_replays_identically() {
    let registry = SessionRegistry::new(Box::new(MemoryStore::new()));
    let id = registry.create(names(3), config(21)).unwrap();
    select_initial_tickets(&registry, &id, 3);
    let snapshot: Snapshot = registry
        .with_session(&id, GameSession::snapshot)
        .unwrap();

    let replay = |snapshot: &Snapshot| {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.save(&id, snapshot).unwrap();
        let registry = SessionRegistry::new(Box::new(store));

        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let scores = play_session(&registry, &id, &mut rng, 20_000).unwrap();
        (snapshot_json(&registry, &id), scores)
    };

    let (first_json, first_scores) = replay(&snapshot);
    let (second_json, second_scores) = replay(&snapshot);

    assert_eq!(first_scores, second_scores);
    assert!(first_json == second_json);
}

#[test]
fn file_store_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (id, saved) = {
        let registry = SessionRegistry::new(Box::new(JsonFileStore::new(dir.path()).unwrap()));
        let id = registry.create(names(2), config(3)).unwrap();
        select_initial_tickets(&registry, &id, 2);
        registry.apply(&id, 0, Action::Pass).unwrap();
        (id, snapshot_json(&registry, &id))
    };

    let registry = SessionRegistry::new(Box::new(JsonFileStore::new(dir.path()).unwrap()));
    assert!(!registry.is_resident(&id));
    assert_eq!(snapshot_json(&registry, &id), saved);
    assert_eq!(
        registry
            .with_session(&id, GameSession::current_player)
            .unwrap(),
        1
    );
}

/// Hands out a tampered snapshot on the first load, then the genuine one.
struct TamperedOnceStore {
    genuine: MemoryStore,
    tampered: Mutex<Option<Snapshot>>,
}

impl SnapshotStore for TamperedOnceStore {
    fn load(&self, id: &SessionId) -> Option<Snapshot> {
        match self.tampered.lock().unwrap().take() {
            Some(snapshot) => Some(snapshot),
            None => self.genuine.load(id),
        }
    }

    fn save(&self, id: &SessionId, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        self.genuine.save(id, snapshot)
    }
}

#[test]
fn broken_session_is_reloaded_from_its_last_snapshot() {
    let session = GameSession::new(names(2), config(17)).unwrap();
    let genuine = session.snapshot();
    let mut tampered = genuine.clone();
    tampered.total_tickets += 1;

    let id = Uuid::new_v4();
    let store = TamperedOnceStore {
        genuine: MemoryStore::new(),
        tampered: Mutex::new(Some(tampered)),
    };
    store.save(&id, &genuine).unwrap();
    let registry = SessionRegistry::new(Box::new(store));

    let keep = Action::SelectTickets {
        keep: vec![true, true, false],
    };
    let error = registry.apply(&id, 0, keep.clone()).unwrap_err();
    assert!(!error.is_recoverable());
    assert!(matches!(
        error,
        RegistryError::Engine(EngineError::Invariant(InvariantViolation::TicketEconomy { .. }))
    ));
    assert!(!registry.is_resident(&id));

    // The genuine snapshot is loaded again, and the selection goes through.
    registry
        .with_session(&id, |session| {
            assert!(!session.is_poisoned());
            assert!(session.state().players[0].has_pending_tickets());
        })
        .unwrap();
    registry.apply(&id, 0, keep).unwrap();
    assert_eq!(
        registry
            .with_session(&id, |session| session.state().players[0].tickets().len())
            .unwrap(),
        2
    );
}

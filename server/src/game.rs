use crate::clock::GameClock;
use crate::gateway::SessionGateway;
use crate::ledger::ScoreLedger;
use crate::present::{CollectibleCoordinator, SpawnOutcome};
use crate::router::Router;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Packet, Position, SESSION_SECS, WORLD_WIDTH};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub spawn_points: Vec<Position>,
    pub session_secs: f32,
    pub max_clients: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            spawn_points: default_spawn_points(),
            session_secs: SESSION_SECS,
            max_clients: 16,
        }
    }
}

/// Five drop points spread across the world, near the top.
pub fn default_spawn_points() -> Vec<Position> {
    (0..5)
        .map(|i| {
            let x = WORLD_WIDTH * (i as f32 + 1.0) / 6.0;
            let y = if i % 2 == 0 { 40.0 } else { 80.0 };
            Position::new(x, y)
        })
        .collect()
}

/// Everything one session's authority owns, wired together once and shared by handle.
pub struct GameState {
    pub tick: u32,
    router: Arc<Router>,
    ledger: Arc<ScoreLedger>,
    presents: Arc<CollectibleCoordinator>,
    gateway: SessionGateway,
    clock: GameClock,
}

impl GameState {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &SessionConfig, rng: StdRng) -> Self {
        let router = Arc::new(Router::new());
        let ledger = Arc::new(ScoreLedger::new(Arc::clone(&router)));
        let presents = Arc::new(CollectibleCoordinator::with_rng(
            config.spawn_points.clone(),
            Arc::clone(&ledger),
            Arc::clone(&router),
            rng,
        ));
        let gateway = SessionGateway::new(
            Arc::clone(&router),
            Arc::clone(&ledger),
            Arc::clone(&presents),
        );

        Self {
            tick: 0,
            router,
            ledger,
            presents,
            gateway,
            clock: GameClock::new(config.session_secs),
        }
    }

    /// Drops the first present.
    pub fn start(&self) -> SpawnOutcome {
        info!(
            "Session started with {} spawn points, {}s on the clock",
            self.presents.spawn_points().len(),
            self.clock.remaining_secs()
        );
        self.presents.spawn_at_random_point()
    }

    pub fn update_physics(&mut self, dt: f32) {
        self.presents.step(dt);

        if let Some(remaining_secs) = self.clock.tick(dt) {
            self.router.broadcast(&Packet::Timer { remaining_secs });
            if remaining_secs == 0 {
                info!("Session clock ran out");
            }
        }
    }

    /// Tears the session down: scores are not kept past the session.
    pub fn end(&self) {
        self.ledger.reset();
    }

    /// Tells every connection the server is going away and closes their queues.
    pub fn disconnect_all(&self, reason: &str) {
        self.router.broadcast(&Packet::Disconnected {
            reason: reason.to_string(),
        });
        let closed = self.router.close_all();
        info!("Closed {} connections", closed);
    }

    pub fn gateway(&self) -> &SessionGateway {
        &self.gateway
    }

    pub fn ledger(&self) -> &Arc<ScoreLedger> {
        &self.ledger
    }

    pub fn presents(&self) -> &Arc<CollectibleCoordinator> {
        &self.presents
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn connection_count(&self) -> usize {
        self.router.len()
    }
}

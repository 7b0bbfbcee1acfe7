//! The collectible present and its spawn → collect → respawn cycle
//!
//! Exactly one present exists at a time. It drops from a spawn point, lands on the floor, and can
//! then be collected once. Collection is decided by a compare-and-set on the present's
//! `collected` flag, so when several collect signals race for the same present only the first
//! one awards points and triggers the respawn. Every other attempt is a silent no-op.

use crate::ledger::ScoreLedger;
use crate::router::Router;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shared::{
    Packet, PlayerId, Position, PresentId, FLOOR_Y, GRAVITY, PRESENT_SIZE, PRESENT_VALUES,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// One spawned present instance
#[derive(Debug)]
pub struct Present {
    pub id: PresentId,
    pub spawn_index: usize,
    landed: AtomicBool,
    collected: AtomicBool,
    /// Drawn by the collector that wins the present
    worth: OnceLock<i32>,
}

impl Present {
    fn new(id: PresentId, spawn_index: usize) -> Self {
        Self {
            id,
            spawn_index,
            landed: AtomicBool::new(false),
            collected: AtomicBool::new(false),
            worth: OnceLock::new(),
        }
    }

    /// Marks the present as resting on the ground. Returns true only for the first call.
    pub fn mark_landed(&self) -> bool {
        !self.landed.swap(true, Ordering::AcqRel)
    }

    pub fn is_landed(&self) -> bool {
        self.landed.load(Ordering::Acquire)
    }

    pub fn is_collected(&self) -> bool {
        self.collected.load(Ordering::Acquire)
    }

    /// Points the present was worth, once it has been collected.
    pub fn worth(&self) -> Option<i32> {
        self.worth.get().copied()
    }

    /// Flips `collected` from false to true. Exactly one caller ever sees true.
    fn try_collect(&self) -> bool {
        self.collected
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentPhase {
    Empty,
    Spawned,
    Collected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnOutcome {
    Spawned {
        present_id: PresentId,
        spawn_index: usize,
        position: Position,
    },
    /// An uncollected present is still live
    AlreadyLive,
    NoSpawnPoints,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectOutcome {
    Awarded { points: i32, respawn: SpawnOutcome },
    AlreadyCollected,
    NotLanded,
    /// The request named a present that is no longer the live one
    Stale,
    NoPresent,
}

struct Falling {
    present: Arc<Present>,
    position: Position,
    vel_y: f32,
}

struct CoordinatorState {
    current: Option<Falling>,
    last_spawn_index: Option<usize>,
    next_id: PresentId,
    rng: StdRng,
}

pub struct CollectibleCoordinator {
    spawn_points: Vec<Position>,
    state: Mutex<CoordinatorState>,
    ledger: Arc<ScoreLedger>,
    router: Arc<Router>,
}

impl CollectibleCoordinator {
    pub fn new(spawn_points: Vec<Position>, ledger: Arc<ScoreLedger>, router: Arc<Router>) -> Self {
        Self::with_rng(spawn_points, ledger, router, StdRng::from_entropy())
    }

    pub fn with_rng(
        spawn_points: Vec<Position>,
        ledger: Arc<ScoreLedger>,
        router: Arc<Router>,
        rng: StdRng,
    ) -> Self {
        Self {
            spawn_points,
            state: Mutex::new(CoordinatorState {
                current: None,
                last_spawn_index: None,
                next_id: 1,
                rng,
            }),
            ledger,
            router,
        }
    }

    /// Spawns a new present at a random spawn point other than the previous one.
    ///
    /// Only valid while no uncollected present is live. With a single spawn point the
    /// no-repeat rule is waived.
    pub fn spawn_at_random_point(&self) -> SpawnOutcome {
        if self.spawn_points.is_empty() {
            warn!("No spawn points configured, present not spawned");
            return SpawnOutcome::NoSpawnPoints;
        }

        let mut state = self.state.lock();
        if let Some(live) = &state.current {
            if !live.present.is_collected() {
                debug!("Present {} still live, spawn skipped", live.present.id);
                return SpawnOutcome::AlreadyLive;
            }
        }

        let count = self.spawn_points.len();
        let last_spawn_index = state.last_spawn_index;
        let spawn_index = match last_spawn_index {
            Some(last) if count > 1 => {
                // pick among the other count - 1 points
                let index = state.rng.gen_range(0..count - 1);
                if index >= last {
                    index + 1
                } else {
                    index
                }
            }
            _ => state.rng.gen_range(0..count),
        };

        let present_id = state.next_id;
        state.next_id += 1;
        state.last_spawn_index = Some(spawn_index);

        let position = self.spawn_points[spawn_index];
        state.current = Some(Falling {
            present: Arc::new(Present::new(present_id, spawn_index)),
            position,
            vel_y: 0.0,
        });

        info!(
            "Spawned present {} at point {} ({:.1}, {:.1})",
            present_id, spawn_index, position.x, position.y
        );
        self.router.broadcast(&Packet::PresentSpawned {
            present_id,
            position,
        });

        SpawnOutcome::Spawned {
            present_id,
            spawn_index,
            position,
        }
    }

    /// Collects the live present on behalf of `collector`.
    ///
    /// Only the first landed, uncollected attempt wins: it awards a random present value to the
    /// collector and spawns the next present. All other attempts change nothing.
    pub fn attempt_collect(&self, present_id: PresentId, collector: PlayerId) -> CollectOutcome {
        let present = match &self.state.lock().current {
            Some(live) => Arc::clone(&live.present),
            None => return CollectOutcome::NoPresent,
        };

        if present.id != present_id {
            debug!(
                "Player {} tried to collect present {} but {} is live",
                collector, present_id, present.id
            );
            return CollectOutcome::Stale;
        }
        if !present.is_landed() {
            debug!("Player {} touched present {} before it landed", collector, present.id);
            return CollectOutcome::NotLanded;
        }
        if !present.try_collect() {
            debug!("Present {} already collected, ignoring player {}", present.id, collector);
            return CollectOutcome::AlreadyCollected;
        }

        let drawn = {
            let mut state = self.state.lock();
            *PRESENT_VALUES.choose(&mut state.rng).unwrap_or(&PRESENT_VALUES[0])
        };
        // only the CAS winner reaches this point, so the first draw is the only one
        let points = *present.worth.get_or_init(|| drawn);
        info!("Player {} collected present {} worth {}", collector, present.id, points);
        self.ledger.award(collector, points, "");

        let respawn = self.spawn_at_random_point();
        CollectOutcome::Awarded { points, respawn }
    }

    /// Signal from the physics side that the present with `present_id` has come to rest.
    pub fn mark_landed(&self, present_id: PresentId) -> bool {
        let state = self.state.lock();
        match &state.current {
            Some(live) if live.present.id == present_id => self.land(live),
            _ => false,
        }
    }

    /// Advances the falling present by `dt` seconds and lands it on the floor.
    pub fn step(&self, dt: f32) -> Option<PresentId> {
        let mut state = self.state.lock();
        let live = state.current.as_mut()?;
        if live.present.is_landed() {
            return None;
        }

        live.vel_y += GRAVITY * dt;
        live.position.y += live.vel_y * dt;

        if live.position.y + PRESENT_SIZE >= FLOOR_Y {
            live.position.y = FLOOR_Y - PRESENT_SIZE;
            live.vel_y = 0.0;
            if self.land(live) {
                return Some(live.present.id);
            }
        }
        None
    }

    fn land(&self, live: &Falling) -> bool {
        if !live.present.mark_landed() {
            return false;
        }
        debug!("Present {} landed at ({:.1}, {:.1})", live.present.id, live.position.x, live.position.y);
        self.router.broadcast(&Packet::PresentLanded {
            present_id: live.present.id,
        });
        true
    }

    pub fn phase(&self) -> PresentPhase {
        match &self.state.lock().current {
            None => PresentPhase::Empty,
            Some(live) if live.present.is_collected() => PresentPhase::Collected,
            Some(_) => PresentPhase::Spawned,
        }
    }

    /// The live present and its current position.
    pub fn current(&self) -> Option<(Arc<Present>, Position)> {
        self.state
            .lock()
            .current
            .as_ref()
            .map(|live| (Arc::clone(&live.present), live.position))
    }

    pub fn last_spawn_index(&self) -> Option<usize> {
        self.state.lock().last_spawn_index
    }

    pub fn spawn_points(&self) -> &[Position] {
        &self.spawn_points
    }
}

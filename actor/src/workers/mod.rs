//! Game-playing workers.
//!
//! Every worker runs a fixed number of scoped threads. Threads claim game
//! indices from a shared queue, play the game with thread-local searches and
//! models, and record the result under the worker's mutex. Nothing else is
//! shared between threads.

pub mod agents;
pub mod dataset;
pub mod pit_play;
pub mod self_play;
pub mod validator;

use std::sync::{Mutex, MutexGuard};
use std::thread;

use engine_core::{Game, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use mcts::{FastRng, MctsConfig, ModelFactory};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

pub use agents::{Agent, Depth1Agent, RandomAgent};
pub use dataset::Dataset;
pub use pit_play::PitPlayWorker;
pub use self_play::{SelfPlayReport, SelfPlayWorker};
pub use validator::ValidatorWorker;

/// Lock a worker mutex, ignoring poisoning; a panicking thread already
/// fails the whole scope.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Thread pool settings shared by all workers.
#[derive(Debug)]
pub struct WorkerPool {
    threads: usize,
    seeds: Mutex<ChaCha20Rng>,
    show_progress: bool,
}

impl WorkerPool {
    /// With `seed` every generator handed out is reproducible; otherwise
    /// they are seeded from entropy.
    pub fn new(threads: usize, seed: Option<u64>) -> Self {
        let seeds = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self {
            threads: threads.max(1),
            seeds: Mutex::new(seeds),
            show_progress: true,
        }
    }

    /// Disable progress bars.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// A fresh generator derived from the pool's seed stream.
    pub fn fork_rng(&self) -> FastRng {
        FastRng::new(lock(&self.seeds).next_u64())
    }

    pub(crate) fn progress(&self, games: u32, label: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(games as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{bar:40.cyan/blue}] {pos}/{len} games ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_prefix(label.to_string());
        pb
    }

    /// Run `work` once per thread and wait for all of them.
    ///
    /// Seeds are drawn before any thread starts, so a seeded pool hands the
    /// same generator to the same thread slot on every run.
    pub(crate) fn run<F>(&self, work: F)
    where
        F: Fn(FastRng) + Sync,
    {
        let rngs: Vec<FastRng> = (0..self.threads).map(|_| self.fork_rng()).collect();
        let work = &work;
        thread::scope(|s| {
            for rng in rngs {
                s.spawn(move || work(rng));
            }
        });
    }
}

/// One side of a match: how to build its model and how it searches.
#[derive(Clone)]
pub struct Contestant {
    pub factory: ModelFactory,
    pub config: MctsConfig,
}

impl Contestant {
    pub fn new(factory: ModelFactory, config: MctsConfig) -> Self {
        Self { factory, config }
    }
}

impl std::fmt::Debug for Contestant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contestant")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Player 1 or player 2 of a match, independent of who moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Who opens game `index`: player 1 starts the odd-numbered games.
    pub fn opening(index: u32) -> Seat {
        if index % 2 == 1 {
            Seat::First
        } else {
            Seat::Second
        }
    }
}

/// Result for player 1 of a finished game whose last move was made by
/// `last_mover`.
pub fn first_player_outcome(final_state: &dyn Game, last_mover: Seat) -> Outcome {
    // game_result is from the side to move, i.e. the player after last_mover
    let to_move = final_state.game_result();
    match last_mover {
        Seat::First => to_move.flipped(),
        Seat::Second => to_move,
    }
}

/// Hands out game indices until the budget is used up.
#[derive(Debug, Default)]
pub(crate) struct GameQueue {
    next: u32,
    total: u32,
}

impl GameQueue {
    pub(crate) fn new(total: u32) -> Self {
        Self { next: 0, total }
    }

    pub(crate) fn claim(&mut self) -> Option<u32> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(index)
    }
}

/// Match results from player 1's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub p1_wins: u32,
    pub p2_wins: u32,
    pub draws: u32,
    pub total_length: u64,
}

impl Tally {
    pub fn record(&mut self, first_player: Outcome, length: usize) {
        match first_player {
            Outcome::Win => self.p1_wins += 1,
            Outcome::Loss => self.p2_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
        self.total_length += length as u64;
    }

    pub fn games(&self) -> u32 {
        self.p1_wins + self.p2_wins + self.draws
    }

    /// Player 1 score in percent, draws counting half. 0 before any game.
    pub fn first_player_winrate(&self) -> f32 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        (self.p1_wins as f32 + self.draws as f32 * 0.5) * 100.0 / games as f32
    }

    pub fn second_player_winrate(&self) -> f32 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        (self.p2_wins as f32 + self.draws as f32 * 0.5) * 100.0 / games as f32
    }

    pub fn average_game_length(&self) -> f32 {
        let games = self.games();
        if games == 0 {
            return 0.0;
        }
        self.total_length as f32 / games as f32
    }

    pub fn merge(&mut self, other: &Tally) {
        self.p1_wins += other.p1_wins;
        self.p2_wins += other.p2_wins;
        self.draws += other.draws;
        self.total_length += other.total_length;
    }

    pub(crate) fn progress_message(&self) -> String {
        format!(
            "{:.1}/{:.1}",
            self.first_player_winrate(),
            self.second_player_winrate()
        )
    }
}

//! Self-play data generation.
//!
//! Two searches play each other; every position the side to move searched
//! becomes a training sample. Once the game is over the value targets are
//! blended with the final result, fully at the last ply and by
//! `value_floor` at the first.

use std::sync::Mutex;

use engine_core::Game;
use mcts::{MctsSearch, Sample};
use tracing::{debug, info};

use super::{first_player_outcome, lock, Contestant, GameQueue, Seat, Tally, WorkerPool};

/// Everything a self-play run collected.
#[derive(Debug, Clone, Default)]
pub struct SelfPlayReport {
    pub samples: Vec<Sample>,
    /// How often each move was played at ply 0.
    pub first_moves: Vec<u32>,
    pub tally: Tally,
}

impl SelfPlayReport {
    pub fn games_played(&self) -> u32 {
        self.tally.games()
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: SelfPlayReport) {
        self.samples.extend(other.samples);
        if self.first_moves.len() < other.first_moves.len() {
            self.first_moves.resize(other.first_moves.len(), 0);
        }
        for (total, count) in self.first_moves.iter_mut().zip(&other.first_moves) {
            *total += count;
        }
        self.tally.merge(&other.tally);
    }
}

struct Shared {
    queue: GameQueue,
    report: SelfPlayReport,
}

/// Plays `games` games between two contestants and keeps every sample.
#[derive(Debug)]
pub struct SelfPlayWorker<'a> {
    game: &'a dyn Game,
    player1: Contestant,
    player2: Contestant,
    games: u32,
    value_floor: f32,
}

impl<'a> SelfPlayWorker<'a> {
    pub fn new(
        game: &'a dyn Game,
        player1: Contestant,
        player2: Contestant,
        games: u32,
        value_floor: f32,
    ) -> Self {
        Self {
            game,
            player1,
            player2,
            games,
            value_floor,
        }
    }

    pub fn run(&self, pool: &WorkerPool) -> SelfPlayReport {
        let shared = Mutex::new(Shared {
            queue: GameQueue::new(self.games),
            report: SelfPlayReport {
                samples: Vec::with_capacity(self.games as usize * self.game.max_turns()),
                first_moves: vec![0; self.game.max_moves()],
                tally: Tally::default(),
            },
        });
        let progress = pool.progress(self.games, "self-play");

        pool.run(|mut rng| {
            let mut model1 = (self.player1.factory)();
            let mut model2 = (self.player2.factory)();
            let mut search1 =
                MctsSearch::new(self.game, self.player1.config, rng.split());
            let mut search2 =
                MctsSearch::new(self.game, self.player2.config, rng.split());
            let mut samples: Vec<Sample> = Vec::with_capacity(self.game.max_turns());

            loop {
                let Some(index) = lock(&shared).queue.claim() else {
                    break;
                };

                search1.reset(self.game);
                search2.reset(self.game);
                samples.clear();

                let mut mover = Seat::opening(index);
                let mut first_move = None;
                loop {
                    let (search, model) = match mover {
                        Seat::First => (&mut search1, model1.as_mut()),
                        Seat::Second => (&mut search2, model2.as_mut()),
                    };
                    search.search(model);
                    let mv = search.best_move();

                    let mut sample =
                        Sample::new(self.game.input_size(), self.game.max_moves());
                    search.fill_sample(&mut sample);
                    samples.push(sample);
                    first_move.get_or_insert(mv);

                    search1.restore_root(mv);
                    search2.restore_root(mv);
                    if search1.root_state().is_terminal() {
                        break;
                    }
                    mover = mover.other();
                }

                let final_state = search1.root_state();
                // Result for whoever made the last move
                let result = final_state.game_result().flipped().as_f32();
                blend_values(&mut samples, result, self.value_floor);

                let outcome = first_player_outcome(final_state, mover);
                debug!(
                    game = index,
                    plies = samples.len(),
                    result = %outcome,
                    "Self-play game finished"
                );

                let mut guard = lock(&shared);
                let report = &mut guard.report;
                report.tally.record(outcome, samples.len());
                report.samples.extend(samples.drain(..));
                if let Some(mv) = first_move {
                    report.first_moves[mv] += 1;
                }
                progress.inc(1);
            }
        });
        progress.finish_and_clear();

        let report = shared.into_inner().unwrap_or_else(|e| e.into_inner()).report;
        info!(
            games = report.games_played(),
            samples = report.samples.len(),
            player1_wins = report.tally.p1_wins,
            player2_wins = report.tally.p2_wins,
            draws = report.tally.draws,
            avg_length = format!("{:.2}", report.tally.average_game_length()),
            "Self-play finished"
        );
        report
    }
}

/// Blend search values with the game result, walking back from the end.
///
/// `result` is the outcome for the side that made the last move. The last
/// sample takes it exactly; earlier samples mix in less of it, down to
/// `floor` at ply 0. The sign alternates with the side to move.
pub fn blend_values(samples: &mut [Sample], result: f32, floor: f32) {
    let n = samples.len();
    if n == 0 {
        return;
    }
    let decay = if n > 1 {
        (1.0 - floor) / (n - 1) as f32
    } else {
        0.0
    };

    let mut r = result;
    for (i, sample) in samples.iter_mut().enumerate().rev() {
        let k = 1.0 - decay * (n - 1 - i) as f32;
        sample.value = k * r + (1.0 - k) * sample.value;
        r = -r;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_tictactoe::TicTacToe;
    use mcts::{MctsConfig, UniformModel};

    fn sample_with_value(value: f32) -> Sample {
        let mut s = Sample::new(1, 1);
        s.value = value;
        s
    }

    #[test]
    fn test_blend_last_sample_takes_result() {
        let mut samples: Vec<Sample> = [0.3, -0.2, 0.5].map(sample_with_value).into();
        blend_values(&mut samples, 1.0, 0.7);

        assert!((samples[2].value - 1.0).abs() < 1e-6);
        // Middle ply: k = 0.85, opponent's perspective
        assert!((samples[1].value - (0.85 * -1.0 + 0.15 * -0.2)).abs() < 1e-6);
        // First ply: k = floor
        assert!((samples[0].value - (0.7 * 1.0 + 0.3 * 0.3)).abs() < 1e-6);
    }

    #[test]
    fn test_blend_single_ply() {
        let mut samples = vec![sample_with_value(-0.9)];
        blend_values(&mut samples, -1.0, 0.7);
        assert!((samples[0].value + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_blend_draw_shrinks_values() {
        let mut samples: Vec<Sample> = [0.4, 0.4].map(sample_with_value).into();
        blend_values(&mut samples, 0.0, 0.5);
        assert!(samples[1].value.abs() < 1e-6);
        assert!((samples[0].value - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_blend_empty_is_noop() {
        blend_values(&mut [], 1.0, 0.7);
    }

    fn uniform_contestant(iterations: u32) -> Contestant {
        let game = TicTacToe::new();
        Contestant::new(
            UniformModel::factory(game.input_size(), game.max_moves()),
            MctsConfig::for_testing().with_iterations(iterations),
        )
    }

    #[test]
    fn test_self_play_collects_one_sample_per_ply() {
        let game = TicTacToe::new();
        let pool = WorkerPool::new(2, Some(11)).quiet();
        let worker =
            SelfPlayWorker::new(&game, uniform_contestant(60), uniform_contestant(60), 6, 0.7);

        let report = worker.run(&pool);

        assert_eq!(report.games_played(), 6);
        assert_eq!(report.samples.len() as u64, report.tally.total_length);
        assert_eq!(report.first_moves.iter().sum::<u32>(), 6);
        assert_eq!(report.first_moves.len(), 9);
        for sample in &report.samples {
            assert_eq!(sample.input.len(), 18);
            assert!((-1.0..=1.0).contains(&sample.value));
            let mass: f32 = sample.policy.iter().sum();
            assert!((mass - 1.0).abs() < 1e-4, "policy mass {mass}");
            for (mv, &p) in sample.policy.iter().enumerate() {
                if p > 0.0 {
                    assert_eq!(sample.legal_moves[mv], 1);
                }
            }
        }
    }

    #[test]
    fn test_self_play_with_temperature_finishes() {
        let game = TicTacToe::new();
        let pool = WorkerPool::new(1, Some(5)).quiet();
        let mut contestant = uniform_contestant(30);
        contestant.config = contestant.config.with_temperature(4, 1.5, 0.5).with_noise(0.25, 0.3);

        let report = SelfPlayWorker::new(&game, contestant.clone(), contestant, 4, 0.7).run(&pool);
        assert_eq!(report.games_played(), 4);
        assert!(report.tally.total_length >= 4 * 5);
    }

    #[test]
    fn test_report_absorb() {
        let mut a = SelfPlayReport {
            samples: vec![sample_with_value(0.0)],
            first_moves: vec![1, 0],
            tally: Tally::default(),
        };
        let mut tally = Tally::default();
        tally.record(engine_core::Outcome::Draw, 2);
        let b = SelfPlayReport {
            samples: vec![sample_with_value(1.0), sample_with_value(-1.0)],
            first_moves: vec![0, 1, 1],
            tally,
        };
        a.absorb(b);
        assert_eq!(a.samples.len(), 3);
        assert_eq!(a.first_moves, vec![1, 1, 1]);
        assert_eq!(a.games_played(), 1);
    }
}

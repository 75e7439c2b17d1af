//! Generation orchestration: answers the trainer's commands.
//!
//! A self-play command plays the generation's games against a mix of the
//! best and a recent model and streams the samples back. A compare command
//! pits a candidate against the current best models and promotes it if it
//! wins often enough.

use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use engine_config::{CentralConfig, SearchConfig, SelfPlayConfig, ValidatorConfig};
use engine_core::Game;
use mcts::{DenseNetwork, FastRng};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{mcts_config, network_spec, resolve_game};
use crate::models::{ModelStore, ModelsStats};
use crate::protocol::{read_command, Command, Emitter};
use crate::samples::average_duplicate_values;
use crate::workers::{
    dataset, Contestant, Dataset, Depth1Agent, PitPlayWorker, RandomAgent, SelfPlayReport,
    SelfPlayWorker, Tally, ValidatorWorker, WorkerPool,
};

/// Scalar tag of the comparison result, spelled as existing training
/// dashboards expect it.
pub const COMPARISON_WIN_RATE_TAG: &str = "Comparision/win rate";

/// Self-play opponents for `generation`: the best models, then one recent.
pub fn pick_opponents<R: Rng + ?Sized>(
    stats: &ModelsStats,
    generation: i32,
    recent_window: u32,
    rng: &mut R,
) -> Vec<i32> {
    let mut opponents = vec![stats.best1];
    opponents.extend(stats.best2);

    let recent = if generation <= 0 {
        0
    } else {
        let window = recent_window.max(1) as i32;
        rng.gen_range((generation - window).max(0)..=generation - 1)
    };
    opponents.push(recent);
    opponents
}

/// Games to play in `generation`, ramping up during warmup.
pub fn game_budget(config: &SelfPlayConfig, generation: i32) -> u32 {
    let warmup = config.warmup_generations;
    if warmup == 0 || generation < 0 || generation as u32 > warmup {
        return config.games;
    }
    let progress = generation as f32 / warmup as f32;
    let share = config.warmup_floor + progress * (1.0 - config.warmup_floor);
    (config.games as f32 * share) as u32
}

/// Divide `total` games between opponents.
///
/// The last opponent gets 10%. The others get x, 2x, 4x... of the rest,
/// the first opponent the most. Repeated opponents are merged into their
/// first entry. A lone opponent plays everything.
pub fn split_games(opponents: &[i32], total: u32) -> Vec<(i32, u32)> {
    let n = opponents.len();
    let shares: Vec<f64> = match n {
        0 => return Vec::new(),
        1 => vec![1.0],
        _ => {
            let mut shares = vec![0.0; n];
            shares[n - 1] = 0.1;
            let mut x = 0.9 / ((1u64 << (n - 1)) - 1) as f64;
            for share in shares[..n - 1].iter_mut().rev() {
                *share = x;
                x *= 2.0;
            }
            shares
        }
    };

    let mut plan: Vec<(i32, u32)> = Vec::with_capacity(n);
    for (&generation, share) in opponents.iter().zip(shares) {
        let games = (share * total as f64) as u32;
        match plan.iter_mut().find(|(g, _)| *g == generation) {
            Some(entry) => entry.1 += games,
            None => plan.push((generation, games)),
        }
    }
    plan
}

#[derive(Debug)]
pub struct Trainer {
    game: Box<dyn Game>,
    config: CentralConfig,
    store: ModelStore,
    pool: WorkerPool,
    rng: FastRng,
}

impl Trainer {
    /// Resolve the game and network shape, and make sure generation 0
    /// exists on disk.
    pub fn new(config: CentralConfig, pool: WorkerPool) -> Result<Self> {
        let game = resolve_game(&config.common.game)?;
        let spec = network_spec(game.as_ref(), &config.model.layers)?;
        let store = ModelStore::new(&config.common.data_dir, spec);

        let mut rng = pool.fork_rng();
        store.ensure_initial_model(&mut rng)?;

        info!(
            game = %game.metadata().display_name,
            data_dir = %config.common.data_dir.display(),
            threads = pool.threads(),
            parameters = store.spec().parameter_count(),
            "Trainer ready"
        );

        Ok(Self {
            game,
            config,
            store,
            pool,
            rng,
        })
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Answer commands until the input ends.
    pub fn serve<R: Read, W: Write>(&mut self, input: &mut R, out: &mut Emitter<W>) -> Result<()> {
        while let Some(command) = read_command(input).context("failed to read command")? {
            let generation = command.generation();
            match command {
                Command::SelfPlay { .. } => {
                    info!(generation, "Self-play requested");
                    self.self_play(generation, out)?;
                }
                Command::Compare { model, .. } => {
                    info!(generation, bytes = model.len(), "Comparison requested");
                    self.compare(generation, &model, out)?;
                }
            }
        }
        info!("Input closed, shutting down");
        Ok(())
    }

    fn contestant(&self, generation: i32, search: &SearchConfig) -> Result<Contestant> {
        Ok(Contestant::new(self.store.factory(generation)?, mcts_config(search)))
    }

    pub fn self_play<W: Write>(&mut self, generation: i32, out: &mut Emitter<W>) -> Result<()> {
        let settings = &self.config.self_play;
        let stats = self.store.load_stats()?;

        let opponents = pick_opponents(&stats, generation, settings.recent_window, &mut self.rng);
        let total = game_budget(settings, generation);
        out.scalar("Self Play/Games", total as f32, generation)?;

        let plan = split_games(&opponents, total);
        info!(generation, total, ?plan, "Self-play plan");

        let best = self.contestant(stats.best1, &settings.mcts)?;
        let mut report = SelfPlayReport::default();
        for &(opponent, games) in &plan {
            if games == 0 {
                debug!(opponent, "No games left for opponent");
                continue;
            }
            let player = self.contestant(opponent, &settings.mcts)?;
            info!(opponent, games, best = stats.best1, "Self-play against opponent");
            let worker = SelfPlayWorker::new(
                self.game.as_ref(),
                player,
                best.clone(),
                games,
                settings.value_floor,
            );
            report.absorb(worker.run(&self.pool));
        }

        self.emit_self_play(generation, report, out)?;

        if generation == stats.best1 {
            self.run_validators(stats.best1, generation, out)?;
        }
        Ok(())
    }

    fn emit_self_play<W: Write>(
        &self,
        generation: i32,
        mut report: SelfPlayReport,
        out: &mut Emitter<W>,
    ) -> Result<()> {
        let games = report.games_played();
        report.first_moves.resize(self.game.max_moves(), 0);
        let first_moves: Vec<(String, f32)> = report
            .first_moves
            .iter()
            .enumerate()
            .map(|(mv, &count)| {
                let share = if games > 0 { count as f32 / games as f32 } else { 0.0 };
                (mv.to_string(), share)
            })
            .collect();
        out.scalars("First move counts", &first_moves, generation)?;
        out.scalar(
            "Self Play/Average game length",
            report.tally.average_game_length(),
            generation,
        )?;

        let duplicates = average_duplicate_values(&mut report.samples);
        out.scalar("Self Play/MSE loss in samples", duplicates.value_mse, generation)?;
        out.scalars(
            "Self Play",
            &[
                ("samples", duplicates.samples as f32),
                ("unique samples", duplicates.unique as f32),
            ],
            generation,
        )?;

        out.dataset(&report.samples, self.game.input_size(), self.game.max_moves())
            .context("failed to send self-play samples")?;
        info!(generation, games, samples = report.samples.len(), "Self-play samples sent");
        Ok(())
    }

    /// Measure the freshly accepted best model against every configured
    /// validator.
    pub fn run_validators<W: Write>(
        &self,
        best: i32,
        generation: i32,
        out: &mut Emitter<W>,
    ) -> Result<()> {
        let validation = &self.config.validation;
        if validation.validators.is_empty() {
            return Ok(());
        }
        let player = self.contestant(best, &validation.mcts)?;
        let game = self.game.as_ref();

        for validator in &validation.validators {
            match validator {
                ValidatorConfig::Dataset { data_path } => {
                    let data = Dataset::load(data_path, game.input_size(), game.max_moves())
                        .with_context(|| {
                            format!("failed to load validation dataset {}", data_path.display())
                        })?;
                    let mut model = (player.factory)();
                    let report = dataset::validate_dataset(model.as_mut(), &data);
                    info!(path = %data_path.display(), ?report, "Dataset validation finished");
                    out.scalars(
                        &format!("Validation/dataset {}", data_path.display()),
                        &report.scalars(),
                        generation,
                    )?;
                }
                ValidatorConfig::RandomAgent { games } => {
                    let tally =
                        ValidatorWorker::<RandomAgent>::new(game, player.clone(), *games)
                            .run(&self.pool);
                    emit_tally(out, "RandomAgent", &tally, generation)?;
                }
                ValidatorConfig::Depth1Agent { games } => {
                    let tally =
                        ValidatorWorker::<Depth1Agent>::new(game, player.clone(), *games)
                            .run(&self.pool);
                    emit_tally(out, "Depth1Agent", &tally, generation)?;
                }
                ValidatorConfig::Model {
                    data_path,
                    games,
                    layers,
                    mcts,
                } => {
                    let layers = layers.as_ref().unwrap_or(&self.config.model.layers);
                    let spec = network_spec(game, layers)?;
                    let reference = DenseNetwork::load(spec, data_path.join("model_best"))
                        .with_context(|| {
                            format!("failed to load reference model from {}", data_path.display())
                        })?;
                    let reference = Contestant::new(
                        reference.factory(),
                        mcts_config(mcts.as_ref().unwrap_or(&validation.mcts)),
                    );
                    let best_player = self.contestant(best, &self.config.pit_play.mcts)?;

                    let tally = PitPlayWorker::new(game, best_player, reference, *games)
                        .run(&self.pool);
                    emit_tally(out, &data_path.display().to_string(), &tally, generation)?;
                }
            }
        }
        Ok(())
    }

    /// Pit a candidate against the best models; promote it if its worst
    /// win rate is good enough. Returns whether it was accepted.
    pub fn compare<W: Write>(
        &self,
        generation: i32,
        weights: &[u8],
        out: &mut Emitter<W>,
    ) -> Result<bool> {
        let pit = &self.config.pit_play;
        let mut stats = self.store.load_stats()?;
        let candidate = Contestant::new(
            self.store.factory_from_bytes(weights)?,
            mcts_config(&pit.mcts),
        );
        let move_time = pit.move_time_ms.map(Duration::from_millis);

        let mut win_rate = 100.0f32;
        for best in stats.bests() {
            let opponent = self.contestant(best, &pit.mcts)?;
            let tally =
                PitPlayWorker::new(self.game.as_ref(), candidate.clone(), opponent, pit.games)
                    .with_move_time(move_time)
                    .run(&self.pool);
            let wr = tally.first_player_winrate();
            info!(generation, best, wr = format!("{wr:.2}"), "Candidate against best model");
            win_rate = win_rate.min(wr);
        }
        out.scalar(COMPARISON_WIN_RATE_TAG, win_rate, generation)?;

        let accepted = win_rate >= pit.win_rate_accepted;
        if accepted {
            stats.promote(generation);
            self.store.save_stats(&stats)?;
            self.store.write_best(weights)?;
            info!(
                generation,
                win_rate,
                best2 = ?stats.best2,
                "Candidate accepted as best model"
            );
        } else {
            warn!(
                generation,
                win_rate,
                required = pit.win_rate_accepted,
                "Candidate rejected"
            );
        }

        out.comparison_done()?;
        Ok(accepted)
    }

    /// One-off arena match between two weight files.
    pub fn pit(&self, model_a: &Path, model_b: &Path, games: Option<u32>) -> Result<Tally> {
        let pit = &self.config.pit_play;
        let load = |path: &Path| -> Result<Contestant> {
            let net = DenseNetwork::load(self.store.spec().clone(), path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            Ok(Contestant::new(net.factory(), mcts_config(&pit.mcts)))
        };

        let tally = PitPlayWorker::new(
            self.game.as_ref(),
            load(model_a)?,
            load(model_b)?,
            games.unwrap_or(pit.games),
        )
        .with_move_time(pit.move_time_ms.map(Duration::from_millis))
        .run(&self.pool);
        Ok(tally)
    }
}

fn emit_tally<W: Write>(
    out: &mut Emitter<W>,
    name: &str,
    tally: &Tally,
    generation: i32,
) -> Result<()> {
    out.scalar(
        &format!("Validation/{name} WR"),
        tally.first_player_winrate(),
        generation,
    )?;
    out.scalar(
        &format!("Validation/{name} game length"),
        tally.average_game_length(),
        generation,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::{parse_frames, Frame};
    use engine_config::parse_config;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::io::Cursor;

    fn self_play_config(games: u32, warmup: u32, floor: f32) -> SelfPlayConfig {
        SelfPlayConfig {
            games,
            warmup_generations: warmup,
            warmup_floor: floor,
            ..SelfPlayConfig::default()
        }
    }

    #[test]
    fn test_budget_warmup_ramp() {
        let config = self_play_config(1000, 10, 0.25);
        assert_eq!(game_budget(&config, 0), 250);
        assert_eq!(game_budget(&config, 2), 400);
        assert_eq!(game_budget(&config, 10), 1000);
        assert_eq!(game_budget(&config, 11), 1000);
    }

    #[test]
    fn test_budget_without_warmup() {
        let config = self_play_config(300, 0, 0.25);
        assert_eq!(game_budget(&config, 0), 300);
        assert_eq!(game_budget(&config, 7), 300);
    }

    #[test]
    fn test_split_three_opponents() {
        assert_eq!(split_games(&[5, 3, 4], 100), vec![(5, 60), (3, 30), (4, 10)]);
    }

    #[test]
    fn test_split_two_opponents() {
        assert_eq!(split_games(&[2, 1], 1000), vec![(2, 900), (1, 100)]);
    }

    #[test]
    fn test_split_merges_duplicates_into_first() {
        assert_eq!(split_games(&[0, 0], 100), vec![(0, 100)]);
        assert_eq!(split_games(&[5, 3, 5], 100), vec![(5, 70), (3, 30)]);
    }

    #[test]
    fn test_split_edge_cases() {
        assert!(split_games(&[], 10).is_empty());
        assert_eq!(split_games(&[4], 10), vec![(4, 10)]);
    }

    #[test]
    fn test_opponents_at_generation_zero() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let opponents = pick_opponents(&ModelsStats::default(), 0, 5, &mut rng);
        assert_eq!(opponents, vec![0, 0]);
    }

    #[test]
    fn test_recent_opponent_within_window() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let stats = ModelsStats {
            best1: 8,
            best2: Some(6),
        };
        for _ in 0..200 {
            let opponents = pick_opponents(&stats, 9, 5, &mut rng);
            assert_eq!(&opponents[..2], &[8, 6]);
            assert!((4..=8).contains(&opponents[2]), "{opponents:?}");
        }
        for _ in 0..50 {
            let recent = pick_opponents(&stats, 2, 5, &mut rng)[2];
            assert!((0..=1).contains(&recent));
        }
        // A zero window still picks the previous generation
        assert_eq!(pick_opponents(&stats, 3, 0, &mut rng)[2], 2);
    }

    fn test_config(data_dir: &Path, win_rate_accepted: f32) -> CentralConfig {
        parse_config(&format!(
            r#"
[common]
game = "tictactoe"
data_dir = "{}"
threads = 2
seed = 17

[self_play]
games = 6

[self_play.mcts]
iterations = 8
init_reserved_nodes = 256

[pit_play]
games = 4
win_rate_accepted = {win_rate_accepted:.1}

[pit_play.mcts]
iterations = 8
init_reserved_nodes = 256

[validation.mcts]
iterations = 8
init_reserved_nodes = 256

[[validation.validators]]
type = "random_agent"
games = 2

[[validation.validators]]
type = "depth1_agent"
games = 2

[model]
layers = [
    {{ units = 16, activation = "relu" }},
    {{ units = 10, activation = "linear" }},
]
"#,
            data_dir.display()
        ))
        .unwrap()
    }

    fn trainer(data_dir: &Path, win_rate_accepted: f32) -> Trainer {
        let pool = WorkerPool::new(2, Some(17)).quiet();
        Trainer::new(test_config(data_dir, win_rate_accepted), pool).unwrap()
    }

    fn command(words: &[i32], payload: &[u8]) -> Vec<u8> {
        let mut bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        bytes.extend_from_slice(payload);
        bytes
    }

    fn tag(frame: &Frame) -> &str {
        match frame {
            Frame::Scalar(tag, ..) | Frame::Scalars(tag, ..) => tag,
            Frame::Dataset { .. } => "<dataset>",
            Frame::ComparisonDone => "<done>",
        }
    }

    #[test]
    fn test_new_writes_initial_model() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = trainer(dir.path(), 55.0);
        assert!(trainer.store().model_path(0).exists());
    }

    #[test]
    fn test_new_rejects_mismatched_layers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path(), 55.0);
        config.model.layers.last_mut().unwrap().units = 8;
        let err = Trainer::new(config, WorkerPool::new(1, Some(1)).quiet()).unwrap_err();
        assert!(err.to_string().contains("last layer"));
    }

    #[test]
    fn test_serve_self_play_generation_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = trainer(dir.path(), 55.0);

        let mut input = Cursor::new(command(&[0, 0], &[]));
        let mut out = Emitter::new(Vec::new());
        trainer.serve(&mut input, &mut out).unwrap();

        let frames = parse_frames(&out.into_inner());
        let tags: Vec<&str> = frames.iter().map(tag).collect();
        assert_eq!(
            tags,
            vec![
                "Self Play/Games",
                "First move counts",
                "Self Play/Average game length",
                "Self Play/MSE loss in samples",
                "Self Play",
                "<dataset>",
                "Validation/RandomAgent WR",
                "Validation/RandomAgent game length",
                "Validation/Depth1Agent WR",
                "Validation/Depth1Agent game length",
            ]
        );

        assert_eq!(frames[0], Frame::Scalar("Self Play/Games".into(), 6.0, 0));

        // best1 and the recent model are both generation 0: 5 + 0 games
        let Frame::Scalars(_, first_moves, 0) = &frames[1] else {
            panic!("unexpected {:?}", frames[1]);
        };
        assert_eq!(first_moves.len(), 9);
        assert_eq!(first_moves[4].0, "4");
        let share: f32 = first_moves.iter().map(|(_, v)| v).sum();
        assert!((share - 1.0).abs() < 1e-5);

        let Frame::Scalar(_, length, _) = frames[2] else {
            panic!()
        };
        assert!((5.0..=9.0).contains(&length));

        let Frame::Scalars(_, counts, _) = &frames[4] else {
            panic!()
        };
        let samples = counts[0].1 as usize;
        assert!(counts[1].1 as usize <= samples);

        let Frame::Dataset {
            count,
            input_len,
            policy_len,
            values,
        } = &frames[5]
        else {
            panic!()
        };
        assert_eq!(*count, samples);
        assert!(*count >= 5 * 5);
        assert_eq!((*input_len, *policy_len), (18, 9));
        assert!(values.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_self_play_skips_validation_for_old_generation() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = trainer(dir.path(), 55.0);
        // Generation 1 exists but best1 is still 0
        std::fs::copy(trainer.store().model_path(0), trainer.store().model_path(1)).unwrap();

        let mut out = Emitter::new(Vec::new());
        trainer.self_play(1, &mut out).unwrap();
        let frames = parse_frames(&out.into_inner());
        assert_eq!(frames.len(), 6);
        assert!(matches!(frames.last(), Some(Frame::Dataset { .. })));
    }

    #[test]
    fn test_compare_accepts_and_promotes() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = trainer(dir.path(), 0.0);
        let weights = std::fs::read(trainer.store().model_path(0)).unwrap();

        let mut input = Cursor::new(command(&[1, 1, weights.len() as i32], &weights));
        let mut out = Emitter::new(Vec::new());
        trainer.serve(&mut input, &mut out).unwrap();

        let frames = parse_frames(&out.into_inner());
        assert_eq!(frames.len(), 2);
        assert!(matches!(&frames[0], Frame::Scalar(t, wr, 1) if t == "Comparision/win rate" && (0.0..=100.0).contains(wr)));
        assert_eq!(frames[1], Frame::ComparisonDone);

        let stats = trainer.store().load_stats().unwrap();
        assert_eq!(stats, ModelsStats { best1: 1, best2: Some(0) });
        assert_eq!(std::fs::read(trainer.store().best_path()).unwrap(), weights);
    }

    #[test]
    fn test_compare_rejects_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = trainer(dir.path(), 100.0);
        // All-zero weights give a uniform policy and a neutral value
        let weights = vec![0u8; trainer.store().spec().parameter_count() * 4];

        let mut out = Emitter::new(Vec::new());
        let accepted = trainer.compare(1, &weights, &mut out).unwrap();
        let frames = parse_frames(&out.into_inner());

        if accepted {
            // Only a perfect score clears a 100% bar
            assert!(matches!(frames[0], Frame::Scalar(_, wr, _) if wr == 100.0));
        } else {
            assert_eq!(trainer.store().load_stats().unwrap(), ModelsStats::default());
            assert!(!trainer.store().best_path().exists());
        }
        assert_eq!(frames.last(), Some(&Frame::ComparisonDone));
    }

    #[test]
    fn test_compare_rejects_wrong_weight_size() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = trainer(dir.path(), 0.0);
        let mut out = Emitter::new(Vec::new());
        assert!(trainer.compare(1, &[0u8; 7], &mut out).is_err());
        assert!(out.into_inner().is_empty());
    }

    #[test]
    fn test_serve_rejects_unknown_opcode() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = trainer(dir.path(), 55.0);
        let mut input = Cursor::new(command(&[9], &[]));
        let err = trainer.serve(&mut input, &mut Emitter::new(Vec::new())).unwrap_err();
        assert!(format!("{err:#}").contains("unknown opcode 9"));
    }

    #[test]
    fn test_pit_between_files() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = trainer(dir.path(), 55.0);
        let path = trainer.store().model_path(0);
        let tally = trainer.pit(&path, &path, Some(3)).unwrap();
        assert_eq!(tally.games(), 3);
        assert!(trainer.pit(&path, &dir.path().join("missing"), Some(1)).is_err());
    }

    #[test]
    fn test_dataset_validator_reports_group() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("positions.bin");
        let mut bytes = 1i32.to_le_bytes().to_vec();
        for x in std::iter::repeat(0.0f32).take(18 + 9).chain([1.0]) {
            bytes.extend_from_slice(&x.to_le_bytes());
        }
        std::fs::write(&data_path, bytes).unwrap();

        let mut config = test_config(dir.path(), 55.0);
        config.validation.validators = vec![ValidatorConfig::Dataset {
            data_path: data_path.clone(),
        }];
        let trainer = Trainer::new(config, WorkerPool::new(1, Some(2)).quiet()).unwrap();

        let mut out = Emitter::new(Vec::new());
        trainer.run_validators(0, 0, &mut out).unwrap();
        let frames = parse_frames(&out.into_inner());
        let Frame::Scalars(main, values, 0) = &frames[0] else {
            panic!("unexpected {frames:?}")
        };
        assert_eq!(main, &format!("Validation/dataset {}", data_path.display()));
        let names: Vec<&str> = values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["value_mse", "policy_mse", "good_sign", "optimal_move"]);
    }

    #[test]
    fn test_model_validator_uses_reference_best() {
        let dir = tempfile::tempdir().unwrap();
        let reference_dir = dir.path().join("reference");
        std::fs::create_dir_all(&reference_dir).unwrap();

        let mut config = test_config(dir.path(), 55.0);
        config.validation.validators = vec![ValidatorConfig::Model {
            data_path: reference_dir.clone(),
            games: 2,
            layers: None,
            mcts: None,
        }];
        let trainer = Trainer::new(config, WorkerPool::new(1, Some(2)).quiet()).unwrap();

        // Reference missing: a fatal error
        assert!(trainer.run_validators(0, 0, &mut Emitter::new(Vec::new())).is_err());

        std::fs::copy(trainer.store().model_path(0), reference_dir.join("model_best")).unwrap();
        let mut out = Emitter::new(Vec::new());
        trainer.run_validators(0, 0, &mut out).unwrap();
        let frames = parse_frames(&out.into_inner());
        let tags: Vec<&str> = frames.iter().map(tag).collect();
        let name = reference_dir.display();
        assert_eq!(
            tags,
            vec![format!("Validation/{name} WR"), format!("Validation/{name} game length")]
        );
    }
}

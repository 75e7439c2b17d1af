//! Arena matches between two contestants; only results are kept.

use std::sync::Mutex;
use std::time::Duration;

use engine_core::Game;
use mcts::{MctsSearch, Model};
use tracing::{debug, info};

use super::{first_player_outcome, lock, Contestant, GameQueue, Seat, Tally, WorkerPool};

#[derive(Debug)]
pub struct PitPlayWorker<'a> {
    game: &'a dyn Game,
    player1: Contestant,
    player2: Contestant,
    games: u32,
    move_time: Option<Duration>,
}

impl<'a> PitPlayWorker<'a> {
    pub fn new(game: &'a dyn Game, player1: Contestant, player2: Contestant, games: u32) -> Self {
        Self {
            game,
            player1,
            player2,
            games,
            move_time: None,
        }
    }

    /// Search each move for a fixed wall-clock time instead of a fixed
    /// iteration count.
    pub fn with_move_time(mut self, move_time: Option<Duration>) -> Self {
        self.move_time = move_time;
        self
    }

    fn think(&self, search: &mut MctsSearch, model: &mut dyn Model) -> usize {
        match self.move_time {
            Some(budget) => search.search_for(model, budget),
            None => search.search(model),
        }
        search.best_move()
    }

    pub fn run(&self, pool: &WorkerPool) -> Tally {
        let shared = Mutex::new((GameQueue::new(self.games), Tally::default()));
        let progress = pool.progress(self.games, "pit-play");

        pool.run(|mut rng| {
            let mut model1 = (self.player1.factory)();
            let mut model2 = (self.player2.factory)();
            let mut search1 = MctsSearch::new(self.game, self.player1.config, rng.split());
            let mut search2 = MctsSearch::new(self.game, self.player2.config, rng.split());

            loop {
                let Some(index) = lock(&shared).0.claim() else {
                    break;
                };

                search1.reset(self.game);
                search2.reset(self.game);

                let mut mover = Seat::opening(index);
                let mut length = 0;
                loop {
                    let mv = match mover {
                        Seat::First => self.think(&mut search1, model1.as_mut()),
                        Seat::Second => self.think(&mut search2, model2.as_mut()),
                    };
                    search1.restore_root(mv);
                    search2.restore_root(mv);
                    length += 1;
                    if search1.root_state().is_terminal() {
                        break;
                    }
                    mover = mover.other();
                }

                let outcome = first_player_outcome(search1.root_state(), mover);
                debug!(game = index, plies = length, result = %outcome, "Pit-play game finished");

                let mut guard = lock(&shared);
                guard.1.record(outcome, length);
                progress.set_message(guard.1.progress_message());
                progress.inc(1);
            }
        });
        progress.finish_and_clear();

        let (_, tally) = shared.into_inner().unwrap_or_else(|e| e.into_inner());
        info!(
            games = tally.games(),
            player1_wins = tally.p1_wins,
            player2_wins = tally.p2_wins,
            draws = tally.draws,
            player1_wr = format!("{:.2}", tally.first_player_winrate()),
            player2_wr = format!("{:.2}", tally.second_player_winrate()),
            "Pit-play finished"
        );
        tally
    }
}

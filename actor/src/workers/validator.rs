//! Matches of a searching model (player 1) against a fixed agent (player 2).

use std::marker::PhantomData;
use std::sync::Mutex;

use engine_core::Game;
use mcts::MctsSearch;
use tracing::{debug, info};

use super::{first_player_outcome, lock, Agent, Contestant, GameQueue, Seat, Tally, WorkerPool};

#[derive(Debug)]
pub struct ValidatorWorker<'a, A> {
    game: &'a dyn Game,
    player: Contestant,
    games: u32,
    agent: PhantomData<fn() -> A>,
}

impl<'a, A: Agent + Default> ValidatorWorker<'a, A> {
    pub fn new(game: &'a dyn Game, player: Contestant, games: u32) -> Self {
        Self {
            game,
            player,
            games,
            agent: PhantomData,
        }
    }

    pub fn run(&self, pool: &WorkerPool) -> Tally {
        let shared = Mutex::new((GameQueue::new(self.games), Tally::default()));
        let label = A::default().name();
        let progress = pool.progress(self.games, label);

        pool.run(|mut rng| {
            let mut model = (self.player.factory)();
            let mut search = MctsSearch::new(self.game, self.player.config, rng.split());
            let mut agent = A::default();

            loop {
                let Some(index) = lock(&shared).0.claim() else {
                    break;
                };

                search.reset(self.game);
                let mut mover = Seat::opening(index);
                let mut length = 0;
                loop {
                    let mv = match mover {
                        Seat::First => {
                            search.search(model.as_mut());
                            search.best_move()
                        }
                        Seat::Second => agent.choose(search.root_state(), &mut rng),
                    };
                    search.restore_root(mv);
                    length += 1;
                    if search.root_state().is_terminal() {
                        break;
                    }
                    mover = mover.other();
                }

                let outcome = first_player_outcome(search.root_state(), mover);
                debug!(game = index, plies = length, result = %outcome, opponent = label, "Validation game finished");

                let mut guard = lock(&shared);
                guard.1.record(outcome, length);
                progress.set_message(guard.1.progress_message());
                progress.inc(1);
            }
        });
        progress.finish_and_clear();

        let (_, tally) = shared.into_inner().unwrap_or_else(|e| e.into_inner());
        info!(
            opponent = label,
            games = tally.games(),
            wins = tally.p1_wins,
            losses = tally.p2_wins,
            draws = tally.draws,
            wr = format!("{:.2}", tally.first_player_winrate()),
            "Validation finished"
        );
        tally
    }
}

//! Oware (Abapa rules) for the Crucible engine
//!
//! Two rows of six pits, four seeds in each at the start. A move empties one
//! of the mover's pits and sows its seeds counter-clockwise, skipping the
//! origin pit on laps. If the last seed lands in an opponent pit that now
//! holds two or three seeds, those seeds are captured together with any
//! unbroken run of two/three pits behind it.
//!
//! # Pit layout
//!
//! ```text
//!   opponent:  5  4  3  2  1  0
//!   mover:     0  1  2  3  4  5   -> sowing continues on the opponent row
//! ```
//!
//! Moves are the mover's pit indices 0-5.

use std::fmt;

use engine_core::{impl_game_boilerplate, register_game, Game, GameMetadata, Outcome};

pub const NAME: &str = "oware";

pub const PITS: usize = 6;
pub const INITIAL_SEEDS: u8 = 4;
pub const TOTAL_SEEDS: u8 = PITS as u8 * 2 * INITIAL_SEEDS;
pub const MAX_TURNS: usize = 200;

/// A score above this wins outright.
const WINNING_SCORE: u8 = TOTAL_SEEDS / 2;

/// One-hot width per pit and per score in the network input.
const PIT_BUCKETS: usize = 24;
const SCORE_BUCKETS: usize = 27;
const SCORE_OFFSET: usize = PITS * 2 * PIT_BUCKETS;
pub const INPUT_SIZE: usize = SCORE_OFFSET + 2 * SCORE_BUCKETS; // 342

/// Register Oware with the global game registry
pub fn register_oware() {
    register_game(NAME.to_string(), || Box::new(Oware::new()));
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oware {
    /// Seeds per pit, indexed by player (0 moves first) then pit.
    pits: [[u8; PITS]; 2],
    scores: [u8; 2],
    /// Player to move, 0 or 1.
    to_move: usize,
    turn: u16,
    ended: bool,
}

impl Oware {
    pub fn new() -> Self {
        Self {
            pits: [[INITIAL_SEEDS; PITS]; 2],
            scores: [0; 2],
            to_move: 0,
            turn: 0,
            ended: false,
        }
    }

    /// Build an arbitrary position, player 0 to move.
    ///
    /// Seeds not on the board and not in `scores` are assumed lost, which is
    /// fine for tests and endgame probes.
    pub fn from_parts(pits: [[u8; PITS]; 2], scores: [u8; 2], turn: u16) -> Self {
        let mut game = Self {
            pits,
            scores,
            to_move: 0,
            turn,
            ended: false,
        };
        game.check_end();
        game
    }

    /// Seeds in the pits of the side to move.
    pub fn my_pits(&self) -> &[u8; PITS] {
        &self.pits[self.to_move]
    }

    /// Seeds in the pits of the side that just moved.
    pub fn enemy_pits(&self) -> &[u8; PITS] {
        &self.pits[1 - self.to_move]
    }

    pub fn my_score(&self) -> u8 {
        self.scores[self.to_move]
    }

    pub fn enemy_score(&self) -> u8 {
        self.scores[1 - self.to_move]
    }

    fn is_legal_for(&self, player: usize, pit: usize) -> bool {
        let seeds = self.pits[player][pit];
        let opponent_empty = self.pits[1 - player].iter().all(|&s| s == 0);
        if opponent_empty {
            // Must feed: the sowing has to reach the opponent row
            seeds as usize >= PITS - pit
        } else {
            seeds > 0
        }
    }

    fn has_moves(&self, player: usize) -> bool {
        (0..PITS).any(|pit| self.is_legal_for(player, pit))
    }

    /// Sows from `pit` and returns the opponent pit of the last seed, if the
    /// last seed landed on the opponent row.
    fn sow(&mut self, pit: usize) -> Option<usize> {
        let me = self.to_move;
        let mut seeds = self.pits[me][pit];
        self.pits[me][pit] = 0;

        // Positions 0-5 are the mover's row, 6-11 the opponent's
        let origin = pit;
        let mut pos = pit;
        while seeds > 0 {
            pos = (pos + 1) % (PITS * 2);
            if pos == origin {
                continue;
            }
            let (row, idx) = if pos < PITS { (me, pos) } else { (1 - me, pos - PITS) };
            self.pits[row][idx] += 1;
            seeds -= 1;
        }

        (pos >= PITS).then(|| pos - PITS)
    }

    /// Captures backward from `last` on the opponent row, unless it would take
    /// every seed the opponent has (grand slam).
    fn capture_from(&mut self, last: usize) {
        let enemy = 1 - self.to_move;
        let row = &self.pits[enemy];

        let run = (0..=last)
            .rev()
            .take_while(|&i| row[i] == 2 || row[i] == 3)
            .collect::<Vec<_>>();
        if run.is_empty() {
            return;
        }

        let captured: u8 = run.iter().map(|&i| row[i]).sum();
        let remaining: u8 = row.iter().sum();
        if captured == remaining {
            return;
        }

        for i in run {
            self.pits[enemy][i] = 0;
        }
        self.scores[self.to_move] += captured;
    }

    fn check_end(&mut self) {
        if self.turn as usize >= MAX_TURNS {
            self.ended = true;
            return;
        }

        if !self.has_moves(self.to_move) {
            // Each side collects what is left in its own row
            for player in 0..2 {
                let rest: u8 = self.pits[player].iter().sum();
                self.scores[player] += rest;
                self.pits[player] = [0; PITS];
            }
            self.ended = true;
            return;
        }

        if self.scores.iter().any(|&s| s > WINNING_SCORE) {
            self.ended = true;
        }
    }
}

impl Default for Oware {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Oware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let top = &self.pits[1];
        let bottom = &self.pits[0];
        for seeds in top.iter().rev() {
            write!(f, "{seeds:>3}")?;
        }
        writeln!(f)?;
        for seeds in bottom {
            write!(f, "{seeds:>3}")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "score {}:{} turn {} to move {}",
            self.scores[0], self.scores[1], self.turn, self.to_move
        )
    }
}

impl Game for Oware {
    fn metadata(&self) -> GameMetadata {
        GameMetadata::new(NAME, "Oware")
    }

    fn legal_moves(&self, moves: &mut Vec<usize>) {
        moves.clear();
        if self.ended {
            return;
        }
        moves.extend((0..PITS).filter(|&pit| self.is_legal_for(self.to_move, pit)));
    }

    fn make_move(&mut self, mv: usize) {
        debug_assert!(
            !self.ended && self.is_legal_for(self.to_move, mv),
            "illegal oware move {mv}"
        );

        if let Some(last) = self.sow(mv) {
            self.capture_from(last);
        }

        self.to_move = 1 - self.to_move;
        self.turn += 1;
        self.check_end();
    }

    fn is_terminal(&self) -> bool {
        self.ended
    }

    fn game_result(&self) -> Outcome {
        match self.my_score().cmp(&self.enemy_score()) {
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Draw,
            std::cmp::Ordering::Greater => Outcome::Win,
        }
    }

    fn scaled_game_result(&self) -> f32 {
        let bonus = 0.85 + MAX_TURNS.saturating_sub(self.turn as usize) as f32 * 0.0007;
        match self.game_result() {
            Outcome::Loss => -bonus,
            Outcome::Draw => 0.0,
            Outcome::Win => bonus,
        }
    }

    fn encode_input(&self, input: &mut [f32]) {
        input[..INPUT_SIZE].fill(0.0);

        let bucket = |seeds: u8| (seeds as usize).min(PIT_BUCKETS - 1);
        for i in 0..PITS {
            input[PIT_BUCKETS * i + bucket(self.my_pits()[i])] = 1.0;
            input[PIT_BUCKETS * (i + PITS) + bucket(self.enemy_pits()[i])] = 1.0;
        }

        let score = |s: u8| (s as usize).min(SCORE_BUCKETS - 1);
        input[SCORE_OFFSET + score(self.my_score())] = 1.0;
        input[SCORE_OFFSET + SCORE_BUCKETS + score(self.enemy_score())] = 1.0;
    }

    fn input_size(&self) -> usize {
        INPUT_SIZE
    }

    fn max_moves(&self) -> usize {
        PITS
    }

    fn max_turns(&self) -> usize {
        MAX_TURNS
    }

    fn turn_number(&self) -> usize {
        self.turn as usize
    }

    /// Material plus pit vulnerability. Empty and 2/3-seed enemy pits are
    /// capture targets, 12+ seed pits are lap threats.
    fn eval(&self) -> f32 {
        let pit_term = |seeds: u8| match seeds {
            0 => 4.0,
            2 | 3 => 3.0,
            s if s >= 12 => 2.0,
            _ => 0.0,
        };

        let mut score = 2.0 * (self.my_score() as f32 - self.enemy_score() as f32);
        for i in 0..PITS {
            score += pit_term(self.enemy_pits()[i]);
            score -= pit_term(self.my_pits()[i]);
        }
        score
    }

    impl_game_boilerplate!();
}

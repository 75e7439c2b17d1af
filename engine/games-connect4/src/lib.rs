//! Connect 4 game implementation for the Crucible engine
//!
//! Connect 4 is a two-player connection game where players drop discs into a
//! 7-column, 6-row vertically suspended grid. The objective is to be the
//! first to form a horizontal, vertical, or diagonal line of four discs.
//!
//! Moves are column indices. Legal moves are pruned tactically to make
//! search cheaper: a winning drop is forced, an opponent threat must be
//! blocked, and drops directly under an opponent's winning cell are avoided
//! while any other column remains.
//!
//! # Board Layout
//!
//! The board is stored in row-major order, with row 0 at the bottom:
//! ```text
//! Row 5: [35][36][37][38][39][40][41]  <- Top
//! Row 4: [28][29][30][31][32][33][34]
//! Row 3: [21][22][23][24][25][26][27]
//! Row 2: [14][15][16][17][18][19][20]
//! Row 1: [ 7][ 8][ 9][10][11][12][13]
//! Row 0: [ 0][ 1][ 2][ 3][ 4][ 5][ 6]  <- Bottom
//!         Col 0  1  2  3  4  5  6
//! ```

use std::fmt;

use engine_core::board_game::{empty_cells, encode_relative_planes, opponent, EMPTY};
use engine_core::{impl_game_boilerplate, register_game, Game, GameMetadata, Outcome};

pub const NAME: &str = "connect4";

/// Board dimensions
pub const COLS: usize = 7;
pub const ROWS: usize = 6;
pub const BOARD_SIZE: usize = COLS * ROWS; // 42
pub const INPUT_SIZE: usize = BOARD_SIZE * 2;

/// Direction vectors: horizontal, vertical, diagonal /, diagonal \
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Per-column weight of a disc for the static evaluation.
const CENTER_WEIGHTS: [f32; COLS] = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0];

/// Register Connect4 with the global game registry
pub fn register_connect4() {
    register_game(NAME.to_string(), || Box::new(Connect4::new()));
}

/// Connect4 game state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connect4 {
    /// Board representation: 0=empty, 1=Red (player 1), 2=Yellow (player 2)
    /// Stored in row-major order with row 0 at the bottom
    board: [u8; BOARD_SIZE],
    /// Player to move: 1=Red, 2=Yellow
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=Red, 2=Yellow, 3=draw
    winner: u8,
    /// Height of each column (number of pieces in column)
    column_heights: [u8; COLS],
    turn: u8,
}

impl Connect4 {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [EMPTY; BOARD_SIZE],
            current_player: 1, // Red goes first
            winner: 0,
            column_heights: [0; COLS],
            turn: 0,
        }
    }

    /// Convert column and row to board index
    #[inline]
    pub fn pos(col: usize, row: usize) -> usize {
        row * COLS + col
    }

    pub fn cell(&self, col: usize, row: usize) -> u8 {
        self.board[Self::pos(col, row)]
    }

    pub fn column_height(&self, col: usize) -> usize {
        self.column_heights[col] as usize
    }

    pub fn current_player(&self) -> u8 {
        self.current_player
    }

    /// Whether `player` would complete four in a row by owning (col, row).
    ///
    /// The cell itself is not inspected, so this works for empty cells.
    fn completes_line(&self, col: usize, row: usize, player: u8) -> bool {
        let owns = |c: i32, r: i32| {
            c >= 0
                && c < COLS as i32
                && r >= 0
                && r < ROWS as i32
                && self.board[Self::pos(c as usize, r as usize)] == player
        };

        DIRECTIONS.iter().any(|&(dc, dr)| {
            let mut count = 1;

            // Count in positive direction
            let (mut c, mut r) = (col as i32 + dc, row as i32 + dr);
            while owns(c, r) {
                count += 1;
                c += dc;
                r += dr;
            }

            // Count in negative direction
            let (mut c, mut r) = (col as i32 - dc, row as i32 - dr);
            while owns(c, r) {
                count += 1;
                c -= dc;
                r -= dr;
            }

            count >= 4
        })
    }

    /// Columns that are not full.
    fn open_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..COLS).filter(|&col| self.column_heights[col] < ROWS as u8)
    }

    /// Whether dropping in `col` wins immediately for `player`.
    fn wins_by_dropping(&self, col: usize, player: u8) -> bool {
        self.completes_line(col, self.column_height(col), player)
    }

    /// Whether the cell above the landing square of `col` is a winning cell
    /// for `player`. Dropping in `col` would hand it to them.
    fn gives_away_cell_above(&self, col: usize, player: u8) -> bool {
        let above = self.column_height(col) + 1;
        above < ROWS && self.completes_line(col, above, player)
    }
}

impl Default for Connect4 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Connect4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..ROWS).rev() {
            for col in 0..COLS {
                let c = match self.cell(col, row) {
                    1 => 'X',
                    2 => 'O',
                    _ => '.',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Game for Connect4 {
    fn metadata(&self) -> GameMetadata {
        GameMetadata::new(NAME, "Connect 4")
    }

    fn legal_moves(&self, moves: &mut Vec<usize>) {
        moves.clear();
        if self.is_terminal() {
            return;
        }

        let me = self.current_player;
        let them = opponent(me);

        if let Some(col) = self.open_columns().find(|&c| self.wins_by_dropping(c, me)) {
            moves.push(col);
            return;
        }

        // With two threats the first block is as good as any other
        if let Some(col) = self.open_columns().find(|&c| self.wins_by_dropping(c, them)) {
            moves.push(col);
            return;
        }

        moves.extend(
            self.open_columns()
                .filter(|&c| !self.gives_away_cell_above(c, them)),
        );
        if moves.is_empty() {
            moves.extend(self.open_columns());
        }
    }

    fn make_move(&mut self, mv: usize) {
        debug_assert!(
            self.winner == 0 && mv < COLS && self.column_heights[mv] < ROWS as u8,
            "illegal connect4 move {mv}"
        );
        let row = self.column_height(mv);
        let player = self.current_player;

        self.board[Self::pos(mv, row)] = player;
        self.column_heights[mv] += 1;
        self.turn += 1;

        if self.completes_line(mv, row, player) {
            self.winner = player;
        } else if self.column_heights.iter().all(|&h| h >= ROWS as u8) {
            self.winner = 3;
        }
        self.current_player = opponent(player);
    }

    fn is_terminal(&self) -> bool {
        self.winner != 0
    }

    fn game_result(&self) -> Outcome {
        match self.winner {
            1 | 2 => Outcome::Loss,
            _ => Outcome::Draw,
        }
    }

    fn scaled_game_result(&self) -> f32 {
        match self.game_result() {
            Outcome::Loss => -0.85 - empty_cells(&self.board) as f32 * 0.0023,
            _ => 0.0,
        }
    }

    fn encode_input(&self, input: &mut [f32]) {
        encode_relative_planes(&self.board, self.current_player, input);
    }

    fn input_size(&self) -> usize {
        INPUT_SIZE
    }

    fn max_moves(&self) -> usize {
        COLS
    }

    fn max_turns(&self) -> usize {
        BOARD_SIZE
    }

    fn turn_number(&self) -> usize {
        self.turn as usize
    }

    /// Center control: discs near the middle column take part in more lines.
    fn eval(&self) -> f32 {
        if self.is_terminal() {
            return self.scaled_game_result();
        }

        let me = self.current_player;
        let score: f32 = self
            .board
            .iter()
            .enumerate()
            .map(|(i, &cell)| {
                let w = CENTER_WEIGHTS[i % COLS];
                match cell {
                    EMPTY => 0.0,
                    c if c == me => w,
                    _ => -w,
                }
            })
            .sum();

        (score / 32.0).clamp(-0.8, 0.8)
    }

    impl_game_boilerplate!();
}

#[cfg(test)]
mod tests;

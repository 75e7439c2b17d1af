//! TicTacToe game implementation for the Crucible engine
//!
//! The smallest game in the workspace. It is fully solvable by the MCTS
//! solver in a few thousand iterations, which makes it the toy position
//! source for search tests and benches.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Game;
//! use games_tictactoe::TicTacToe;
//!
//! let mut game = TicTacToe::new();
//! let mut moves = Vec::new();
//! game.legal_moves(&mut moves);
//! assert_eq!(moves.len(), 9);
//!
//! game.make_move(4);
//! assert_eq!(game.turn_number(), 1);
//! ```

use std::fmt;

use engine_core::board_game::{encode_relative_planes, opponent, EMPTY};
use engine_core::{impl_game_boilerplate, register_game, Game, GameMetadata, Outcome};

pub const NAME: &str = "tictactoe";
pub const BOARD_CELLS: usize = 9;
pub const INPUT_SIZE: usize = BOARD_CELLS * 2;

/// Winning positions (rows, columns, diagonals)
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// Register TicTacToe with the global game registry
pub fn register_tictactoe() {
    register_game(NAME.to_string(), || Box::new(TicTacToe::new()));
}

/// TicTacToe game state
///
/// Player 1 is X and moves first. Moves are cell indices 0-8, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicTacToe {
    /// Board representation: 0=empty, 1=X, 2=O
    board: [u8; BOARD_CELLS],
    /// Player to move: 1=X, 2=O
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=X, 2=O, 3=draw
    winner: u8,
    turn: u8,
}

impl TicTacToe {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [EMPTY; BOARD_CELLS],
            current_player: 1,
            winner: 0,
            turn: 0,
        }
    }

    /// Build a position from a board string of `x`, `o` and `.` (row-major).
    ///
    /// The side to move is derived from the stone counts.
    pub fn from_board_str(s: &str) -> Option<Self> {
        let cells: Vec<u8> = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                'x' | 'X' => Some(1),
                'o' | 'O' => Some(2),
                '.' | '-' => Some(EMPTY),
                _ => None,
            })
            .collect::<Option<_>>()?;
        let board: [u8; BOARD_CELLS] = cells.try_into().ok()?;

        let xs = board.iter().filter(|&&c| c == 1).count();
        let os = board.iter().filter(|&&c| c == 2).count();
        if xs != os && xs != os + 1 {
            return None;
        }

        Some(Self {
            board,
            current_player: if xs == os { 1 } else { 2 },
            winner: Self::check_winner(&board),
            turn: (xs + os) as u8,
        })
    }

    pub fn board(&self) -> &[u8; BOARD_CELLS] {
        &self.board
    }

    pub fn current_player(&self) -> u8 {
        self.current_player
    }

    /// Check for winner on the board
    fn check_winner(board: &[u8; BOARD_CELLS]) -> u8 {
        for &[a, b, c] in &LINES {
            if board[a] != EMPTY && board[a] == board[b] && board[b] == board[c] {
                return board[a];
            }
        }

        if board.iter().all(|&cell| cell != EMPTY) {
            return 3;
        }

        0
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.board.chunks(3) {
            for &cell in row {
                let c = match cell {
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

impl Game for TicTacToe {
    fn metadata(&self) -> GameMetadata {
        GameMetadata::new(NAME, "Tic-Tac-Toe")
    }

    fn legal_moves(&self, moves: &mut Vec<usize>) {
        moves.clear();
        if self.winner != 0 {
            return;
        }
        moves.extend((0..BOARD_CELLS).filter(|&pos| self.board[pos] == EMPTY));
    }

    fn make_move(&mut self, mv: usize) {
        debug_assert!(
            self.winner == 0 && self.board[mv] == EMPTY,
            "illegal tictactoe move {mv}"
        );
        self.board[mv] = self.current_player;
        self.winner = Self::check_winner(&self.board);
        self.current_player = opponent(self.current_player);
        self.turn += 1;
    }

    fn is_terminal(&self) -> bool {
        self.winner != 0
    }

    fn game_result(&self) -> Outcome {
        match self.winner {
            3 | 0 => Outcome::Draw,
            // The side to move never completes a line on its own turn
            w if w == self.current_player => Outcome::Win,
            _ => Outcome::Loss,
        }
    }

    fn scaled_game_result(&self) -> f32 {
        self.game_result().as_f32()
    }

    fn encode_input(&self, input: &mut [f32]) {
        encode_relative_planes(&self.board, self.current_player, input);
    }

    fn input_size(&self) -> usize {
        INPUT_SIZE
    }

    fn max_moves(&self) -> usize {
        BOARD_CELLS
    }

    fn max_turns(&self) -> usize {
        BOARD_CELLS
    }

    fn turn_number(&self) -> usize {
        self.turn as usize
    }

    impl_game_boilerplate!();
}

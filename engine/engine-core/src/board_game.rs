//! Shared helpers for two-player grid games.
//!
//! Tic-tac-toe and Connect 4 both encode a cell board as two one-hot planes
//! seen from the side to move. Keeping that here avoids duplicating it in
//! every grid game.

/// Cell value for an empty square.
pub const EMPTY: u8 = 0;

/// Writes the two-plane, side-relative encoding of `board` into `out`.
///
/// - `board`: cell values (0 = empty, 1 = player one, 2 = player two)
/// - `to_move`: the player whose turn it is (1 or 2)
///
/// The first `board.len()` floats mark the stones of `to_move`, the next
/// `board.len()` floats mark the opponent's stones.
pub fn encode_relative_planes(board: &[u8], to_move: u8, out: &mut [f32]) {
    let n = board.len();
    assert!(
        out.len() >= n * 2,
        "input buffer too small: {} < {}",
        out.len(),
        n * 2
    );

    out[..n * 2].fill(0.0);
    for (i, &cell) in board.iter().enumerate() {
        if cell == EMPTY {
            continue;
        }
        if cell == to_move {
            out[i] = 1.0;
        } else {
            out[i + n] = 1.0;
        }
    }
}

/// Returns the other player for a 1/2 player id.
#[inline]
pub const fn opponent(player: u8) -> u8 {
    3 - player
}

/// Number of empty cells on the board.
pub fn empty_cells(board: &[u8]) -> usize {
    board.iter().filter(|&&c| c == EMPTY).count()
}

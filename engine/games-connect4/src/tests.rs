use super::*;
use engine_core::Game;

fn play(moves: &[usize]) -> Connect4 {
    let mut game = Connect4::new();
    for &mv in moves {
        game.make_move(mv);
    }
    game
}

fn legal(game: &Connect4) -> Vec<usize> {
    let mut moves = Vec::new();
    game.legal_moves(&mut moves);
    moves
}

#[test]
fn test_initial_state() {
    let game = Connect4::new();
    assert_eq!(game.board, [0; BOARD_SIZE]);
    assert_eq!(game.current_player(), 1);
    assert_eq!(game.column_heights, [0; COLS]);
    assert!(!game.is_terminal());
    assert_eq!(legal(&game), (0..COLS).collect::<Vec<_>>());
}

#[test]
fn test_drop_piece() {
    let game = play(&[3]);

    // Piece should be at bottom of column 3
    assert_eq!(game.cell(3, 0), 1);
    assert_eq!(game.column_height(3), 1);
    assert_eq!(game.current_player(), 2);
    assert_eq!(game.turn_number(), 1);
    assert!(!game.is_terminal());
}

#[test]
fn test_stacking_pieces() {
    let mut game = Connect4::new();
    for i in 0..ROWS {
        game.make_move(0);
        assert_eq!(game.column_height(0), i + 1);
    }

    assert!(!legal(&game).contains(&0));
}

#[test]
fn test_vertical_win() {
    let game = play(&[0, 1, 0, 1, 0, 1, 0]);

    assert!(game.is_terminal());
    assert!(legal(&game).is_empty());
    assert_eq!(game.game_result(), Outcome::Loss);

    let expected = -0.85 - 35.0 * 0.0023;
    assert!((game.scaled_game_result() - expected).abs() < 1e-6);
}

#[test]
fn test_horizontal_win() {
    let game = play(&[0, 0, 1, 1, 2, 2, 3]);
    assert!(game.is_terminal());
    assert_eq!(game.winner, 1);
    assert_eq!(game.game_result(), Outcome::Loss);
}

#[test]
fn test_diagonal_win_ascending() {
    // Red ends up on (0,0), (1,1), (2,2), (3,3)
    let game = play(&[0, 1, 1, 2, 3, 2, 2, 3, 6, 3, 3]);
    assert_eq!(game.cell(3, 3), 1);
    assert!(game.is_terminal());
    assert_eq!(game.winner, 1);
}

#[test]
fn test_faster_loss_scores_lower() {
    let quick = play(&[0, 1, 0, 1, 0, 1, 0]);
    let slow = play(&[0, 0, 1, 1, 2, 2, 6, 5, 3]);
    assert!(slow.is_terminal());
    assert!(quick.scaled_game_result() < slow.scaled_game_result());
    assert!(quick.scaled_game_result() >= -1.0);
}

#[test]
fn test_draw_game() {
    // Alternating pairs of rows never line up four of a kind
    let mut game = Connect4::new();
    for row in 0..ROWS {
        for col in 0..COLS {
            if (col, row) != (6, 5) {
                game.board[Connect4::pos(col, row)] = 1 + ((row / 2 + col) % 2) as u8;
            }
        }
    }
    game.column_heights = [ROWS as u8, 6, 6, 6, 6, 6, 5];
    game.turn = 41;
    game.current_player = 1;
    assert!(!game.is_terminal());

    game.make_move(6);
    assert!(game.is_terminal());
    assert_eq!(game.game_result(), Outcome::Draw);
    assert_eq!(game.scaled_game_result(), 0.0);
}

#[test]
fn test_winning_drop_is_the_only_move() {
    // Red has three stacked in column 0
    let game = play(&[0, 1, 0, 1, 0, 2]);
    assert_eq!(game.current_player(), 1);
    assert_eq!(legal(&game), vec![0]);
}

#[test]
fn test_block_is_forced() {
    // Yellow has three stacked in column 1, red has no win of its own
    let game = play(&[0, 1, 2, 1, 4, 1]);
    assert_eq!(game.current_player(), 1);
    assert_eq!(legal(&game), vec![1]);
}

#[test]
fn test_avoids_playing_under_opponent_win() {
    // Yellow owns (0,1), (1,1), (2,1); (3,1) would complete the row
    let game = play(&[0, 1, 2, 0, 6, 1, 6, 2]);
    assert_eq!(game.current_player(), 1);
    assert_eq!(game.column_height(3), 0);
    assert_eq!(legal(&game), vec![0, 1, 2, 4, 5, 6]);
}

#[test]
fn test_encode_input_is_side_relative() {
    let game = play(&[3]);
    let mut input = vec![0.0f32; INPUT_SIZE];
    game.encode_input(&mut input);

    // Yellow to move: red's disc lands in the opponent plane
    assert_eq!(input[BOARD_SIZE + 3], 1.0);
    assert_eq!(input.iter().sum::<f32>(), 1.0);
}

#[test]
fn test_eval_prefers_center() {
    let game = play(&[3]);
    // Yellow to move, red owns the center
    assert!(game.eval() < 0.0);

    let game = play(&[3, 0]);
    assert!(game.eval() > 0.0);
    assert_eq!(Connect4::new().eval(), 0.0);
}

#[test]
fn test_same_position() {
    let a: Box<dyn Game> = Box::new(play(&[3, 4]));
    let b: Box<dyn Game> = Box::new(play(&[3, 4]));
    let c: Box<dyn Game> = Box::new(play(&[4, 3]));
    assert!(a.same_position(b.as_ref()));
    assert!(!a.same_position(c.as_ref()));
}

#[test]
fn test_metadata() {
    let meta = Connect4::new().metadata();
    assert_eq!(meta.name, "connect4");
    assert_eq!(meta.display_name, "Connect 4");
    assert_eq!(Connect4::new().max_moves(), 7);
    assert_eq!(Connect4::new().input_size(), 84);
}

#[test]
fn test_random_games_invariants() {
    for seed in 0..50usize {
        let mut game = Connect4::new();
        let mut moves = Vec::new();
        let mut i = seed;

        while !game.is_terminal() {
            game.legal_moves(&mut moves);
            assert!(!moves.is_empty(), "no legal moves in\n{game}");
            i = i.wrapping_mul(31).wrapping_add(17);
            game.make_move(moves[i % moves.len()]);
            assert!(game.turn_number() <= BOARD_SIZE);
        }

        let stones = game.board.iter().filter(|&&c| c != 0).count();
        assert_eq!(stones, game.turn_number());
        assert!(game.scaled_game_result() <= 0.0);
        assert!(game.scaled_game_result() >= -1.0);
    }
}

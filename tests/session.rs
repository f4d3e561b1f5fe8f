use std::time::Duration;

use assert_matches::assert_matches;
use rand::{SeedableRng, seq::IndexedRandom};
use rand_xoshiro::Xoshiro256PlusPlus;
use tictactoe_server::tictactoe::{
    Board, BoardError, GameResult, GameSession, GameStatus, MoveError, Opponent, Player,
    ai::{Difficulty, Strategies, compute_ai_move},
    progress::{AI_MARK, DifficultyTable, MARK_OPTIONS, Progress, StageAdvance, Tier},
    think::ThinkingDelay,
};

const X: Option<&str> = Some("X");
const O: Option<&str> = Some("O");

/// Random human against the computer until the game ends
fn play_random_game(
    difficulty: Difficulty,
    strategies: &Strategies,
    rng: &mut Xoshiro256PlusPlus,
) -> GameSession<&'static str> {
    let human = MARK_OPTIONS[1];
    let mut session = GameSession::against_computer(human, AI_MARK, difficulty);
    session.start().unwrap();
    while session.status().is_playing() {
        let empty = session.board().empty_cells();
        let index = *empty.choose(rng).unwrap();
        session.play(index, &human, strategies, rng).unwrap();
    }
    session
}

#[test]
fn test_impossible_never_loses_against_random_play() {
    let strategies = Strategies::default();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x7ac);
    for game in 0..1500 {
        let session = play_random_game(Difficulty::Impossible, &strategies, &mut rng);
        assert_matches!(
            session.status(),
            GameStatus::Finished(GameResult::Draw)
                | GameStatus::Finished(GameResult::Victory {
                    player: Player::P2,
                    ..
                }),
            "game {game} lost by the computer: {:?}",
            session.history()
        );
    }
}

#[test]
fn test_every_difficulty_finishes_legal_games() {
    let strategies = Strategies::default();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
    for difficulty in Difficulty::variants() {
        for _ in 0..200 {
            let session = play_random_game(difficulty, &strategies, &mut rng);
            assert!(session.status().is_finished());
            let history = session.history();
            assert!((5..=9).contains(&history.len()), "{history:?}");
            let mut sorted = history.to_vec();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), history.len(), "cell played twice: {history:?}");
        }
    }
}

#[test]
fn test_easy_scenario_any_empty_cell() {
    let board = Board::from_cells([X, X, None, None, O, None, None, None, None]);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
    let mut seen = [0usize; 9];
    for _ in 0..1200 {
        let index = compute_ai_move(&board, Difficulty::Easy, &"O", &"X", &mut rng).unwrap();
        seen[index] += 1;
    }
    for index in [2, 3, 5, 6, 7, 8] {
        assert!((130..=270).contains(&seen[index]), "{seen:?}");
    }
    assert_eq!(seen[0] + seen[1] + seen[4], 0);
}

#[test]
fn test_impossible_scenario_blocks() {
    // X threatens both 5 and 7, the first threat in index order is blocked
    let board = Board::from_cells([O, X, O, X, X, None, None, None, None]);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
    let index = compute_ai_move(&board, Difficulty::Impossible, &"O", &"X", &mut rng);
    assert_eq!(index, Some(5));
    assert!(board.completes_line(5, &"X"));
}

#[test]
fn test_normal_blocks_about_three_quarters() {
    let board = Board::from_cells([X, X, None, None, None, None, None, None, None]);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(17);
    let blocks = (0..200)
        .filter(|_| compute_ai_move(&board, Difficulty::Normal, &"O", &"X", &mut rng) == Some(2))
        .count();
    // 75% strategic plus 1/7 of the random picks
    assert!((140..=190).contains(&blocks), "{blocks} blocks");
}

#[test]
fn test_hard_plays_like_normal() {
    let board = Board::from_cells([X, X, None, None, O, None, None, None, None]);
    for seed in 0..50 {
        let mut normal_rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut hard_rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        assert_eq!(
            compute_ai_move(&board, Difficulty::Normal, &"O", &"X", &mut normal_rng),
            compute_ai_move(&board, Difficulty::Hard, &"O", &"X", &mut hard_rng)
        );
    }
}

#[test]
fn test_full_board_scenario_is_draw() {
    let mut session = GameSession::new(Opponent::Local, "X", "O");
    session.start().unwrap();
    // X O X / O X X / O X O
    for index in [0, 1, 2, 3, 4, 8, 7, 6] {
        let mark = *session.mark(session.status().turn().unwrap());
        assert!(session.apply_move(index, &mark).unwrap().is_playing());
    }
    assert_eq!(
        session.apply_move(5, &"X"),
        Ok(GameStatus::Finished(GameResult::Draw))
    );
    assert!(session.board().is_full());
    assert_eq!(session.winning_line(), None);
}

#[test]
fn test_occupied_cell_rejected_unchanged() {
    let mut session = GameSession::new(Opponent::Local, "😎", "👻");
    session.start().unwrap();
    session.apply_move(0, &"😎").unwrap();
    let board = session.board().clone();
    let status = session.status();

    assert_eq!(
        session.apply_move(0, &"👻"),
        Err(MoveError::Board(BoardError::Occupied(0)))
    );
    assert_eq!(session.board(), &board);
    assert_eq!(session.status(), status);
}

#[test]
fn test_reset_is_idempotent_from_every_state() {
    let strategies = Strategies::default();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
    let mut sessions = vec![GameSession::against_computer("😊", AI_MARK, Difficulty::Normal)];

    let mut playing = GameSession::against_computer("😊", AI_MARK, Difficulty::Normal);
    playing.start().unwrap();
    playing.play(4, &"😊", &strategies, &mut rng).unwrap();
    sessions.push(playing);

    sessions.push(play_random_game(Difficulty::Easy, &strategies, &mut rng));

    for mut session in sessions {
        let first = session.reset();
        let second = session.reset();
        assert_eq!(first, second);
        assert_matches!(first, GameStatus::Setup | GameStatus::Playing(Player::P1));
        assert!(session.board().is_empty());
        assert_eq!(session.status().result(), None);
        assert_eq!(session.winning_line(), None);
    }
}

#[tokio::test(start_paused = true)]
async fn test_reset_discards_pending_computer_move() {
    let mut session = GameSession::against_computer('X', 'O', Difficulty::Impossible);
    session.start().unwrap();
    session.apply_move(0, &'X').unwrap();

    let ticket = session.ai_ticket().unwrap();
    let handle = tokio::spawn(async move {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        ThinkingDelay::fixed(800.0)
            .decide(&ticket, &Strategies::default(), &mut rng)
            .await
    });

    // No human move while the computer thinks
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        session.apply_move(1, &'X'),
        Err(MoveError::WrongTurn {
            expected: Player::P2
        })
    );

    session.reset();
    let decision = handle.await.unwrap();
    assert_eq!(decision.index, Some(4));
    assert_eq!(session.resolve_ai(decision), Err(MoveError::Stale));
    assert!(session.board().is_empty());
    assert_eq!(session.status(), GameStatus::Playing(Player::P1));
}

#[tokio::test(start_paused = true)]
async fn test_pending_computer_move_applies() {
    let mut session = GameSession::against_computer('X', 'O', Difficulty::Impossible);
    session.start().unwrap();
    session.apply_move(4, &'X').unwrap();

    let ticket = session.ai_ticket().unwrap();
    let start = tokio::time::Instant::now();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
    let decision = ThinkingDelay::fixed(500.0)
        .decide(&ticket, &Strategies::default(), &mut rng)
        .await;
    assert!(start.elapsed() >= Duration::from_millis(500));

    assert_eq!(session.resolve_ai(decision), Ok(GameStatus::Playing(Player::P1)));
    let index = decision.index.unwrap();
    assert!([0, 2, 6, 8].contains(&index));
    assert_eq!(session.board()[index], Some('O'));
}

#[test]
fn test_stage_run_through_every_tier() {
    let table = DifficultyTable::default();
    let mut progress = Progress::default();
    let mut played = Vec::new();

    for tier in Tier::variants() {
        assert!(progress.is_unlocked(tier));
        while let Some(stage) = progress.current_stage(tier) {
            played.push(table.difficulty(tier, stage));
            let advance = progress.record_win(tier);
            if stage + 1 == tictactoe_server::tictactoe::progress::STAGES_PER_TIER {
                assert_eq!(advance, StageAdvance::TierCompleted);
            }
        }
    }

    assert!(progress.is_game_completed());
    assert_eq!(played.len(), 45);
    assert_eq!(
        played.iter().filter(|d| **d == Difficulty::Impossible).count(),
        1
    );
    assert_eq!(played.last(), Some(&Difficulty::Impossible));
}

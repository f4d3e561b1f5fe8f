use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use tictactoe_server::tictactoe::{
    GameResult, GameSession, GameStatus, Opponent, Player,
    ai::{Difficulty, Strategies},
    progress::{AI_MARK, MARK_OPTIONS},
    think::ThinkingDelay,
};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "selfplay", version, about = "Pit two computer opponents against each other")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, value_name = "N", default_value_t = 100)]
    games: usize,
    /// Difficulty of the opening player
    #[arg(long, value_name = "DIFFICULTY", default_value_t = Difficulty::Impossible)]
    first: Difficulty,
    /// Difficulty of the second player
    #[arg(long, value_name = "DIFFICULTY", default_value_t = Difficulty::Normal)]
    second: Difficulty,
    /// Random seed, taken from the OS when absent
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Mean thinking time per move in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0.0)]
    think_ms: f64,
    /// Strategic probability of the normal strategy
    #[arg(long, value_name = "P")]
    strategic_probability: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Tally {
    FirstWins,
    SecondWins,
    Draw,
}

async fn play_game(
    strategies: &Strategies,
    difficulties: [Difficulty; 2],
    delay: &ThinkingDelay,
    rng: &mut Xoshiro256PlusPlus,
) -> Result<GameStatus> {
    let mut session = GameSession::new(Opponent::Local, MARK_OPTIONS[0], AI_MARK);
    session.start().with_context(|| "Failed to start session")?;

    while let GameStatus::Playing(player) = session.status() {
        let difficulty = difficulties[player.index()];
        let mark = *session.mark(player);
        let opponent = *session.mark(player.opposite());

        tokio::time::sleep(delay.sample(rng)).await;

        let Some(index) =
            strategies.choose_move(session.board(), difficulty, &mark, &opponent, rng)
        else {
            break;
        };
        session
            .apply_move(index, &mark)
            .with_context(|| format!("{player} ({difficulty}) chose an illegal move {index}"))?;
        log::trace!("{player} played {index}\n{}", session.board());
    }

    log::debug!("{session}");
    Ok(session.status())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    log::debug!("Command line arguments: {args:?}");

    let mut rng = match args.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_os_rng(),
    };
    let mut strategies = Strategies::default();
    if let Some(p) = args.strategic_probability {
        strategies.normal.strategic_probability = p;
    }
    let delay = ThinkingDelay {
        mean_ms: args.think_ms,
        std_dev_ms: args.think_ms / 3.0,
        min_ms: 0.0,
    };

    let mut tallies = Vec::with_capacity(args.games);
    for game in 0..args.games {
        let status = play_game(&strategies, [args.first, args.second], &delay, &mut rng)
            .await
            .with_context(|| format!("Game {game} failed"))?;
        let tally = match status {
            GameStatus::Finished(GameResult::Victory {
                player: Player::P1, ..
            }) => Tally::FirstWins,
            GameStatus::Finished(GameResult::Victory {
                player: Player::P2, ..
            }) => Tally::SecondWins,
            _ => Tally::Draw,
        };
        tallies.push(tally);
    }

    println!(
        "{games} games: {first} (first) vs {second}",
        games = args.games,
        first = args.first,
        second = args.second
    );
    for (tally, count) in tallies.into_iter().counts().into_iter().sorted() {
        println!(
            "  {tally:?}: {count} ({percent:.1}%)",
            percent = 100.0 * count as f64 / args.games as f64
        );
    }

    Ok(())
}

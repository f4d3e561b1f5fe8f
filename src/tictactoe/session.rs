use std::fmt::Display;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    Board, BoardError, GameResult, GameStatus, Line, Mark, Outcome, Player,
    ai::{Difficulty, Strategies},
};

/// Who sits in the `P2` seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opponent {
    /// Second human on the same device
    Local,
    /// Human on the other end of a relay
    Remote,
    /// Computer playing at the given difficulty
    Computer(Difficulty),
}

/// Reasons a move is ignored. The session is left untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("Game is not being played")]
    NotPlaying,
    #[error("It is {expected}'s turn")]
    WrongTurn { expected: Player },
    #[error("It is not the computer's turn")]
    NotComputerTurn,
    #[error("Computer move was decided for a previous game")]
    Stale,
    #[error("Opponent left the match")]
    Abandoned,
}

/// Errors while choosing marks or starting
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    #[error("Marks can only be chosen before the game starts")]
    NotInSetup,
    #[error("Both players chose the same mark")]
    IdenticalMarks,
    #[error("Mark is reserved for the computer")]
    ReservedMark,
    #[error("The computer's mark cannot be changed")]
    ComputerSeat,
}

/// Turn state machine for one match.
///
/// `Setup -> Playing -> Finished`, with resets allowed from any state.
/// `P1` always opens. In computer games the computer holds `P2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession<M> {
    /// Board state
    board: Board<M>,
    /// Marks of `P1` and `P2`
    marks: [M; 2],
    /// Occupant of the `P2` seat
    opponent: Opponent,
    /// Game status
    status: GameStatus,
    /// Whether the session left setup at least once
    started: bool,
    /// Bumped on every reset, guards in-flight computer moves
    generation: u64,
    /// History of moves made
    history: Vec<usize>,
}

impl<M: Mark> GameSession<M> {
    /// New session in setup
    pub fn new(opponent: Opponent, first: M, second: M) -> Self {
        Self {
            board: Board::new(),
            marks: [first, second],
            opponent,
            status: GameStatus::Setup,
            started: false,
            generation: 0,
            history: Vec::new(),
        }
    }

    /// New session against the computer, which plays `ai_mark` from the `P2` seat
    pub fn against_computer(human: M, ai_mark: M, difficulty: Difficulty) -> Self {
        Self::new(Opponent::Computer(difficulty), human, ai_mark)
    }

    pub fn board(&self) -> &Board<M> {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn opponent(&self) -> Opponent {
        self.opponent
    }

    pub fn mark(&self, player: Player) -> &M {
        &self.marks[player.index()]
    }

    /// Seat holding `mark`
    pub fn player_of(&self, mark: &M) -> Option<Player> {
        Player::variants()
            .into_iter()
            .find(|player| self.mark(*player) == mark)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Line to highlight once the game is won
    pub fn winning_line(&self) -> Option<Line> {
        match self.status {
            GameStatus::Finished(GameResult::Victory { line, .. }) => Some(line),
            _ => None,
        }
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        match self.opponent {
            Opponent::Computer(difficulty) => Some(difficulty),
            _ => None,
        }
    }

    /// Whether the session waits for the computer
    pub fn is_computer_turn(&self) -> bool {
        self.difficulty().is_some() && self.status == GameStatus::Playing(Player::P2)
    }

    /// Choose the mark of a seat while in setup
    pub fn set_mark(&mut self, player: Player, mark: M) -> Result<(), SetupError> {
        if self.status != GameStatus::Setup {
            return Err(SetupError::NotInSetup);
        }
        if self.difficulty().is_some() {
            if player == Player::P2 {
                return Err(SetupError::ComputerSeat);
            }
            if mark == self.marks[Player::P2.index()] {
                return Err(SetupError::ReservedMark);
            }
        }
        self.marks[player.index()] = mark;
        Ok(())
    }

    /// Leave setup, `P1` to move
    pub fn start(&mut self) -> Result<GameStatus, SetupError> {
        if self.status != GameStatus::Setup {
            return Err(SetupError::NotInSetup);
        }
        if self.marks[0] == self.marks[1] {
            return Err(SetupError::IdenticalMarks);
        }
        self.started = true;
        self.status = GameStatus::Playing(Player::P1);
        log::debug!("Session started against {:?}", self.opponent);
        Ok(self.status)
    }

    /// Place `acting` on `index` if it is that mark's turn and the cell is free
    pub fn apply_move(&mut self, index: usize, acting: &M) -> Result<GameStatus, MoveError> {
        let GameStatus::Playing(player) = self.status else {
            log::debug!("Move {index} ignored: game is not being played");
            return Err(MoveError::NotPlaying);
        };
        if self.mark(player) != acting {
            log::debug!("Move {index} ignored: {player} is to move");
            return Err(MoveError::WrongTurn { expected: player });
        }
        self.place(player, index)
    }

    /// Single move application path shared by humans, the computer and remote peers
    fn place(&mut self, player: Player, index: usize) -> Result<GameStatus, MoveError> {
        let mark = self.marks[player.index()].clone();
        if let Err(e) = self.board.place(index, mark) {
            log::debug!("Move {index} by {player} ignored: {e}");
            return Err(e.into());
        }
        self.history.push(index);

        self.status = match self.board.outcome(self.mark(player)) {
            Outcome::Won(line) => GameStatus::Finished(GameResult::Victory { player, line }),
            Outcome::Draw => GameStatus::Finished(GameResult::Draw),
            Outcome::Open => GameStatus::Playing(player.opposite()),
        };
        if let GameStatus::Finished(result) = self.status {
            log::debug!("Game finished with result: {result:?}");
        }
        Ok(self.status)
    }

    /// Snapshot for deciding the computer move outside the session
    pub fn ai_ticket(&self) -> Option<AiTicket<M>> {
        if !self.is_computer_turn() {
            return None;
        }
        Some(AiTicket {
            generation: self.generation,
            board: self.board.clone(),
            ai: self.marks[Player::P2.index()].clone(),
            opponent: self.marks[Player::P1.index()].clone(),
            difficulty: self.difficulty()?,
        })
    }

    /// Apply a computer decision. Decisions from before the last reset are discarded.
    pub fn resolve_ai(&mut self, decision: AiDecision) -> Result<GameStatus, MoveError> {
        if decision.generation != self.generation {
            log::debug!(
                "Discarding computer move from generation {} (now {})",
                decision.generation,
                self.generation
            );
            return Err(MoveError::Stale);
        }
        if !self.is_computer_turn() {
            return Err(MoveError::NotComputerTurn);
        }
        match decision.index {
            Some(index) => self.place(Player::P2, index),
            // No cell left for the computer
            None => {
                self.status = GameStatus::Finished(GameResult::Draw);
                Ok(self.status)
            }
        }
    }

    /// Decide and apply the computer move synchronously
    pub fn play_computer_turn(
        &mut self,
        strategies: &Strategies,
        rng: &mut dyn RngCore,
    ) -> Result<GameStatus, MoveError> {
        let ticket = self.ai_ticket().ok_or(MoveError::NotComputerTurn)?;
        let decision = ticket.decide(strategies, rng);
        self.resolve_ai(decision)
    }

    /// Human move, answered by the computer when it is its turn
    pub fn play(
        &mut self,
        index: usize,
        acting: &M,
        strategies: &Strategies,
        rng: &mut dyn RngCore,
    ) -> Result<GameStatus, MoveError> {
        let status = self.apply_move(index, acting)?;
        if self.is_computer_turn() {
            self.play_computer_turn(strategies, rng)
        } else {
            Ok(status)
        }
    }

    /// Clear the board for a rematch. A session that was started goes straight back to playing.
    pub fn reset(&mut self) -> GameStatus {
        self.board = Board::new();
        self.history.clear();
        self.generation += 1;
        self.status = if self.started {
            GameStatus::Playing(Player::P1)
        } else {
            GameStatus::Setup
        };
        self.status
    }

    /// Clear the board and go back to choosing marks
    pub fn reset_to_setup(&mut self) -> GameStatus {
        self.started = false;
        self.reset()
    }
}

impl<M: Display> Display for GameSession<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board)?;
        write!(f, "{}", self.status)
    }
}

/// Everything a strategy needs to decide the computer move, detached from the session
#[derive(Debug, Clone)]
pub struct AiTicket<M> {
    generation: u64,
    board: Board<M>,
    ai: M,
    opponent: M,
    difficulty: Difficulty,
}

impl<M: Mark> AiTicket<M> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn decide(&self, strategies: &Strategies, rng: &mut dyn RngCore) -> AiDecision {
        AiDecision {
            generation: self.generation,
            index: strategies.choose_move(&self.board, self.difficulty, &self.ai, &self.opponent, rng),
        }
    }
}

/// Computer move tagged with the session generation it was decided for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiDecision {
    pub generation: u64,
    pub index: Option<usize>,
}

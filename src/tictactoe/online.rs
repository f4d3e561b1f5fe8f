use anyhow::{Context, Result};

use super::{GameSession, GameStatus, Mark, MoveError, Opponent, Player, SetupError};

/// Outgoing side of an online match
pub trait MoveRelay {
    /// Notify the peer of a locally accepted move
    fn send_move(&mut self, index: usize) -> Result<()>;
}

/// Match against a remote peer.
///
/// Local and remote moves go through the same session, so both ends reject illegal
/// moves identically without the relay validating anything.
#[derive(Debug)]
pub struct OnlineMatch<M, R> {
    session: GameSession<M>,
    /// Seat of the local player
    seat: Player,
    relay: R,
    abandoned: bool,
}

impl<M: Mark, R: MoveRelay> OnlineMatch<M, R> {
    /// Start a match with `marks` indexed by seat
    pub fn new(seat: Player, marks: [M; 2], relay: R) -> Result<Self, SetupError> {
        let [first, second] = marks;
        let mut session = GameSession::new(Opponent::Remote, first, second);
        session.start()?;
        log::debug!("Online match started as {seat}");
        Ok(Self {
            session,
            seat,
            relay,
            abandoned: false,
        })
    }

    pub fn session(&self) -> &GameSession<M> {
        &self.session
    }

    pub fn seat(&self) -> Player {
        self.seat
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    pub fn is_my_turn(&self) -> bool {
        !self.abandoned && self.session.status().turn() == Some(self.seat)
    }

    /// Local move, forwarded to the peer once accepted.
    ///
    /// If forwarding fails the move still stands locally, the peer never sees it and
    /// the match is abandoned.
    pub fn play(&mut self, index: usize) -> Result<GameStatus> {
        if self.abandoned {
            return Err(MoveError::Abandoned.into());
        }
        let mark = self.session.mark(self.seat).clone();
        let status = self.session.apply_move(index, &mark)?;
        if let Err(e) = self.relay.send_move(index) {
            log::warn!("Relaying move {index} failed, abandoning the match");
            self.abandoned = true;
            return Err(e).with_context(|| format!("Failed to relay move {index}"));
        }
        Ok(status)
    }

    /// Move received from the peer
    pub fn on_opponent_move(&mut self, index: usize) -> Result<GameStatus, MoveError> {
        if self.abandoned {
            return Err(MoveError::Abandoned);
        }
        let mark = self.session.mark(self.seat.opposite()).clone();
        self.session.apply_move(index, &mark)
    }

    /// The peer disconnected, no further moves are accepted
    pub fn on_opponent_left(&mut self) {
        log::info!("Opponent left the match");
        self.abandoned = true;
    }
}

//! Stage progression against the computer.
//!
//! Each tier is a run of stages that must be beaten in order. A tier unlocks once
//! the previous one is completed. Only wins advance a stage.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{GameResult, Player, ai::Difficulty};

/// Number of stages in every tier
pub const STAGES_PER_TIER: u32 = 15;

/// Mark reserved for the computer
pub const AI_MARK: &str = "🤖";

/// Marks offered to human players
pub const MARK_OPTIONS: [&str; 16] = [
    "😊", "😎", "😂", "🥳", "👻", "🦄", "🍕", "🚀", "🤯", "🤩", "👑", "👽", "👾", "🧡", "🔥", "💧",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    pub const fn variants() -> [Tier; 3] {
        [Tier::Easy, Tier::Medium, Tier::Hard]
    }

    /// Tier that must be completed first
    pub const fn previous(&self) -> Option<Tier> {
        match self {
            Tier::Easy => None,
            Tier::Medium => Some(Tier::Easy),
            Tier::Hard => Some(Tier::Medium),
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Easy => write!(f, "easy"),
            Tier::Medium => write!(f, "medium"),
            Tier::Hard => write!(f, "hard"),
        }
    }
}

/// Result of recording a win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum StageAdvance {
    /// Next stage to play in the same tier
    Next { stage: u32 },
    /// Every stage of the tier has been beaten
    TierCompleted,
}

/// Number of stages beaten per tier, stored by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub hard: u32,
}

impl Progress {
    pub fn stage(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Easy => self.easy,
            Tier::Medium => self.medium,
            Tier::Hard => self.hard,
        }
    }

    fn stage_mut(&mut self, tier: Tier) -> &mut u32 {
        match tier {
            Tier::Easy => &mut self.easy,
            Tier::Medium => &mut self.medium,
            Tier::Hard => &mut self.hard,
        }
    }

    pub fn is_completed(&self, tier: Tier) -> bool {
        self.stage(tier) >= STAGES_PER_TIER
    }

    pub fn is_unlocked(&self, tier: Tier) -> bool {
        tier.previous()
            .is_none_or(|previous| self.is_completed(previous))
    }

    /// Every tier completed
    pub fn is_game_completed(&self) -> bool {
        self.is_completed(Tier::Hard)
    }

    /// Stage to play next in `tier`, `None` once completed
    pub fn current_stage(&self, tier: Tier) -> Option<u32> {
        let stage = self.stage(tier);
        (stage < STAGES_PER_TIER).then_some(stage)
    }

    /// Advance `tier` by one stage. Completed tiers stay completed.
    pub fn record_win(&mut self, tier: Tier) -> StageAdvance {
        let stage = self.stage_mut(tier);
        *stage = stage.saturating_add(1).min(STAGES_PER_TIER);
        let stage = *stage;
        log::debug!("Stage {stage} reached on tier {tier}");
        if stage >= STAGES_PER_TIER {
            StageAdvance::TierCompleted
        } else {
            StageAdvance::Next { stage }
        }
    }

    /// Record a finished game played by `human` on `tier`. Losses and draws leave progress untouched.
    pub fn record_result(
        &mut self,
        tier: Tier,
        result: GameResult,
        human: Player,
    ) -> Option<StageAdvance> {
        match result {
            GameResult::Victory { player, .. } if player == human => Some(self.record_win(tier)),
            _ => None,
        }
    }
}

/// Computer difficulty played for every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyTable {
    pub easy: Difficulty,
    pub medium: Difficulty,
    pub hard: Difficulty,
    /// Played on the last hard stage instead of `hard`
    pub final_stage: Difficulty,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            easy: Difficulty::Easy,
            medium: Difficulty::Normal,
            hard: Difficulty::Normal,
            final_stage: Difficulty::Impossible,
        }
    }
}

impl DifficultyTable {
    pub fn difficulty(&self, tier: Tier, stage: u32) -> Difficulty {
        match tier {
            Tier::Easy => self.easy,
            Tier::Medium => self.medium,
            Tier::Hard if stage.saturating_add(1) >= STAGES_PER_TIER => self.final_stage,
            Tier::Hard => self.hard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::Line;

    #[test]
    fn test_fresh_progress() {
        let progress = Progress::default();
        assert!(progress.is_unlocked(Tier::Easy));
        assert!(!progress.is_unlocked(Tier::Medium));
        assert!(!progress.is_unlocked(Tier::Hard));
        assert_eq!(progress.current_stage(Tier::Easy), Some(0));
        assert!(!progress.is_game_completed());
    }

    #[test]
    fn test_unlocks_in_order() {
        let mut progress = Progress::default();
        for stage in 1..STAGES_PER_TIER {
            assert_eq!(progress.record_win(Tier::Easy), StageAdvance::Next { stage });
        }
        assert!(!progress.is_unlocked(Tier::Medium));
        assert_eq!(progress.record_win(Tier::Easy), StageAdvance::TierCompleted);
        assert!(progress.is_unlocked(Tier::Medium));
        assert!(!progress.is_unlocked(Tier::Hard));
        assert_eq!(progress.current_stage(Tier::Easy), None);

        // Completed tiers saturate
        assert_eq!(progress.record_win(Tier::Easy), StageAdvance::TierCompleted);
        assert_eq!(progress.easy, STAGES_PER_TIER);
    }

    #[test]
    fn test_game_completed() {
        let progress = Progress {
            easy: 15,
            medium: 15,
            hard: 15,
        };
        assert!(progress.is_game_completed());
        assert!(Tier::variants().into_iter().all(|tier| progress.is_unlocked(tier)));
    }

    #[test]
    fn test_only_wins_advance() {
        let mut progress = Progress::default();
        let line = Line([0, 1, 2]);
        let loss = GameResult::Victory {
            player: Player::P2,
            line,
        };
        assert_eq!(progress.record_result(Tier::Easy, loss, Player::P1), None);
        assert_eq!(progress.record_result(Tier::Easy, GameResult::Draw, Player::P1), None);
        assert_eq!(progress, Progress::default());

        let win = GameResult::Victory {
            player: Player::P1,
            line,
        };
        assert_eq!(
            progress.record_result(Tier::Easy, win, Player::P1),
            Some(StageAdvance::Next { stage: 1 })
        );
    }

    #[test]
    fn test_default_difficulty_table() {
        let table = DifficultyTable::default();
        assert_eq!(table.difficulty(Tier::Easy, 0), Difficulty::Easy);
        assert_eq!(table.difficulty(Tier::Medium, 7), Difficulty::Normal);
        assert_eq!(table.difficulty(Tier::Hard, 0), Difficulty::Normal);
        assert_eq!(table.difficulty(Tier::Hard, 13), Difficulty::Normal);
        assert_eq!(table.difficulty(Tier::Hard, 14), Difficulty::Impossible);
    }

    #[test]
    fn test_stored_stage_out_of_range() {
        let mut progress: Progress =
            serde_json::from_str(&format!(r#"{{"hard":{}}}"#, u32::MAX)).unwrap();
        assert!(progress.is_completed(Tier::Hard));
        assert_eq!(
            DifficultyTable::default().difficulty(Tier::Hard, progress.hard),
            Difficulty::Impossible
        );
        assert_eq!(progress.record_win(Tier::Hard), StageAdvance::TierCompleted);
        assert_eq!(progress.hard, STAGES_PER_TIER);
    }

    #[test]
    fn test_progress_serde() {
        let progress: Progress = serde_json::from_str(r#"{"easy":3}"#).unwrap();
        assert_eq!(
            progress,
            Progress {
                easy: 3,
                medium: 0,
                hard: 0
            }
        );
    }

    #[test]
    fn test_ai_mark_not_offered() {
        assert!(!MARK_OPTIONS.contains(&AI_MARK));
        let mut options = MARK_OPTIONS.to_vec();
        options.sort();
        options.dedup();
        assert_eq!(options.len(), MARK_OPTIONS.len());
    }
}

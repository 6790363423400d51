//! 胜利对局的提交摘要与排行榜接口。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::card::CardId;
use super::history::GameHistory;
use super::state::{EndState, GameState};
use crate::constants::{MAX_PROGRESS, MAX_SCORE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub score: u32,
    pub rounds: u32,
    pub duration_ms: u64,
    pub progress: i32,
    pub bugs: i32,
    pub technical_debt: i32,
    pub cards_played: Vec<CardId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("score {0} exceeds 1000")]
    ScoreOutOfRange(u32),
    #[error("a finished game has at least one round")]
    NoRounds,
    #[error("summary does not describe a won game")]
    NotWon,
    #[error("no cards were played")]
    NoCardsPlayed,
}

impl GameSummary {
    /// 只有胜利的对局才有摘要。
    pub fn from_game(state: &GameState, history: &GameHistory) -> Option<Self> {
        if state.end_state != EndState::Won {
            return None;
        }
        let stats = &state.stats;
        Some(Self {
            player_id: state.player_id.clone(),
            score: stats.final_score.unwrap_or_default(),
            rounds: stats.current_round,
            duration_ms: stats.elapsed_ms(stats.start_time),
            progress: state.resources.progress,
            bugs: state.resources.bugs,
            technical_debt: state.resources.technical_debt,
            cards_played: history.played_card_ids(),
        })
    }

    pub fn validate(&self) -> Result<(), SummaryError> {
        if self.score > MAX_SCORE {
            return Err(SummaryError::ScoreOutOfRange(self.score));
        }
        if self.rounds < 1 {
            return Err(SummaryError::NoRounds);
        }
        if self.progress < MAX_PROGRESS || self.bugs != 0 {
            return Err(SummaryError::NotWon);
        }
        if self.cards_played.is_empty() {
            return Err(SummaryError::NoCardsPlayed);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub id: String,
    pub rank: usize,
}

/// 排行榜提交的落点。网络实现由宿主提供。
pub trait LeaderboardSink {
    fn submit(&mut self, summary: &GameSummary) -> Result<SubmissionReceipt, SummaryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryLeaderboard {
    entries: Vec<GameSummary>,
}

impl InMemoryLeaderboard {
    pub fn entries(&self) -> &[GameSummary] {
        &self.entries
    }

    /// 分数从高到低，同分按提交先后。
    pub fn top(&self, limit: usize) -> Vec<&GameSummary> {
        let mut ranked: Vec<&GameSummary> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(limit);
        ranked
    }
}

impl LeaderboardSink for InMemoryLeaderboard {
    fn submit(&mut self, summary: &GameSummary) -> Result<SubmissionReceipt, SummaryError> {
        summary.validate()?;
        let rank = 1 + self
            .entries
            .iter()
            .filter(|entry| entry.score > summary.score)
            .count();
        self.entries.push(summary.clone());
        let id = format!(
            "{}-{}",
            summary.player_id.as_deref().unwrap_or("anonymous"),
            self.entries.len()
        );
        tracing::debug!(%id, rank, score = summary.score, "summary submitted");
        Ok(SubmissionReceipt { id, rank })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(score: u32) -> GameSummary {
        GameSummary {
            player_id: Some("dev".into()),
            score,
            rounds: 8,
            duration_ms: 90_000,
            progress: 100,
            bugs: 0,
            technical_debt: 4,
            cards_played: vec!["write-code".into(), "hotfix".into()],
        }
    }

    #[test]
    fn valid_summary_passes() {
        assert_eq!(summary(800).validate(), Ok(()));
    }

    #[test]
    fn structural_checks() {
        assert_eq!(
            summary(1001).validate(),
            Err(SummaryError::ScoreOutOfRange(1001))
        );

        let mut no_rounds = summary(500);
        no_rounds.rounds = 0;
        assert_eq!(no_rounds.validate(), Err(SummaryError::NoRounds));

        let mut buggy = summary(500);
        buggy.bugs = 1;
        assert_eq!(buggy.validate(), Err(SummaryError::NotWon));

        let mut empty = summary(500);
        empty.cards_played.clear();
        assert_eq!(empty.validate(), Err(SummaryError::NoCardsPlayed));
    }

    #[test]
    fn rank_counts_strictly_higher_scores() {
        let mut board = InMemoryLeaderboard::default();
        assert_eq!(board.submit(&summary(700)).map(|r| r.rank), Ok(1));
        assert_eq!(board.submit(&summary(900)).map(|r| r.rank), Ok(1));
        assert_eq!(board.submit(&summary(700)).map(|r| r.rank), Ok(2));
        assert_eq!(board.submit(&summary(100)).map(|r| r.rank), Ok(4));

        let receipt = board.submit(&summary(950)).expect("submit");
        assert_eq!(receipt.id, "dev-5");

        let scores: Vec<u32> = board.top(3).iter().map(|entry| entry.score).collect();
        assert_eq!(scores, vec![950, 900, 700]);
    }

    #[test]
    fn invalid_summary_is_not_recorded() {
        let mut board = InMemoryLeaderboard::default();
        let mut bad = summary(300);
        bad.cards_played.clear();
        assert!(board.submit(&bad).is_err());
        assert!(board.entries().is_empty());
    }
}

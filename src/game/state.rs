use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::card::{CardInstance, InstanceId};
use crate::clock::Timestamp;
use crate::constants::{MAX_PROGRESS, MAX_SCORE, MAX_TECHNICAL_DEBT, SAVE_VERSION};

/// 游戏阶段。`GameOver` 是终止状态，只能通过开新局离开。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    Planning,
    GameOver,
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Planning
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EndState {
    InProgress,
    Won,
    LostNoCards,
}

impl Default for EndState {
    fn default() -> Self {
        Self::InProgress
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameResources {
    pub progress: i32,
    pub bugs: i32,
    pub technical_debt: i32,
    pub productivity_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStats {
    pub current_round: u32,
    pub cards_played: u32,
    pub start_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<u32>,
}

impl GameStats {
    pub fn new(start_time: Timestamp) -> Self {
        Self {
            current_round: 1,
            cards_played: 0,
            start_time,
            end_time: None,
            final_score: None,
        }
    }

    /// 已结束的游戏取结束时间，否则取 `now`。
    pub fn elapsed_ms(&self, now: Timestamp) -> u64 {
        self.end_time.unwrap_or(now).saturating_sub(self.start_time)
    }
}

/// 四个互不相交的牌堆。`deck[0]` 是牌库顶。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GamePiles {
    #[serde(default)]
    pub deck: Vec<CardInstance>,
    #[serde(default)]
    pub hand: Vec<CardInstance>,
    #[serde(default)]
    pub discard: Vec<CardInstance>,
    #[serde(default)]
    pub graveyard: Vec<CardInstance>,
}

impl GamePiles {
    pub fn total(&self) -> usize {
        self.deck.len() + self.hand.len() + self.discard.len() + self.graveyard.len()
    }

    pub fn drawable(&self) -> usize {
        self.deck.len() + self.discard.len()
    }

    pub fn find_in_hand_index(&self, instance_id: &str) -> Option<usize> {
        self.hand
            .iter()
            .position(|card| card.instance_id == instance_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &CardInstance> {
        self.deck
            .iter()
            .chain(self.hand.iter())
            .chain(self.discard.iter())
            .chain(self.graveyard.iter())
    }
}

/// 游戏的权威状态，由规则引擎独占。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub phase: GamePhase,
    pub end_state: EndState,
    pub resources: GameResources,
    pub stats: GameStats,
    pub piles: GamePiles,
    pub seed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
}

impl GameState {
    pub fn new(resources: GameResources, seed: impl Into<String>, start_time: Timestamp) -> Self {
        Self {
            phase: GamePhase::Planning,
            end_state: EndState::InProgress,
            resources,
            stats: GameStats::new(start_time),
            piles: GamePiles::default(),
            seed: seed.into(),
            player_id: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn integrity_check(&self) -> Vec<IntegrityError> {
        let mut errors = Vec::new();
        let resources = &self.resources;

        if !(0..=MAX_PROGRESS).contains(&resources.progress) {
            errors.push(IntegrityError::ProgressOutOfRange {
                value: resources.progress,
            });
        }
        if resources.bugs < 0 {
            errors.push(IntegrityError::NegativeBugs {
                value: resources.bugs,
            });
        }
        if !(0..=MAX_TECHNICAL_DEBT).contains(&resources.technical_debt) {
            errors.push(IntegrityError::TechnicalDebtOutOfRange {
                value: resources.technical_debt,
            });
        }
        if resources.productivity_points < 0 {
            errors.push(IntegrityError::NegativeProductivityPoints {
                value: resources.productivity_points,
            });
        }
        if self.stats.current_round < 1 {
            errors.push(IntegrityError::InvalidRound {
                round: self.stats.current_round,
            });
        }

        let mut seen = HashSet::new();
        for card in self.piles.all() {
            if !seen.insert(card.instance_id.as_str()) {
                errors.push(IntegrityError::DuplicateInstance {
                    instance_id: card.instance_id.clone(),
                });
            }
        }

        match (self.phase, self.end_state) {
            (GamePhase::Planning, EndState::InProgress) => {
                if self.stats.end_time.is_some() || self.stats.final_score.is_some() {
                    errors.push(IntegrityError::PhaseMismatch);
                }
            }
            (GamePhase::GameOver, EndState::Won | EndState::LostNoCards) => {
                if self.stats.end_time.is_none() {
                    errors.push(IntegrityError::MissingEndTime);
                }
            }
            _ => errors.push(IntegrityError::PhaseMismatch),
        }

        if let Some(score) = self.stats.final_score {
            if score > MAX_SCORE {
                errors.push(IntegrityError::ScoreOutOfRange { score });
            }
        }

        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("progress {value} is outside 0..=100")]
    ProgressOutOfRange { value: i32 },
    #[error("bugs {value} is negative")]
    NegativeBugs { value: i32 },
    #[error("technical debt {value} is outside 0..=20")]
    TechnicalDebtOutOfRange { value: i32 },
    #[error("productivity points {value} is negative")]
    NegativeProductivityPoints { value: i32 },
    #[error("round {round} is below 1")]
    InvalidRound { round: u32 },
    #[error("card instance {instance_id} appears in more than one place")]
    DuplicateInstance { instance_id: InstanceId },
    #[error("phase and end state disagree")]
    PhaseMismatch,
    #[error("finished game has no end time")]
    MissingEndTime,
    #[error("final score {score} exceeds 1000")]
    ScoreOutOfRange { score: u32 },
}

/// 返回所有不变量违例的描述，用于测试与断言；空列表表示状态合法。
pub fn validate_game_state(state: &GameState) -> Vec<String> {
    state
        .integrity_check()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// 可序列化的存档快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveState {
    pub game_state: GameState,
    pub saved_at: Timestamp,
    pub version: String,
}

impl SaveState {
    pub fn new(game_state: GameState, saved_at: Timestamp) -> Self {
        Self {
            game_state,
            saved_at,
            version: SAVE_VERSION.to_string(),
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.version == SAVE_VERSION
    }
}

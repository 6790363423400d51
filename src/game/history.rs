use serde::{Deserialize, Serialize};

use super::card::CardId;
use super::effects::EffectResolution;
use super::state::GameResources;
use crate::clock::Timestamp;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    CardPlayed,
    RoundStart,
    RoundEnd,
    TechDebtReduction,
    GameEnd,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameHistoryEntry {
    pub round: u32,
    pub action: HistoryAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<CardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<EffectResolution>>,
    pub resources_before: GameResources,
    pub resources_after: GameResources,
    pub description: String,
    pub timestamp: Timestamp,
}

impl GameHistoryEntry {
    pub fn new(
        round: u32,
        action: HistoryAction,
        resources_before: GameResources,
        resources_after: GameResources,
        description: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            round,
            action,
            card_id: None,
            effects: None,
            resources_before,
            resources_after,
            description: description.into(),
            timestamp,
        }
    }

    /// 资源没有变化的条目，例如回合开始。
    pub fn marker(
        round: u32,
        action: HistoryAction,
        resources: &GameResources,
        description: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self::new(
            round,
            action,
            resources.clone(),
            resources.clone(),
            description,
            timestamp,
        )
    }

    pub fn with_card(mut self, card_id: impl Into<CardId>) -> Self {
        self.card_id = Some(card_id.into());
        self
    }

    pub fn with_effects(mut self, effects: Vec<EffectResolution>) -> Self {
        self.effects = Some(effects);
        self
    }
}

/// 当前对局的只追加日志，只在开新局时清空。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameHistory {
    entries: Vec<GameHistoryEntry>,
}

impl GameHistory {
    pub fn record(&mut self, entry: GameHistoryEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[GameHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_round_start(&self) -> Option<&GameHistoryEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.action == HistoryAction::RoundStart)
    }

    /// 最近一次 `round_start` 之后是否出过牌。
    pub fn card_played_since_round_start(&self) -> bool {
        self.entries
            .iter()
            .rev()
            .take_while(|entry| entry.action != HistoryAction::RoundStart)
            .any(|entry| entry.action == HistoryAction::CardPlayed)
    }

    /// 按打出顺序列出卡牌 id。
    pub fn played_card_ids(&self) -> Vec<CardId> {
        self.entries
            .iter()
            .filter(|entry| entry.action == HistoryAction::CardPlayed)
            .filter_map(|entry| entry.card_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(round: u32, action: HistoryAction) -> GameHistoryEntry {
        GameHistoryEntry::marker(round, action, &GameResources::default(), "", 0)
    }

    #[test]
    fn card_play_is_scoped_to_current_round() {
        let mut history = GameHistory::default();
        history.record(marker(1, HistoryAction::RoundStart));
        assert!(!history.card_played_since_round_start());

        history.record(marker(1, HistoryAction::CardPlayed).with_card("hotfix"));
        assert!(history.card_played_since_round_start());

        history.record(marker(1, HistoryAction::RoundEnd));
        history.record(marker(2, HistoryAction::RoundStart));
        assert!(!history.card_played_since_round_start());
        assert_eq!(history.last_round_start().map(|entry| entry.round), Some(2));
    }

    #[test]
    fn played_ids_follow_play_order() {
        let mut history = GameHistory::default();
        history.record(marker(1, HistoryAction::RoundStart));
        history.record(marker(1, HistoryAction::CardPlayed).with_card("write-code"));
        history.record(marker(1, HistoryAction::CardPlayed).with_card("hotfix"));
        history.record(marker(2, HistoryAction::RoundStart));
        history.record(marker(2, HistoryAction::CardPlayed).with_card("write-code"));
        assert_eq!(
            history.played_card_ids(),
            vec!["write-code", "hotfix", "write-code"]
        );
    }

    #[test]
    fn clear_empties_the_log() {
        let mut history = GameHistory::default();
        history.record(marker(1, HistoryAction::RoundStart));
        history.clear();
        assert!(history.is_empty());
        assert!(history.last_round_start().is_none());
    }
}

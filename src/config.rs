use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::BASE_PRODUCTIVITY_POINTS;
use crate::game::{CardId, GameResources};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid game config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 新游戏的配置。所有字段都可省略，缺省时使用标准规则。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    /// 指定种子后，洗牌、抛硬币与随机弃牌都可复现。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    /// 只使用这些卡牌构建牌库。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_filter: Option<Vec<CardId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_resources: Option<GameResources>,
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn with_player_id(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn with_deck_filter<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CardId>,
    {
        self.deck_filter = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_initial_resources(mut self, resources: GameResources) -> Self {
        self.initial_resources = Some(resources);
        self
    }

    pub fn starting_resources(&self) -> GameResources {
        self.initial_resources.clone().unwrap_or(GameResources {
            progress: 0,
            bugs: 0,
            technical_debt: 0,
            productivity_points: BASE_PRODUCTIVITY_POINTS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_standard_rules() {
        let config = GameConfig::from_json("{}").expect("empty config should parse");
        assert_eq!(config, GameConfig::default());
        let resources = config.starting_resources();
        assert_eq!(resources.productivity_points, 20);
        assert_eq!(resources.progress, 0);
    }

    #[test]
    fn partial_json_is_accepted() {
        let config = GameConfig::from_json(r#"{"seed":"abc","deck_filter":["hotfix"]}"#)
            .expect("config should parse");
        assert_eq!(config.seed.as_deref(), Some("abc"));
        assert_eq!(config.deck_filter, Some(vec!["hotfix".to_string()]));
    }

    #[test]
    fn malformed_json_reports_config_error() {
        let error = GameConfig::from_json("{seed:").expect_err("should fail");
        assert!(error.to_string().starts_with("invalid game config"));
    }
}

//! 游戏核心逻辑模块（卡牌、状态、效果与规则引擎）。

pub mod card;
pub mod catalog;
pub mod effects;
pub mod history;
pub mod random;
pub mod rules;
pub mod scoring;
pub mod state;
pub mod summary;
pub mod validators;

pub use card::{
    Card, CardId, CardInstance, CoinSide, Effect, EffectKind, InstanceId, RandomMode, Requirement,
};
pub use catalog::{catalog, create_deck, find_card, shuffle_deck};
pub use effects::{apply_effect_to_game_state, resolve_effect, EffectResolution};
pub use history::{GameHistory, GameHistoryEntry, HistoryAction};
pub use random::{GameRng, RandomSource};
pub use rules::{
    ActionData, ActionResult, CardPlayPreview, EndTurnPreview, PlayerAction, RuleEngine,
    RuleError,
};
pub use scoring::calculate_score;
pub use state::{
    validate_game_state, EndState, GamePhase, GamePiles, GameResources, GameState, GameStats,
    IntegrityError, SaveState,
};
pub use summary::{GameSummary, InMemoryLeaderboard, LeaderboardSink, SubmissionReceipt, SummaryError};
pub use validators::{validate_card_play, PlayValidation};

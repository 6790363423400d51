pub mod clock;
pub mod config;
pub mod constants;
pub mod game;

use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use config::{ConfigError, GameConfig};
pub use game::{
    ActionData, ActionResult, Card, CardId, CardInstance, CardPlayPreview, CoinSide, Effect,
    EffectKind, EndState, EndTurnPreview, GameHistory, GameHistoryEntry, GamePhase, GamePiles,
    GameResources, GameState, GameSummary, HistoryAction, InMemoryLeaderboard, IntegrityError,
    LeaderboardSink, PlayerAction, RandomMode, Requirement, RuleEngine, RuleError, SaveState,
    SubmissionReceipt, SummaryError,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

/// 解析失败的动作也作为失败的 `ActionResult` 返回，而不是抛出异常。
fn parse_action(action_json: &str) -> Result<PlayerAction, ActionResult> {
    serde_json::from_str(action_json).map_err(|error| {
        ActionResult::failed(&RuleError::InvalidAction {
            message: error.to_string(),
        })
    })
}

/// 浏览器侧持有的引擎句柄，所有输入输出都是 JSON 字符串。
#[wasm_bindgen]
pub struct GameEngine {
    engine: RuleEngine,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<GameEngine, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) if !json.trim().is_empty() => {
                GameConfig::from_json(json).map_err(serde_to_js_error)?
            }
            _ => GameConfig::default(),
        };
        Ok(GameEngine {
            engine: RuleEngine::new(config),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        to_json(self.engine.state())
    }

    pub fn history_json(&self) -> Result<String, JsValue> {
        to_json(&self.engine.history().entries())
    }

    pub fn process_action_json(&mut self, action_json: &str) -> Result<String, JsValue> {
        let result = match parse_action(action_json) {
            Ok(action) => self.engine.process_action(action),
            Err(failed) => failed,
        };
        to_json(&result)
    }

    /// `outcomes_json` 形如 `["heads","tails"]`。
    pub fn process_action_with_coin_flips_json(
        &mut self,
        action_json: &str,
        outcomes_json: &str,
    ) -> Result<String, JsValue> {
        let outcomes: Vec<CoinSide> =
            serde_json::from_str(outcomes_json).map_err(serde_to_js_error)?;
        let result = match parse_action(action_json) {
            Ok(action) => self
                .engine
                .process_action_with_predetermined_coin_flips(action, &outcomes),
            Err(failed) => failed,
        };
        to_json(&result)
    }

    pub fn draw_pending_cards_json(&mut self) -> Result<String, JsValue> {
        to_json(&self.engine.draw_pending_cards())
    }

    pub fn prepare_card_play_json(&mut self, card_instance_id: &str) -> Result<String, JsValue> {
        let preview = self
            .engine
            .prepare_card_play(card_instance_id)
            .map_err(serde_to_js_error)?;
        to_json(&preview)
    }

    pub fn prepare_end_turn_json(&self) -> Result<String, JsValue> {
        to_json(&self.engine.prepare_end_turn())
    }

    pub fn save_state_json(&self) -> Result<String, JsValue> {
        to_json(&self.engine.get_save_state())
    }

    /// 未获胜时返回 `null`。
    pub fn summary_json(&self) -> Result<String, JsValue> {
        to_json(&self.engine.game_summary())
    }
}

/// 返回完整的标准牌组，每个副本各占一项。
#[wasm_bindgen(js_name = "createDeck")]
pub fn create_deck() -> Result<JsValue, JsValue> {
    to_value(&game::create_deck()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "calculateScore")]
pub fn calculate_score(state: JsValue) -> Result<u32, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    Ok(game::calculate_score(&state))
}

/// 返回不变量违例的描述列表，空数组表示状态合法。
#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    to_value(&game::validate_game_state(&state)).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

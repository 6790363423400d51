//! 纯函数校验：出牌合法性、技术债削减资格、胜负判定。

use serde::{Deserialize, Serialize};

use super::card::{CardInstance, Requirement};
use super::history::GameHistory;
use super::state::GameState;
use crate::constants::{HAND_SIZE, MAX_PROGRESS};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayValidation {
    pub can_play: bool,
    pub reasons: Vec<String>,
}

pub fn validate_card_play(card: &CardInstance, state: &GameState) -> PlayValidation {
    // 被打出的牌本身不能拿来支付弃牌类代价。
    let other_cards = state.piles.hand.len().saturating_sub(1);
    let mut reasons = Vec::new();

    for requirement in &card.card.requirements {
        match requirement {
            Requirement::SpendProductivityPoints { amount } => {
                let available = state.resources.productivity_points;
                if available < *amount {
                    reasons.push(format!(
                        "Need {amount} productivity points (have {available})"
                    ));
                }
            }
            Requirement::DiscardCards { count } => {
                if other_cards < *count {
                    reasons.push(format!(
                        "Need {count} other cards in hand to discard (have {other_cards})"
                    ));
                }
            }
            Requirement::SendToGraveyard { count } => {
                if other_cards < *count {
                    reasons.push(format!(
                        "Need {count} other cards in hand to send to the graveyard (have {other_cards})"
                    ));
                }
            }
            Requirement::Unknown => reasons.push("Unknown requirement type".to_string()),
        }
    }

    PlayValidation {
        can_play: reasons.is_empty(),
        reasons,
    }
}

/// 本回合尚未出牌时才能弃掉整手牌削减技术债。
pub fn validate_technical_debt_reduction(state: &GameState, history: &GameHistory) -> bool {
    !state.is_finished() && !history.card_played_since_round_start()
}

pub fn check_win_condition(state: &GameState) -> bool {
    state.resources.progress >= MAX_PROGRESS && state.resources.bugs == 0
}

/// 牌库与弃牌堆合计不足一手牌时判负。
pub fn check_lose_condition(state: &GameState) -> bool {
    state.piles.drawable() < HAND_SIZE
}

//! 胜利时的最终得分：回数、出牌数、用时三个分量。

use super::state::{EndState, GameState};
use crate::constants::{
    CARDS_FULL_SCORE, CARDS_SCORE_CAP, CARDS_ZERO_SCORE, MAX_SCORE, ROUNDS_FULL_SCORE,
    ROUNDS_SCORE_CAP, ROUNDS_ZERO_SCORE, TIME_FULL_SCORE_SECS, TIME_SCORE_CAP,
    TIME_ZERO_SCORE_SECS,
};

/// `value` 不超过 `full` 时得满分，达到 `zero` 时为 0，中间线性递减。
fn interpolate(value: f64, full: f64, zero: f64, cap: f64) -> f64 {
    if value <= full {
        cap
    } else if value >= zero {
        0.0
    } else {
        cap - ((value - full) / (zero - full)) * cap
    }
}

pub fn rounds_component(rounds: u32) -> f64 {
    interpolate(
        rounds as f64,
        ROUNDS_FULL_SCORE as f64,
        ROUNDS_ZERO_SCORE as f64,
        ROUNDS_SCORE_CAP,
    )
}

pub fn cards_component(cards_played: u32) -> f64 {
    interpolate(
        cards_played as f64,
        CARDS_FULL_SCORE as f64,
        CARDS_ZERO_SCORE as f64,
        CARDS_SCORE_CAP,
    )
}

pub fn time_component(elapsed_secs: f64) -> f64 {
    interpolate(
        elapsed_secs,
        TIME_FULL_SCORE_SECS,
        TIME_ZERO_SCORE_SECS,
        TIME_SCORE_CAP,
    )
}

/// 仅在 `EndState::Won` 时计分，其余情况恒为 0。
pub fn calculate_score(state: &GameState) -> u32 {
    if state.end_state != EndState::Won {
        return 0;
    }
    let stats = &state.stats;
    let elapsed_secs = stats.elapsed_ms(stats.start_time) as f64 / 1000.0;
    let total = rounds_component(stats.current_round)
        + cards_component(stats.cards_played)
        + time_component(elapsed_secs);
    (total.round() as u32).min(MAX_SCORE)
}

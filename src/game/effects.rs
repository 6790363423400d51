use serde::{Deserialize, Serialize};

use super::card::{CoinSide, Effect, EffectKind, RandomMode};
use super::catalog::shuffle_deck;
use super::random::RandomSource;
use super::rules::RuleError;
use super::state::GameState;
use crate::constants::{MAX_PROGRESS, MAX_TECHNICAL_DEBT};

/// 单个效果的解析结果：取值以及（若有）硬币结果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectResolution {
    pub effect: Effect,
    pub value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CoinSide>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEffect {
    pub state: GameState,
    /// `DrawCards` 不直接移动卡牌，由表现层按此数量执行抽牌动画。
    pub pending_draw: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectsOutcome {
    pub new_state: GameState,
    pub resolutions: Vec<EffectResolution>,
    pub pending_draw: u32,
}

pub fn resolve_effect(
    effect: &Effect,
    predetermined: Option<CoinSide>,
    rng: &mut dyn RandomSource,
) -> Result<EffectResolution, RuleError> {
    let (value, outcome) = match effect.mode {
        RandomMode::Static { value } => (value, None),
        RandomMode::CoinFlip {
            heads_value,
            tails_value,
        } => {
            let side = predetermined.unwrap_or_else(|| rng.coin_flip());
            let value = match side {
                CoinSide::Heads => heads_value,
                CoinSide::Tails => tails_value,
            };
            (value, Some(side))
        }
        RandomMode::Unknown => return Err(RuleError::UnknownRandomMode),
    };

    Ok(EffectResolution {
        effect: effect.clone(),
        value,
        outcome,
    })
}

pub fn apply_effect_to_game_state(
    resolution: &EffectResolution,
    state: &GameState,
    rng: &mut dyn RandomSource,
) -> Result<AppliedEffect, RuleError> {
    let mut next = state.clone();
    let mut pending_draw = 0;
    let value = resolution.value;
    let resources = &mut next.resources;

    match resolution.effect.kind {
        EffectKind::AddProgress => {
            resources.progress = (resources.progress + value).min(MAX_PROGRESS);
        }
        EffectKind::AddBugs => {
            resources.bugs = (resources.bugs + value).max(0);
        }
        EffectKind::RemoveBugs => {
            resources.bugs = (resources.bugs - value).max(0);
        }
        EffectKind::AddTechnicalDebt => {
            resources.technical_debt = (resources.technical_debt + value).min(MAX_TECHNICAL_DEBT);
        }
        EffectKind::RemoveTechnicalDebt => {
            resources.technical_debt = (resources.technical_debt - value).max(0);
        }
        EffectKind::DrawCards => {
            pending_draw = value.max(0) as u32;
        }
        EffectKind::ShuffleDiscardToDeck => {
            // 弃牌堆洗混后放到牌库底部，牌库顶的顺序保持不变。
            let discard = std::mem::take(&mut next.piles.discard);
            let reshuffled = shuffle_deck(&discard, rng);
            next.piles.deck.extend(reshuffled);
        }
        EffectKind::Unknown => return Err(RuleError::UnknownEffectKind),
    }

    Ok(AppliedEffect {
        state: next,
        pending_draw,
    })
}

/// 按声明顺序依次解析并应用效果，每个效果都作用在上一个效果产生的状态上。
///
/// `predetermined` 中的硬币结果按顺序分配给硬币类效果；用完之后改为实时抛掷。
pub fn resolve_and_apply_effects(
    effects: &[Effect],
    state: &GameState,
    predetermined: &[CoinSide],
    rng: &mut dyn RandomSource,
) -> Result<EffectsOutcome, RuleError> {
    let mut current = state.clone();
    let mut resolutions = Vec::with_capacity(effects.len());
    let mut pending_draw = 0;
    let mut forced = predetermined.iter().copied();

    for effect in effects {
        let outcome = if effect.is_coin_flip() {
            forced.next()
        } else {
            None
        };
        let resolution = resolve_effect(effect, outcome, rng)?;
        let applied = apply_effect_to_game_state(&resolution, &current, rng)?;
        current = applied.state;
        pending_draw += applied.pending_draw;
        resolutions.push(resolution);
    }

    Ok(EffectsOutcome {
        new_state: current,
        resolutions,
        pending_draw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{create_deck, instantiate_deck};
    use crate::game::random::testing::ScriptedRandom;
    use crate::game::state::GameResources;

    fn state_with(resources: GameResources) -> GameState {
        GameState::new(resources, "effects", 0)
    }

    fn run(effects: &[Effect], state: &GameState) -> GameState {
        let mut rng = ScriptedRandom::default();
        resolve_and_apply_effects(effects, state, &[], &mut rng)
            .expect("effects should resolve")
            .new_state
    }

    #[test]
    fn static_effect_resolves_to_declared_value() {
        let mut rng = ScriptedRandom::default();
        let resolution = resolve_effect(&Effect::fixed(EffectKind::AddProgress, 7), None, &mut rng)
            .expect("resolve");
        assert_eq!(resolution.value, 7);
        assert_eq!(resolution.outcome, None);
    }

    #[test]
    fn predetermined_outcome_wins_over_randomness() {
        // 脚本随机源会给出正面，必须使用指定的反面。
        let mut rng = ScriptedRandom::new([0, 0, 0]);
        let effect = Effect::coin_flip(EffectKind::AddProgress, 15, 3);
        let resolution =
            resolve_effect(&effect, Some(CoinSide::Tails), &mut rng).expect("resolve");
        assert_eq!(resolution.value, 3);
        assert_eq!(resolution.outcome, Some(CoinSide::Tails));

        let resolution = resolve_effect(&effect, Some(CoinSide::Heads), &mut rng).expect("resolve");
        assert_eq!(resolution.value, 15);
    }

    #[test]
    fn coin_flip_draws_from_random_source() {
        let mut rng = ScriptedRandom::new([1]);
        let effect = Effect::coin_flip(EffectKind::RemoveBugs, 3, 1);
        let resolution = resolve_effect(&effect, None, &mut rng).expect("resolve");
        assert_eq!(resolution.outcome, Some(CoinSide::Tails));
        assert_eq!(resolution.value, 1);
    }

    #[test]
    fn unknown_mode_and_kind_are_errors() {
        let mut rng = ScriptedRandom::default();
        let effect = Effect {
            kind: EffectKind::AddBugs,
            mode: RandomMode::Unknown,
        };
        assert_eq!(
            resolve_effect(&effect, None, &mut rng),
            Err(RuleError::UnknownRandomMode)
        );

        let resolution = EffectResolution {
            effect: Effect::fixed(EffectKind::Unknown, 1),
            value: 1,
            outcome: None,
        };
        let state = state_with(GameResources::default());
        assert_eq!(
            apply_effect_to_game_state(&resolution, &state, &mut rng),
            Err(RuleError::UnknownEffectKind)
        );
    }

    #[test]
    fn clamps_apply_per_kind() {
        let state = state_with(GameResources {
            progress: 95,
            bugs: 1,
            technical_debt: 19,
            productivity_points: 4,
        });
        let next = run(
            &[
                Effect::fixed(EffectKind::AddProgress, 10),
                Effect::fixed(EffectKind::RemoveBugs, 4),
                Effect::fixed(EffectKind::AddTechnicalDebt, 5),
            ],
            &state,
        );
        assert_eq!(next.resources.progress, 100);
        assert_eq!(next.resources.bugs, 0);
        assert_eq!(next.resources.technical_debt, 20);
        assert_eq!(next.resources.productivity_points, 4);

        let next = run(&[Effect::fixed(EffectKind::RemoveTechnicalDebt, 30)], &next);
        assert_eq!(next.resources.technical_debt, 0);
    }

    #[test]
    fn effect_order_matters() {
        let start = state_with(GameResources::default());

        let add_then_remove = run(
            &[
                Effect::fixed(EffectKind::AddBugs, 3),
                Effect::fixed(EffectKind::RemoveBugs, 5),
            ],
            &start,
        );
        assert_eq!(add_then_remove.resources.bugs, 0);

        let remove_then_add = run(
            &[
                Effect::fixed(EffectKind::RemoveBugs, 5),
                Effect::fixed(EffectKind::AddBugs, 3),
            ],
            &start,
        );
        assert_eq!(remove_then_add.resources.bugs, 3);
    }

    #[test]
    fn draw_cards_is_deferred_to_the_caller() {
        let mut state = state_with(GameResources::default());
        state.piles.deck = instantiate_deck(&create_deck());
        let mut rng = ScriptedRandom::default();
        let outcome = resolve_and_apply_effects(
            &[
                Effect::fixed(EffectKind::DrawCards, 2),
                Effect::fixed(EffectKind::DrawCards, 1),
            ],
            &state,
            &[],
            &mut rng,
        )
        .expect("resolve");
        assert_eq!(outcome.pending_draw, 3);
        assert_eq!(outcome.new_state.piles, state.piles, "no card moves");
    }

    #[test]
    fn shuffle_discard_moves_discard_under_deck() {
        let mut state = state_with(GameResources::default());
        let mut cards = instantiate_deck(&create_deck());
        state.piles.discard = cards.split_off(cards.len() - 4);
        state.piles.deck = cards;
        let top = state.piles.deck[0].clone();
        let before = state.piles.total();

        let next = run(&[Effect::fixed(EffectKind::ShuffleDiscardToDeck, 0)], &state);
        assert!(next.piles.discard.is_empty());
        assert_eq!(next.piles.total(), before);
        assert_eq!(next.piles.deck[0], top);
    }

    #[test]
    fn forced_outcomes_only_feed_coin_flips() {
        let state = state_with(GameResources::default());
        let mut rng = ScriptedRandom::new([0, 0]);
        let outcome = resolve_and_apply_effects(
            &[
                Effect::fixed(EffectKind::AddProgress, 1),
                Effect::coin_flip(EffectKind::AddProgress, 15, 0),
                Effect::coin_flip(EffectKind::AddBugs, 0, 4),
            ],
            &state,
            &[CoinSide::Tails, CoinSide::Tails],
            &mut rng,
        )
        .expect("resolve");
        assert_eq!(outcome.resolutions[0].outcome, None);
        assert_eq!(outcome.resolutions[1].outcome, Some(CoinSide::Tails));
        assert_eq!(outcome.resolutions[2].outcome, Some(CoinSide::Tails));
        assert_eq!(outcome.new_state.resources.progress, 1);
        assert_eq!(outcome.new_state.resources.bugs, 4);
    }

    #[test]
    fn input_state_is_not_mutated() {
        let state = state_with(GameResources::default());
        let snapshot = state.clone();
        let _ = run(&[Effect::fixed(EffectKind::AddProgress, 50)], &state);
        assert_eq!(state, snapshot);
    }
}

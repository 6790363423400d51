use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    card::{CardInstance, CoinSide, EffectKind, InstanceId, RandomMode, Requirement},
    catalog::{create_deck, create_deck_filtered, find_card, instantiate_deck, shuffle_deck},
    effects::{resolve_and_apply_effects, EffectResolution},
    history::{GameHistory, GameHistoryEntry, HistoryAction},
    random::{GameRng, RandomSource},
    scoring::calculate_score,
    state::{EndState, GamePhase, GamePiles, GameState, SaveState},
    summary::GameSummary,
    validators::{
        check_lose_condition, check_win_condition, validate_card_play,
        validate_technical_debt_reduction, PlayValidation,
    },
};
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::config::GameConfig;
use crate::constants::{
    BASE_PRODUCTIVITY_POINTS, HAND_SIZE, SAVE_VERSION, TECHNICAL_DEBT_REDUCTION,
};

/// 表现层发给引擎的动作。未知的 `type` 会反序列化为 `Unknown`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerAction {
    PlayCard {
        card_instance_id: InstanceId,
    },
    DiscardAllForTdReduction,
    EndTurn,
    StartNewGame {
        #[serde(default)]
        config: Option<GameConfig>,
    },
    LoadGame {
        save_state: SaveState,
    },
    #[serde(other)]
    Unknown,
}

impl PlayerAction {
    pub fn kind(&self) -> &'static str {
        match self {
            PlayerAction::PlayCard { .. } => "PLAY_CARD",
            PlayerAction::DiscardAllForTdReduction => "DISCARD_ALL_FOR_TD_REDUCTION",
            PlayerAction::EndTurn => "END_TURN",
            PlayerAction::StartNewGame { .. } => "START_NEW_GAME",
            PlayerAction::LoadGame { .. } => "LOAD_GAME",
            PlayerAction::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("Card not found in hand")]
    CardNotFound { card_instance_id: InstanceId },
    #[error("Game is over")]
    GameFinished,
    #[error("{}", .reasons.join("; "))]
    RequirementsNotMet { reasons: Vec<String> },
    #[error("Technical debt can only be reduced before playing any card this round")]
    TechDebtReductionUnavailable,
    #[error("Not enough cards to draw a new hand")]
    NotEnoughCards { available: usize },
    #[error("No pending card draw")]
    NoPendingDraw,
    #[error("Incompatible save version {found} (expected {expected})")]
    IncompatibleSave { found: String, expected: String },
    #[error("Unknown action type")]
    UnknownAction,
    #[error("Invalid action: {message}")]
    InvalidAction { message: String },
    #[error("Unknown requirement type")]
    UnknownRequirement,
    #[error("Unknown effect type")]
    UnknownEffectKind,
    #[error("Unknown random type")]
    UnknownRandomMode,
}

/// 供表现层编排动画的附加数据。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolved_effects: Vec<EffectResolution>,
    #[serde(default)]
    pub pending_draw: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discarded: Vec<InstanceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sent_to_graveyard: Vec<InstanceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drawn: Vec<InstanceId>,
    #[serde(default)]
    pub reshuffled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_state: Option<GameState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ActionData>,
}

impl ActionResult {
    pub fn succeeded(state: GameState, data: Option<ActionData>) -> Self {
        Self {
            success: true,
            new_state: Some(state),
            error: None,
            data,
        }
    }

    pub fn failed(error: &RuleError) -> Self {
        Self {
            success: false,
            new_state: None,
            error: Some(error.to_string()),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoinFlipPreview {
    pub effect_index: usize,
    pub outcome: CoinSide,
    pub value: i32,
}

/// 出牌预览。随机结果与真正提交时互不相关。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardPlayPreview {
    pub validation: PlayValidation,
    pub cards_to_discard: Vec<CardInstance>,
    pub cards_to_graveyard: Vec<CardInstance>,
    pub coin_flip_effects: Vec<CoinFlipPreview>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndTurnPreview {
    pub cards_to_discard: Vec<InstanceId>,
    pub cards_to_draw: usize,
    pub needs_reshuffle: bool,
    pub would_lose: bool,
}

/// 一次状态转移的结果，只在 `dispatch` 中提交。
struct Transition {
    state: GameState,
    entries: Vec<GameHistoryEntry>,
    data: Option<ActionData>,
    pending_draw: u32,
    // 已提交但仍需报告失败，例如回合结束时牌不够。
    failure: Option<RuleError>,
}

impl Transition {
    fn new(state: GameState) -> Self {
        Self {
            state,
            entries: Vec::new(),
            data: None,
            pending_draw: 0,
            failure: None,
        }
    }
}

pub struct RuleEngine {
    state: GameState,
    history: GameHistory,
    pending_draw: u32,
    rng: Box<dyn RandomSource>,
    preview_rng: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
}

impl RuleEngine {
    pub fn new(config: GameConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: GameConfig, clock: Box<dyn Clock>) -> Self {
        let mut engine = Self {
            state: GameState::new(Default::default(), String::new(), 0),
            history: GameHistory::default(),
            pending_draw: 0,
            rng: Box::new(GameRng::from_seed_str("")),
            preview_rng: Box::new(GameRng::labelled("", "preview")),
            clock,
        };
        engine.create_new_game(config);
        engine
    }

    /// 替换提交用的随机源。开新局或读档时会按种子重新生成。
    pub fn with_random_source(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    pub fn pending_draw(&self) -> u32 {
        self.pending_draw
    }

    pub fn create_new_game(&mut self, config: GameConfig) -> GameState {
        let seed = config.seed.clone().unwrap_or_else(GameRng::random_seed);
        self.rng = Box::new(GameRng::from_seed_str(&seed));
        self.preview_rng = Box::new(GameRng::labelled(&seed, "preview"));

        let cards = match &config.deck_filter {
            Some(ids) => {
                for id in ids.iter().filter(|id| find_card(id).is_none()) {
                    warn!(%id, "deck filter names an unknown card");
                }
                create_deck_filtered(ids)
            }
            None => create_deck(),
        };
        let deck = shuffle_deck(&instantiate_deck(&cards), self.rng.as_mut());

        let now = self.clock.now_ms();
        let mut state = GameState::new(config.starting_resources(), seed, now);
        state.player_id = config.player_id.clone();
        state.piles.deck = deck;
        let dealt = HAND_SIZE.min(state.piles.deck.len());
        state.piles.hand = state.piles.deck.drain(..dealt).collect();

        self.history.clear();
        self.history.record(round_start_entry(&state, now));
        self.pending_draw = 0;
        self.state = state.clone();

        info!(
            seed = %self.state.seed,
            deck = self.state.piles.deck.len(),
            "new game created"
        );
        state
    }

    pub fn process_action(&mut self, action: PlayerAction) -> ActionResult {
        self.dispatch(action, &[])
    }

    /// 与 `process_action` 相同，但硬币效果按声明顺序使用给定结果。
    pub fn process_action_with_predetermined_coin_flips(
        &mut self,
        action: PlayerAction,
        outcomes: &[CoinSide],
    ) -> ActionResult {
        self.dispatch(action, outcomes)
    }

    fn dispatch(&mut self, action: PlayerAction, outcomes: &[CoinSide]) -> ActionResult {
        let kind = action.kind();
        debug!(action = kind, round = self.state.stats.current_round, "processing action");

        let result = match action {
            PlayerAction::PlayCard { card_instance_id } => {
                self.play_card(&card_instance_id, outcomes)
            }
            PlayerAction::DiscardAllForTdReduction => self.reduce_technical_debt(),
            PlayerAction::EndTurn => self.end_turn(),
            PlayerAction::StartNewGame { config } => Ok(Transition::new(
                self.create_new_game(config.unwrap_or_default()),
            )),
            PlayerAction::LoadGame { save_state } => self.load_game(save_state),
            PlayerAction::Unknown => Err(RuleError::UnknownAction),
        };

        match result {
            Ok(transition) => self.commit(transition),
            Err(error) => {
                warn!(action = kind, %error, "action rejected");
                ActionResult::failed(&error)
            }
        }
    }

    fn commit(&mut self, transition: Transition) -> ActionResult {
        let Transition {
            state,
            entries,
            data,
            pending_draw,
            failure,
        } = transition;

        for entry in entries {
            self.history.record(entry);
        }
        self.pending_draw = pending_draw;
        self.state = state;

        match failure {
            Some(error) => {
                warn!(%error, "action ended the game");
                ActionResult {
                    success: false,
                    new_state: Some(self.state.clone()),
                    error: Some(error.to_string()),
                    data,
                }
            }
            None => ActionResult::succeeded(self.state.clone(), data),
        }
    }

    fn play_card(
        &mut self,
        instance_id: &str,
        outcomes: &[CoinSide],
    ) -> Result<Transition, RuleError> {
        let hand_index = self.state.piles.find_in_hand_index(instance_id).ok_or_else(|| {
            RuleError::CardNotFound {
                card_instance_id: instance_id.to_string(),
            }
        })?;
        ensure_planning(&self.state)?;

        let instance = self.state.piles.hand[hand_index].clone();
        let validation = validate_card_play(&instance, &self.state);
        if !validation.can_play {
            return Err(RuleError::RequirementsNotMet {
                reasons: validation.reasons,
            });
        }

        // 在消耗随机数之前排除所有失败路径，失败的动作不推进随机流。
        ensure_payable(&instance, self.state.piles.hand.len() - 1)?;

        let before = self.state.resources.clone();
        let mut next = self.state.clone();
        let mut data = ActionData::default();
        next.piles.hand.remove(hand_index);

        for requirement in &instance.card.requirements {
            match requirement {
                Requirement::SpendProductivityPoints { amount } => {
                    next.resources.productivity_points -= amount;
                }
                Requirement::DiscardCards { count } => {
                    for _ in 0..*count {
                        let card = take_random(&mut next.piles.hand, self.rng.as_mut())?;
                        data.discarded.push(card.instance_id.clone());
                        next.piles.discard.push(card);
                    }
                }
                Requirement::SendToGraveyard { count } => {
                    for _ in 0..*count {
                        let card = take_random(&mut next.piles.hand, self.rng.as_mut())?;
                        data.sent_to_graveyard.push(card.instance_id.clone());
                        next.piles.graveyard.push(card);
                    }
                }
                Requirement::Unknown => return Err(RuleError::UnknownRequirement),
            }
        }
        next.piles.graveyard.push(instance.clone());

        let outcome =
            resolve_and_apply_effects(&instance.card.effects, &next, outcomes, self.rng.as_mut())?;
        let mut next = outcome.new_state;
        next.stats.cards_played += 1;

        let now = self.clock.now_ms();
        let mut entries = vec![GameHistoryEntry::new(
            next.stats.current_round,
            HistoryAction::CardPlayed,
            before,
            next.resources.clone(),
            format!("Played {}", instance.card.title),
            now,
        )
        .with_card(instance.card.id.clone())
        .with_effects(outcome.resolutions.clone())];

        let mut pending_draw = self.pending_draw + outcome.pending_draw;
        if check_win_condition(&next) {
            finish_game(&mut next, EndState::Won, now, &mut entries);
            pending_draw = 0;
        } else if check_lose_condition(&next) {
            finish_game(&mut next, EndState::LostNoCards, now, &mut entries);
            pending_draw = 0;
        }

        data.resolved_effects = outcome.resolutions;
        data.pending_draw = pending_draw;
        debug!(
            card = %instance.card.id,
            pending_draw,
            progress = next.resources.progress,
            bugs = next.resources.bugs,
            "card played"
        );

        Ok(Transition {
            state: next,
            entries,
            data: Some(data),
            pending_draw,
            failure: None,
        })
    }

    fn reduce_technical_debt(&mut self) -> Result<Transition, RuleError> {
        ensure_planning(&self.state)?;
        if !validate_technical_debt_reduction(&self.state, &self.history) {
            return Err(RuleError::TechDebtReductionUnavailable);
        }

        let mut next = self.state.clone();
        let before = next.resources.clone();
        next.resources.technical_debt = (next.resources.technical_debt - TECHNICAL_DEBT_REDUCTION).max(0);
        let entry = GameHistoryEntry::new(
            next.stats.current_round,
            HistoryAction::TechDebtReduction,
            before,
            next.resources.clone(),
            format!(
                "Discarded hand to reduce technical debt to {}",
                next.resources.technical_debt
            ),
            self.clock.now_ms(),
        );

        self.finish_turn(next, vec![entry])
    }

    fn end_turn(&mut self) -> Result<Transition, RuleError> {
        ensure_planning(&self.state)?;
        self.finish_turn(self.state.clone(), Vec::new())
    }

    fn finish_turn(
        &mut self,
        mut next: GameState,
        mut entries: Vec<GameHistoryEntry>,
    ) -> Result<Transition, RuleError> {
        let now = self.clock.now_ms();
        let round = next.stats.current_round;
        entries.push(GameHistoryEntry::marker(
            round,
            HistoryAction::RoundEnd,
            &next.resources,
            format!("Round {round} ended"),
            now,
        ));

        let hand = std::mem::take(&mut next.piles.hand);
        next.piles.discard.extend(hand);

        let mut data = ActionData::default();
        let available = next.piles.drawable();
        if available < HAND_SIZE {
            finish_game(&mut next, EndState::LostNoCards, now, &mut entries);
            return Ok(Transition {
                state: next,
                entries,
                data: Some(data),
                pending_draw: 0,
                failure: Some(RuleError::NotEnoughCards { available }),
            });
        }

        let draw = draw_cards(&mut next.piles, HAND_SIZE, self.rng.as_mut());
        data.drawn = draw.drawn;
        data.reshuffled = draw.reshuffled;

        next.stats.current_round += 1;
        next.resources.productivity_points =
            (BASE_PRODUCTIVITY_POINTS - next.resources.technical_debt).max(0);
        entries.push(round_start_entry(&next, now));

        debug!(
            round = next.stats.current_round,
            productivity_points = next.resources.productivity_points,
            reshuffled = data.reshuffled,
            "round started"
        );

        Ok(Transition {
            state: next,
            entries,
            data: Some(data),
            pending_draw: 0,
            failure: None,
        })
    }

    fn load_game(&mut self, save: SaveState) -> Result<Transition, RuleError> {
        if !save.is_compatible() {
            return Err(RuleError::IncompatibleSave {
                found: save.version,
                expected: SAVE_VERSION.to_string(),
            });
        }

        let state = save.game_state;
        self.rng = Box::new(GameRng::labelled(
            &state.seed,
            &format!("load-{}-{}", state.stats.current_round, state.stats.cards_played),
        ));
        self.preview_rng = Box::new(GameRng::labelled(&state.seed, "preview"));
        self.history.clear();
        let mut transition = Transition::new(state);
        transition
            .entries
            .push(round_start_entry(&transition.state, self.clock.now_ms()));
        info!(seed = %transition.state.seed, round = transition.state.stats.current_round, "game loaded");
        Ok(transition)
    }

    /// 执行 `DrawCards` 效果留下的延迟抽牌。
    pub fn draw_pending_cards(&mut self) -> ActionResult {
        if self.pending_draw == 0 {
            return ActionResult::failed(&RuleError::NoPendingDraw);
        }
        if let Err(error) = ensure_planning(&self.state) {
            return ActionResult::failed(&error);
        }

        let mut next = self.state.clone();
        let draw = draw_cards(&mut next.piles, self.pending_draw as usize, self.rng.as_mut());
        let data = ActionData {
            drawn: draw.drawn,
            reshuffled: draw.reshuffled,
            ..ActionData::default()
        };

        let mut entries = Vec::new();
        if check_lose_condition(&next) {
            finish_game(&mut next, EndState::LostNoCards, self.clock.now_ms(), &mut entries);
        }
        self.commit(Transition {
            state: next,
            entries,
            data: Some(data),
            pending_draw: 0,
            failure: None,
        })
    }

    pub fn prepare_card_play(&mut self, instance_id: &str) -> Result<CardPlayPreview, RuleError> {
        let hand_index = self.state.piles.find_in_hand_index(instance_id).ok_or_else(|| {
            RuleError::CardNotFound {
                card_instance_id: instance_id.to_string(),
            }
        })?;
        ensure_planning(&self.state)?;

        let instance = &self.state.piles.hand[hand_index];
        let validation = validate_card_play(instance, &self.state);
        let mut remaining: Vec<CardInstance> = self
            .state
            .piles
            .hand
            .iter()
            .filter(|card| card.instance_id != instance_id)
            .cloned()
            .collect();

        let mut cards_to_discard = Vec::new();
        let mut cards_to_graveyard = Vec::new();
        for requirement in &instance.card.requirements {
            let (count, target) = match requirement {
                Requirement::DiscardCards { count } => (*count, &mut cards_to_discard),
                Requirement::SendToGraveyard { count } => (*count, &mut cards_to_graveyard),
                _ => continue,
            };
            for _ in 0..count.min(remaining.len()) {
                let index = self.preview_rng.next_below(remaining.len());
                target.push(remaining.remove(index));
            }
        }

        let coin_flip_effects = instance
            .card
            .effects
            .iter()
            .enumerate()
            .filter_map(|(effect_index, effect)| match effect.mode {
                RandomMode::CoinFlip {
                    heads_value,
                    tails_value,
                } => {
                    let outcome = self.preview_rng.coin_flip();
                    let value = match outcome {
                        CoinSide::Heads => heads_value,
                        CoinSide::Tails => tails_value,
                    };
                    Some(CoinFlipPreview {
                        effect_index,
                        outcome,
                        value,
                    })
                }
                _ => None,
            })
            .collect();

        Ok(CardPlayPreview {
            validation,
            cards_to_discard,
            cards_to_graveyard,
            coin_flip_effects,
        })
    }

    pub fn prepare_end_turn(&self) -> EndTurnPreview {
        let piles = &self.state.piles;
        let available = piles.drawable() + piles.hand.len();
        EndTurnPreview {
            cards_to_discard: piles
                .hand
                .iter()
                .map(|card| card.instance_id.clone())
                .collect(),
            cards_to_draw: HAND_SIZE.min(available),
            needs_reshuffle: piles.deck.len() < HAND_SIZE,
            would_lose: self.state.is_finished() || available < HAND_SIZE,
        }
    }

    pub fn get_save_state(&self) -> SaveState {
        SaveState::new(self.state.clone(), self.clock.now_ms())
    }

    /// 胜利后提交排行榜所需的摘要。
    pub fn game_summary(&self) -> Option<GameSummary> {
        GameSummary::from_game(&self.state, &self.history)
    }
}

fn ensure_planning(state: &GameState) -> Result<(), RuleError> {
    if state.phase == GamePhase::Planning {
        Ok(())
    } else {
        Err(RuleError::GameFinished)
    }
}

/// 代价中需要移走的手牌总数不能超过其余手牌，效果的种类与取值方式必须可识别。
fn ensure_payable(instance: &CardInstance, other_cards: usize) -> Result<(), RuleError> {
    let owed: usize = instance
        .card
        .requirements
        .iter()
        .map(|requirement| match requirement {
            Requirement::DiscardCards { count } | Requirement::SendToGraveyard { count } => *count,
            _ => 0,
        })
        .sum();
    if owed > other_cards {
        return Err(RuleError::RequirementsNotMet {
            reasons: vec![format!(
                "Need {owed} other cards in hand to pay the requirements (have {other_cards})"
            )],
        });
    }

    for effect in &instance.card.effects {
        if effect.mode == RandomMode::Unknown {
            return Err(RuleError::UnknownRandomMode);
        }
        if effect.kind == EffectKind::Unknown {
            return Err(RuleError::UnknownEffectKind);
        }
    }
    Ok(())
}

fn round_start_entry(state: &GameState, now: Timestamp) -> GameHistoryEntry {
    let round = state.stats.current_round;
    GameHistoryEntry::marker(
        round,
        HistoryAction::RoundStart,
        &state.resources,
        format!("Round {round} started"),
        now,
    )
}

fn finish_game(
    state: &mut GameState,
    end_state: EndState,
    now: Timestamp,
    entries: &mut Vec<GameHistoryEntry>,
) {
    state.phase = GamePhase::GameOver;
    state.end_state = end_state;
    state.stats.end_time = Some(now);
    state.stats.final_score = Some(calculate_score(state));

    let description = match end_state {
        EndState::Won => format!(
            "Project shipped with a score of {}",
            state.stats.final_score.unwrap_or_default()
        ),
        _ => "Ran out of cards".to_string(),
    };
    entries.push(GameHistoryEntry::marker(
        state.stats.current_round,
        HistoryAction::GameEnd,
        &state.resources,
        description,
        now,
    ));

    info!(
        end_state = ?end_state,
        rounds = state.stats.current_round,
        cards_played = state.stats.cards_played,
        score = ?state.stats.final_score,
        "game over"
    );
}

fn take_random(
    hand: &mut Vec<CardInstance>,
    rng: &mut dyn RandomSource,
) -> Result<CardInstance, RuleError> {
    if hand.is_empty() {
        return Err(RuleError::RequirementsNotMet {
            reasons: vec!["Not enough cards in hand to pay the requirements".to_string()],
        });
    }
    let index = rng.next_below(hand.len());
    Ok(hand.remove(index))
}

struct Draw {
    drawn: Vec<InstanceId>,
    reshuffled: bool,
}

/// 从牌库顶抽牌；牌库耗尽时把整个弃牌堆洗回牌库继续抽。
fn draw_cards(piles: &mut GamePiles, count: usize, rng: &mut dyn RandomSource) -> Draw {
    let mut draw = Draw {
        drawn: Vec::with_capacity(count),
        reshuffled: false,
    };
    while draw.drawn.len() < count {
        if piles.deck.is_empty() {
            if piles.discard.is_empty() {
                break;
            }
            let discard = std::mem::take(&mut piles.discard);
            piles.deck = shuffle_deck(&discard, rng);
            draw.reshuffled = true;
        }
        let card = piles.deck.remove(0);
        draw.drawn.push(card.instance_id.clone());
        piles.hand.push(card);
    }
    draw
}

use serde::{Deserialize, Serialize};

/// 卡牌定义标识，例如 `"hotfix"`。
pub type CardId = String;
/// 一局游戏内卡牌实例的唯一标识。
pub type InstanceId = String;

/// 打出卡牌需要支付的代价。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Requirement {
    SpendProductivityPoints { amount: i32 },
    DiscardCards { count: usize },
    SendToGraveyard { count: usize },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EffectKind {
    AddProgress,
    AddBugs,
    RemoveBugs,
    AddTechnicalDebt,
    RemoveTechnicalDebt,
    ShuffleDiscardToDeck,
    DrawCards,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RandomMode {
    Static { value: i32 },
    CoinFlip { heads_value: i32, tails_value: i32 },
    #[serde(other)]
    Unknown,
}

/// 声明式的卡牌效果：效果种类 × 取值方式。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Effect {
    pub kind: EffectKind,
    pub mode: RandomMode,
}

impl Effect {
    pub fn fixed(kind: EffectKind, value: i32) -> Self {
        Self {
            kind,
            mode: RandomMode::Static { value },
        }
    }

    pub fn coin_flip(kind: EffectKind, heads_value: i32, tails_value: i32) -> Self {
        Self {
            kind,
            mode: RandomMode::CoinFlip {
                heads_value,
                tails_value,
            },
        }
    }

    pub fn is_coin_flip(&self) -> bool {
        matches!(self.mode, RandomMode::CoinFlip { .. })
    }
}

/// 卡牌目录中的不可变定义。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub flavor_text: String,
    #[serde(default = "default_copies")]
    pub copies: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
}

fn default_copies() -> u8 {
    1
}

impl Card {
    pub fn new(id: impl Into<CardId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            flavor_text: String::new(),
            copies: 1,
            requirements: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_flavor(mut self, flavor_text: impl Into<String>) -> Self {
        self.flavor_text = flavor_text.into();
        self
    }

    pub fn with_copies(mut self, copies: u8) -> Self {
        self.copies = copies;
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// 牌堆中的一张具体卡牌。同一定义的两张副本拥有不同的 `instance_id`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardInstance {
    pub instance_id: InstanceId,
    pub card: Card,
}

impl CardInstance {
    pub fn card_id(&self) -> &str {
        &self.card.id
    }
}

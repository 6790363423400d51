//! 卡牌目录与牌库构建。目录数据与规则引擎分离，调整数值时只需修改这里。

use once_cell::sync::Lazy;

use super::card::{Card, CardId, CardInstance, Effect, EffectKind, Requirement};
use super::random::RandomSource;

static CATALOG: Lazy<Vec<Card>> = Lazy::new(build_catalog);

fn spend(amount: i32) -> Requirement {
    Requirement::SpendProductivityPoints { amount }
}

fn build_catalog() -> Vec<Card> {
    use EffectKind::*;

    vec![
        Card::new("write-code", "Write Code")
            .with_description("Gain 8 progress, introduce 1 bug.")
            .with_flavor("It compiles. Ship it.")
            .with_copies(4)
            .requires(spend(3))
            .effect(Effect::fixed(AddProgress, 8))
            .effect(Effect::fixed(AddBugs, 1)),
        Card::new("write-tests", "Write Unit Tests")
            .with_description("Remove 2 bugs.")
            .with_copies(3)
            .requires(spend(2))
            .effect(Effect::fixed(RemoveBugs, 2)),
        Card::new("refactor", "Refactor")
            .with_description("Remove 3 technical debt, gain 2 progress.")
            .with_flavor("Leave the campsite cleaner than you found it.")
            .with_copies(2)
            .requires(spend(4))
            .effect(Effect::fixed(RemoveTechnicalDebt, 3))
            .effect(Effect::fixed(AddProgress, 2)),
        Card::new("hotfix", "Hotfix")
            .with_description("Discard a random card. Remove 3 bugs, add 1 technical debt.")
            .with_copies(2)
            .requires(spend(1))
            .requires(Requirement::DiscardCards { count: 1 })
            .effect(Effect::fixed(RemoveBugs, 3))
            .effect(Effect::fixed(AddTechnicalDebt, 1)),
        Card::new("pair-programming", "Pair Programming")
            .with_description("Gain 10 progress.")
            .with_copies(2)
            .requires(spend(5))
            .effect(Effect::fixed(AddProgress, 10)),
        Card::new("deploy-on-friday", "Deploy on Friday")
            .with_description("Flip for 15 progress; flip again for 4 bugs.")
            .with_flavor("What could possibly go wrong?")
            .with_copies(2)
            .requires(spend(2))
            .effect(Effect::coin_flip(AddProgress, 15, 0))
            .effect(Effect::coin_flip(AddBugs, 0, 4)),
        Card::new("copy-paste", "Stack Overflow Copy-Paste")
            .with_description("Gain 6 progress, add 2 technical debt.")
            .with_copies(3)
            .requires(spend(1))
            .effect(Effect::fixed(AddProgress, 6))
            .effect(Effect::fixed(AddTechnicalDebt, 2)),
        Card::new("rubber-duck", "Rubber Duck Debugging")
            .with_description("Flip: remove 3 bugs on heads, 1 on tails.")
            .with_copies(2)
            .requires(spend(1))
            .effect(Effect::coin_flip(RemoveBugs, 3, 1)),
        Card::new("sprint-planning", "Sprint Planning")
            .with_description("Draw 2 cards.")
            .with_copies(2)
            .requires(spend(2))
            .effect(Effect::fixed(DrawCards, 2)),
        Card::new("retrospective", "Retrospective")
            .with_description("Shuffle your discard pile into your deck, remove 1 technical debt.")
            .requires(spend(2))
            .effect(Effect::fixed(ShuffleDiscardToDeck, 0))
            .effect(Effect::fixed(RemoveTechnicalDebt, 1)),
        Card::new("overtime", "Overtime")
            .with_description("Send a random card to the graveyard. Gain 12 progress, add 2 bugs.")
            .with_flavor("Sleep is for the release after next.")
            .with_copies(2)
            .requires(Requirement::SendToGraveyard { count: 1 })
            .effect(Effect::fixed(AddProgress, 12))
            .effect(Effect::fixed(AddBugs, 2)),
        Card::new("code-review", "Code Review")
            .with_description("Remove 2 bugs and 1 technical debt.")
            .with_copies(2)
            .requires(spend(3))
            .effect(Effect::fixed(RemoveBugs, 2))
            .effect(Effect::fixed(RemoveTechnicalDebt, 1)),
        Card::new("legacy-migration", "Legacy Migration")
            .with_description("Discard 2 random cards. Gain 20 progress, add 3 technical debt.")
            .requires(spend(6))
            .requires(Requirement::DiscardCards { count: 2 })
            .effect(Effect::fixed(AddProgress, 20))
            .effect(Effect::fixed(AddTechnicalDebt, 3)),
        Card::new("coffee-break", "Coffee Break")
            .with_description("Discard a random card. Flip for 5 progress.")
            .with_copies(2)
            .requires(Requirement::DiscardCards { count: 1 })
            .effect(Effect::coin_flip(AddProgress, 5, 0)),
        Card::new("tech-spike", "Technical Spike")
            .with_description("Gain 4 progress, draw 1 card.")
            .with_copies(2)
            .requires(spend(3))
            .effect(Effect::fixed(AddProgress, 4))
            .effect(Effect::fixed(DrawCards, 1)),
    ]
}

pub fn catalog() -> &'static [Card] {
    &CATALOG
}

pub fn find_card(id: &str) -> Option<&'static Card> {
    CATALOG.iter().find(|card| card.id == id)
}

/// 按目录顺序展开每张卡牌的副本，结果是确定的。
pub fn create_deck() -> Vec<Card> {
    expand(CATALOG.iter())
}

/// 仅使用给定 id 的卡牌构建牌库，未知 id 会被忽略。
pub fn create_deck_filtered(ids: &[CardId]) -> Vec<Card> {
    expand(CATALOG.iter().filter(|card| ids.contains(&card.id)))
}

fn expand<'a>(cards: impl Iterator<Item = &'a Card>) -> Vec<Card> {
    cards
        .flat_map(|card| std::iter::repeat(card).take(card.copies as usize))
        .cloned()
        .collect()
}

/// Fisher–Yates 洗牌，返回新的序列。
pub fn shuffle_deck<T: Clone>(cards: &[T], rng: &mut dyn RandomSource) -> Vec<T> {
    let mut shuffled = cards.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.next_below(i + 1);
        shuffled.swap(i, j);
    }
    shuffled
}

pub fn create_card_instance(card: &Card, serial: usize) -> CardInstance {
    CardInstance {
        instance_id: format!("{}#{}", card.id, serial),
        card: card.clone(),
    }
}

pub fn instantiate_deck(cards: &[Card]) -> Vec<CardInstance> {
    cards
        .iter()
        .enumerate()
        .map(|(serial, card)| create_card_instance(card, serial))
        .collect()
}

use std::rc::Rc;

use proptest::prelude::*;
use sprint_cards::game::{validate_game_state, GamePhase};
use sprint_cards::{FixedClock, GameConfig, PlayerAction, RuleEngine};

const DECK_SIZE: usize = 32;

#[derive(Debug, Clone, Copy)]
enum Step {
    Play(usize),
    EndTurn,
    ReduceDebt,
    DrawPending,
    Wait(u64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => (0usize..8).prop_map(Step::Play),
        2 => Just(Step::EndTurn),
        1 => Just(Step::ReduceDebt),
        1 => Just(Step::DrawPending),
        1 => (0u64..30_000).prop_map(Step::Wait),
    ]
}

fn engine(seed: &str) -> (RuleEngine, Rc<FixedClock>) {
    let clock = Rc::new(FixedClock::new(1_700_000_000_000));
    let engine = RuleEngine::with_clock(
        GameConfig::default().with_seed(seed),
        Box::new(Rc::clone(&clock)),
    );
    (engine, clock)
}

fn apply(engine: &mut RuleEngine, clock: &FixedClock, step: Step) -> bool {
    match step {
        Step::Play(index) => {
            let hand = &engine.state().piles.hand;
            if hand.is_empty() {
                return false;
            }
            let id = hand[index % hand.len()].instance_id.clone();
            engine
                .process_action(PlayerAction::PlayCard {
                    card_instance_id: id,
                })
                .success
        }
        Step::EndTurn => engine.process_action(PlayerAction::EndTurn).success,
        Step::ReduceDebt => {
            engine
                .process_action(PlayerAction::DiscardAllForTdReduction)
                .success
        }
        Step::DrawPending => engine.draw_pending_cards().success,
        Step::Wait(millis) => {
            clock.advance(millis);
            true
        }
    }
}

proptest! {
    #[test]
    fn reachable_states_keep_invariants(
        seed in "[a-z0-9]{1,12}",
        steps in proptest::collection::vec(step_strategy(), 1..120),
    ) {
        let (mut engine, clock) = engine(&seed);
        for step in steps {
            let before = engine.state().clone();
            let succeeded = apply(&mut engine, &clock, step);
            let state = engine.state();

            prop_assert_eq!(state.piles.total(), DECK_SIZE);
            prop_assert!(validate_game_state(state).is_empty(), "{:?}", validate_game_state(state));
            prop_assert!(state.stats.current_round >= before.stats.current_round);
            prop_assert!(state.stats.cards_played >= before.stats.cards_played);

            if !succeeded && !matches!(step, Step::EndTurn | Step::ReduceDebt) {
                prop_assert_eq!(state, &before);
            }
            if before.phase == GamePhase::GameOver {
                prop_assert_eq!(state, &before);
            }
            if let Some(score) = state.stats.final_score {
                prop_assert!(score <= 1000);
            }
        }
    }

    #[test]
    fn same_seed_same_game(
        seed in "[a-z0-9]{1,12}",
        steps in proptest::collection::vec(step_strategy(), 1..60),
    ) {
        let (mut left, left_clock) = engine(&seed);
        let (mut right, right_clock) = engine(&seed);
        for step in steps {
            apply(&mut left, &left_clock, step);
            apply(&mut right, &right_clock, step);
            prop_assert_eq!(left.state(), right.state());
        }
        prop_assert_eq!(left.history(), right.history());
    }

    #[test]
    fn previews_never_change_state(
        seed in "[a-z0-9]{1,12}",
        index in 0usize..5,
    ) {
        let (mut engine, _) = engine(&seed);
        let before = engine.state().clone();
        let id = before.piles.hand[index].instance_id.clone();
        let preview = engine.prepare_card_play(&id);
        prop_assert!(preview.is_ok());
        let _ = engine.prepare_end_turn();
        prop_assert_eq!(engine.state(), &before);
        prop_assert_eq!(engine.history().len(), 1);
    }
}

//! Property checks: hard constraints hold for every reachable state, and a
//! rejected batch leaves no trace.

use contracts::{GameConfig, Modifier, ModifierOp, PlayerAction, Role, WorldState};
use engine_core::{kernel, GameWorld, NoopAdvisors};
use proptest::prelude::*;

fn assert_within_constraints(state: &WorldState) {
    for path in kernel::addressable_paths() {
        let Some((min, max)) = kernel::bounds(path) else {
            continue;
        };
        let value = kernel::get(state, path).expect("table path resolves");
        assert!(
            (min..=max).contains(&value),
            "{path}={value} escaped [{min}, {max}]"
        );
    }
}

fn arbitrary_action() -> impl Strategy<Value = PlayerAction> {
    let known = prop_oneof![
        Just(("work", serde_json::Value::Null)),
        Just(("consume", serde_json::Value::Null)),
        Just(("produce", serde_json::Value::Null)),
        Just(("evade_taxes", serde_json::Value::Null)),
        Just(("comply_taxes", serde_json::Value::Null)),
    ];
    let wages = (0.01_f64..20.0).prop_map(|wage_level| {
        ("set_wages", serde_json::json!({ "wage_level": wage_level }))
    });
    prop_oneof![known, wages].prop_map(|(action_type, params)| PlayerAction {
        action_type: action_type.to_string(),
        params,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn constraints_hold_after_random_action_ticks(
        seed in 0_u32..10_000,
        actions in proptest::collection::vec(arbitrary_action(), 0..12),
        ticks in 1_usize..4,
    ) {
        let mut world = GameWorld::new(GameConfig::new("srv_prop", seed), 0);
        let citizen = world.join_player("cit", Role::Citizen).unwrap();
        let owner = world.join_player("biz", Role::BusinessOwner).unwrap();

        for action in &actions {
            // Role routing decides the target; rejections are fine.
            let _ = world.submit_action(&citizen, action.clone());
            let _ = world.submit_action(&owner, action.clone());
        }
        for _ in 0..ticks {
            world.run_tick(&NoopAdvisors);
            assert_within_constraints(world.state());
            prop_assert!(world
                .state()
                .players
                .values()
                .all(|player| player.actions_pending.is_empty()));
        }
    }

    #[test]
    fn rejected_batches_leave_constrained_paths_untouched(
        deltas in proptest::collection::vec(-500.0_f64..500.0, 1..6),
    ) {
        let mut state = WorldState::default();
        let mut batch: Vec<Modifier> = deltas
            .iter()
            .enumerate()
            .map(|(index, delta)| {
                let paths = kernel::addressable_paths();
                Modifier::add(paths[index % paths.len()], *delta)
            })
            .collect();
        batch.push(Modifier {
            variable: "no.such.path".to_string(),
            operation: ModifierOp::Set,
            value: 1.0,
            min: None,
            max: None,
        });

        let before = state.clone();
        let rejection = kernel::apply_batch(&mut state, &batch, "prop").unwrap_err();
        prop_assert_eq!(rejection.index, batch.len() - 1);
        prop_assert_eq!(state, before);
    }

    #[test]
    fn single_modifiers_never_escape_hard_bounds(
        value in -1.0e9_f64..1.0e9,
        path_index in 0_usize..23,
    ) {
        let mut state = WorldState::default();
        let paths = kernel::addressable_paths();
        let path = paths[path_index % paths.len()];
        let _ = kernel::apply_modifier(&mut state, &Modifier::set(path, value));
        assert_within_constraints(&state);
    }
}

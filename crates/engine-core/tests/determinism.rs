//! End-to-end determinism: identical initial state, identical ordered
//! submissions, identical advisor outputs, identical post-tick hashes.

use contracts::{AdvisorStage, GameConfig, PlayerAction, Role};
use engine_core::{GameWorld, NoopAdvisors, ScriptedAdvisors};
use serde_json::{json, Value};

fn config() -> GameConfig {
    GameConfig::new("srv_determinism", 99)
}

fn scripted() -> ScriptedAdvisors {
    ScriptedAdvisors::new()
        .with_output(
            AdvisorStage::Analyst,
            json!({
                "trends": ["growth slowing"],
                "risks": ["unrest"],
                "projections": { "gdp": 1000.0 },
                "confidence": 0.7
            }),
        )
        .with_output(
            AdvisorStage::Media,
            json!({
                "headlines": [ { "text": "Wages stagnate as prices drift", "truth_score": 0.8 } ],
                "articles": [],
                "rumors": [ { "text": "the treasury is emptier than reported", "credibility": 0.4 } ]
            }),
        )
        .with_output(
            AdvisorStage::Reaction,
            json!({
                "approval_delta": { "overall": -2.0, "economic": -3.0, "social": 0.0, "security": 1.0 },
                "protest_prob": 0.2,
                "movements": [],
                "suppressed_warnings": []
            }),
        )
        .with_output(AdvisorStage::Crisis, Value::Null)
        .with_output(
            AdvisorStage::Historian,
            json!({
                "era_transition": null,
                "summary": "an ordinary stretch of governance",
                "player_reputations": {}
            }),
        )
}

fn play_three_ticks(advisors: &ScriptedAdvisors) -> Vec<String> {
    let mut world = GameWorld::new(config(), 0);
    let owner = world.join_player("boss", Role::BusinessOwner).unwrap();
    let citizen = world.join_player("ada", Role::Citizen).unwrap();
    let politician = world.join_player("rep", Role::Politician).unwrap();

    let mut hashes = Vec::new();
    world
        .submit_action(
            &citizen,
            PlayerAction { action_type: "work".to_string(), params: Value::Null },
        )
        .unwrap();
    world
        .submit_action(
            &owner,
            PlayerAction { action_type: "produce".to_string(), params: Value::Null },
        )
        .unwrap();
    world
        .submit_action(
            &politician,
            PlayerAction {
                action_type: "propose_law".to_string(),
                params: json!({ "text": "Subsidize bread" }),
            },
        )
        .unwrap();
    hashes.push(world.run_tick(advisors).content_hash);

    world
        .submit_action(
            &citizen,
            PlayerAction { action_type: "consume".to_string(), params: Value::Null },
        )
        .unwrap();
    hashes.push(world.run_tick(advisors).content_hash);
    hashes.push(world.run_tick(advisors).content_hash);
    hashes
}

#[test]
fn three_tick_replay_matches_hash_for_hash() {
    let advisors = scripted();
    assert_eq!(play_three_ticks(&advisors), play_three_ticks(&advisors));
}

#[test]
fn tick_and_seed_advance_by_exactly_one() {
    let mut world = GameWorld::new(config(), 0);
    for expected in 1..=5_u64 {
        world.run_tick(&NoopAdvisors);
        assert_eq!(world.state().meta.tick, expected);
        assert_eq!(u64::from(world.state().meta.seed), 99 + expected);
    }
}

#[test]
fn deadline_advances_by_whole_intervals() {
    let mut world = GameWorld::new(config(), 1_000);
    let interval = world.config().tick_interval_ms();
    let first_deadline = world.state().meta.tick_deadline_ms;
    assert_eq!(first_deadline, 1_000 + interval);
    world.run_tick(&NoopAdvisors);
    world.run_tick(&NoopAdvisors);
    assert_eq!(world.state().meta.tick_deadline_ms, first_deadline + 2 * interval);
}

#[test]
fn rehydrated_world_continues_the_hash_chain() {
    let advisors = scripted();
    let mut original = GameWorld::new(config(), 0);
    original.join_player("ada", Role::Citizen).unwrap();
    original.run_tick(&advisors);

    let snapshot = original.state().clone();
    let mut resumed = GameWorld::from_state(config(), snapshot);

    let from_original = original.run_tick(&advisors).content_hash;
    let from_resumed = resumed.run_tick(&advisors).content_hash;
    assert_eq!(from_original, from_resumed);
}

use super::*;

use engine_core::NoopAdvisors;

fn test_options() -> ServerOptions {
    ServerOptions {
        sqlite_path: None,
        tick_interval_hours: 4,
        max_players: 3,
        advisors: Arc::new(NoopAdvisors),
        schedule_ticks: false,
    }
}

#[test]
fn error_codes_map_to_distinct_statuses() {
    assert_eq!(status_for_code(ErrorCode::GameNotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for_code(ErrorCode::InvalidAuth), StatusCode::UNAUTHORIZED);
    assert_eq!(status_for_code(ErrorCode::WrongPhase), StatusCode::CONFLICT);
    assert_eq!(status_for_code(ErrorCode::ServerFull), StatusCode::FORBIDDEN);
    assert_eq!(status_for_code(ErrorCode::RateLimited), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn server_credentials_differ_by_counter() {
    let (id_a, seed_a) = derive_server_credentials(1_700_000_000_000, 1);
    let (id_b, seed_b) = derive_server_credentials(1_700_000_000_000, 2);
    assert_ne!(id_a, id_b);
    assert_ne!(seed_a, seed_b);
    assert!(id_a.starts_with("srv_"));
}

#[test]
fn role_parsing_rejects_unknown_roles() {
    assert!(parse_role("citizen").is_ok());
    assert!(parse_role("emperor").is_err());
}

#[tokio::test]
async fn create_join_action_view_round_trip() {
    let state = AppState::new(test_options());

    let created = create_server(
        State(state.clone()),
        Json(JoinRequest {
            player_name: "ada".to_string(),
            player_role: "citizen".to_string(),
        }),
    )
    .await
    .expect("create should succeed")
    .0;
    assert_eq!(created.tick, 0);
    assert_eq!(created.player_token.len(), 32);

    let joined = join_server(
        Path(created.server_id.clone()),
        State(state.clone()),
        Json(JoinRequest {
            player_name: "rex".to_string(),
            player_role: "politician".to_string(),
        }),
    )
    .await
    .expect("join should succeed")
    .0;
    assert_ne!(joined.player_id, created.player_id);

    let action = submit_action(
        Path(created.server_id.clone()),
        State(state.clone()),
        Json(ActionRequest {
            player_id: created.player_id.clone(),
            player_token: created.player_token.clone(),
            action: PlayerAction {
                action_type: "work".to_string(),
                params: Value::Null,
            },
        }),
    )
    .await
    .expect("action should queue")
    .0;
    assert!(action.success);
    assert_eq!(action.pending_count, 1);

    let viewed = view_server(
        Path(created.server_id.clone()),
        State(state.clone()),
        Query(ViewQuery {
            player_id: created.player_id.clone(),
            token: created.player_token.clone(),
        }),
    )
    .await
    .expect("view should project")
    .0;
    assert_eq!(viewed.tick, 0);
    assert_eq!(viewed.phase, Phase::AcceptingActions);

    let status = server_status(Path(created.server_id.clone()), State(state.clone()))
        .await
        .expect("status should report")
        .0;
    assert!(status.initialized);
    assert_eq!(status.player_count, 2);
    assert_eq!(status.players.len(), 2);
}

#[tokio::test]
async fn auth_and_capacity_errors_surface_with_codes() {
    let state = AppState::new(test_options());
    let created = create_server(
        State(state.clone()),
        Json(JoinRequest {
            player_name: "ada".to_string(),
            player_role: "citizen".to_string(),
        }),
    )
    .await
    .expect("create should succeed")
    .0;

    let bad_auth = submit_action(
        Path(created.server_id.clone()),
        State(state.clone()),
        Json(ActionRequest {
            player_id: created.player_id.clone(),
            player_token: "wrong-token".to_string(),
            action: PlayerAction {
                action_type: "work".to_string(),
                params: Value::Null,
            },
        }),
    )
    .await
    .expect_err("bad token must be rejected");
    assert_eq!(bad_auth.status, StatusCode::UNAUTHORIZED);

    for name in ["bob", "cyn"] {
        join_server(
            Path(created.server_id.clone()),
            State(state.clone()),
            Json(JoinRequest {
                player_name: name.to_string(),
                player_role: "citizen".to_string(),
            }),
        )
        .await
        .expect("join under cap");
    }
    let full = join_server(
        Path(created.server_id.clone()),
        State(state.clone()),
        Json(JoinRequest {
            player_name: "dee".to_string(),
            player_role: "citizen".to_string(),
        }),
    )
    .await
    .expect_err("fourth player exceeds cap");
    assert_eq!(full.status, StatusCode::FORBIDDEN);
    assert_eq!(full.error.error_code, ErrorCode::ServerFull);

    let missing = server_status(Path("srv_missing".to_string()), State(state.clone()))
        .await
        .expect_err("unknown game");
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn over_pending_submission_hits_rate_limit() {
    let state = AppState::new(test_options());
    let created = create_server(
        State(state.clone()),
        Json(JoinRequest {
            player_name: "ada".to_string(),
            player_role: "citizen".to_string(),
        }),
    )
    .await
    .expect("create should succeed")
    .0;

    for _ in 0..5 {
        submit_action(
            Path(created.server_id.clone()),
            State(state.clone()),
            Json(ActionRequest {
                player_id: created.player_id.clone(),
                player_token: created.player_token.clone(),
                action: PlayerAction {
                    action_type: "work".to_string(),
                    params: Value::Null,
                },
            }),
        )
        .await
        .expect("within limit");
    }

    let sixth = submit_action(
        Path(created.server_id.clone()),
        State(state.clone()),
        Json(ActionRequest {
            player_id: created.player_id.clone(),
            player_token: created.player_token.clone(),
            action: PlayerAction {
                action_type: "work".to_string(),
                params: Value::Null,
            },
        }),
    )
    .await
    .expect_err("sixth submission exceeds the pending cap");
    assert_eq!(sixth.status, StatusCode::TOO_MANY_REQUESTS);

    let game = state.require_game(&created.server_id).await.unwrap();
    let pending = game
        .lock()
        .await
        .world()
        .player(&created.player_id)
        .unwrap()
        .actions_pending
        .len();
    assert_eq!(pending, 5);
}

async fn health() -> Json<Value> {
    Json(json!({
        "game": SERVICE_NAME,
        "status": "ok",
        "timestamp": epoch_ms(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequest {
    player_name: String,
    player_role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateServerResponse {
    server_id: String,
    player_id: String,
    player_token: String,
    tick: u64,
    tick_deadline: u64,
}

async fn create_server(
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<CreateServerResponse>, HttpApiError> {
    let role = parse_role(&request.player_role)?;
    if request.player_name.trim().is_empty() {
        return Err(HttpApiError::invalid_query("playerName must not be empty", None));
    }

    let now_ms = epoch_ms();
    let (server_id, seed) = {
        let mut inner = state.inner.lock().await;
        inner.created_count += 1;
        derive_server_credentials(now_ms, inner.created_count)
    };

    let mut config = GameConfig::new(server_id.clone(), seed);
    config.tick_interval_hours = state.options.tick_interval_hours;
    config.max_players = state.options.max_players;

    let mut api = EngineApi::create(config, now_ms);
    if let Some(path) = state.options.sqlite_path.as_deref() {
        api.attach_sqlite_store(path)
            .map_err(|err| HttpApiError::internal("could not attach game store", Some(err.to_string())))?;
    }
    let grant = api
        .join(request.player_name.trim(), role)
        .map_err(HttpApiError::from_api)?;
    state.insert_game(server_id.clone(), api).await;

    tracing::info!(server = server_id.as_str(), "game created");
    Ok(Json(CreateServerResponse {
        server_id,
        player_id: grant.player_id,
        player_token: grant.player_token,
        tick: grant.tick,
        tick_deadline: grant.tick_deadline_ms,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinServerResponse {
    player_id: String,
    player_token: String,
    tick: u64,
    tick_deadline: u64,
}

async fn join_server(
    Path(server_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinServerResponse>, HttpApiError> {
    let role = parse_role(&request.player_role)?;
    if request.player_name.trim().is_empty() {
        return Err(HttpApiError::invalid_query("playerName must not be empty", None));
    }

    let game = state.require_game(&server_id).await?;
    let grant = {
        let mut api = game.lock().await;
        api.join(request.player_name.trim(), role)
            .map_err(HttpApiError::from_api)?
    };

    Ok(Json(JoinServerResponse {
        player_id: grant.player_id,
        player_token: grant.player_token,
        tick: grant.tick,
        tick_deadline: grant.tick_deadline_ms,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewQuery {
    player_id: String,
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewResponse {
    view: PlayerView,
    tick: u64,
    phase: Phase,
    tick_deadline: u64,
}

async fn view_server(
    Path(server_id): Path<String>,
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ViewResponse>, HttpApiError> {
    let game = state.require_game(&server_id).await?;
    let api = game.lock().await;
    let view = api
        .view(&query.player_id, &query.token)
        .map_err(HttpApiError::from_api)?;
    let meta = &api.world().state().meta;

    Ok(Json(ViewResponse {
        view,
        tick: meta.tick,
        phase: meta.phase,
        tick_deadline: meta.tick_deadline_ms,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionRequest {
    player_id: String,
    player_token: String,
    action: PlayerAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResponse {
    success: bool,
    pending_count: usize,
    tick: u64,
}

async fn submit_action(
    Path(server_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, HttpApiError> {
    let game = state.require_game(&server_id).await?;
    let mut api = game.lock().await;
    let pending_count = api
        .submit_action(&request.player_id, &request.player_token, request.action)
        .map_err(HttpApiError::from_api)?;

    Ok(Json(ActionResponse {
        success: true,
        pending_count,
        tick: api.tick(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerSummary {
    id: String,
    name: String,
    role: Role,
    alive: bool,
    pending_actions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    initialized: bool,
    server_id: String,
    tick: u64,
    phase: Phase,
    tick_deadline: u64,
    player_count: usize,
    law_count: usize,
    event_count: usize,
    players: Vec<PlayerSummary>,
}

async fn server_status(
    Path(server_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, HttpApiError> {
    let game = state.require_game(&server_id).await?;
    let api = game.lock().await;
    let world_state = api.world().state();

    let players = world_state
        .players
        .values()
        .map(|player| PlayerSummary {
            id: player.id.clone(),
            name: player.name.clone(),
            role: player.role,
            alive: player.alive,
            pending_actions: player.actions_pending.len(),
        })
        .collect();

    Ok(Json(StatusResponse {
        initialized: true,
        server_id: world_state.meta.server_id.clone(),
        tick: world_state.meta.tick,
        phase: world_state.meta.phase,
        tick_deadline: world_state.meta.tick_deadline_ms,
        player_count: world_state.players.len(),
        law_count: world_state.laws.len(),
        event_count: world_state.events.len(),
        players,
    }))
}

/// Per-process options the CLI wires from the environment.
#[derive(Clone)]
pub struct ServerOptions {
    /// `None` disables persistence (handler tests).
    pub sqlite_path: Option<String>,
    pub tick_interval_hours: u32,
    pub max_players: u16,
    pub advisors: Arc<dyn AdvisorSuite + Send + Sync>,
    /// Disabled in tests so ticks only run when driven explicitly.
    pub schedule_ticks: bool,
}

impl ServerOptions {
    pub fn new(advisors: Arc<dyn AdvisorSuite + Send + Sync>) -> Self {
        Self {
            sqlite_path: Some(default_sqlite_path()),
            tick_interval_hours: 4,
            max_players: 20,
            advisors,
            schedule_ticks: true,
        }
    }
}

#[derive(Clone)]
struct AppState {
    inner: Arc<Mutex<Registry>>,
    options: Arc<ServerOptions>,
}

#[derive(Default)]
struct Registry {
    games: BTreeMap<String, Arc<Mutex<EngineApi>>>,
    created_count: u64,
}

impl AppState {
    fn new(options: ServerOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry::default())),
            options: Arc::new(options),
        }
    }

    /// Reload every persisted game and restart its scheduler. Best-effort:
    /// a game that fails to load is logged and skipped, the rest still come up.
    async fn restore_persisted_games(&self) {
        let Some(path) = self.options.sqlite_path.clone() else {
            return;
        };
        let store = match SqliteGameStore::open(&path) {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(%err, path = path.as_str(), "could not open game store");
                return;
            }
        };
        let server_ids = match store.list_server_ids() {
            Ok(ids) => ids,
            Err(err) => {
                tracing::warn!(%err, "could not list persisted games");
                return;
            }
        };

        for server_id in server_ids {
            let loaded = store.load_game(&server_id).and_then(|game| {
                let tokens = store.load_tokens(&server_id)?;
                Ok(game.map(|(config, state)| (config, state, tokens)))
            });
            match loaded {
                Ok(Some((config, state, tokens))) => {
                    let mut api = EngineApi::from_parts(config, state, tokens);
                    if let Err(err) = api.attach_sqlite_store(&path) {
                        tracing::warn!(server = server_id.as_str(), %err, "reattach failed");
                        continue;
                    }
                    self.insert_game(server_id.clone(), api).await;
                    tracing::info!(server = server_id.as_str(), "restored persisted game");
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(server = server_id.as_str(), %err, "skipping unloadable game");
                }
            }
        }
    }

    async fn insert_game(&self, server_id: String, api: EngineApi) -> Arc<Mutex<EngineApi>> {
        let game = Arc::new(Mutex::new(api));
        {
            let mut inner = self.inner.lock().await;
            inner.games.insert(server_id.clone(), game.clone());
        }
        if self.options.schedule_ticks {
            spawn_tick_loop(server_id, Arc::downgrade(&game), self.options.advisors.clone());
        }
        game
    }

    async fn require_game(&self, server_id: &str) -> Result<Arc<Mutex<EngineApi>>, HttpApiError> {
        let inner = self.inner.lock().await;
        inner
            .games
            .get(server_id)
            .cloned()
            .ok_or_else(|| HttpApiError::game_not_found(server_id))
    }
}

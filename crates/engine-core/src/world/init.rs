use contracts::{
    BusinessRecord, CitizenRecord, Era, GameConfig, HiddenStats, Phase, Player, PoliticianRecord,
    Role, VisibleStats, WorldState,
};

/// Baseline world for a fresh game. Numeric starting points sit comfortably
/// inside their hard constraints so the first recalculation is well-behaved.
pub(super) fn initial_state(config: &GameConfig, now_ms: u64) -> WorldState {
    let mut state = WorldState::default();
    state.meta.server_id = config.server_id.clone();
    state.meta.seed = config.seed;
    state.meta.tick_interval_hours = config.tick_interval_hours;
    state.meta.tick_deadline_ms = now_ms + config.tick_interval_ms();
    state.meta.phase = Phase::AcceptingActions;
    state.history.eras.push(Era {
        name: "Founding Era".to_string(),
        tick_start: 0,
        tick_end: None,
        summary: None,
    });
    state
}

pub(super) fn new_player(
    state: &WorldState,
    player_id: &str,
    name: &str,
    role: Role,
    tick: u64,
) -> Player {
    let mut player = Player {
        id: player_id.to_string(),
        name: name.to_string(),
        role,
        joined_tick: tick,
        alive: true,
        hidden_stats: HiddenStats::default(),
        visible_stats: VisibleStats {
            wealth: 0.0,
            movement_id: None,
        },
        citizen: None,
        business: None,
        politician: None,
        actions_pending: Vec::new(),
        actions_history: Vec::new(),
    };

    match role {
        Role::Citizen => {
            // Employment is a persistent field: wired once at join to the
            // first business owner, never reassigned by action handlers.
            let employer_id = state
                .players
                .values()
                .find(|candidate| candidate.alive && candidate.role == Role::BusinessOwner)
                .map(|candidate| candidate.id.clone());
            player.visible_stats.wealth = 100.0;
            player.citizen = Some(CitizenRecord {
                employed: employer_id.is_some(),
                employer_id,
                satisfaction: 60.0,
                economic_pressure: 0.0,
                radicalization: 0.0,
                voted_this_tick: false,
            });
        }
        Role::BusinessOwner => {
            player.visible_stats.wealth = 500.0;
            player.hidden_stats.influence = 2.0;
            player.business = Some(BusinessRecord {
                production_capacity: 50.0,
                employees: 5,
                wage_level: 1.0,
                strike_risk: 0.1,
                tax_evasion: 0.0,
            });
        }
        Role::Politician => {
            player.visible_stats.wealth = 200.0;
            player.hidden_stats.influence = 5.0;
            player.politician = Some(PoliticianRecord {
                laws_proposed: 0,
                laws_passed: 0,
                lobby_money_received: 0.0,
                tax_evasion: 0.0,
                statements: Default::default(),
            });
        }
    }

    player
}

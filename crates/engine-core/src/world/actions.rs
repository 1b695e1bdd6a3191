//! Action resolution: queued submissions become state mutations.
//!
//! Handlers never read the clock and never call advisors. A malformed or
//! inapplicable action is a silent no-op; only well-formed submissions touch
//! state, and every write to a constrained path goes through the kernel.

use contracts::{
    ActionType, Law, LawStatus, MovementType, Role, SubmittedAction, VoteChoice, VoteTally,
    ACTION_HISTORY_GROUPS, LAW_TEXT_MAX_CHARS, STATEMENT_MAX_CHARS,
};
use serde::Deserialize;
use serde_json::Value;

use super::tick::TickCounters;
use super::GameWorld;
use crate::{kernel, rng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Resolved,
    Skipped,
}

#[derive(Debug, Deserialize)]
struct VoteLawParams {
    law_id: String,
    choice: String,
}

#[derive(Debug, Deserialize)]
struct JoinMovementParams {
    movement_id: String,
}

#[derive(Debug, Deserialize)]
struct SetWagesParams {
    wage_level: f64,
}

#[derive(Debug, Deserialize)]
struct LobbyParams {
    target_player_id: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct ProposeLawParams {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AllocateBudgetParams {
    welfare: f64,
    infrastructure: f64,
    enforcement: f64,
    education: f64,
    discretionary: f64,
}

#[derive(Debug, Deserialize)]
struct PublishStatementParams {
    text: String,
}

fn parse_params<T: serde::de::DeserializeOwned>(params: &Value) -> Option<T> {
    serde_json::from_value(params.clone()).ok()
}

impl GameWorld {
    /// Move every pending action into its player's history, exactly once per
    /// tick, and return the drained groups in player-id order.
    pub(super) fn drain_pending_actions(&mut self, tick: u64) -> Vec<(String, Vec<SubmittedAction>)> {
        let mut drained = Vec::new();
        for (player_id, player) in self.state.players.iter_mut() {
            let actions = std::mem::take(&mut player.actions_pending);
            player.actions_history.push(contracts::ActionHistoryGroup {
                tick,
                actions: actions.clone(),
            });
            while player.actions_history.len() > ACTION_HISTORY_GROUPS {
                player.actions_history.remove(0);
            }
            drained.push((player_id.clone(), actions));
        }
        drained
    }

    pub(super) fn resolve_actions(
        &mut self,
        tick: u64,
        drained: &[(String, Vec<SubmittedAction>)],
        counters: &mut TickCounters,
    ) {
        for (player_id, actions) in drained {
            for action in actions {
                let outcome = match ActionType::parse(&action.action_type) {
                    Some(action_type) => self.resolve_one(tick, player_id, action_type, &action.params),
                    None => {
                        tracing::warn!(
                            player = player_id.as_str(),
                            action_type = action.action_type.as_str(),
                            "skipping unknown action type"
                        );
                        Outcome::Skipped
                    }
                };
                match outcome {
                    Outcome::Resolved => counters.actions_resolved += 1,
                    Outcome::Skipped => counters.actions_skipped += 1,
                }
            }
        }
    }

    fn resolve_one(
        &mut self,
        tick: u64,
        player_id: &str,
        action_type: ActionType,
        params: &Value,
    ) -> Outcome {
        match action_type {
            ActionType::Work => self.action_work(player_id),
            ActionType::Consume => self.action_consume(player_id),
            ActionType::VoteLaw => self.action_vote_law(player_id, params, 1.0),
            ActionType::JoinMovement => self.action_join_movement(player_id, params),
            ActionType::LeaveMovement => self.action_leave_movement(player_id),
            ActionType::Produce => self.action_produce(player_id),
            ActionType::SetWages => self.action_set_wages(player_id, params),
            ActionType::Lobby => self.action_lobby(player_id, params),
            ActionType::EvadeTaxes => self.action_evade_taxes(player_id),
            ActionType::ComplyTaxes => self.action_comply_taxes(player_id),
            ActionType::ProposeLaw => self.action_propose_law(tick, player_id, params),
            ActionType::VoteLawPolitician => self.action_vote_law(player_id, params, 3.0),
            ActionType::AllocateBudget => self.action_allocate_budget(player_id, params),
            ActionType::PublishStatement => self.action_publish_statement(tick, player_id, params),
        }
    }

    fn action_work(&mut self, player_id: &str) -> Outcome {
        let Some(player) = self.state.players.get(player_id) else {
            return Outcome::Skipped;
        };
        let Some(citizen) = player.citizen.as_ref() else {
            return Outcome::Skipped;
        };

        let employer_wage = citizen
            .employer_id
            .as_deref()
            .and_then(|employer| self.state.players.get(employer))
            .and_then(|employer| employer.business.as_ref())
            .map(|business| business.wage_level);

        match (citizen.employed, employer_wage) {
            (true, Some(wage_level)) => {
                let wage = self.state.economy.wage_index * wage_level;
                kernel::add(&mut self.state, "economy.gdp", 0.01 * wage);
                if let Some(player) = self.state.players.get_mut(player_id) {
                    player.visible_stats.wealth += wage;
                    if let Some(citizen) = player.citizen.as_mut() {
                        citizen.satisfaction = (citizen.satisfaction + 1.0).min(100.0);
                    }
                }
            }
            _ => {
                if let Some(citizen) = self
                    .state
                    .players
                    .get_mut(player_id)
                    .and_then(|player| player.citizen.as_mut())
                {
                    citizen.economic_pressure = (citizen.economic_pressure + 5.0).min(100.0);
                }
            }
        }
        Outcome::Resolved
    }

    fn action_consume(&mut self, player_id: &str) -> Outcome {
        let Some(player) = self.state.players.get(player_id) else {
            return Outcome::Skipped;
        };
        if player.citizen.is_none() {
            return Outcome::Skipped;
        }
        let wealth = player.visible_stats.wealth;
        let amount = (0.3 * wealth).min(0.01 * self.state.economy.market.supply);

        if amount <= 0.0 {
            if let Some(citizen) = self
                .state
                .players
                .get_mut(player_id)
                .and_then(|player| player.citizen.as_mut())
            {
                citizen.economic_pressure = (citizen.economic_pressure + 8.0).min(100.0);
            }
            return Outcome::Resolved;
        }

        kernel::add(&mut self.state, "economy.market.demand", 0.1 * amount);
        kernel::add(&mut self.state, "economy.market.supply", -0.05 * amount);
        if let Some(player) = self.state.players.get_mut(player_id) {
            player.visible_stats.wealth -= amount;
            if let Some(citizen) = player.citizen.as_mut() {
                citizen.satisfaction = (citizen.satisfaction + 3.0).min(100.0);
            }
        }
        Outcome::Resolved
    }

    fn action_vote_law(&mut self, player_id: &str, params: &Value, weight: f64) -> Outcome {
        let Some(params) = parse_params::<VoteLawParams>(params) else {
            return Outcome::Skipped;
        };
        let Some(choice) = VoteChoice::parse(&params.choice) else {
            return Outcome::Skipped;
        };

        let Some(law) = self
            .state
            .laws
            .iter_mut()
            .find(|law| law.id == params.law_id && law.status == LawStatus::Voting)
        else {
            return Outcome::Skipped;
        };
        tally_vote(&mut law.votes, choice, weight);

        if let Some(player) = self.state.players.get_mut(player_id) {
            if let Some(citizen) = player.citizen.as_mut() {
                citizen.voted_this_tick = true;
            }
            player.hidden_stats.influence += 0.5;
        }
        Outcome::Resolved
    }

    fn action_join_movement(&mut self, player_id: &str, params: &Value) -> Outcome {
        let Some(params) = parse_params::<JoinMovementParams>(params) else {
            return Outcome::Skipped;
        };
        if self.state.movement(&params.movement_id).is_none() {
            return Outcome::Skipped;
        }

        // Membership is exclusive: leaving the previous movement keeps
        // movement_id consistent with member lists.
        let previous = self
            .state
            .players
            .get(player_id)
            .and_then(|player| player.visible_stats.movement_id.clone());
        if let Some(previous_id) = previous {
            if let Some(movement) = self.state.movement_mut(&previous_id) {
                movement.member_player_ids.retain(|member| member != player_id);
            }
        }

        let mut joined_radical = false;
        if let Some(movement) = self.state.movement_mut(&params.movement_id) {
            if !movement.member_player_ids.iter().any(|member| member == player_id) {
                movement.member_player_ids.push(player_id.to_string());
            }
            joined_radical = movement.movement_type == MovementType::Radical;
        }

        if let Some(player) = self.state.players.get_mut(player_id) {
            player.visible_stats.movement_id = Some(params.movement_id);
            player.hidden_stats.influence += 2.0;
            if joined_radical {
                if let Some(citizen) = player.citizen.as_mut() {
                    citizen.radicalization = (citizen.radicalization + 10.0).min(100.0);
                }
            }
        }
        Outcome::Resolved
    }

    fn action_leave_movement(&mut self, player_id: &str) -> Outcome {
        let Some(movement_id) = self
            .state
            .players
            .get(player_id)
            .and_then(|player| player.visible_stats.movement_id.clone())
        else {
            return Outcome::Skipped;
        };

        if let Some(movement) = self.state.movement_mut(&movement_id) {
            movement.member_player_ids.retain(|member| member != player_id);
        }
        if let Some(player) = self.state.players.get_mut(player_id) {
            player.visible_stats.movement_id = None;
        }
        Outcome::Resolved
    }

    fn action_produce(&mut self, player_id: &str) -> Outcome {
        let Some(business) = self
            .state
            .players
            .get(player_id)
            .and_then(|player| player.business.as_ref())
        else {
            return Outcome::Skipped;
        };

        let halve_capacity = business.strike_risk > 0.8;
        let capacity = if halve_capacity {
            business.production_capacity * 0.5
        } else {
            business.production_capacity
        };
        let employees = business.employees;
        let wage_level = business.wage_level;

        let output = capacity;
        let price_index = self.state.economy.market.price_index;
        let wage_index = self.state.economy.wage_index;
        kernel::add(&mut self.state, "economy.market.supply", capacity);
        kernel::add(&mut self.state, "economy.gdp", 0.1 * output);

        let profit = output * price_index - f64::from(employees) * wage_level * wage_index;
        if let Some(player) = self.state.players.get_mut(player_id) {
            if let Some(business) = player.business.as_mut() {
                if halve_capacity {
                    business.production_capacity = capacity;
                }
            }
            player.visible_stats.wealth += profit.max(0.0);
            player.hidden_stats.influence += 1.0;
        }
        Outcome::Resolved
    }

    fn action_set_wages(&mut self, player_id: &str, params: &Value) -> Outcome {
        let Some(params) = parse_params::<SetWagesParams>(params) else {
            return Outcome::Skipped;
        };
        if !params.wage_level.is_finite() {
            return Outcome::Skipped;
        }
        let new_level = params.wage_level.max(0.1).min(10.0);

        let Some(business) = self
            .state
            .players
            .get(player_id)
            .and_then(|player| player.business.as_ref())
        else {
            return Outcome::Skipped;
        };
        let old_level = business.wage_level;
        let wage_index = self.state.economy.wage_index;

        if let Some(business) = self
            .state
            .players
            .get_mut(player_id)
            .and_then(|player| player.business.as_mut())
        {
            if new_level < 0.7 * wage_index {
                business.strike_risk = (business.strike_risk + 0.15).min(1.0);
            } else if new_level > 1.2 * wage_index {
                business.strike_risk = (business.strike_risk - 0.1).max(0.0);
            }
            business.wage_level = new_level;
        }
        kernel::add(&mut self.state, "economy.wage_index", 0.01 * (new_level - old_level));
        Outcome::Resolved
    }

    fn action_lobby(&mut self, player_id: &str, params: &Value) -> Outcome {
        let Some(params) = parse_params::<LobbyParams>(params) else {
            return Outcome::Skipped;
        };
        if !params.amount.is_finite() || params.amount <= 0.0 {
            return Outcome::Skipped;
        }
        let Some(lobbier) = self.state.players.get(player_id) else {
            return Outcome::Skipped;
        };
        let actual = (0.2 * lobbier.visible_stats.wealth).min(params.amount);
        if actual <= 0.0 {
            return Outcome::Skipped;
        }

        let target_is_politician = self
            .state
            .players
            .get(&params.target_player_id)
            .is_some_and(|target| target.politician.is_some());
        if !target_is_politician {
            return Outcome::Skipped;
        }

        if let Some(target) = self.state.players.get_mut(&params.target_player_id) {
            if let Some(politician) = target.politician.as_mut() {
                politician.lobby_money_received += actual;
            }
            target.hidden_stats.corruption += 0.5 * actual;
        }
        if let Some(lobbier) = self.state.players.get_mut(player_id) {
            lobbier.visible_stats.wealth -= actual;
            lobbier.hidden_stats.influence += 3.0;
            lobbier.hidden_stats.corruption += 2.0;
        }
        Outcome::Resolved
    }

    fn action_evade_taxes(&mut self, player_id: &str) -> Outcome {
        let Some(player) = self.state.players.get(player_id) else {
            return Outcome::Skipped;
        };
        if player.business.is_none() {
            return Outcome::Skipped;
        }
        let kept = 0.05 * player.visible_stats.wealth * self.state.economy.tax_rate / 100.0;

        kernel::add(&mut self.state, "economy.tax_compliance", -0.02);
        if let Some(player) = self.state.players.get_mut(player_id) {
            if let Some(business) = player.business.as_mut() {
                business.tax_evasion = (business.tax_evasion + 0.1).min(1.0);
            }
            player.visible_stats.wealth += kept;
            player.hidden_stats.corruption += 1.5;
        }
        Outcome::Resolved
    }

    fn action_comply_taxes(&mut self, player_id: &str) -> Outcome {
        let Some(player) = self.state.players.get(player_id) else {
            return Outcome::Skipped;
        };
        if player.business.is_none() {
            return Outcome::Skipped;
        }
        let paid = 0.02 * player.visible_stats.wealth * self.state.economy.tax_rate / 100.0;

        kernel::add(&mut self.state, "economy.tax_compliance", 0.01);
        if let Some(player) = self.state.players.get_mut(player_id) {
            if let Some(business) = player.business.as_mut() {
                business.tax_evasion = (business.tax_evasion - 0.1).max(0.0);
            }
            player.visible_stats.wealth -= paid;
            player.hidden_stats.reputation += 0.5;
        }
        Outcome::Resolved
    }

    fn action_propose_law(&mut self, tick: u64, player_id: &str, params: &Value) -> Outcome {
        let Some(params) = parse_params::<ProposeLawParams>(params) else {
            return Outcome::Skipped;
        };
        let text = params.text.trim();
        if text.is_empty() || text.chars().count() > LAW_TEXT_MAX_CHARS {
            return Outcome::Skipped;
        }
        if self
            .state
            .players
            .get(player_id)
            .and_then(|player| player.politician.as_ref())
            .is_none()
        {
            return Outcome::Skipped;
        }

        let law_id = rng::seeded_id("law", self.state.meta.seed, self.state.laws.len() as u64, 0);
        self.state.laws.push(Law {
            id: law_id,
            proposer: player_id.to_string(),
            proposed_tick: tick,
            original_text: text.to_string(),
            status: LawStatus::Proposed,
            votes: VoteTally::default(),
            judiciary_interpretation: None,
            activated_tick: None,
            repealed_tick: None,
        });

        if let Some(player) = self.state.players.get_mut(player_id) {
            if let Some(politician) = player.politician.as_mut() {
                politician.laws_proposed += 1;
            }
            player.hidden_stats.influence += 3.0;
        }
        Outcome::Resolved
    }

    fn action_allocate_budget(&mut self, player_id: &str, params: &Value) -> Outcome {
        let Some(params) = parse_params::<AllocateBudgetParams>(params) else {
            return Outcome::Skipped;
        };
        let fractions = [
            params.welfare,
            params.infrastructure,
            params.enforcement,
            params.education,
            params.discretionary,
        ];
        if fractions.iter().any(|f| !f.is_finite() || !(0.0..=1.0).contains(f)) {
            return Outcome::Skipped;
        }
        let sum: f64 = fractions.iter().sum();
        if (sum - 1.0).abs() > 0.01 {
            return Outcome::Skipped;
        }
        if self
            .state
            .players
            .get(player_id)
            .and_then(|player| player.politician.as_ref())
            .is_none()
        {
            return Outcome::Skipped;
        }

        let allocation = &mut self.state.government.budget_allocation;
        allocation.welfare = params.welfare;
        allocation.infrastructure = params.infrastructure;
        allocation.enforcement = params.enforcement;
        allocation.education = params.education;
        allocation.discretionary = params.discretionary;

        if let Some(player) = self.state.players.get_mut(player_id) {
            player.hidden_stats.influence += 2.0;
        }
        Outcome::Resolved
    }

    fn action_publish_statement(&mut self, tick: u64, player_id: &str, params: &Value) -> Outcome {
        let Some(params) = parse_params::<PublishStatementParams>(params) else {
            return Outcome::Skipped;
        };
        if params.text.chars().count() > STATEMENT_MAX_CHARS {
            return Outcome::Skipped;
        }
        let Some(player) = self.state.players.get_mut(player_id) else {
            return Outcome::Skipped;
        };
        if player.role != Role::Politician {
            return Outcome::Skipped;
        }
        if let Some(politician) = player.politician.as_mut() {
            politician.statements.insert(tick, params.text);
        }
        player.hidden_stats.reputation += 0.5;
        Outcome::Resolved
    }
}

fn tally_vote(votes: &mut VoteTally, choice: VoteChoice, weight: f64) {
    match choice {
        VoteChoice::For => votes.for_ += weight,
        VoteChoice::Against => votes.against += weight,
        VoteChoice::Abstain => votes.abstain += weight,
    }
}

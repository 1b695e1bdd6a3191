//! The advisor pipeline: six staged consultations, validated and applied.
//!
//! Stages run strictly in order and never block each other: every failure
//! path lands on the stage's documented fallback and the tick carries on.
//! Raw outputs are recorded for the tick log exactly as the transport
//! returned them.

use std::collections::BTreeMap;

use contracts::{
    AdvisorStage, AnalystOutput, Article, CrisisOutput, Era, EventSource, EventStatus, GameEvent,
    Headline, HistorianOutput, JudiciaryInterpretation, JudiciaryOutput, LawImplementation,
    MediaOutput, Movement, MovementAction, MovementDirective, MovementType, ReactionOutput, Rumor,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::tick::TickCounters;
use super::GameWorld;
use crate::advisor::{AdvisorError, AdvisorSuite};
use crate::{kernel, rng};

const MEDIA_FALLBACK_HEADLINES: [&str; 2] = [
    "Officials report an uneventful period across the nation",
    "Markets hold steady while the government deliberates",
];
const ARTICLE_CAP: usize = 20;
const RECENT_EVENTS_IN_INPUT: usize = 5;

/// Presence check for the stage's required top-level fields, then a strict
/// deserialize. A field that is present but `null` passes the presence check
/// and is judged by the record's own serde defaults.
fn validated<T: DeserializeOwned>(stage: AdvisorStage, raw: &Value) -> Result<T, AdvisorError> {
    let Some(object) = raw.as_object() else {
        return Err(AdvisorError::UnexpectedShape(stage));
    };
    for field in stage.required_fields() {
        if !object.contains_key(*field) {
            return Err(AdvisorError::MissingField { stage, field });
        }
    }
    serde_json::from_value(raw.clone()).map_err(|err| AdvisorError::Parse(err.to_string()))
}

fn failure_record(error: &AdvisorError) -> Value {
    json!({ "error": error.to_string() })
}

impl GameWorld {
    pub(super) fn run_advisor_pipeline(
        &mut self,
        tick: u64,
        newly_active: &[String],
        advisors: &dyn AdvisorSuite,
        counters: &mut TickCounters,
        outputs: &mut BTreeMap<String, Value>,
        sequence: &mut u64,
    ) {
        let analyst = self.stage_analyst(tick, advisors, counters, outputs);
        self.stage_judiciary(newly_active, advisors, counters, outputs);
        self.stage_media(tick, &analyst, advisors, counters, outputs, sequence);
        self.stage_reaction(tick, &analyst, advisors, counters, outputs, sequence);
        self.stage_crisis(tick, advisors, counters, outputs, sequence);
    }

    // -- analyst ------------------------------------------------------------

    fn stage_analyst(
        &mut self,
        tick: u64,
        advisors: &dyn AdvisorSuite,
        counters: &mut TickCounters,
        outputs: &mut BTreeMap<String, Value>,
    ) -> AnalystOutput {
        let input = self.analyst_input(tick);
        let projections = input.get("projections").cloned().unwrap_or(Value::Null);

        let attempt = match advisors.consult(AdvisorStage::Analyst, &input) {
            Ok(Some(raw)) => validated::<AnalystOutput>(AdvisorStage::Analyst, &raw)
                .map(|output| (output, raw)),
            Ok(None) => Err(AdvisorError::UnexpectedShape(AdvisorStage::Analyst)),
            Err(error) => Err(error),
        };

        match attempt {
            Ok((mut output, raw)) => {
                output.confidence = output.confidence.clamp(0.0, 1.0);
                outputs.insert("analyst".to_string(), raw);
                output
            }
            Err(error) => {
                tracing::warn!(%error, "analyst stage fell back");
                counters.advisor_failures += 1;
                outputs.insert("analyst".to_string(), failure_record(&error));
                AnalystOutput::fallback(projections)
            }
        }
    }

    fn analyst_input(&self, tick: u64) -> Value {
        let economy = &self.state.economy;
        let society = &self.state.society;
        let recent_events: Vec<Value> = self
            .state
            .events
            .iter()
            .rev()
            .take(RECENT_EVENTS_IN_INPUT)
            .map(|event| json!({ "type": event.event_type, "severity": event.severity }))
            .collect();
        json!({
            "tick": tick,
            "economy": {
                "gdp": economy.gdp,
                "gdp_delta": economy.gdp_delta,
                "inflation": economy.inflation,
                "unemployment": economy.unemployment,
                "tax_rate": economy.tax_rate,
                "price_index": economy.market.price_index,
                "shortage": economy.market.shortage,
            },
            "society": {
                "stability": society.stability,
                "public_trust": society.public_trust,
                "satisfaction": society.satisfaction,
                "radicalization": society.radicalization,
                "protest_pressure": society.protest_pressure,
            },
            "approval": self.state.government.approval.overall,
            "recent_events": recent_events,
            "projections": {
                "gdp": economy.gdp,
                "inflation": economy.inflation,
                "unemployment": economy.unemployment,
            },
        })
    }

    // -- judiciary ----------------------------------------------------------

    fn stage_judiciary(
        &mut self,
        newly_active: &[String],
        advisors: &dyn AdvisorSuite,
        counters: &mut TickCounters,
        outputs: &mut BTreeMap<String, Value>,
    ) {
        let mut records = Vec::with_capacity(newly_active.len());

        for law_id in newly_active {
            let Some(input) = self.judiciary_input(law_id) else {
                continue;
            };

            let attempt = match advisors.consult(AdvisorStage::Judiciary, &input) {
                Ok(Some(raw)) => validated::<JudiciaryOutput>(AdvisorStage::Judiciary, &raw)
                    .map(|output| (output, raw)),
                Ok(None) => Err(AdvisorError::UnexpectedShape(AdvisorStage::Judiciary)),
                Err(error) => Err(error),
            };

            let (interpretation, record) = match attempt {
                Ok((output, raw)) => (
                    JudiciaryInterpretation {
                        interpretation: output.interpretation,
                        ambiguities: output.ambiguities,
                        implementation: output.implementation,
                        rejected_by_core: false,
                    },
                    raw,
                ),
                Err(error) => {
                    tracing::warn!(law = law_id.as_str(), %error, "judiciary stage fell back");
                    counters.advisor_failures += 1;
                    (noop_interpretation(), failure_record(&error))
                }
            };
            records.push(json!({ "law_id": law_id, "output": record }));

            let modifiers = interpretation.implementation.modifiers.clone();
            if let Some(law) = self.state.law_mut(law_id) {
                law.judiciary_interpretation = Some(interpretation);
            }

            if !modifiers.is_empty() {
                let tag = format!("law:{law_id}");
                if kernel::apply_batch(&mut self.state, &modifiers, &tag).is_err() {
                    if let Some(bound) = self
                        .state
                        .law_mut(law_id)
                        .and_then(|law| law.judiciary_interpretation.as_mut())
                    {
                        bound.rejected_by_core = true;
                    }
                }
            }
        }

        outputs.insert("judiciary".to_string(), Value::Array(records));
    }

    fn judiciary_input(&self, law_id: &str) -> Option<Value> {
        let law = self.state.law(law_id)?;
        Some(json!({
            "law_id": law.id,
            "law_text": law.original_text,
            "proposed_tick": law.proposed_tick,
            "votes": law.votes,
            "addressable_variables": kernel::addressable_paths(),
            "economy": {
                "gdp": self.state.economy.gdp,
                "tax_rate": self.state.economy.tax_rate,
                "wage_index": self.state.economy.wage_index,
            },
        }))
    }

    // -- media --------------------------------------------------------------

    fn stage_media(
        &mut self,
        tick: u64,
        analyst: &AnalystOutput,
        advisors: &dyn AdvisorSuite,
        counters: &mut TickCounters,
        outputs: &mut BTreeMap<String, Value>,
        sequence: &mut u64,
    ) {
        let input = self.media_input(tick, analyst);

        let attempt = match advisors.consult(AdvisorStage::Media, &input) {
            Ok(Some(raw)) => {
                validated::<MediaOutput>(AdvisorStage::Media, &raw).map(|output| (output, raw))
            }
            Ok(None) => Err(AdvisorError::UnexpectedShape(AdvisorStage::Media)),
            Err(error) => Err(error),
        };

        let output = match attempt {
            Ok((output, raw)) => {
                outputs.insert("media".to_string(), raw);
                output
            }
            Err(error) => {
                tracing::warn!(%error, "media stage fell back");
                counters.advisor_failures += 1;
                outputs.insert("media".to_string(), failure_record(&error));
                MediaOutput {
                    headlines: MEDIA_FALLBACK_HEADLINES
                        .iter()
                        .map(|text| contracts::MediaHeadlineOut {
                            text: (*text).to_string(),
                            truth_score: 1.0,
                        })
                        .collect(),
                    articles: Vec::new(),
                    rumors: Vec::new(),
                }
            }
        };

        let seed = self.state.meta.seed;
        self.state.media.headlines = output
            .headlines
            .into_iter()
            .map(|headline| {
                let id = rng::seeded_id("head", seed, tick, next(sequence));
                Headline {
                    id,
                    tick,
                    text: headline.text,
                    truth_score: headline.truth_score.clamp(0.0, 1.0),
                }
            })
            .collect();
        self.state.media.rumors = output
            .rumors
            .into_iter()
            .map(|rumor| {
                let id = rng::seeded_id("rumor", seed, tick, next(sequence));
                Rumor {
                    id,
                    tick,
                    text: rumor.text,
                    credibility: rumor.credibility.clamp(0.0, 1.0),
                }
            })
            .collect();
        for article in output.articles {
            let id = rng::seeded_id("art", seed, tick, next(sequence));
            self.state.media.articles.push(Article {
                id,
                tick,
                title: article.title,
                body: article.body,
                truth_score: article.truth_score.clamp(0.0, 1.0),
            });
        }
        while self.state.media.articles.len() > ARTICLE_CAP {
            self.state.media.articles.remove(0);
        }
    }

    fn media_input(&self, tick: u64, analyst: &AnalystOutput) -> Value {
        // This stage runs before the watchdog and crisis push this tick's
        // events, so the press works from the most recent resolved ones.
        let recent_events: Vec<Value> = self
            .state
            .events
            .iter()
            .rev()
            .take(RECENT_EVENTS_IN_INPUT)
            .map(|event| {
                json!({
                    "type": event.event_type,
                    "severity": event.severity,
                    "description": event.description,
                })
            })
            .collect();
        json!({
            "tick": tick,
            "events": recent_events,
            "trends": analyst.trends,
            "risks": analyst.risks,
            "approval": self.state.government.approval.overall,
            "protest_pressure": self.state.society.protest_pressure,
        })
    }

    // -- reaction -----------------------------------------------------------

    fn stage_reaction(
        &mut self,
        tick: u64,
        analyst: &AnalystOutput,
        advisors: &dyn AdvisorSuite,
        counters: &mut TickCounters,
        outputs: &mut BTreeMap<String, Value>,
        sequence: &mut u64,
    ) {
        let input = self.reaction_input(analyst);

        let attempt = match advisors.consult(AdvisorStage::Reaction, &input) {
            Ok(Some(raw)) => validated::<ReactionOutput>(AdvisorStage::Reaction, &raw)
                .and_then(|output| {
                    if (0.0..=1.0).contains(&output.protest_prob) {
                        Ok((output, raw))
                    } else {
                        Err(AdvisorError::OutOfRange {
                            stage: AdvisorStage::Reaction,
                            field: "protest_prob",
                        })
                    }
                }),
            Ok(None) => Err(AdvisorError::UnexpectedShape(AdvisorStage::Reaction)),
            Err(error) => Err(error),
        };

        match attempt {
            Ok((output, raw)) => {
                outputs.insert("reaction".to_string(), raw);
                kernel::add(&mut self.state, "government.approval.overall", output.approval_delta.overall);
                kernel::add(&mut self.state, "government.approval.economic", output.approval_delta.economic);
                kernel::add(&mut self.state, "government.approval.social", output.approval_delta.social);
                kernel::add(&mut self.state, "government.approval.security", output.approval_delta.security);

                // One-way ratchet: reaction only ever pushes pressure up;
                // the recalculator's decay is the only way down.
                let current = self.state.society.protest_pressure;
                if output.protest_prob > current {
                    let blended = 0.5 * current + 0.5 * output.protest_prob;
                    kernel::write(&mut self.state, "society.protest_pressure", blended);
                }

                for directive in &output.movements {
                    self.apply_movement_directive(tick, directive, sequence);
                }
                for warning in &output.suppressed_warnings {
                    tracing::debug!(warning = warning.as_str(), "reaction suppressed warning");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "reaction stage fell back");
                counters.advisor_failures += 1;
                outputs.insert("reaction".to_string(), failure_record(&error));
                kernel::add(&mut self.state, "government.approval.overall", -1.0);
                kernel::add(&mut self.state, "government.approval.economic", -1.0);
                kernel::add(&mut self.state, "government.approval.social", -1.0);
                kernel::add(&mut self.state, "government.approval.security", -1.0);
                kernel::add(&mut self.state, "society.protest_pressure", 0.02);
            }
        }
    }

    fn reaction_input(&self, analyst: &AnalystOutput) -> Value {
        let movements: Vec<Value> = self
            .state
            .society
            .movements
            .iter()
            .map(|movement| {
                json!({
                    "id": movement.id,
                    "type": movement.movement_type,
                    "strength": movement.strength,
                    "members": movement.member_player_ids.len(),
                })
            })
            .collect();
        json!({
            "approval": self.state.government.approval,
            "satisfaction": self.state.society.satisfaction,
            "stability": self.state.society.stability,
            "radicalization": self.state.society.radicalization,
            "protest_pressure": self.state.society.protest_pressure,
            "movements": movements,
            "risks": analyst.risks,
        })
    }

    fn apply_movement_directive(
        &mut self,
        tick: u64,
        directive: &MovementDirective,
        sequence: &mut u64,
    ) {
        match directive.action {
            MovementAction::Create => {
                let Some(name) = directive.name.clone() else {
                    return;
                };
                let id = rng::seeded_id("mov", self.state.meta.seed, tick, next(sequence));
                self.state.society.movements.push(Movement {
                    id,
                    name,
                    movement_type: directive.movement_type.unwrap_or(MovementType::Populist),
                    strength: directive.strength_delta.unwrap_or(0.1).clamp(0.0, 1.0),
                    demands: directive.demands.clone().unwrap_or_default(),
                    member_player_ids: Vec::new(),
                    created_tick: tick,
                });
            }
            MovementAction::Strengthen => {
                let Some(movement_id) = directive.movement_id.as_deref() else {
                    return;
                };
                if let Some(movement) = self.state.movement_mut(movement_id) {
                    let delta = directive.strength_delta.unwrap_or(0.1);
                    movement.strength = (movement.strength + delta).clamp(0.0, 1.0);
                }
            }
            MovementAction::Dissolve => {
                let Some(movement_id) = directive.movement_id.clone() else {
                    return;
                };
                let Some(position) = self
                    .state
                    .society
                    .movements
                    .iter()
                    .position(|movement| movement.id == movement_id)
                else {
                    return;
                };
                let movement = self.state.society.movements.remove(position);
                for member in movement.member_player_ids {
                    if let Some(player) = self.state.players.get_mut(&member) {
                        player.visible_stats.movement_id = None;
                    }
                }
            }
        }
    }

    // -- crisis -------------------------------------------------------------

    fn stage_crisis(
        &mut self,
        tick: u64,
        advisors: &dyn AdvisorSuite,
        counters: &mut TickCounters,
        outputs: &mut BTreeMap<String, Value>,
        sequence: &mut u64,
    ) {
        let input = self.crisis_input(tick);

        let attempt = match advisors.consult(AdvisorStage::Crisis, &input) {
            // A quiet tick: the crisis advisor may legitimately decline.
            Ok(None) => {
                outputs.insert("crisis".to_string(), Value::Null);
                return;
            }
            Ok(Some(raw)) => {
                validated::<CrisisOutput>(AdvisorStage::Crisis, &raw).and_then(|output| {
                    if (1..=5).contains(&output.severity) {
                        Ok((output, raw))
                    } else {
                        Err(AdvisorError::OutOfRange {
                            stage: AdvisorStage::Crisis,
                            field: "severity",
                        })
                    }
                })
            }
            Err(error) => Err(error),
        };

        match attempt {
            Ok((output, raw)) => {
                outputs.insert("crisis".to_string(), raw);
                let id = rng::seeded_id("evt", self.state.meta.seed, tick, next(sequence));
                self.state.events.push(GameEvent {
                    id,
                    source: EventSource::Crisis,
                    tick,
                    event_type: output.event_type.clone(),
                    severity: output.severity,
                    status: EventStatus::Pending,
                    description: format!("crisis: {}", output.event_type),
                    modifiers: output.modifiers,
                    duration_ticks: output.duration_ticks,
                    expires_tick: None,
                    narrative_hook: output.narrative_hook,
                });
            }
            Err(error) => {
                tracing::warn!(%error, "crisis stage fell back, injecting nothing");
                counters.advisor_failures += 1;
                outputs.insert("crisis".to_string(), failure_record(&error));
            }
        }
    }

    fn crisis_input(&self, tick: u64) -> Value {
        json!({
            "tick": tick,
            "stability_history": self.state.history.stability_samples,
            "gdp_history": self.state.history.gdp_samples,
            "protest_pressure": self.state.society.protest_pressure,
            "shortage": self.state.economy.market.shortage,
            "unemployment": self.state.economy.unemployment,
            "active_events": self
                .state
                .events
                .iter()
                .filter(|event| event.status == EventStatus::Applied && event.expires_tick.is_some())
                .count(),
        })
    }

    // -- historian ----------------------------------------------------------

    pub(super) fn run_historian(
        &mut self,
        tick: u64,
        advisors: &dyn AdvisorSuite,
        counters: &mut TickCounters,
        outputs: &mut BTreeMap<String, Value>,
    ) {
        let input = self.historian_input(tick);

        let attempt = match advisors.consult(AdvisorStage::Historian, &input) {
            Ok(Some(raw)) => validated::<HistorianOutput>(AdvisorStage::Historian, &raw)
                .map(|output| (output, raw)),
            Ok(None) => Err(AdvisorError::UnexpectedShape(AdvisorStage::Historian)),
            Err(error) => Err(error),
        };

        match attempt {
            Ok((output, raw)) => {
                outputs.insert("historian".to_string(), raw);
                if let Some(transition) = output.era_transition {
                    if let Some(open_era) = self.state.history.eras.last_mut() {
                        open_era.tick_end = Some(tick);
                    }
                    self.state.history.eras.push(Era {
                        name: transition.name,
                        tick_start: tick,
                        tick_end: None,
                        summary: transition.summary,
                    });
                }
                for (player_id, record) in output.player_reputations {
                    if self.state.players.contains_key(&player_id) {
                        self.state.history.player_reputations.insert(player_id, record);
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "historian stage fell back, skipping history update");
                counters.advisor_failures += 1;
                outputs.insert("historian".to_string(), failure_record(&error));
            }
        }
    }

    fn historian_input(&self, tick: u64) -> Value {
        let players: Vec<Value> = self
            .state
            .players
            .values()
            .map(|player| {
                json!({
                    "id": player.id,
                    "role": player.role,
                    "influence": player.hidden_stats.influence,
                    "reputation": player.hidden_stats.reputation,
                })
            })
            .collect();
        let tick_events: Vec<Value> = self
            .state
            .events
            .iter()
            .filter(|event| event.tick == tick)
            .map(|event| json!({ "type": event.event_type, "severity": event.severity }))
            .collect();
        json!({
            "tick": tick,
            "current_era": self.state.history.eras.last().map(|era| era.name.clone()),
            "events": tick_events,
            "players": players,
            "reputations": self.state.history.player_reputations,
        })
    }
}

fn noop_interpretation() -> JudiciaryInterpretation {
    JudiciaryInterpretation {
        interpretation: "No binding interpretation could be produced; the law stands without effect."
            .to_string(),
        ambiguities: Vec::new(),
        implementation: LawImplementation {
            affected_variables: Vec::new(),
            modifiers: Vec::new(),
        },
        rejected_by_core: false,
    }
}

fn next(sequence: &mut u64) -> u64 {
    let value = *sequence;
    *sequence += 1;
    value
}

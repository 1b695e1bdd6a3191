//! Modifier kernel: dot-path addressed reads and writes over the state tree.
//!
//! Every numeric mutation outside plain struct code goes through this module
//! so the hard-constraint table is enforced on every write. Addressable
//! leaves are a static table of typed getter/setter pairs; unknown paths and
//! non-numeric leaves are explicit rejections, never panics.

use std::fmt;

use contracts::{Modifier, ModifierOp, WorldState};

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifierRejection {
    /// The dot-path does not resolve to a numeric leaf.
    VariableNotFound(String),
    /// The computed value was NaN or infinite after constraint clamping.
    NotFinite(String),
}

impl fmt::Display for ModifierRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VariableNotFound(variable) => write!(f, "variable_not_found: {variable}"),
            Self::NotFinite(variable) => write!(f, "non-finite result for {variable}"),
        }
    }
}

impl std::error::Error for ModifierRejection {}

/// A batch rejection after rollback: every write already made by the batch
/// has been restored to its prior value.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRejection {
    pub index: usize,
    pub rejection: ModifierRejection,
}

impl fmt::Display for BatchRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "modifier {} rejected: {}", self.index, self.rejection)
    }
}

// ---------------------------------------------------------------------------
// Path table
// ---------------------------------------------------------------------------

struct PathEntry {
    path: &'static str,
    get: fn(&WorldState) -> f64,
    set: fn(&mut WorldState, f64),
    /// Hard constraint (min, max); clamped on every write, never a failure.
    bounds: Option<(f64, f64)>,
}

macro_rules! path_entry {
    ($path:literal, $($field:ident).+, $bounds:expr) => {
        PathEntry {
            path: $path,
            get: |state| state.$($field).+,
            set: |state, value| state.$($field).+ = value,
            bounds: $bounds,
        }
    };
}

static STATE_PATHS: &[PathEntry] = &[
    path_entry!("economy.gdp", economy.gdp, Some((0.0, 100_000.0))),
    path_entry!("economy.gdp_delta", economy.gdp_delta, None),
    path_entry!("economy.inflation", economy.inflation, Some((-20.0, 500.0))),
    path_entry!("economy.unemployment", economy.unemployment, Some((0.0, 100.0))),
    path_entry!("economy.tax_rate", economy.tax_rate, Some((0.0, 100.0))),
    path_entry!("economy.tax_compliance", economy.tax_compliance, Some((0.0, 1.0))),
    path_entry!("economy.wage_index", economy.wage_index, Some((0.01, 100.0))),
    path_entry!("economy.budget.revenue", economy.budget.revenue, None),
    path_entry!("economy.budget.spending", economy.budget.spending, None),
    path_entry!("economy.budget.reserves", economy.budget.reserves, Some((-10_000.0, 100_000.0))),
    path_entry!("economy.budget.deficit", economy.budget.deficit, None),
    path_entry!("economy.market.supply", economy.market.supply, Some((0.0, 100_000.0))),
    path_entry!("economy.market.demand", economy.market.demand, Some((0.0, 100_000.0))),
    path_entry!("economy.market.price_index", economy.market.price_index, Some((0.01, 1_000.0))),
    path_entry!("society.stability", society.stability, Some((0.0, 100.0))),
    path_entry!("society.public_trust", society.public_trust, Some((0.0, 100.0))),
    path_entry!("society.satisfaction", society.satisfaction, Some((0.0, 100.0))),
    path_entry!("society.radicalization", society.radicalization, Some((0.0, 100.0))),
    path_entry!("society.protest_pressure", society.protest_pressure, Some((0.0, 1.0))),
    path_entry!("government.approval.overall", government.approval.overall, Some((0.0, 100.0))),
    path_entry!("government.approval.economic", government.approval.economic, Some((0.0, 100.0))),
    path_entry!("government.approval.social", government.approval.social, Some((0.0, 100.0))),
    path_entry!("government.approval.security", government.approval.security, Some((0.0, 100.0))),
];

fn lookup(path: &str) -> Option<&'static PathEntry> {
    STATE_PATHS.iter().find(|entry| entry.path == path)
}

/// Every addressable dot-path, in table order.
pub fn addressable_paths() -> Vec<&'static str> {
    STATE_PATHS.iter().map(|entry| entry.path).collect()
}

/// Current value of an addressable leaf.
pub fn get(state: &WorldState, path: &str) -> Option<f64> {
    lookup(path).map(|entry| (entry.get)(state))
}

/// Hard constraint for a path, if the table binds one.
pub fn bounds(path: &str) -> Option<(f64, f64)> {
    lookup(path).and_then(|entry| entry.bounds)
}

fn clamp_to(value: f64, bounds: Option<(f64, f64)>) -> f64 {
    match bounds {
        Some((min, max)) => value.max(min).min(max),
        None => value,
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Direct constrained write used by the recalculator and action handlers.
/// The hard constraint for the path is applied; unknown paths are a no-op by
/// construction (callers pass table literals).
pub fn write(state: &mut WorldState, path: &str, value: f64) {
    if let Some(entry) = lookup(path) {
        let clamped = clamp_to(value, entry.bounds);
        if clamped.is_finite() {
            (entry.set)(state, clamped);
        }
    }
}

/// Constrained in-place addition.
pub fn add(state: &mut WorldState, path: &str, delta: f64) {
    if let Some(entry) = lookup(path) {
        let clamped = clamp_to((entry.get)(state) + delta, entry.bounds);
        if clamped.is_finite() {
            (entry.set)(state, clamped);
        }
    }
}

/// One write made by a batch, with the value it replaced.
#[derive(Debug, Clone, Copy)]
pub struct AppliedWrite {
    path: &'static str,
    prior: f64,
}

/// Apply a single modifier. On success returns the undo record.
pub fn apply_modifier(
    state: &mut WorldState,
    modifier: &Modifier,
) -> Result<AppliedWrite, ModifierRejection> {
    let Some(entry) = lookup(&modifier.variable) else {
        return Err(ModifierRejection::VariableNotFound(modifier.variable.clone()));
    };

    let current = (entry.get)(state);
    let computed = match modifier.operation {
        ModifierOp::Set => modifier.value,
        ModifierOp::Add => current + modifier.value,
        ModifierOp::Multiply => current * modifier.value,
        ModifierOp::Clamp => {
            let mut value = current;
            if let Some(min) = modifier.min {
                value = value.max(min);
            }
            if let Some(max) = modifier.max {
                value = value.min(max);
            }
            value
        }
    };

    // The hard clamp never fails a modifier; it silently truncates.
    let constrained = clamp_to(computed, entry.bounds);
    if !constrained.is_finite() {
        return Err(ModifierRejection::NotFinite(modifier.variable.clone()));
    }

    (entry.set)(state, constrained);
    Ok(AppliedWrite {
        path: entry.path,
        prior: current,
    })
}

/// Apply an ordered batch atomically. On any rejection, every modifier
/// already written is restored to its prior value before returning.
pub fn apply_batch(
    state: &mut WorldState,
    modifiers: &[Modifier],
    source_tag: &str,
) -> Result<(), BatchRejection> {
    let mut applied: Vec<AppliedWrite> = Vec::with_capacity(modifiers.len());

    for (index, modifier) in modifiers.iter().enumerate() {
        match apply_modifier(state, modifier) {
            Ok(write) => applied.push(write),
            Err(rejection) => {
                tracing::warn!(
                    source = source_tag,
                    index,
                    variable = %modifier.variable,
                    %rejection,
                    "modifier batch rejected, rolling back"
                );
                for undo in applied.iter().rev() {
                    if let Some(entry) = lookup(undo.path) {
                        (entry.set)(state, undo.prior);
                    }
                }
                return Err(BatchRejection { index, rejection });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Modifier;

    #[test]
    fn set_is_clamped_to_hard_constraints() {
        let mut state = WorldState::default();
        apply_modifier(&mut state, &Modifier::set("society.stability", 250.0)).unwrap();
        assert_eq!(state.society.stability, 100.0);
        apply_modifier(&mut state, &Modifier::set("society.stability", -5.0)).unwrap();
        assert_eq!(state.society.stability, 0.0);
    }

    #[test]
    fn unknown_path_is_variable_not_found() {
        let mut state = WorldState::default();
        let err = apply_modifier(&mut state, &Modifier::add("economy.moon_tax", 1.0)).unwrap_err();
        assert!(matches!(err, ModifierRejection::VariableNotFound(_)));
    }

    #[test]
    fn infinite_result_on_unbounded_path_is_rejected() {
        let mut state = WorldState::default();
        state.economy.gdp_delta = f64::MAX;
        let err = apply_modifier(
            &mut state,
            &Modifier {
                variable: "economy.gdp_delta".to_string(),
                operation: ModifierOp::Multiply,
                value: f64::MAX,
                min: None,
                max: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ModifierRejection::NotFinite(_)));
        assert_eq!(state.economy.gdp_delta, f64::MAX);
    }

    #[test]
    fn infinite_value_clamped_by_hard_constraint_is_accepted() {
        let mut state = WorldState::default();
        apply_modifier(&mut state, &Modifier::set("economy.gdp", f64::INFINITY)).unwrap();
        assert_eq!(state.economy.gdp, 100_000.0);
    }

    #[test]
    fn clamp_op_uses_the_modifier_bounds() {
        let mut state = WorldState::default();
        state.society.satisfaction = 80.0;
        apply_modifier(
            &mut state,
            &Modifier {
                variable: "society.satisfaction".to_string(),
                operation: ModifierOp::Clamp,
                value: 0.0,
                min: Some(10.0),
                max: Some(55.0),
            },
        )
        .unwrap();
        assert_eq!(state.society.satisfaction, 55.0);
    }

    #[test]
    fn rejected_batch_restores_every_prior_value() {
        let mut state = WorldState::default();
        let before_gdp = state.economy.gdp;
        let before_stability = state.society.stability;

        let batch = vec![
            Modifier::add("economy.gdp", 500.0),
            Modifier::add("society.stability", -10.0),
            Modifier::add("economy.not_a_leaf", 1.0),
        ];
        let rejection = apply_batch(&mut state, &batch, "test").unwrap_err();

        assert_eq!(rejection.index, 2);
        assert_eq!(state.economy.gdp, before_gdp);
        assert_eq!(state.society.stability, before_stability);
    }

    #[test]
    fn successful_batch_applies_in_order() {
        let mut state = WorldState::default();
        let batch = vec![
            Modifier::set("economy.tax_rate", 30.0),
            Modifier {
                variable: "economy.tax_rate".to_string(),
                operation: ModifierOp::Multiply,
                value: 2.0,
                min: None,
                max: None,
            },
        ];
        apply_batch(&mut state, &batch, "test").unwrap();
        assert_eq!(state.economy.tax_rate, 60.0);
    }
}

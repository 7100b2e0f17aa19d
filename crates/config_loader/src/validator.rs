//! Configuration validation
//!
//! Rules:
//! - pole ids unique
//! - min_level < max_level, initial_level within bounds
//! - noise_amplitude >= 0, trend_range > 0, flip_probability in [0, 1]
//! - tick_period_ms > 0, replay step_secs > 0
//! - store names unique and non-empty, required params present

use std::collections::HashSet;

use contracts::{ClockMode, StoreType, TelemetryBlueprint, TelemetryError};

/// Validate a TelemetryBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &TelemetryBlueprint) -> Result<(), TelemetryError> {
    validate_poles(blueprint)?;
    validate_simulator(blueprint)?;
    validate_stores(blueprint)?;
    Ok(())
}

fn validate_poles(blueprint: &TelemetryBlueprint) -> Result<(), TelemetryError> {
    if blueprint.poles.is_empty() {
        return Err(TelemetryError::config_validation(
            "poles",
            "at least one pole must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for pole in &blueprint.poles {
        if !seen.insert(pole.id) {
            return Err(TelemetryError::config_validation(
                format!("poles[id={}]", pole.id),
                "duplicate pole id",
            ));
        }

        if pole.min_level >= pole.max_level {
            return Err(TelemetryError::config_validation(
                format!("poles[id={}].min_level", pole.id),
                format!(
                    "min_level ({}) must be < max_level ({})",
                    pole.min_level, pole.max_level
                ),
            ));
        }

        if let Some(initial) = pole.initial_level {
            if !pole.bounds().contains(initial) {
                return Err(TelemetryError::config_validation(
                    format!("poles[id={}].initial_level", pole.id),
                    format!(
                        "initial_level ({}) must be within [{}, {}]",
                        initial, pole.min_level, pole.max_level
                    ),
                ));
            }
        }

        if pole.noise_amplitude < 0.0 {
            return Err(TelemetryError::config_validation(
                format!("poles[id={}].noise_amplitude", pole.id),
                format!("noise_amplitude must be >= 0, got {}", pole.noise_amplitude),
            ));
        }

        if pole.trend_range <= 0.0 {
            return Err(TelemetryError::config_validation(
                format!("poles[id={}].trend_range", pole.id),
                format!("trend_range must be > 0, got {}", pole.trend_range),
            ));
        }

        if !(0.0..=1.0).contains(&pole.flip_probability) {
            return Err(TelemetryError::config_validation(
                format!("poles[id={}].flip_probability", pole.id),
                format!(
                    "flip_probability must be in [0, 1], got {}",
                    pole.flip_probability
                ),
            ));
        }
    }
    Ok(())
}

fn validate_simulator(blueprint: &TelemetryBlueprint) -> Result<(), TelemetryError> {
    let sim = &blueprint.simulator;

    if sim.tick_period_ms == 0 {
        return Err(TelemetryError::config_validation(
            "simulator.tick_period_ms",
            "tick_period_ms must be > 0",
        ));
    }

    if sim.retry.max_attempts == 0 {
        return Err(TelemetryError::config_validation(
            "simulator.retry.max_attempts",
            "max_attempts must be > 0",
        ));
    }

    if let ClockMode::Replay { step_secs, .. } = sim.clock {
        if step_secs == 0 {
            return Err(TelemetryError::config_validation(
                "simulator.clock.step_secs",
                "replay step_secs must be > 0",
            ));
        }
    }

    Ok(())
}

fn validate_stores(blueprint: &TelemetryBlueprint) -> Result<(), TelemetryError> {
    let mut seen = HashSet::new();
    for (idx, store) in blueprint.stores.iter().enumerate() {
        if store.name.is_empty() {
            return Err(TelemetryError::config_validation(
                format!("stores[{idx}].name"),
                "store name cannot be empty",
            ));
        }

        if !seen.insert(store.name.as_str()) {
            return Err(TelemetryError::config_validation(
                format!("stores[name={}]", store.name),
                "duplicate store name",
            ));
        }

        match store.store_type {
            StoreType::Json | StoreType::Sqlite => {
                if !store.params.contains_key("path") {
                    return Err(TelemetryError::config_validation(
                        format!("stores[name={}].params.path", store.name),
                        "path parameter is required",
                    ));
                }
            }
            StoreType::Log => {}
        }

        if store.queue_capacity == 0 {
            return Err(TelemetryError::config_validation(
                format!("stores[name={}].queue_capacity", store.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_toml;

    fn valid_blueprint() -> TelemetryBlueprint {
        parse_toml(
            r#"
[[poles]]
id = 1
min_level = 0.0
max_level = 8.0

[[poles]]
id = 2
min_level = 0.0
max_level = 8.0

[[stores]]
name = "snapshot"
store_type = "json"
[stores.params]
path = "data.json"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_blueprint_passes() {
        assert!(validate(&valid_blueprint()).is_ok());
    }

    #[test]
    fn test_duplicate_pole_id_rejected() {
        let mut bp = valid_blueprint();
        bp.poles[1].id = bp.poles[0].id;
        let err = validate(&bp).unwrap_err();
        assert!(matches!(err, TelemetryError::ConfigValidation { .. }));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut bp = valid_blueprint();
        bp.poles[0].min_level = 9.0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_initial_level_outside_bounds_rejected() {
        let mut bp = valid_blueprint();
        bp.poles[0].initial_level = Some(8.5);
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_flip_probability_range() {
        let mut bp = valid_blueprint();
        bp.poles[0].flip_probability = 1.5;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_zero_tick_period_rejected() {
        let mut bp = valid_blueprint();
        bp.simulator.tick_period_ms = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_json_store_requires_path() {
        let mut bp = valid_blueprint();
        bp.stores[0].params.clear();
        let err = validate(&bp).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("path"), "unexpected error: {msg}");
    }

    #[test]
    fn test_duplicate_store_name_rejected() {
        let mut bp = valid_blueprint();
        let mut dup = bp.stores[0].clone();
        dup.params
            .insert("path".to_string(), "other.json".to_string());
        bp.stores.push(dup);
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_no_poles_rejected() {
        let mut bp = valid_blueprint();
        bp.poles.clear();
        assert!(validate(&bp).is_err());
    }
}

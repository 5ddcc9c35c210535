//! Custom validation functions shared by the configuration sections.

use std::collections::BTreeMap;

use validator::ValidationError;

pub const VOTING_RULES: &[&str] = &["argmax", "majority", "weighted", "borda"];
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub fn validate_voting_rule(rule: &str) -> Result<(), ValidationError> {
    if VOTING_RULES.contains(&rule.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_voting_rule"))
    }
}

pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Voting weights must be finite and non-negative.
pub fn validate_weights(weights: &BTreeMap<String, f64>) -> Result<(), ValidationError> {
    if weights.values().all(|w| w.is_finite() && *w >= 0.0) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_weight"))
    }
}

/// Every grid axis needs at least one value, otherwise the product is empty.
pub fn validate_grid(
    grid: &BTreeMap<String, Vec<serde_json::Value>>,
) -> Result<(), ValidationError> {
    if grid.values().any(Vec::is_empty) {
        return Err(ValidationError::new("empty_grid_axis"));
    }
    Ok(())
}

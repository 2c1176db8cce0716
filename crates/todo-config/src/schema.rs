//! Built-in configuration schema: every option named in spec §4.1, its
//! default value, and the type used to validate `set()` calls.

use serde_json::Value;
use todo_utils::error::TodoError;

/// All recognized dotted-path option names, in schema order.
pub const OPTION_PATHS: &[&str] = &[
    "output.defaultFormat",
    "output.showColor",
    "output.showUnicode",
    "archive.enabled",
    "archive.daysUntilArchive",
    "archive.maxCompletedTasks",
    "archive.preserveRecentCount",
    "archive.archiveOnSessionEnd",
    "archive.autoArchiveOnComplete",
    "validation.strictMode",
    "validation.checksumEnabled",
    "validation.maxActiveTasks",
    "validation.phaseValidation.phaseAdvanceThreshold",
    "validation.phaseValidation.blockOnCriticalTasks",
    "session.requireSessionNote",
    "session.autoStartSession",
    "multiSession.enabled",
    "multiSession.maxConcurrentSessions",
    "multiSession.allowScopeOverlap",
    "analyze.hierarchyWeight.parentChild",
    "analyze.hierarchyWeight.crossEpic",
    "analyze.hierarchyWeight.crossPhase",
    "backups.maxBackups",
    "defaults.priority",
    "defaults.phase",
    "defaults.labels",
    "lifecycleEnforcement.mode",
];

/// The full built-in default tree.
#[must_use]
pub fn default_schema() -> Value {
    serde_json::json!({
        "output": {
            "defaultFormat": "text",
            "showColor": true,
            "showUnicode": true
        },
        "archive": {
            "enabled": true,
            "daysUntilArchive": 30,
            "maxCompletedTasks": 500,
            "preserveRecentCount": 10,
            "archiveOnSessionEnd": false,
            "autoArchiveOnComplete": false
        },
        "validation": {
            "strictMode": false,
            "checksumEnabled": true,
            "maxActiveTasks": 1,
            "phaseValidation": {
                "phaseAdvanceThreshold": 100,
                "blockOnCriticalTasks": true
            }
        },
        "session": {
            "requireSessionNote": false,
            "autoStartSession": false
        },
        "multiSession": {
            "enabled": false,
            "maxConcurrentSessions": 1,
            "allowScopeOverlap": false
        },
        "analyze": {
            "hierarchyWeight": {
                "parentChild": 0.3,
                "crossEpic": 1.0,
                "crossPhase": 1.5
            }
        },
        "backups": {
            "maxBackups": 5
        },
        "defaults": {
            "priority": "medium",
            "phase": Value::Null,
            "labels": Value::Array(Vec::new())
        },
        "lifecycleEnforcement": {
            "mode": "advisory"
        }
    })
}

#[must_use]
pub fn all_paths() -> &'static [&'static str] {
    OPTION_PATHS
}

/// Validate that `value`'s JSON type matches the default's type at `path`.
pub fn validate_type(path: &str, value: &Value) -> Result<(), TodoError> {
    let default = lookup(&default_schema(), path).ok_or_else(|| TodoError::InvalidInput {
        message: format!("unknown config option '{path}'"),
    })?;

    let matches = match (&default, value) {
        (Value::Bool(_), Value::Bool(_)) => true,
        (Value::Number(_), Value::Number(_)) => true,
        (Value::String(_), Value::String(_)) => true,
        (Value::Null, _) => true,
        (Value::Array(_), Value::Array(_)) => true,
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        Err(TodoError::InvalidInput {
            message: format!("'{path}' expects a value of the same type as its default ({default})"),
        })
    }
}

/// Parse a raw environment-variable string into the JSON type expected at
/// `path`, falling back to a plain string if the path is unrecognized.
#[must_use]
pub fn parse_env_value(path: &str, raw: &str) -> Value {
    match lookup(&default_schema(), path) {
        Some(Value::Bool(_)) => Value::Bool(raw.eq_ignore_ascii_case("true") || raw == "1"),
        Some(Value::Number(n)) if n.is_f64() => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some(Value::Number(_)) => raw
            .parse::<i64>()
            .ok()
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some(Value::Array(_)) => raw
            .split(',')
            .map(|s| Value::String(s.trim().to_string()))
            .collect::<Vec<_>>()
            .into(),
        _ => Value::String(raw.to_string()),
    }
}

fn lookup(value: &Value, path: &str) -> Option<Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_covers_every_declared_path() {
        let schema = default_schema();
        for path in OPTION_PATHS {
            assert!(lookup(&schema, path).is_some(), "missing default for {path}");
        }
    }

    #[test]
    fn validate_type_accepts_matching_type() {
        assert!(validate_type("validation.maxActiveTasks", &serde_json::json!(2)).is_ok());
        assert!(validate_type("output.showColor", &serde_json::json!(false)).is_ok());
        assert!(validate_type("defaults.phase", &serde_json::json!("design")).is_ok());
        assert!(validate_type("defaults.labels", &serde_json::json!(["a", "b"])).is_ok());
    }

    #[test]
    fn validate_type_rejects_mismatch() {
        assert!(validate_type("validation.maxActiveTasks", &serde_json::json!("two")).is_err());
    }

    #[test]
    fn validate_type_rejects_unknown_path() {
        assert!(validate_type("not.a.real.option", &serde_json::json!(1)).is_err());
    }

    #[test]
    fn parse_env_value_coerces_bool_and_number() {
        assert_eq!(parse_env_value("output.showColor", "true"), Value::Bool(true));
        assert_eq!(
            parse_env_value("validation.maxActiveTasks", "3"),
            Value::Number(3.into())
        );
        assert_eq!(
            parse_env_value("analyze.hierarchyWeight.parentChild", "0.5"),
            serde_json::json!(0.5)
        );
    }

    #[test]
    fn parse_env_value_splits_list_options() {
        assert_eq!(
            parse_env_value("defaults.labels", "backend, urgent"),
            serde_json::json!(["backend", "urgent"])
        );
    }
}

//! Layered configuration (spec §4.1): CLI flag → env var → project config
//! file → global user config → built-in defaults.

mod schema;

use camino::Utf8PathBuf;
use serde_json::Value;
use std::collections::BTreeMap;
use todo_utils::error::TodoError;

pub use schema::default_schema;

/// Precedence source for a configuration value, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    Cli,
    Env,
    Project,
    Global,
    Default,
}

const ENV_PREFIX: &str = "TODO_";

/// Resolved configuration, built by overlaying all five sources.
#[derive(Debug, Clone)]
pub struct Config {
    layers: BTreeMap<ConfigSource, Value>,
    project_config_path: Utf8PathBuf,
    global_config_path: Utf8PathBuf,
}

impl Config {
    /// Load the project and global config files (if present), pull in
    /// environment variables, and seed built-in defaults. `cli_overrides`
    /// is the highest-precedence layer, supplied by the CLI front end.
    pub fn load(
        project_config_path: Utf8PathBuf,
        global_config_path: Utf8PathBuf,
        cli_overrides: Value,
    ) -> Result<Self, TodoError> {
        let project = todo_store::load_json::<Value>(&project_config_path)?.unwrap_or(Value::Object(Default::default()));
        let global = todo_store::load_json::<Value>(&global_config_path)?.unwrap_or(Value::Object(Default::default()));
        let env = env_layer();

        let mut layers = BTreeMap::new();
        layers.insert(ConfigSource::Cli, cli_overrides);
        layers.insert(ConfigSource::Env, env);
        layers.insert(ConfigSource::Project, project);
        layers.insert(ConfigSource::Global, global);
        layers.insert(ConfigSource::Default, default_schema());

        Ok(Self {
            layers,
            project_config_path,
            global_config_path,
        })
    }

    /// Get the highest-precedence defined value at a dotted `path`
    /// (e.g. `"archive.daysUntilArchive"`).
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        for source in [
            ConfigSource::Cli,
            ConfigSource::Env,
            ConfigSource::Project,
            ConfigSource::Global,
            ConfigSource::Default,
        ] {
            if let Some(layer) = self.layers.get(&source)
                && let Some(v) = lookup(layer, path)
            {
                return Some(v);
            }
        }
        None
    }

    /// Convenience typed getters.
    #[must_use]
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }

    #[must_use]
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    #[must_use]
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(|v| v.as_f64())
    }

    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<String> {
        self.get(path).and_then(|v| v.as_str().map(str::to_string))
    }

    /// Which source a resolved value for `path` currently comes from, for
    /// status display.
    #[must_use]
    pub fn source_of(&self, path: &str) -> Option<ConfigSource> {
        for source in [
            ConfigSource::Cli,
            ConfigSource::Env,
            ConfigSource::Project,
            ConfigSource::Global,
            ConfigSource::Default,
        ] {
            if let Some(layer) = self.layers.get(&source)
                && lookup(layer, path).is_some()
            {
                return Some(source);
            }
        }
        None
    }

    /// Set `value` at `path` in the given scope, validating it against the
    /// built-in schema's type for that path, and persist project/global
    /// scopes to disk.
    pub fn set(&mut self, path: &str, value: Value, scope: ConfigSource) -> Result<(), TodoError> {
        schema::validate_type(path, &value)?;

        let layer = self
            .layers
            .get_mut(&scope)
            .ok_or_else(|| TodoError::Config {
                message: format!("cannot set a value in the {scope:?} layer"),
            })?;
        insert(layer, path, value);

        match scope {
            ConfigSource::Project => {
                todo_store::save_json_atomic(
                    &self.project_config_path,
                    &self.layers[&ConfigSource::Project],
                    &todo_store::SaveOptions::default(),
                )?;
            }
            ConfigSource::Global => {
                todo_store::save_json_atomic(
                    &self.global_config_path,
                    &self.layers[&ConfigSource::Global],
                    &todo_store::SaveOptions::default(),
                )?;
            }
            ConfigSource::Cli | ConfigSource::Env => {
                // in-memory only for this process
            }
            ConfigSource::Default => {
                return Err(TodoError::Config {
                    message: "cannot set a value in the default layer".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn lookup(value: &Value, path: &str) -> Option<Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() { None } else { Some(current.clone()) }
}

fn insert(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        current = current
            .as_object_mut()
            .unwrap()
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }
    if !current.is_object() {
        *current = Value::Object(Default::default());
    }
    current
        .as_object_mut()
        .unwrap()
        .insert(segments.last().unwrap().to_string(), value);
}

fn env_layer() -> Value {
    let mut root = Value::Object(Default::default());
    for path in schema::all_paths() {
        let env_name = format!("{ENV_PREFIX}{}", path.to_uppercase().replace('.', "_"));
        if let Ok(raw) = std::env::var(&env_name) {
            let value = schema::parse_env_value(path, &raw);
            insert(&mut root, path, value);
        }
    }
    root
}

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TestUtilError};
use crate::sequence::Sequence;

/// Status and body sequences the scripted server answers with.
///
/// Per-path overrides take precedence over the global sequences. Statuses and
/// bodies advance independently of each other.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Default status code sequence
    pub statuses: Sequence<StatusCode>,
    /// Default response body sequence
    pub bodies: Sequence<String>,
    /// URL path -> status code sequence
    pub status_overrides: HashMap<String, Sequence<StatusCode>>,
    /// URL path -> response body sequence
    pub body_overrides: HashMap<String, Sequence<String>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            statuses: Sequence::repeat(StatusCode::OK),
            bodies: Sequence::repeat(String::new()),
            status_overrides: HashMap::new(),
            body_overrides: HashMap::new(),
        }
    }
}

impl Script {
    /// Status for the next request to `path`.
    ///
    /// A path present in `status_overrides` keeps using its own sequence even
    /// once it is empty, in which case the answer is 200.
    pub fn next_status(&mut self, path: &str) -> StatusCode {
        let seq = match self.status_overrides.get_mut(path) {
            Some(seq) => seq,
            None => &mut self.statuses,
        };
        seq.next_value().unwrap_or(StatusCode::OK)
    }

    /// Body for the next request to `path`.
    ///
    /// Unlike statuses, an emptied body override falls through to the global
    /// body sequence.
    pub fn next_body(&mut self, path: &str) -> String {
        let seq = match self.body_overrides.get_mut(path) {
            Some(seq) if !seq.is_empty() => seq,
            _ => &mut self.bodies,
        };
        seq.next_value().unwrap_or_default()
    }
}

/// Serializable form of a [`Script`], loaded from TOML or JSON.
///
/// ```toml
/// statuses = [404, 200]
/// bodies = ["404", "I'm OK"]
///
/// [paths."/health"]
/// statuses = [503, 200]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Default status codes
    #[serde(default = "default_statuses")]
    pub statuses: Vec<u16>,
    /// Default response bodies
    #[serde(default = "default_bodies")]
    pub bodies: Vec<String>,
    /// Per-path overrides
    #[serde(default)]
    pub paths: BTreeMap<String, PathScript>,
}

/// Overrides for a single URL path. A missing list means no override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathScript {
    /// Status code override
    pub statuses: Option<Vec<u16>>,
    /// Response body override
    pub bodies: Option<Vec<String>>,
}

fn default_statuses() -> Vec<u16> {
    vec![StatusCode::OK.as_u16()]
}

fn default_bodies() -> Vec<String> {
    vec![String::new()]
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            statuses: default_statuses(),
            bodies: default_bodies(),
            paths: BTreeMap::new(),
        }
    }
}

impl ScriptConfig {
    /// Loads a script file; `.json` files are read as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Ok(toml::from_str(&content)?),
        }
    }

    /// Validates status codes and builds the runtime [`Script`]
    pub fn into_script(self) -> Result<Script> {
        let mut script = Script {
            statuses: status_sequence(&self.statuses)?,
            bodies: Sequence::new(self.bodies),
            status_overrides: HashMap::new(),
            body_overrides: HashMap::new(),
        };

        for (path, overrides) in self.paths {
            if let Some(statuses) = overrides.statuses {
                script
                    .status_overrides
                    .insert(path.clone(), status_sequence(&statuses)?);
            }
            if let Some(bodies) = overrides.bodies {
                script.body_overrides.insert(path, Sequence::new(bodies));
            }
        }

        Ok(script)
    }
}

impl TryFrom<ScriptConfig> for Script {
    type Error = TestUtilError;

    fn try_from(config: ScriptConfig) -> Result<Self> {
        config.into_script()
    }
}

fn status_sequence(codes: &[u16]) -> Result<Sequence<StatusCode>> {
    codes
        .iter()
        .map(|&code| {
            StatusCode::from_u16(code)
                .map_err(|_| TestUtilError::Config(format!("invalid status code {}", code)))
        })
        .collect()
}

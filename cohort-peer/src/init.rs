//! The population spec published by the peer's init resource.

use crate::error::PeerError;
use cohort_types::TurnContext;
use serde::{Deserialize, Serialize};

/// Contents of the init resource.
///
/// ```json
/// {
///   "context": "This is a simulation of the New York state elections...",
///   "demographic_info": [[["Republican", 25], ["Democrat", 45]], [["White", 60]]],
///   "options": ["Gavin", "Donald", "Mike"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResource {
    /// Shared scenario description, the base of every system prompt.
    pub context: String,
    /// Feature categories, each a list of `(feature name, weight)` pairs.
    #[serde(alias = "demographicInfo")]
    pub demographic_info: Vec<Vec<(String, f64)>>,
    /// The choices every agent decides between.
    pub options: Vec<String>,
}

impl InitResource {
    /// Parse the payload returned by `read_resource`.
    ///
    /// Text payloads are parsed as JSON; structured payloads are used
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::Malformed`] if the payload does not have the
    /// expected fields.
    pub fn from_payload(payload: &TurnContext) -> Result<Self, PeerError> {
        let parsed = match payload {
            TurnContext::Text(text) => serde_json::from_str(text),
            TurnContext::Structured(value) => serde_json::from_value(value.clone()),
        };
        parsed.map_err(|e| PeerError::Malformed(format!("init resource: {e}")))
    }
}

//! Decisions and the option sets that constrain them.

use crate::error::InitError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An agent's current decision.
///
/// Starts as [`Decision::Undecided`]. Only ever becomes
/// [`Decision::Chosen`] with a value drawn from the agent's [`OptionSet`];
/// see [`OptionSet::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Decision {
    /// No decision recorded yet.
    #[default]
    Undecided,
    /// A validated choice.
    Chosen(String),
}

impl Decision {
    /// The chosen value, if any.
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Decision::Undecided => None,
            Decision::Chosen(value) => Some(value),
        }
    }

    /// Whether a choice has been recorded.
    pub fn is_decided(&self) -> bool {
        matches!(self, Decision::Chosen(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Undecided => f.write_str("undecided"),
            Decision::Chosen(value) => f.write_str(value),
        }
    }
}

/// A proposed decision that is not in the option set.
///
/// The `Display` output is what the model sees as the decision tool's
/// result, so it always names every valid option. The same proposal
/// against the same set renders the same message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid decision \"{proposed}\". Valid options are: {valid}. Please choose one of these.")]
pub struct DecisionRejected {
    /// The value the model proposed.
    pub proposed: String,
    /// The options that would have been accepted.
    pub valid: OptionSet,
}

/// The fixed, ordered set of choices available to an agent.
///
/// Order is the order given at construction with duplicates removed.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct OptionSet(Vec<String>);

impl OptionSet {
    /// Build an option set, dropping duplicates but keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::InvalidSpec`] when no options are given.
    pub fn new<I, S>(options: I) -> Result<Self, InitError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for option in options {
            let option = option.into();
            if !unique.contains(&option) {
                unique.push(option);
            }
        }
        if unique.is_empty() {
            return Err(InitError::InvalidSpec("option set is empty".into()));
        }
        Ok(Self(unique))
    }

    /// Whether `value` is one of the options.
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|o| o == value)
    }

    /// Check a proposal, producing the accepted [`Decision`] or a rejection.
    pub fn validate(&self, proposed: &str) -> Result<Decision, DecisionRejected> {
        if self.contains(proposed) {
            Ok(Decision::Chosen(proposed.to_string()))
        } else {
            Err(DecisionRejected {
                proposed: proposed.to_string(),
                valid: self.clone(),
            })
        }
    }

    /// Iterate over the options in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl TryFrom<Vec<String>> for OptionSet {
    type Error = InitError;

    fn try_from(options: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(options)
    }
}

impl From<OptionSet> for Vec<String> {
    fn from(set: OptionSet) -> Self {
        set.0
    }
}

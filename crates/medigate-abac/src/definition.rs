//! The persisted policy definition format.
//!
//! Policies are authored as a JSON document of named entries:
//!
//! ```json
//! {
//!   "doctor_policy": {
//!     "role": ["doctor"],
//!     "attributes": {
//!       "team": "emergency",
//!       "action": ["read", "update", "write", "delete"]
//!     }
//!   }
//! }
//! ```
//!
//! Under `attributes`, the special key `action` holds the permitted action
//! list; every other key must name a member of the closed attribute
//! comparison set (`team`, `active_shift`). Unknown keys are rejected at
//! parse time rather than silently never matching.
//!
//! Declaration order in the document is preserved — it is the evaluation
//! tie-break.

use serde_json::Value;
use thiserror::Error;

use medigate_types::Role;

use crate::policy::Policy;

/// Error type for policy document parsing.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The document is not valid JSON.
    #[error("invalid policy document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The top level (or a policy entry) is not a JSON object.
    #[error("policy document must be an object of named policies")]
    NotAnObject,

    /// A field has the wrong JSON type.
    #[error("policy '{policy}': field '{field}' has the wrong type")]
    InvalidField { policy: String, field: String },

    /// A role name is not in the closed role set.
    #[error("policy '{policy}': unknown role '{role}'")]
    UnknownRole { policy: String, role: String },

    /// An attribute key does not map onto a user snapshot field.
    #[error("policy '{policy}': unknown attribute '{key}'")]
    UnknownAttribute { policy: String, key: String },

    /// The `action` list is missing.
    #[error("policy '{policy}': missing 'action' list under attributes")]
    MissingActions { policy: String },
}

/// Result type for policy document parsing.
pub type Result<T> = std::result::Result<T, DefinitionError>;

/// Parses a policy document into named policies, in declaration order.
///
/// # Errors
///
/// Rejects malformed JSON, unknown role names, unknown attribute keys
/// (the comparison set is closed), and entries without an `action` list —
/// a policy that permits nothing is almost certainly an authoring mistake.
pub fn parse_policy_document(json: &str) -> Result<Vec<(String, Policy)>> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Object(entries) = document else {
        return Err(DefinitionError::NotAnObject);
    };

    let mut policies = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        let policy = parse_entry(&name, &entry)?;
        policies.push((name, policy));
    }
    Ok(policies)
}

fn parse_entry(name: &str, entry: &Value) -> Result<Policy> {
    let Value::Object(fields) = entry else {
        return Err(DefinitionError::NotAnObject);
    };

    let roles = parse_roles(name, fields.get("role"))?;
    let mut policy = Policy::for_roles(roles);

    let Some(attributes) = fields.get("attributes") else {
        return Err(DefinitionError::MissingActions {
            policy: name.to_string(),
        });
    };
    let Value::Object(attributes) = attributes else {
        return Err(DefinitionError::InvalidField {
            policy: name.to_string(),
            field: "attributes".to_string(),
        });
    };

    let mut saw_actions = false;
    for (key, value) in attributes {
        match key.as_str() {
            "action" => {
                policy = policy.allow_actions(parse_string_list(name, "action", value)?);
                saw_actions = true;
            }
            "team" => {
                let Value::String(team) = value else {
                    return Err(DefinitionError::InvalidField {
                        policy: name.to_string(),
                        field: "team".to_string(),
                    });
                };
                policy = policy.require_team(team.clone());
            }
            "active_shift" => {
                let Value::Bool(active) = value else {
                    return Err(DefinitionError::InvalidField {
                        policy: name.to_string(),
                        field: "active_shift".to_string(),
                    });
                };
                policy = policy.require_active_shift(*active);
            }
            other => {
                return Err(DefinitionError::UnknownAttribute {
                    policy: name.to_string(),
                    key: other.to_string(),
                });
            }
        }
    }

    if !saw_actions {
        return Err(DefinitionError::MissingActions {
            policy: name.to_string(),
        });
    }

    Ok(policy)
}

fn parse_roles(policy: &str, value: Option<&Value>) -> Result<Vec<Role>> {
    let names = parse_string_list(policy, "role", value.unwrap_or(&Value::Null))?;
    names
        .into_iter()
        .map(|name| {
            Role::from_name(&name).ok_or_else(|| DefinitionError::UnknownRole {
                policy: policy.to_string(),
                role: name,
            })
        })
        .collect()
}

fn parse_string_list(policy: &str, field: &str, value: &Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(DefinitionError::InvalidField {
            policy: policy.to_string(),
            field: field.to_string(),
        });
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(DefinitionError::InvalidField {
                policy: policy.to_string(),
                field: field.to_string(),
            }),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

//! Shape checks for strategy dossier data.

use serde_json::Value;

use crate::error::{Error, Result};

/// Keys every dossier must carry.
pub const REQUIRED_KEYS: &[&str] = &[
    "company",
    "location",
    "candidate_name",
    "date",
    "executive_summary",
    "local_mission_portfolio",
    "enterprise_bi",
    "strategic_context",
    "technical_stack_dna",
    "strategic_fit",
    "sources",
];

/// Keys whose value must be a list of `{label, text}` objects.
pub const LABELED_LIST_KEYS: &[&str] = &[
    "local_mission_portfolio",
    "enterprise_bi",
    "strategic_context",
    "technical_stack_dna",
    "strategic_fit",
];

/// Validate dossier data, failing on the first violation.
pub fn validate_dossier(data: &Value) -> Result<()> {
    for key in REQUIRED_KEYS {
        if data.get(key).is_none() {
            return Err(Error::Schema(format!("Missing required dossier key: {}", key)));
        }
    }

    for key in LABELED_LIST_KEYS {
        let items = data
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Schema(format!("Key '{}' must be a list of objects.", key)))?;

        for item in items {
            let labeled = item.is_object() && item.get("label").is_some() && item.get("text").is_some();
            if !labeled {
                return Err(Error::Schema(format!(
                    "Invalid object in '{}'. Expected {{'label': '...', 'text': '...'}}",
                    key
                )));
            }
        }
    }

    Ok(())
}

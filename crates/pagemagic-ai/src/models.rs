//! Model listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// OpenRouter model id, e.g. `meta-llama/llama-3-8b-instruct:free`.
    pub id: String,
    pub display_name: String,
}

/// Keep entries whose name contains `(free)` in any case, sorted by name.
pub fn free_models(data: &[Value]) -> Vec<ModelInfo> {
    let mut models: Vec<ModelInfo> = data
        .iter()
        .filter_map(|model| {
            let id = model["id"].as_str()?;
            let name = model["name"].as_str()?;
            name.to_lowercase().contains("(free)").then(|| ModelInfo {
                id: id.to_string(),
                display_name: name.to_string(),
            })
        })
        .collect();

    models.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    models
}

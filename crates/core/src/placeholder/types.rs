use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// The placeholder record served by the API.
///
/// Every field is optional on input; missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Placeholder {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl Placeholder {
    /// Creates a placeholder with the given ID and name.
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
        }
    }

    /// Sets the description for this placeholder.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Entity for Placeholder {
    type Id = i32;
    const SET_NAME: &'static str = "placeholders";
    const ENTITY_TYPE: &'static str = "Placeholder";

    fn id(&self) -> i32 {
        self.id
    }
}

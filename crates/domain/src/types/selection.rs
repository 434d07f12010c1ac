//! Selectable sub-resources and the active selection

use serde::{Deserialize, Serialize};

/// A resource the operator may pick within an established connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableResource {
    /// Opaque provider-assigned id, unique within one listing.
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_primary: bool,
}

/// The resource currently in use for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub resource_id: String,
    pub display_name: String,
    pub description: Option<String>,
}

impl From<&SelectableResource> for Selection {
    fn from(resource: &SelectableResource) -> Self {
        Self {
            resource_id: resource.id.clone(),
            display_name: resource.display_name.clone(),
            description: resource.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_copies_chosen_values() {
        let resource = SelectableResource {
            id: "cal-2".into(),
            display_name: "Overflow".into(),
            description: None,
            is_primary: false,
        };

        let selection = Selection::from(&resource);
        assert_eq!(selection.resource_id, "cal-2");
        assert_eq!(selection.display_name, "Overflow");
        assert_eq!(selection.description, None);
    }
}

//! Group record with member references

use crate::resource::{Resource, ResourceId};
use serde::{Deserialize, Serialize};

/// Named group of members
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Identifier (assigned on creation)
    #[serde(default, alias = "Id")]
    pub id: Option<ResourceId>,

    /// Group name
    #[serde(default, alias = "DisplayName")]
    pub display_name: Option<String>,

    /// Identifier in the provisioning client's domain
    #[serde(default, alias = "ExternalId")]
    pub external_id: Option<String>,

    /// Members
    #[serde(default, alias = "Members")]
    pub members: Vec<Member>,
}

/// Reference to a group member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member identifier
    #[serde(alias = "Value")]
    pub value: String,

    /// Member display name
    #[serde(default, alias = "Display")]
    pub display: Option<String>,
}

impl Group {
    /// Create unsaved group
    #[inline]
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..Self::default()
        }
    }

    /// With identifier
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: ResourceId) -> Self {
        self.id = Some(id);
        self
    }

    /// With member
    #[inline]
    #[must_use]
    pub fn with_member(mut self, value: impl Into<String>) -> Self {
        self.members.push(Member {
            value: value.into(),
            display: None,
        });
        self
    }
}

impl Resource for Group {
    const KIND: &'static str = "Group";

    fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = Some(id);
    }

    fn validate(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if self.display_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            messages.push("displayName is required".to_string());
        }
        for (i, member) in self.members.iter().enumerate() {
            if member.value.trim().is_empty() {
                messages.push(format!("members[{i}].value is required"));
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::decode;

    #[test]
    fn group_decode_with_members() {
        let decoded = decode::<Group>(
            r#"{ "DisplayName": "admins", "Members": [{ "Value": "u1" }, { "value": "u2", "display": "Bob" }] }"#,
        );
        assert!(decoded.is_valid());
        let group = decoded.resource().unwrap();
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.members[1].display.as_deref(), Some("Bob"));
    }

    #[test]
    fn group_validate_requires_display_name() {
        let group = Group::default();
        assert_eq!(group.validate(), vec!["displayName is required"]);
    }

    #[test]
    fn group_validate_member_values() {
        let group = Group::new("ops").with_member("u1").with_member(" ");
        assert_eq!(group.validate(), vec!["members[1].value is required"]);
    }

    #[test]
    fn group_decode_wrong_shape() {
        let decoded = decode::<Group>(r#"{ "displayName": 42 }"#);
        assert!(decoded.resource().is_none());
        assert_eq!(decoded.messages().len(), 1);
    }
}

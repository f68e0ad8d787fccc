//! Identity service resources.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user or organization known to the identity service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,

    #[serde(default)]
    pub handle: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// `user` or `organization`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    /// Name for display, falling back to the handle.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.handle)
    }
}

/// Membership of the current user in an organization.
///
/// Stored verbatim as the active context; only the identity is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub identity: Identity,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Membership {
    /// Handle of the organization.
    pub fn handle(&self) -> &str {
        &self.identity.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_preserves_unknown_fields() {
        let json = r#"{
            "identity": { "id": "org-1", "handle": "acme", "name": "Acme", "type": "organization", "avatar": "x.png" },
            "scopes": ["admin"]
        }"#;

        let membership: Membership = serde_json::from_str(json).unwrap();
        assert_eq!(membership.handle(), "acme");
        assert_eq!(membership.identity.kind.as_deref(), Some("organization"));
        assert!(membership.identity.extra.contains_key("avatar"));

        let back = serde_json::to_value(&membership).unwrap();
        assert_eq!(back["scopes"][0], "admin");
        assert_eq!(back["identity"]["type"], "organization");
    }

    #[test]
    fn display_name_falls_back_to_handle() {
        let identity: Identity =
            serde_json::from_str(r#"{ "id": "u1", "handle": "jdoe" }"#).unwrap();
        assert_eq!(identity.display_name(), "jdoe");
    }
}

//! Client credentials record

use crate::resource::{Resource, ResourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// API client with a shared secret and an optional validity window
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Identifier (assigned on creation)
    #[serde(default, alias = "Id")]
    pub id: Option<ResourceId>,

    /// Human-readable name
    #[serde(default, alias = "DisplayName")]
    pub display_name: Option<String>,

    /// Shared secret
    #[serde(default, alias = "Secret")]
    pub secret: String,

    /// Moment the client stops being valid
    #[serde(default, alias = "ExpirationTime")]
    pub expiration_time: Option<DateTime<Utc>>,

    /// Moment the client starts being valid
    #[serde(default, alias = "NotBefore")]
    pub not_before: Option<DateTime<Utc>>,
}

impl Client {
    /// Create unsaved client with secret
    #[inline]
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
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

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// With validity window
    #[inline]
    #[must_use]
    pub fn with_validity(mut self, not_before: DateTime<Utc>, expiration: DateTime<Utc>) -> Self {
        self.not_before = Some(not_before);
        self.expiration_time = Some(expiration);
        self
    }

    /// Check if the client is valid at `now`
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before.map_or(true, |t| t <= now) && self.expiration_time.map_or(true, |t| now < t)
    }
}

impl Resource for Client {
    const KIND: &'static str = "Client";

    fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = Some(id);
    }

    fn validate(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if self.secret.trim().is_empty() {
            messages.push("secret is required".to_string());
        }
        if let (Some(start), Some(end)) = (self.not_before, self.expiration_time) {
            if start > end {
                messages.push("notBefore must not be after expirationTime".to_string());
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::decode;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn client_decode_pascal_case() {
        let decoded = decode::<Client>(r#"{ "Secret": "s1", "DisplayName": "app" }"#);
        assert!(decoded.is_valid());
        let client = decoded.resource().unwrap();
        assert_eq!(client.secret, "s1");
        assert_eq!(client.display_name.as_deref(), Some("app"));
        assert!(client.id.is_none());
    }

    #[test]
    fn client_serializes_camel_case() {
        let client = Client::new("s").with_id(ResourceId::new("c1"));
        let value = serde_json::to_value(&client).unwrap();
        assert_eq!(value["id"], "c1");
        assert_eq!(value["secret"], "s");
        assert!(value.get("displayName").is_some());
    }

    #[test]
    fn client_validate_requires_secret() {
        assert_eq!(Client::new("  ").validate(), vec!["secret is required"]);
        assert!(Client::new("s").validate().is_empty());
    }

    #[test]
    fn client_validate_window_order() {
        let client = Client::new("s").with_validity(at(20), at(1));
        assert_eq!(client.validate().len(), 1);
    }

    #[test]
    fn client_validate_reports_all_messages() {
        let client = Client::new("").with_validity(at(20), at(1));
        assert_eq!(client.validate().len(), 2);
    }

    #[test]
    fn client_is_active_at() {
        let client = Client::new("s").with_validity(at(1), at(20));
        assert!(!client.is_active_at(at(1) - chrono::Duration::seconds(1)));
        assert!(client.is_active_at(at(10)));
        assert!(!client.is_active_at(at(20)));
        assert!(Client::new("s").is_active_at(at(5)));
    }
}

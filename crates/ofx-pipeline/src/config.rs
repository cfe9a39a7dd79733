//! Service configuration
//!
//! Provides [`ServiceConfig`]: cancellation policy, the dotted input paths
//! each verb reads, and list limits. Loadable from TOML.

use serde::{Deserialize, Serialize};

/// When the orchestrator checks the cancellation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationCheck {
    /// Once, when the operation starts
    OnEntry,

    /// At entry, before every pre-action phase and before the default action
    #[default]
    EveryPhase,
}

/// Input paths consulted by the built-in verbs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    /// 1-based page number (list)
    pub page: String,
    /// Page size (list)
    pub per_page: String,
    /// Target identifier (get, delete, patch)
    pub id: String,
    /// Raw resource payload (create)
    pub resource: String,
    /// Raw operations payload (patch)
    pub operations: String,
    /// Client identifier (credential lookup)
    pub client_id: String,
    /// Client secret (credential lookup)
    pub client_secret: String,
}

impl InputPaths {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("page", self.page.as_str()),
            ("per_page", self.per_page.as_str()),
            ("id", self.id.as_str()),
            ("resource", self.resource.as_str()),
            ("operations", self.operations.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ]
        .into_iter()
    }
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            page: "Pagination.Page".to_string(),
            per_page: "Pagination.PerPage".to_string(),
            id: "Id".to_string(),
            resource: "Resource".to_string(),
            operations: "Operations".to_string(),
            client_id: "ClientId".to_string(),
            client_secret: "ClientSecret".to_string(),
        }
    }
}

/// Configuration of a [`ResourceService`](crate::ResourceService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Cancellation policy
    pub cancellation: CancellationCheck,

    /// Input paths
    pub inputs: InputPaths,

    /// State path list mirrors the total record count into
    pub total_count_path: String,

    /// Largest accepted page size (unbounded if `None`)
    pub max_per_page: Option<usize>,
}

impl ServiceConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation policy
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationCheck) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Set input paths
    #[inline]
    #[must_use]
    pub fn with_inputs(mut self, inputs: InputPaths) -> Self {
        self.inputs = inputs;
        self
    }

    /// Set the state path for the total count
    #[inline]
    #[must_use]
    pub fn with_total_count_path(mut self, path: impl Into<String>) -> Self {
        self.total_count_path = path.into();
        self
    }

    /// Cap the page size
    #[inline]
    #[must_use]
    pub fn with_max_per_page(mut self, max: usize) -> Self {
        self.max_per_page = Some(max);
        self
    }

    /// Parse configuration from TOML
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or a path is empty
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every path is usable
    ///
    /// # Errors
    /// Returns `ConfigError::EmptyPath` naming the first empty path
    pub fn validate(&self) -> Result<(), ConfigError> {
        let empty = self
            .inputs
            .iter()
            .chain(std::iter::once(("total_count_path", self.total_count_path.as_str())))
            .find(|(_, path)| path.trim().is_empty());
        match empty {
            Some((name, _)) => Err(ConfigError::EmptyPath(name)),
            None => Ok(()),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cancellation: CancellationCheck::default(),
            inputs: InputPaths::default(),
            total_count_path: "Pagination.TotalCount".to_string(),
            max_per_page: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML syntax or shape error
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A path setting is empty
    #[error("path setting '{0}' is empty")]
    EmptyPath(&'static str),
}

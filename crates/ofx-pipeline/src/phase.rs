//! Pipeline phases
//!
//! Provides [`Phase`], the named extension points every operation passes
//! through, in their fixed execution order.

use std::fmt::{self, Display, Formatter};

/// Extension point in the operation pipeline
///
/// Declared in execution order; the default action runs between
/// [`Phase::BeforeAction`] and [`Phase::AfterAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Normalize raw inputs
    HandleInput,

    /// Domain validation of inputs and payload
    ValidateInput,

    /// Establish or adjust actor bindings
    DefineActors,

    /// Wire cross-cutting concerns against the stable actor set
    Bind,

    /// Last chance to mutate state or skip the default action
    BeforeAction,

    /// Observe or post-process the result
    AfterAction,

    /// Deterministic cleanup
    ReleaseUnmanagedResources,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Self; 7] = [
        Self::HandleInput,
        Self::ValidateInput,
        Self::DefineActors,
        Self::Bind,
        Self::BeforeAction,
        Self::AfterAction,
        Self::ReleaseUnmanagedResources,
    ];

    /// Phase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HandleInput => "HandleInput",
            Self::ValidateInput => "ValidateInput",
            Self::DefineActors => "DefineActors",
            Self::Bind => "Bind",
            Self::BeforeAction => "BeforeAction",
            Self::AfterAction => "AfterAction",
            Self::ReleaseUnmanagedResources => "ReleaseUnmanagedResources",
        }
    }

    /// Check if the phase runs before the default action
    #[inline]
    #[must_use]
    pub fn is_pre_action(self) -> bool {
        self <= Self::BeforeAction
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_order_matches_declaration() {
        let mut sorted = Phase::ALL;
        sorted.sort();
        assert_eq!(sorted, Phase::ALL);
        assert_eq!(Phase::ALL.first(), Some(&Phase::HandleInput));
        assert_eq!(Phase::ALL.last(), Some(&Phase::ReleaseUnmanagedResources));
    }

    #[test]
    fn phase_pre_action_split() {
        let pre: Vec<_> = Phase::ALL.into_iter().filter(|p| p.is_pre_action()).collect();
        assert_eq!(pre.len(), 5);
        assert!(!Phase::AfterAction.is_pre_action());
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::DefineActors.to_string(), "DefineActors");
    }
}

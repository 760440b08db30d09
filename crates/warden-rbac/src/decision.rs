//! Resolution outcomes.

use serde::{Deserialize, Serialize};

/// The outcome of resolving a permission node for an actor.
///
/// `Unset` means no override and no registered default applied; the caller
/// decides whether that means deny-by-default or allow-by-default.
/// Resolution never fails with an error, it degrades to `Unset`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDecision {
    /// The node is granted.
    Allowed,

    /// The node is explicitly refused.
    Denied,

    /// Nothing decided the node; the caller's default applies.
    Unset,
}

impl PermissionDecision {
    /// Whether the decision is `Allowed`.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Whether the decision is `Denied`.
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied)
    }

    /// Whether the decision is settled either way.
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// Collapse to a boolean with a caller-chosen default for `Unset`.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_rbac::PermissionDecision;
    ///
    /// assert!(PermissionDecision::Allowed.granted_or(false));
    /// assert!(!PermissionDecision::Denied.granted_or(true));
    /// assert!(PermissionDecision::Unset.granted_or(true));
    /// ```
    pub fn granted_or(&self, default: bool) -> bool {
        match self {
            Self::Allowed => true,
            Self::Denied => false,
            Self::Unset => default,
        }
    }
}

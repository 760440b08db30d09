//! Group tiers
//!
//! This module defines the ordered set of group tiers an actor can belong
//! to. The ordering is total and explicit, so "highest-privilege group"
//! comparisons and promotion source/target checks are well-defined.

use serde::{Deserialize, Serialize};

/// An actor's group tier.
///
/// Tiers are hierarchical: each tier carries the defaults of lower tiers.
/// The hierarchy is: Guest < Default < ZoneAdmin < Op < Owner
///
/// # Permission Model
///
/// - **Guest**: visitors, narrowest defaults
/// - **Default**: the tier every actor belongs to unless recorded otherwise
/// - **ZoneAdmin**: can administer zones and their overrides
/// - **Op**: server operators
/// - **Owner**: full control
///
/// # Examples
///
/// ```
/// use warden_rbac::GroupTier;
///
/// assert!(GroupTier::Owner > GroupTier::ZoneAdmin);
/// assert_eq!(GroupTier::parse("zone_admin"), Some(GroupTier::ZoneAdmin));
/// assert_eq!(GroupTier::default(), GroupTier::Default);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupTier {
    /// Visitors with the narrowest defaults
    Guest = 0,

    /// The baseline tier for every actor
    Default = 1,

    /// Can administer zones and overrides
    ZoneAdmin = 2,

    /// Server operators
    Op = 3,

    /// Full control
    Owner = 4,
}

impl GroupTier {
    /// All tiers in ascending privilege order.
    pub const fn all() -> [GroupTier; 5] {
        [
            Self::Guest,
            Self::Default,
            Self::ZoneAdmin,
            Self::Op,
            Self::Owner,
        ]
    }

    /// Check if this tier may administer zones.
    ///
    /// # Returns
    ///
    /// `true` for ZoneAdmin, Op, and Owner tiers
    pub fn is_zone_admin(&self) -> bool {
        *self >= GroupTier::ZoneAdmin
    }

    /// Check if this tier has operator privileges.
    ///
    /// # Returns
    ///
    /// `true` for Op and Owner tiers
    pub fn is_op(&self) -> bool {
        *self >= GroupTier::Op
    }

    /// Parse a tier from its string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_rbac::GroupTier;
    ///
    /// assert_eq!(GroupTier::parse("owner"), Some(GroupTier::Owner));
    /// assert_eq!(GroupTier::parse("GUEST"), Some(GroupTier::Guest));
    /// assert_eq!(GroupTier::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "guest" => Some(Self::Guest),
            "default" => Some(Self::Default),
            "zone_admin" => Some(Self::ZoneAdmin),
            "op" => Some(Self::Op),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Get the string representation of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Default => "default",
            Self::ZoneAdmin => "zone_admin",
            Self::Op => "op",
            Self::Owner => "owner",
        }
    }

    /// Get a human-readable display name for the tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::Default => "Default",
            Self::ZoneAdmin => "Zone Admin",
            Self::Op => "Operator",
            Self::Owner => "Owner",
        }
    }
}

impl Default for GroupTier {
    fn default() -> Self {
        Self::Default
    }
}

impl std::fmt::Display for GroupTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

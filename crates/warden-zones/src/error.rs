//! Error types for zone administration.
//!
//! Structural errors are reported synchronously to the caller and the
//! failed operation has no effect on the zone table.

use thiserror::Error;

/// Zone administration error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneError {
    /// A zone with this name already exists.
    #[error("zone already exists: {0}")]
    DuplicateZone(String),

    /// No zone with this name is known.
    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    /// The requested parent link would make the zone its own ancestor.
    #[error("zone parenting would create a cycle through: {0}")]
    Cycle(String),

    /// The global zone and live world zones cannot be deleted or reparented.
    #[error("zone is protected: {0}")]
    ProtectedZone(String),

    /// The zone name is empty, reserved, or contains invalid characters.
    #[error("invalid zone name: {0}")]
    InvalidName(String),
}

/// Result type for zone operations.
pub type ZoneResult<T> = Result<T, ZoneError>;

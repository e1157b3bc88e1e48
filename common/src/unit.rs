//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an expiration of something issued for a limited
/// time.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

//! Common numeric type aliases.

/// Specifies cost value.
pub type Cost = f64;

/// Represents a time duration in seconds.
pub type Duration = f64;

/// Represents a timestamp in seconds since the start of a simulation day.
pub type Timestamp = f64;

/// Amount of utility weight dimensions: access, wait, in-vehicle and egress time.
pub const WEIGHT_DIMENSIONS: usize = 4;

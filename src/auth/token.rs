//! Cached token models.

pub mod owner;
pub mod record;

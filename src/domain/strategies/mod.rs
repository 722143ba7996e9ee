//! Registered signal strategies.

pub mod anchor_momentum;
pub mod ema_pullback;
pub mod zscore_reversion;

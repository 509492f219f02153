//! Fintrack Common Types
//!
//! Shared types used across the fintrack crates: currency codes, display
//! money and the clock abstraction used by anything with a time-based expiry.

pub mod currency;
pub mod money;
pub mod error;
pub mod time;

pub use currency::*;
pub use money::*;
pub use error::*;
pub use time::*;

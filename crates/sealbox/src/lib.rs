//! sealbox — sealed-box loudspeaker math.
//!
//! Closed-form f64 formulas only; nothing here processes audio.

pub mod error;

// Driver and enclosure models
pub mod sealed_box;
pub mod thiele_small;

// Filter design and response
pub mod filters;
pub mod hexfloat;

// Front end
pub mod presets;
pub mod system;

pub use error::ConfigError;
pub use filters::{FilterChain, Sos};
pub use system::{System, SystemConfig};

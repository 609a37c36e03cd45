//! Bundled driver + box combinations.

use crate::error::ConfigError;
use crate::system::SystemConfig;

/// Generic 8" woofer (W8-1808) in a 0.75 cu ft (22 l) sealed box.
pub const W8_1808: SystemConfig = SystemConfig {
    sd: 220.0,
    fs: 45.0,
    qts: 0.44,
    qes: 0.66,
    qms: 1.33,
    re: 6.8,
    le: 0.04,
    vas: 88.0,
    xmax: 5.0,
    vc: 22.0,
};

/// Dayton RSS210HO-4 8" subwoofer in a 0.75 cu ft (22 l) sealed box.
pub const HO_4_8: SystemConfig = SystemConfig {
    sd: 213.8,
    fs: 29.6,
    qts: 0.4,
    qes: 0.46,
    qms: 3.33,
    re: 3.6,
    le: 0.99,
    vas: 18.7,
    xmax: 11.0,
    vc: 22.0,
};

/// Every preset with its lookup name.
pub const ALL: [(&str, SystemConfig); 2] = [("w8-1808", W8_1808), ("ho-4-8", HO_4_8)];

/// Look up a preset. Case-insensitive; `_` and `-` are interchangeable.
pub fn by_name(name: &str) -> Result<SystemConfig, ConfigError> {
    let key = name.trim().to_ascii_lowercase().replace('_', "-");
    ALL.iter()
        .find(|(n, _)| *n == key)
        .map(|(_, cfg)| *cfg)
        .ok_or_else(|| ConfigError::UnknownPreset {
            name: name.to_string(),
            available: names().join(", "),
        })
}

pub fn names() -> Vec<&'static str> {
    ALL.iter().map(|(n, _)| *n).collect()
}

//! Detector parameters: lookup tables from human units to the engine's
//! linear fixed-point thresholds, and the validated configuration record.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// Twist in dB (index) to linear power ratio ×10.
pub const TWIST_TABLE: [i32; 25] = [
    10, 13, 16, 20, 25, 32, 40, 50, 63, 79, 100, 126, 158, 200, 251, 316, 398, 501, 631, 794,
    1000, 1259, 1585, 1995, 2512,
];

/// Minimum single-bin block energy for a tone at `-index` dBm0.
///
/// Each entry sits 0.5 dB under the nominal energy a 102-sample block
/// produces for a tone at that level. From -2 down to -35 dBm0 a tone pair at
/// the configured level is accepted and one a full dB lower is not. Below
/// -35 dBm0 the scaled input is only a few LSB wide, so measured energies
/// stray from the nominal curve by more than 1 dB.
pub const LEVEL_TABLE: [i32; 43] = [
    147_442_868, 117_118_033, 93_030_161, 73_896_483, 58_698_063, 46_625_529, 37_035_974,
    29_418_720, 23_368_120, 18_561_957, 14_744_287, 11_711_803, 9_303_016, 7_389_648, 5_869_806,
    4_662_553, 3_703_597, 2_941_872, 2_336_812, 1_856_196, 1_474_429, 1_171_180, 930_302, 738_965,
    586_981, 466_255, 370_360, 294_187, 233_681, 185_620, 147_443, 117_118, 93_030, 73_896, 58_698,
    46_626, 37_036, 29_419, 23_368, 18_562, 14_744, 11_712, 9_303,
];

/// Nominal block duration used to convert milliseconds to blocks.
pub const NOMINAL_BLOCK_MS: u32 = 12;

pub const TWIST_DB_RANGE: RangeInclusive<i32> = 0..=24;
pub const LEVEL_DBM0_RANGE: RangeInclusive<i32> = -42..=0;
pub const DURATION_MS_RANGE: RangeInclusive<u32> = 12..=2000;
pub const ENERGY_RATIO_RANGE: RangeInclusive<i32> = 10..=1000;

pub const DEFAULT_NORMAL_TWIST_DB: i32 = 5;
pub const DEFAULT_REVERSE_TWIST_DB: i32 = 9;
pub const DEFAULT_LEVEL_DBM0: i32 = -20;
pub const DEFAULT_DURATION_MS: u32 = 12;
pub const DEFAULT_ENERGY_RATIO: i32 = 838;

/// Linear ×10 ratio for a twist in dB, if it is in the table.
pub fn twist_ratio(db: i32) -> Option<i32> {
    if !TWIST_DB_RANGE.contains(&db) {
        return None;
    }
    Some(TWIST_TABLE[db as usize])
}

/// Absolute bin-energy threshold for a level in dBm0, if it is in the table.
pub fn level_threshold(dbm0: i32) -> Option<i32> {
    if !LEVEL_DBM0_RANGE.contains(&dbm0) {
        return None;
    }
    Some(LEVEL_TABLE[(-dbm0) as usize])
}

/// Configuration in human units. Out-of-range fields fall back to their
/// defaults when converted to [`Parameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Allowed excess of row over column energy, in dB.
    pub normal_twist_db: i32,
    /// Allowed excess of column over row energy, in dB.
    pub reverse_twist_db: i32,
    /// Minimum level of each tone, in dBm0.
    pub level_dbm0: i32,
    pub min_positive_ms: u32,
    pub min_negative_ms: u32,
    /// Divisor of the two winning energies in the total-energy test; larger
    /// values require the tones to carry more of the block.
    pub energy_ratio: i32,
    /// Notch out 350 Hz and 440 Hz before detection.
    pub filter_dialtone: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            normal_twist_db: DEFAULT_NORMAL_TWIST_DB,
            reverse_twist_db: DEFAULT_REVERSE_TWIST_DB,
            level_dbm0: DEFAULT_LEVEL_DBM0,
            min_positive_ms: DEFAULT_DURATION_MS,
            min_negative_ms: DEFAULT_DURATION_MS,
            energy_ratio: DEFAULT_ENERGY_RATIO,
            filter_dialtone: false,
        }
    }
}

impl DetectorConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Validated detector parameters in engine units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    threshold: i32,
    normal_twist: i32,
    reverse_twist: i32,
    energy_ratio: i32,
    min_positive_blocks: u32,
    min_negative_blocks: u32,
    filter_dialtone: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

impl Parameters {
    /// Convert a configuration, replacing each invalid field with its default.
    pub fn from_config(config: &DetectorConfig) -> Self {
        let normal_twist = twist_ratio(config.normal_twist_db).unwrap_or_else(|| {
            substituted("normal_twist_db", config.normal_twist_db, DEFAULT_NORMAL_TWIST_DB);
            TWIST_TABLE[DEFAULT_NORMAL_TWIST_DB as usize]
        });
        let reverse_twist = twist_ratio(config.reverse_twist_db).unwrap_or_else(|| {
            substituted("reverse_twist_db", config.reverse_twist_db, DEFAULT_REVERSE_TWIST_DB);
            TWIST_TABLE[DEFAULT_REVERSE_TWIST_DB as usize]
        });
        let threshold = level_threshold(config.level_dbm0).unwrap_or_else(|| {
            substituted("level_dbm0", config.level_dbm0, DEFAULT_LEVEL_DBM0);
            LEVEL_TABLE[(-DEFAULT_LEVEL_DBM0) as usize]
        });
        let energy_ratio = if ENERGY_RATIO_RANGE.contains(&config.energy_ratio) {
            config.energy_ratio
        } else {
            substituted("energy_ratio", config.energy_ratio, DEFAULT_ENERGY_RATIO);
            DEFAULT_ENERGY_RATIO
        };

        Self {
            threshold,
            normal_twist,
            reverse_twist,
            energy_ratio,
            min_positive_blocks: duration_blocks("min_positive_ms", config.min_positive_ms),
            min_negative_blocks: duration_blocks("min_negative_ms", config.min_negative_ms),
            filter_dialtone: config.filter_dialtone,
        }
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn normal_twist(&self) -> i32 {
        self.normal_twist
    }

    pub fn reverse_twist(&self) -> i32 {
        self.reverse_twist
    }

    pub fn energy_ratio(&self) -> i32 {
        self.energy_ratio
    }

    /// Hit blocks a candidate needs before it is committed.
    pub fn min_positive_blocks(&self) -> u32 {
        self.min_positive_blocks
    }

    /// Consecutive miss blocks that close a candidate window.
    pub fn min_negative_blocks(&self) -> u32 {
        self.min_negative_blocks
    }

    pub fn filter_dialtone(&self) -> bool {
        self.filter_dialtone
    }
}

fn duration_blocks(field: &str, ms: u32) -> u32 {
    let ms = if DURATION_MS_RANGE.contains(&ms) {
        ms
    } else {
        substituted(field, ms, DEFAULT_DURATION_MS);
        DEFAULT_DURATION_MS
    };
    ms / NOMINAL_BLOCK_MS
}

fn substituted<T: std::fmt::Display>(field: &str, rejected: T, default: T) {
    warn!(field, %rejected, %default, "detector parameter out of range, using default");
}

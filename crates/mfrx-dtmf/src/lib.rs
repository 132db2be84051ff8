//! Fixed-point dual-tone (DTMF) digit receiver for 8 kHz linear PCM.
//!
//! Samples are analysed in 102-sample blocks by a bank of Goertzel filters,
//! each block is accepted or rejected on level, twist, adjacent-bin and
//! total-energy tests, and a hit/miss debouncer turns block verdicts into
//! digits delivered through a queue or a callback.

pub mod detect;
pub mod error;
pub mod keypad;
pub mod params;
pub mod report;

pub use detect::dsp::{BlockEnergies, FilterBank, Rejection, Verdict, BLOCK_LEN, SAMPLE_RATE_HZ};
pub use detect::goertzel::GoertzelFilter;
pub use detect::{ToneDetector, ToneDetectorBuilder};
pub use error::{Error, Result};
pub use params::{DetectorConfig, Parameters};
pub use report::DigitCallback;

mod debounce;
pub mod dsp;
pub mod goertzel;
pub mod notch;

use tracing::{debug, trace};

use crate::error::Result;
use crate::keypad::key_at;
use crate::params::{DetectorConfig, Parameters};
use crate::report::{DigitCallback, DigitSink, DEFAULT_QUEUE_CAPACITY};
use debounce::{HitDebouncer, WindowClose};
use dsp::{BlockEnergies, FilterBank, Verdict, BLOCK_LEN};
use notch::DialToneNotch;

/// Dual-tone digit receiver for one channel of 8 kHz linear PCM.
#[derive(Debug)]
pub struct ToneDetector {
    bank: FilterBank,
    notch: DialToneNotch,
    params: Parameters,
    debouncer: HitDebouncer,
    last_hit: Option<char>,
    sink: DigitSink,
    lost: u32,
}

impl ToneDetector {
    /// Create a pull-mode detector with default parameters.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder with default settings.
    pub fn builder() -> ToneDetectorBuilder {
        ToneDetectorBuilder::new()
    }

    /// Feed samples. Returns the raw verdict of the most recent completed
    /// block, before debouncing.
    ///
    /// In callback mode the callback may run several times within one call.
    pub fn feed(&mut self, samples: &[i16]) -> Option<char> {
        for &sample in samples {
            let sample = if self.params.filter_dialtone() {
                self.notch.process(sample)
            } else {
                sample
            };
            if let Some(energies) = self.bank.push(sample) {
                self.resolve_block(&energies);
            }
        }
        self.last_hit
    }

    /// Copy up to `buf.len()` queued digits (ASCII) in arrival order and
    /// return how many were copied. Always 0 in callback mode.
    pub fn drain(&mut self, buf: &mut [u8]) -> usize {
        self.sink.drain(buf)
    }

    /// Drain every queued digit.
    pub fn take_digits(&mut self) -> String {
        let mut buf = vec![0u8; self.sink.pending()];
        let copied = self.sink.drain(&mut buf);
        buf[..copied].iter().map(|&b| char::from(b)).collect()
    }

    /// Digits waiting to be drained.
    pub fn pending(&self) -> usize {
        self.sink.pending()
    }

    /// Digits that were detected but dropped on a full queue, plus candidates
    /// that never met the minimum positive duration.
    pub fn lost_count(&self) -> u32 {
        self.lost
    }

    /// Samples still needed to complete the current block. Digits are only
    /// committed on a block boundary.
    pub fn samples_to_block_end(&self) -> usize {
        self.bank.remaining()
    }

    pub fn last_hit(&self) -> Option<char> {
        self.last_hit
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Replace the configuration. Invalid fields fall back to defaults; the
    /// new parameters take effect together on the next sample.
    pub fn set_parameters(&mut self, config: &DetectorConfig) {
        self.apply_parameters(Parameters::from_config(config));
    }

    pub fn apply_parameters(&mut self, params: Parameters) {
        if params.filter_dialtone() != self.params.filter_dialtone() {
            self.notch.reset();
        }
        self.params = params;
    }

    /// Clear filter, debounce and queue state. Parameters and callback are kept.
    pub fn reset(&mut self) {
        self.bank.reset();
        self.notch.reset();
        self.debouncer.reset();
        self.sink.clear();
        self.last_hit = None;
        self.lost = 0;
    }

    fn resolve_block(&mut self, energies: &BlockEnergies) {
        let hit = match energies.classify(&self.params) {
            Verdict::Hit(key) => Some(key),
            Verdict::Miss(reason) => {
                trace!(?reason, total = energies.total, "block rejected");
                None
            }
        };
        self.last_hit = hit.map(key_at);

        let closed = self.debouncer.record(
            hit,
            self.params.min_positive_blocks(),
            self.params.min_negative_blocks(),
        );
        match closed {
            Some(WindowClose::Commit { key, hits }) => {
                let digit = key_at(key);
                if self.sink.deliver(digit, hits) {
                    debug!(%digit, hits, "digit committed");
                } else {
                    self.lost = self.lost.saturating_add(1);
                    debug!(%digit, lost = self.lost, "digit queue full, digit dropped");
                }
            }
            Some(WindowClose::Lost { key, hits }) => {
                self.lost = self.lost.saturating_add(1);
                debug!(
                    digit = %key_at(key),
                    hits,
                    lost = self.lost,
                    "candidate too short"
                );
            }
            None => {}
        }
    }
}

/// Builder for configuring a ToneDetector.
pub struct ToneDetectorBuilder {
    params: Parameters,
    callback: Option<DigitCallback>,
    queue_capacity: usize,
}

impl ToneDetectorBuilder {
    pub fn new() -> Self {
        Self {
            params: Parameters::default(),
            callback: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Start from an already validated parameter set, e.g. one default shared
    /// by every channel.
    pub fn parameters(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }

    /// Validate and use a human-unit configuration.
    pub fn config(mut self, config: &DetectorConfig) -> Self {
        self.params = Parameters::from_config(config);
        self
    }

    /// Deliver digits synchronously instead of queueing them.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(char, u32) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Set the pull-mode queue size in digits.
    pub fn queue_capacity(mut self, digits: usize) -> Self {
        self.queue_capacity = digits.max(1);
        self
    }

    /// Build the detector.
    pub fn build(self) -> Result<ToneDetector> {
        let sink = match self.callback {
            Some(callback) => DigitSink::Callback(callback),
            None => DigitSink::queue(self.queue_capacity),
        };
        Ok(ToneDetector {
            bank: FilterBank::new(BLOCK_LEN)?,
            notch: DialToneNotch::new(),
            params: self.params,
            debouncer: HitDebouncer::new(),
            last_hit: None,
            sink,
            lost: 0,
        })
    }
}

impl Default for ToneDetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pos_ms: u32, neg_ms: u32) -> DetectorConfig {
        DetectorConfig {
            min_positive_ms: pos_ms,
            min_negative_ms: neg_ms,
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn silence_produces_nothing() {
        let mut detector = ToneDetector::builder().config(&config(36, 36)).build().unwrap();
        for _ in 0..100 {
            assert_eq!(detector.feed(&[0; 800]), None);
        }
        assert_eq!(detector.pending(), 0);
        assert_eq!(detector.lost_count(), 0);
    }

    #[test]
    fn partial_block_keeps_previous_verdict() {
        let mut detector = ToneDetector::new().unwrap();
        assert_eq!(detector.feed(&[0; 50]), None);
        assert_eq!(detector.bank.position(), 50);
        assert_eq!(detector.samples_to_block_end(), 52);
        detector.feed(&[0; 52]);
        assert_eq!(detector.bank.position(), 0);
    }

    #[test]
    fn set_parameters_applies_all_fields() {
        let mut detector = ToneDetector::new().unwrap();
        detector.set_parameters(&DetectorConfig {
            level_dbm0: -30,
            min_positive_ms: 36,
            min_negative_ms: 5000,
            ..DetectorConfig::default()
        });
        let params = detector.parameters();
        assert_eq!(params.threshold(), 147_443);
        assert_eq!(params.min_positive_blocks(), 3);
        assert_eq!(params.min_negative_blocks(), 1);
    }

    #[test]
    fn reset_keeps_parameters() {
        let mut detector = ToneDetector::builder().config(&config(36, 36)).build().unwrap();
        detector.feed(&[1000; 300]);
        detector.reset();
        assert_eq!(detector.bank.position(), 0);
        assert_eq!(detector.last_hit(), None);
        assert_eq!(detector.parameters().min_positive_blocks(), 3);
    }

    #[test]
    fn lost_count_saturates() {
        let mut detector = ToneDetector::builder().config(&config(36, 36)).build().unwrap();
        detector.lost = u32::MAX;
        let hit = BlockEnergies {
            rows: [10_000_000, 0, 0, 0],
            cols: [10_000_000, 0, 0, 0],
            total: 0,
        };
        let miss = BlockEnergies {
            rows: [0; 4],
            cols: [0; 4],
            total: 0,
        };
        detector.resolve_block(&hit);
        assert_eq!(detector.last_hit(), Some('1'));
        for _ in 0..4 {
            detector.resolve_block(&miss);
        }
        assert_eq!(detector.pending(), 0);
        assert_eq!(detector.lost_count(), u32::MAX);
    }
}

use crate::error::{Error, Result};

/// Fractional bits of a filter coefficient (Q14).
pub const COEFF_SHIFT: u32 = 14;

/// Single-bin fixed-point Goertzel filter.
///
/// The two recursion registers are 16 bits wide and wrap on overflow; the
/// energy formula is defined in terms of those truncated values, so they must
/// not be widened or saturated.
#[derive(Debug, Clone)]
pub struct GoertzelFilter {
    coefficient: i32,
    block_length: usize,
    v2: i16,
    v3: i16,
    sample_count: usize,
}

impl GoertzelFilter {
    /// Create a filter from a Q14 coefficient (`2·cos(ω)·2^14`).
    pub fn new(coefficient: i32, block_length: usize) -> Result<Self> {
        if block_length == 0 {
            return Err(Error::InvalidBlockLength(block_length));
        }
        Ok(Self {
            coefficient,
            block_length,
            v2: 0,
            v3: 0,
            sample_count: 0,
        })
    }

    /// Create a filter tuned to `freq_hz`.
    pub fn for_frequency(freq_hz: f32, sample_rate_hz: f32, block_length: usize) -> Result<Self> {
        Self::new(coefficient_for(freq_hz, sample_rate_hz), block_length)
    }

    /// Advance the recursion by one (already scaled) sample.
    ///
    /// Samples beyond the block length are ignored until `result` is taken.
    #[inline]
    pub fn update(&mut self, sample: i16) {
        if self.sample_count >= self.block_length {
            return;
        }
        self.step(sample);
        self.sample_count += 1;
    }

    /// Close the block and return its energy, resetting the filter.
    pub fn result(&mut self) -> i32 {
        self.step(0);
        let v2 = i64::from(self.v2);
        let v3 = i64::from(self.v3);
        let coefficient = i64::from(self.coefficient);
        let energy = (v3 * v3 + v2 * v2 - ((v3 * coefficient) >> COEFF_SHIFT) * v2) << 1;
        self.reset();
        energy.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    pub fn reset(&mut self) {
        self.v2 = 0;
        self.v3 = 0;
        self.sample_count = 0;
    }

    pub fn coefficient(&self) -> i32 {
        self.coefficient
    }

    pub fn block_length(&self) -> usize {
        self.block_length
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[inline]
    fn step(&mut self, sample: i16) {
        let v1 = self.v2;
        self.v2 = self.v3;
        // Truncation to 16 bits is intentional.
        self.v3 = (((self.coefficient * i32::from(self.v2)) >> COEFF_SHIFT) - i32::from(v1)
            + i32::from(sample)) as i16;
    }
}

/// Q14 coefficient `round(2·cos(2π·f/fs)·2^14)`.
pub fn coefficient_for(freq_hz: f32, sample_rate_hz: f32) -> i32 {
    let omega = std::f64::consts::TAU * f64::from(freq_hz) / f64::from(sample_rate_hz);
    (2.0 * omega.cos() * f64::from(1u32 << COEFF_SHIFT)).round() as i32
}

#![allow(dead_code)]

use mfrx_dtmf::keypad::tone_pair;

pub const SAMPLE_RATE_HZ: f64 = 8000.0;
pub const BLOCK: usize = 102;

/// Peak amplitude of a sine at `level` dBm0 (full-scale sine = +3.14 dBm0).
pub fn amplitude(level_dbm0: f64) -> f64 {
    32767.0 * 10f64.powf((level_dbm0 - 3.14) / 20.0)
}

/// Sum of sines, each `(freq_hz, level_dbm0)`, starting at phase zero.
pub fn tones(parts: &[(f64, f64)], len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| {
            let t = n as f64 / SAMPLE_RATE_HZ;
            parts
                .iter()
                .map(|&(freq_hz, level)| {
                    amplitude(level) * (std::f64::consts::TAU * freq_hz * t).sin()
                })
                .sum()
        })
        .collect()
}

/// Row/column pair for `digit`, with independent levels.
pub fn twisted_digit(digit: char, row_level: f64, col_level: f64, len: usize) -> Vec<f64> {
    let (row_hz, col_hz) = tone_pair(digit).expect("keypad digit");
    tones(
        &[(f64::from(row_hz), row_level), (f64::from(col_hz), col_level)],
        len,
    )
}

pub fn digit(digit: char, level: f64, len: usize) -> Vec<f64> {
    twisted_digit(digit, level, level, len)
}

pub fn silence(len: usize) -> Vec<f64> {
    vec![0.0; len]
}

pub fn mix(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Round and clip to 16-bit PCM.
pub fn pcm(signal: &[f64]) -> Vec<i16> {
    signal
        .iter()
        .map(|&v| v.round().clamp(-32768.0, 32767.0) as i16)
        .collect()
}

/// Keyed digit string: each digit `on` samples, followed by `off` samples of
/// silence, at `level` dBm0.
pub fn dial(digits: &str, level: f64, on: usize, off: usize) -> Vec<i16> {
    let mut signal = Vec::new();
    for d in digits.chars() {
        signal.extend(digit(d, level, on));
        signal.extend(silence(off));
    }
    pcm(&signal)
}

/// White Gaussian noise with the power of a sine at `level_dbm0`.
pub fn gaussian_noise(len: usize, level_dbm0: f64, seed: u32) -> Vec<f64> {
    let rms = amplitude(level_dbm0) / std::f64::consts::SQRT_2;
    let mut rng = XorShift32::new(seed);
    let mut out = Vec::with_capacity(len + 1);
    while out.len() < len {
        let u1 = rng.next_f64().max(1e-12);
        let u2 = rng.next_f64();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = std::f64::consts::TAU * u2;
        out.push(r * theta.cos() * rms);
        out.push(r * theta.sin() * rms);
    }
    out.truncate(len);
    out
}

struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    fn new(seed: u32) -> Self {
        let state = if seed == 0 { 0xA5A5_1234 } else { seed };
        Self { state }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX)
    }
}

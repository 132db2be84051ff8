use super::goertzel::GoertzelFilter;
use crate::error::Result;
use crate::keypad::{key_index, COL_FREQS_HZ, ROW_FREQS_HZ};
use crate::params::{Parameters, TWIST_TABLE};

pub const SAMPLE_RATE_HZ: f32 = 8000.0;
/// Samples per detection block (~12.75 ms at 8 kHz).
pub const BLOCK_LEN: usize = 102;
/// Right shift applied to each 16-bit input sample before filtering.
pub const INPUT_SHIFT: u32 = 7;
/// A non-winning bin must stay this many dB below the winner of its group.
pub const ADJACENT_REJECT_DB: usize = 8;

/// Row and column Goertzel filters advanced in lock-step over one block.
#[derive(Debug, Clone)]
pub struct FilterBank {
    rows: [GoertzelFilter; 4],
    cols: [GoertzelFilter; 4],
    block_len: usize,
    position: usize,
    block_energy: i32,
}

/// Filter outputs for one completed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEnergies {
    pub rows: [i32; 4],
    pub cols: [i32; 4],
    /// Sum of squared scaled samples over the block.
    pub total: i32,
}

/// Acceptance stage that rejected a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Level,
    Twist,
    AdjacentRow,
    AdjacentCol,
    TotalEnergy,
}

/// Per-block decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Row-major key index of the accepted pair.
    Hit(usize),
    Miss(Rejection),
}

impl FilterBank {
    pub fn new(block_len: usize) -> Result<Self> {
        let filter =
            |freq_hz: f32| GoertzelFilter::for_frequency(freq_hz, SAMPLE_RATE_HZ, block_len);
        let rows = [
            filter(ROW_FREQS_HZ[0])?,
            filter(ROW_FREQS_HZ[1])?,
            filter(ROW_FREQS_HZ[2])?,
            filter(ROW_FREQS_HZ[3])?,
        ];
        let cols = [
            filter(COL_FREQS_HZ[0])?,
            filter(COL_FREQS_HZ[1])?,
            filter(COL_FREQS_HZ[2])?,
            filter(COL_FREQS_HZ[3])?,
        ];
        Ok(Self {
            rows,
            cols,
            block_len,
            position: 0,
            block_energy: 0,
        })
    }

    /// Feed one raw sample. Returns the block energies when the sample
    /// completes a block.
    #[inline]
    pub fn push(&mut self, sample: i16) -> Option<BlockEnergies> {
        let scaled = sample >> INPUT_SHIFT;
        self.block_energy += i32::from(scaled) * i32::from(scaled);
        for filter in self.rows.iter_mut().chain(self.cols.iter_mut()) {
            filter.update(scaled);
        }

        self.position += 1;
        if self.position < self.block_len {
            return None;
        }

        let energies = BlockEnergies {
            rows: std::array::from_fn(|i| self.rows[i].result()),
            cols: std::array::from_fn(|i| self.cols[i].result()),
            total: self.block_energy,
        };
        self.position = 0;
        self.block_energy = 0;
        Some(energies)
    }

    /// Samples still needed to complete the current block.
    pub fn remaining(&self) -> usize {
        self.block_len - self.position
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub fn reset(&mut self) {
        for filter in self.rows.iter_mut().chain(self.cols.iter_mut()) {
            filter.reset();
        }
        self.position = 0;
        self.block_energy = 0;
    }
}

impl BlockEnergies {
    pub fn best_row(&self) -> usize {
        strongest(&self.rows)
    }

    pub fn best_col(&self) -> usize {
        strongest(&self.cols)
    }

    /// Run the acceptance test for this block.
    pub fn classify(&self, params: &Parameters) -> Verdict {
        let best_row = self.best_row();
        let best_col = self.best_col();
        let row = self.rows[best_row];
        let col = self.cols[best_col];

        if row < params.threshold() || col < params.threshold() {
            return Verdict::Miss(Rejection::Level);
        }

        if !(col / params.reverse_twist() < row / 10 && col / 10 > row / params.normal_twist()) {
            return Verdict::Miss(Rejection::Twist);
        }

        if adjacent_bin_too_strong(&self.rows, best_row) {
            return Verdict::Miss(Rejection::AdjacentRow);
        }
        if adjacent_bin_too_strong(&self.cols, best_col) {
            return Verdict::Miss(Rejection::AdjacentCol);
        }

        let tones = i64::from(row) + i64::from(col);
        if tones / i64::from(params.energy_ratio()) <= i64::from(self.total) / 10 {
            return Verdict::Miss(Rejection::TotalEnergy);
        }

        Verdict::Hit(key_index(best_row, best_col))
    }
}

// Ties keep the lowest index.
fn strongest(energies: &[i32; 4]) -> usize {
    let mut best = 0;
    for (i, &energy) in energies.iter().enumerate().skip(1) {
        if energy > energies[best] {
            best = i;
        }
    }
    best
}

fn adjacent_bin_too_strong(energies: &[i32; 4], best: usize) -> bool {
    let limit = i64::from(energies[best]) * 10 / i64::from(TWIST_TABLE[ADJACENT_REJECT_DB]);
    energies
        .iter()
        .enumerate()
        .any(|(i, &energy)| i != best && i64::from(energy) > limit)
}

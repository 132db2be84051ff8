use bitvec::prelude::*;

use crate::keypad::KEY_COUNT;

const HISTORY_WORDS: usize = 8;
/// Width of the rolling hit history. Must exceed the longest negative
/// duration (2000 ms / 12 ms = 166 blocks) by at least two bits.
pub(crate) const HISTORY_BITS: usize = HISTORY_WORDS * 32;

/// Outcome of a closed accumulation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowClose {
    /// The leading candidate met the positive duration.
    Commit { key: usize, hits: u32 },
    /// A candidate accumulated but fell short.
    Lost { key: usize, hits: u32 },
}

/// Hit/miss hysteresis over per-block verdicts.
///
/// Bit 0 of the history is the most recent block. A window closes once the
/// last `min_negative` blocks were all misses and some earlier block, more
/// than `min_negative` blocks back, was a hit.
#[derive(Debug, Clone)]
pub(crate) struct HitDebouncer {
    history: BitArray<[u32; HISTORY_WORDS], Lsb0>,
    counts: [u32; KEY_COUNT],
    leader: usize,
}

impl HitDebouncer {
    pub(crate) fn new() -> Self {
        Self {
            history: BitArray::new([0; HISTORY_WORDS]),
            counts: [0; KEY_COUNT],
            leader: 0,
        }
    }

    /// Consume one block verdict (`Some(key)` on a hit).
    pub(crate) fn record(
        &mut self,
        hit: Option<usize>,
        min_positive: u32,
        min_negative: u32,
    ) -> Option<WindowClose> {
        self.history.shift_end(1);
        if let Some(key) = hit {
            self.history.set(0, true);
            self.counts[key] = self.counts[key].saturating_add(1);
            if self.counts[key] > self.counts[self.leader] {
                self.leader = key;
            }
        }

        let gap = (min_negative as usize).min(HISTORY_BITS - 2);
        let bits = self.history.as_bitslice();
        if !(bits[..gap].not_any() && bits[gap + 1..].any()) {
            return None;
        }

        let key = self.leader;
        let hits = self.counts[key];
        self.counts = [0; KEY_COUNT];
        self.history = BitArray::new([0; HISTORY_WORDS]);
        if hits >= min_positive {
            Some(WindowClose::Commit { key, hits })
        } else {
            Some(WindowClose::Lost { key, hits })
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(debouncer: &mut HitDebouncer, pattern: &str, pos: u32, neg: u32) -> Vec<WindowClose> {
        pattern
            .chars()
            .filter_map(|c| {
                let hit = c.to_digit(16).map(|d| d as usize);
                debouncer.record(hit, pos, neg)
            })
            .collect()
    }

    #[test]
    fn three_hits_then_three_misses_commit() {
        let mut d = HitDebouncer::new();
        assert!(run(&mut d, "555--", 3, 3).is_empty());
        assert_eq!(
            run(&mut d, "-", 3, 3),
            vec![WindowClose::Commit { key: 5, hits: 3 }]
        );
    }

    #[test]
    fn short_burst_is_lost() {
        let mut d = HitDebouncer::new();
        assert_eq!(
            run(&mut d, "55---", 3, 3),
            vec![WindowClose::Lost { key: 5, hits: 2 }]
        );
    }

    #[test]
    fn single_hit_needs_an_extra_miss() {
        // 0b1000 is not above 2^3, so the window closes one block later.
        let mut d = HitDebouncer::new();
        assert!(run(&mut d, "5---", 1, 3).is_empty());
        assert_eq!(
            run(&mut d, "-", 1, 3),
            vec![WindowClose::Commit { key: 5, hits: 1 }]
        );
    }

    #[test]
    fn silence_never_closes() {
        let mut d = HitDebouncer::new();
        assert!(run(&mut d, &"-".repeat(1000), 1, 1).is_empty());
    }

    #[test]
    fn short_gap_is_bridged() {
        let mut d = HitDebouncer::new();
        assert_eq!(
            run(&mut d, "55-55---", 3, 3),
            vec![WindowClose::Commit { key: 5, hits: 4 }]
        );
    }

    #[test]
    fn majority_candidate_wins() {
        let mut d = HitDebouncer::new();
        assert_eq!(
            run(&mut d, "4555---", 2, 3),
            vec![WindowClose::Commit { key: 5, hits: 3 }]
        );
        // Ties keep the earlier leader.
        assert_eq!(
            run(&mut d, "9955---", 2, 3),
            vec![WindowClose::Commit { key: 9, hits: 2 }]
        );
    }

    #[test]
    fn long_negative_duration_fits_history() {
        let mut d = HitDebouncer::new();
        let pattern = format!("{}{}", "1".repeat(200), "-".repeat(165));
        assert!(run(&mut d, &pattern, 1, 166).is_empty());
        assert_eq!(
            run(&mut d, "-", 1, 166),
            vec![WindowClose::Commit { key: 1, hits: 200 }]
        );
    }

    #[test]
    fn close_resets_counts() {
        let mut d = HitDebouncer::new();
        run(&mut d, "777--", 1, 2);
        assert_eq!(
            run(&mut d, "3---", 1, 2),
            vec![WindowClose::Commit { key: 3, hits: 1 }]
        );
    }

    #[test]
    fn hit_count_saturates() {
        let mut d = HitDebouncer::new();
        d.counts[5] = u32::MAX;
        assert_eq!(
            run(&mut d, "5--", 1, 1),
            vec![WindowClose::Commit { key: 5, hits: u32::MAX }]
        );
    }
}

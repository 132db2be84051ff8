//! The 4x4 dual-tone keypad: row/column frequencies and the digit alphabet.

use phf::phf_map;

/// Low-group ("row") frequencies in Hz.
pub const ROW_FREQS_HZ: [f32; 4] = [697.0, 770.0, 852.0, 941.0];
/// High-group ("column") frequencies in Hz.
pub const COL_FREQS_HZ: [f32; 4] = [1209.0, 1336.0, 1477.0, 1633.0];

/// Number of distinct (row, column) outcomes.
pub const KEY_COUNT: usize = 16;

pub const DTMF_KEYS: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

static KEY_POSITIONS: phf::Map<char, (u8, u8)> = phf_map! {
    '1' => (0, 0),
    '2' => (0, 1),
    '3' => (0, 2),
    'A' => (0, 3),
    '4' => (1, 0),
    '5' => (1, 1),
    '6' => (1, 2),
    'B' => (1, 3),
    '7' => (2, 0),
    '8' => (2, 1),
    '9' => (2, 2),
    'C' => (2, 3),
    '*' => (3, 0),
    '0' => (3, 1),
    '#' => (3, 2),
    'D' => (3, 3),
};

/// Digit for a row-major key index (`row * 4 + col`).
pub fn key_at(index: usize) -> char {
    DTMF_KEYS[(index >> 2) & 3][index & 3]
}

/// Row-major key index for a (row, column) pair.
pub fn key_index(row: usize, col: usize) -> usize {
    (row << 2) + col
}

/// Grid position of a digit. Letters are accepted in either case.
pub fn position(digit: char) -> Option<(usize, usize)> {
    KEY_POSITIONS
        .get(&digit.to_ascii_uppercase())
        .map(|&(row, col)| (row as usize, col as usize))
}

/// The (row, column) frequency pair that signals `digit`.
pub fn tone_pair(digit: char) -> Option<(f32, f32)> {
    let (row, col) = position(digit)?;
    Some((ROW_FREQS_HZ[row], COL_FREQS_HZ[col]))
}

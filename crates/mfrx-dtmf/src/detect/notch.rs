/// High-Q notches at 350 Hz and 440 Hz, the usual dial tone pair.
#[derive(Debug, Clone, Default)]
pub struct DialToneNotch {
    z350: [f32; 2],
    z440: [f32; 2],
}

impl DialToneNotch {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn process(&mut self, sample: i16) -> i16 {
        let mut x = f32::from(sample);

        let v = 0.98356 * x + 1.895_442_6 * self.z350[0] - 0.969_139_6 * self.z350[1];
        x = v - 1.925_148 * self.z350[0] + self.z350[1];
        self.z350 = [v, self.z350[0]];

        let v = 0.98456 * x + 1.852_954_3 * self.z440[0] - 0.969_139_6 * self.z440[1];
        x = v - 1.881_993_8 * self.z440[0] + self.z440[1];
        self.z440 = [v, self.z440[0]];

        // Saturating conversion.
        x as i16
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

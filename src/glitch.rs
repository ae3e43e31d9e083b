//! Single-sample Glitch Correction
//!
//! Bus logs occasionally carry a byte that flips for exactly one frame and then
//! returns to its previous value. These transients are not real state changes,
//! and left alone they split one constancy interval into two short ones.
//!
//! ## Rule
//! A 5-sample window `w` slides left-to-right over the channel. The centre
//! sample is a glitch when it differs from `w[0]` and the four neighbours
//! `w[0]`, `w[1]`, `w[3]`, `w[4]` are all equal. The glitch is overwritten with
//! the neighbour value.
//!
//! The sweep mutates the channel as it goes, so a window always sees the
//! corrections made by the windows to its left. The first two and last two
//! samples never sit in the centre of a window and are never corrected.

use log::debug;

/// Width of the sliding consistency window
pub const WINDOW: usize = 5;
/// Offset of the sample under test inside the window
const CENTRE: usize = WINDOW / 2;

/// Repair isolated single-sample glitches in place.
///
/// Returns the number of samples rewritten. Channels shorter than the window
/// are left untouched.
pub fn correct(channel: &mut [u8]) -> usize {
    if channel.len() < WINDOW {
        return 0;
    }

    let mut corrections = 0;
    for i in 0..=channel.len() - WINDOW {
        let w = &channel[i..i + WINDOW];
        if w[CENTRE] != w[0] && w[0] == w[1] && w[0] == w[3] && w[0] == w[4] {
            let consensus = w[0];
            debug!(
                "[Glitch] index {}: {:#04x} -> {:#04x}",
                i + CENTRE,
                channel[i + CENTRE],
                consensus
            );
            channel[i + CENTRE] = consensus;
            corrections += 1;
        }
    }
    corrections
}

/// Glitch corrector that keeps running statistics across channels
#[derive(Debug, Default)]
pub struct GlitchCorrector {
    channels_scanned: u64,
    samples_scanned: u64,
    corrections: u64,
}

impl GlitchCorrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Correct one channel and fold the result into the statistics
    pub fn correct(&mut self, channel: &mut [u8]) -> usize {
        let fixed = correct(channel);
        self.channels_scanned += 1;
        self.samples_scanned += channel.len() as u64;
        self.corrections += fixed as u64;
        fixed
    }

    /// Get correction statistics: (channels, samples, corrections, ratio %)
    pub fn stats(&self) -> (u64, u64, u64, f64) {
        let ratio = if self.samples_scanned > 0 {
            self.corrections as f64 / self.samples_scanned as f64 * 100.0
        } else {
            0.0
        };
        (
            self.channels_scanned,
            self.samples_scanned,
            self.corrections,
            ratio,
        )
    }

    /// Total corrections applied so far
    pub fn corrections(&self) -> u64 {
        self.corrections
    }
}

use std::time::Duration;

/// Playback clock over a sequence whose frames may still be decoding.
///
/// `available` is always the number of frames decoded so far and `complete`
/// tells whether more will arrive. The position never runs past the last
/// available frame; it only wraps around once the sequence is complete.
#[derive(Debug, Clone)]
pub struct Playback {
    fps: f64,
    position: f64,
    paused: bool,
    looping: bool,
}

impl Playback {
    pub fn new(fps: f64, looping: bool) -> Self {
        Self {
            fps,
            position: 0.0,
            paused: false,
            looping,
        }
    }

    /// Move the clock forward, returns whether the displayed frame changed.
    pub fn advance(&mut self, dt: Duration, available: usize, complete: bool) -> bool {
        if available == 0 {
            self.position = 0.0;
            return false;
        }

        let before = self.current_frame(available);

        if !self.paused {
            let mut next = self.position + dt.as_secs_f64() * self.fps;
            let end = available as f64;

            if next >= end {
                next = if complete && self.looping {
                    next % end
                } else {
                    end - 1.0
                };
            }

            self.position = next;
        }

        before != self.current_frame(available)
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Jump `frames` forward or back, clamped to the decoded range.
    pub fn step(&mut self, frames: isize, available: usize) {
        if available == 0 {
            return;
        }

        let current = self.current_frame(available).unwrap_or(0) as isize;
        let target = (current + frames).clamp(0, available as isize - 1);

        self.position = target as f64;
    }

    /// Scrub to a fraction of the whole sequence, `total` counting frames not yet decoded.
    pub fn seek_fraction(&mut self, fraction: f64, total: usize, available: usize) {
        if available == 0 || total == 0 {
            return;
        }

        let target = (fraction.clamp(0.0, 1.0) * (total - 1) as f64).round();

        self.position = target.min((available - 1) as f64);
    }

    pub fn current_frame(&self, available: usize) -> Option<usize> {
        if available == 0 {
            None
        } else {
            Some((self.position.floor() as usize).min(available - 1))
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

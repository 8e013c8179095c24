use std::time::Instant;

/// Playback clock: a known position plus the monotonic instant it was observed at.
/// While running, the position advances with wall time; while paused it holds.
#[derive(Debug, PartialEq, Default)]
pub struct PlaybackTimer {
    /// Anchor position in seconds (finite, >= 0).
    anchor_position: f64,
    /// Set while playing; elapsed time since this instant is added to the anchor.
    anchor_instant: Option<Instant>,
}

impl PlaybackTimer {
    /// Start (or resume) playback from `position`.
    pub fn start(&mut self, position: f64) {
        self.anchor_position = sanitize_position(position);
        self.anchor_instant = Some(Instant::now());
    }

    /// Freeze the clock at its current estimate.
    pub fn pause(&mut self) {
        self.anchor_position = self.position();
        self.anchor_instant = None;
    }

    /// Jump to `position`, keeping the running/paused state.
    pub fn seek(&mut self, position: f64) {
        self.anchor_position = sanitize_position(position);
        if self.anchor_instant.is_some() {
            self.anchor_instant = Some(Instant::now());
        }
    }

    pub fn is_running(&self) -> bool {
        self.anchor_instant.is_some()
    }

    /// Current playback position estimate in seconds.
    pub fn position(&self) -> f64 {
        let base = self.anchor_position;
        match self.anchor_instant {
            Some(inst) => {
                let val = base + inst.elapsed().as_secs_f64();
                if val.is_finite() { val } else { base }
            }
            None => base,
        }
    }
}

pub fn sanitize_position(p: f64) -> f64 {
    if !p.is_finite() || p < 0.0 { 0.0 } else { p }
}

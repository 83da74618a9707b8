use foundation::time::Time;

/// Frame metadata handed to every per-frame update.
///
/// The host scheduler (requestAnimationFrame, a CLI loop, a test) owns the
/// clock; the runtime only accumulates the deltas it is given, so a frame
/// sequence can be replayed exactly.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time of this frame (seconds).
    pub dt_s: f64,
    /// Time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    /// Fixed-step frame: `time = index * dt_s`.
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    /// The frame before any tick has run.
    pub fn first() -> Self {
        Self::new(0, 0.0)
    }

    pub fn next(self) -> Self {
        self.advance(self.dt_s)
    }

    /// Next frame with a variable delta. Negative or non-finite deltas count as zero.
    pub fn advance(self, dt_s: f64) -> Self {
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        Self {
            index: self.index + 1,
            dt_s,
            time: self.time + self.dt_s,
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::first()
    }
}

/// Deterministic frame metadata.
///
/// Frames are produced by the host each time it forwards elapsed wall time to
/// the viewer. Tests build them directly, so animations can be replayed with
/// simulated time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Milliseconds elapsed since the previous frame.
    pub dt_ms: f64,
    /// Host time at the end of the frame (milliseconds).
    pub time_ms: f64,
}

impl Frame {
    pub fn first() -> Self {
        Self {
            index: 0,
            dt_ms: 0.0,
            time_ms: 0.0,
        }
    }

    /// The frame following `self` after `dt_ms` more milliseconds.
    pub fn advance(self, dt_ms: f64) -> Self {
        let dt_ms = dt_ms.max(0.0);
        Self {
            index: self.index + 1,
            dt_ms,
            time_ms: self.time_ms + dt_ms,
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::first()
    }
}

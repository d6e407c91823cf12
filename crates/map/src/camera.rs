use crate::spec::{Easing, RotateOptions};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BearingAnimation {
    from: f64,
    to: f64,
    duration_ms: f64,
    elapsed_ms: f64,
    easing: Easing,
}

impl BearingAnimation {
    pub fn new(from: f64, to: f64, options: RotateOptions) -> Self {
        Self {
            from,
            to,
            duration_ms: options.duration_ms.max(0.0),
            elapsed_ms: 0.0,
            easing: options.easing,
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    pub fn bearing(&self) -> f64 {
        if self.duration_ms == 0.0 {
            return self.to;
        }
        let t = self.easing.apply(self.elapsed_ms / self.duration_ms);
        self.from + (self.to - self.from) * t
    }

    pub fn advance(&mut self, dt_ms: f64) {
        self.elapsed_ms = (self.elapsed_ms + dt_ms.max(0.0)).min(self.duration_ms);
    }
}

/// Bearing plus the animation currently moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Camera {
    bearing: f64,
    animation: Option<BearingAnimation>,
}

impl Camera {
    pub fn new(bearing: f64) -> Self {
        Self {
            bearing,
            animation: None,
        }
    }

    pub fn bearing(&self) -> f64 {
        self.animation
            .as_ref()
            .map_or(self.bearing, BearingAnimation::bearing)
    }

    pub fn is_moving(&self) -> bool {
        self.animation.is_some()
    }

    /// Starts from the current, possibly mid-animation, bearing.
    pub fn rotate_to(&mut self, bearing: f64, options: RotateOptions) {
        let from = self.bearing();
        self.bearing = from;
        self.animation = Some(BearingAnimation::new(from, bearing, options));
    }

    /// Ends any animation where it currently is.
    pub fn stop(&mut self) {
        self.bearing = self.bearing();
        self.animation = None;
    }

    /// Returns `true` when an animation finished during this step.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        let Some(anim) = &mut self.animation else {
            return false;
        };
        anim.advance(dt_ms);
        if anim.is_finished() {
            self.bearing = anim.target();
            self.animation = None;
            return true;
        }
        false
    }
}

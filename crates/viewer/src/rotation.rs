use map::{Easing, MapBackend, RotateOptions};

use crate::config::RotationConfig;

/// The rotate-view toggle.
///
/// Enabling issues one linear `rotate_to` sized by the viewport width,
/// starting from wherever the bearing currently is. Disabling stops the
/// camera on the spot. Nothing repeats on its own.
#[derive(Debug, Clone)]
pub struct RotationControl {
    enabled: bool,
    user_interacting: bool,
    config: RotationConfig,
}

impl RotationControl {
    pub fn new(config: RotationConfig) -> Self {
        Self {
            enabled: false,
            user_interacting: false,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_user_interacting(&self) -> bool {
        self.user_interacting
    }

    pub fn icon(&self) -> &str {
        if self.enabled {
            &self.config.enabled_icon
        } else {
            &self.config.disabled_icon
        }
    }

    pub fn set_user_interacting(&mut self, interacting: bool) {
        self.user_interacting = interacting;
    }

    /// `(target bearing, options)` for a viewport `width_px` wide.
    pub fn rotation_from(&self, bearing: f64, width_px: f64) -> (f64, RotateOptions) {
        let width = width_px.max(0.0);
        (
            bearing + width * self.config.deg_per_px,
            RotateOptions {
                duration_ms: width * self.config.ms_per_px,
                easing: Easing::Linear,
            },
        )
    }

    /// Flips the toggle and returns the icon to show.
    pub fn toggle<M: MapBackend>(&mut self, map: &mut M, width_px: f64) -> &str {
        self.enabled = !self.enabled;
        if self.enabled {
            if !self.user_interacting {
                let (target, options) = self.rotation_from(map.bearing(), width_px);
                map.rotate_to(target, options);
            }
        } else {
            map.stop();
        }
        self.icon()
    }
}

use serde::{Deserialize, Serialize};

/// A `[lng, lat]` pair in degrees, serialized as a two-element array.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        LngLat { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(v: [f64; 2]) -> Self {
        LngLat::new(v[0], v[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// Axis-aligned geographic bounds, `[southwest, northeast]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[LngLat; 2]", into = "[LngLat; 2]")]
pub struct LngLatBounds {
    pub sw: LngLat,
    pub ne: LngLat,
}

impl LngLatBounds {
    pub const fn new(sw: LngLat, ne: LngLat) -> Self {
        LngLatBounds { sw, ne }
    }

    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.sw.lng && p.lng <= self.ne.lng && p.lat >= self.sw.lat && p.lat <= self.ne.lat
    }

    /// Nearest point inside the bounds.
    pub fn clamp(&self, p: LngLat) -> LngLat {
        LngLat::new(
            p.lng.clamp(self.sw.lng, self.ne.lng),
            p.lat.clamp(self.sw.lat, self.ne.lat),
        )
    }
}

impl From<[LngLat; 2]> for LngLatBounds {
    fn from(v: [LngLat; 2]) -> Self {
        LngLatBounds::new(v[0], v[1])
    }
}

impl From<LngLatBounds> for [LngLat; 2] {
    fn from(b: LngLatBounds) -> Self {
        [b.sw, b.ne]
    }
}

/// Detected target in a frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Detection {
    /// Center of the target in pixels.
    pub center: (f32, f32),
    /// Bounding box as `(x, y, width, height)` in pixels.
    pub bbox: (f32, f32, f32, f32),
    /// Detection confidence.
    #[serde(default = "Detection::default_score")]
    pub score: f32,
}

impl Detection {
    fn default_score() -> f32 {
        1.0
    }

    /// Area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.bbox.2 * self.bbox.3
    }
}

/// Target observation for a single cycle.
///
/// The area of the target is used as a stand-in for the distance to the
/// target. Larger means closer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub center_x: f32,
    pub center_y: f32,
    pub area: f32,
}

impl Observation {
    pub fn new(center_x: f32, center_y: f32, area: f32) -> Self {
        Self {
            center_x,
            center_y,
            area,
        }
    }
}

impl From<&Detection> for Observation {
    fn from(detection: &Detection) -> Self {
        Self {
            center_x: detection.center.0,
            center_y: detection.center.1,
            area: detection.area(),
        }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}) area {:.0}",
            self.center_x, self.center_y, self.area
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_from_detection() {
        let detection = Detection {
            center: (320.0, 240.0),
            bbox: (270.0, 180.0, 100.0, 120.0),
            score: 0.9,
        };

        let observation = Observation::from(&detection);

        assert_eq!(observation.center_x, 320.0);
        assert_eq!(observation.center_y, 240.0);
        assert_eq!(observation.area, 12_000.0);
    }
}

//! Poses, axis-aligned boxes and the room boundary polygon.

use std::f64::consts::{PI, TAU};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Position plus heading (radians). Heading is stored as-is; callers
/// normalize where they compare angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, z: f64, heading: f64) -> Self {
        Self { x, y, z, heading }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose[P:({}, {}, {}), rot:{}]",
            self.x, self.y, self.z, self.heading
        )
    }
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(angle: f64) -> f64 {
    let r = angle.rem_euclid(TAU);
    if r > PI {
        r - TAU
    } else {
        r
    }
}

/// Axis-aligned box given by center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: [f64; 3],
    pub half_extents: [f64; 3],
}

impl Aabb {
    pub fn new(center: [f64; 3], half_extents: [f64; 3]) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Length of the planar half diagonal, `sqrt(rx^2 + ry^2)`.
    pub fn half_diagonal(&self) -> f64 {
        self.half_extents[0].hypot(self.half_extents[1])
    }

    /// Clamp a planar point into the box footprint.
    pub fn clamp_xy(&self, x: f64, y: f64) -> (f64, f64) {
        let [cx, cy, _] = self.center;
        let [rx, ry, _] = self.half_extents;
        (x.clamp(cx - rx, cx + rx), y.clamp(cy - ry, cy + ry))
    }
}

/// Simple 2D polygon used as the containment region for object centers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    points: Vec<(f64, f64)>,
}

impl Polygon {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Rectangle spanned by the planar footprint of `bbox`, counter-clockwise
    /// from the min corner.
    pub fn from_box(bbox: &Aabb) -> Self {
        let (x0, y0) = (
            bbox.center[0] - bbox.half_extents[0],
            bbox.center[1] - bbox.half_extents[1],
        );
        let (x1, y1) = (
            bbox.center[0] + bbox.half_extents[0],
            bbox.center[1] + bbox.half_extents[1],
        );
        Self::new(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    pub fn add(&mut self, x: f64, y: f64) {
        self.points.push((x, y));
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Even-odd crossing test with a ray towards +x.
    ///
    /// Each edge (i, i-1) toggles when the point's y separates the endpoint
    /// y values (one strictly above, one not) and the edge crosses that y
    /// to the right of the point. For an axis-aligned rectangle this makes
    /// the min-x and min-y edges inside and the max-x and max-y edges
    /// outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.points.len();
        if n == 0 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = self.points[i];
            let (xj, yj) = self.points[j];
            if (yi > y) != (yj > y) {
                let intersect_x = (xj - xi) * (y - yi) / (yj - yi) + xi;
                if x < intersect_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Room boundary: the generating box plus its polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    bbox: Aabb,
    polygon: Polygon,
}

impl Boundary {
    pub fn from_box(bbox: Aabb) -> Self {
        Self {
            polygon: Polygon::from_box(&bbox),
            bbox,
        }
    }

    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygon.contains(x, y)
    }
}

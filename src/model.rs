//! A single placed object: footprint, pose and per-round candidate poses.

use std::fmt;

use crate::catalog::{GeomKind, ObjectClass};
use crate::geometry::{wrap_angle, Boundary, Pose};
use crate::prng::Pcg32;

/// Rejection sampling budget for one candidate pose before falling back
/// to clamping into the boundary box.
pub const MAX_PROPOSAL_ATTEMPTS: u32 = 10_000;

/// Planar footprint with its half extents along the local axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Ellipsoid { rx: f64, ry: f64 },
    Cuboid { rx: f64, ry: f64 },
}

impl Shape {
    pub fn new(kind: GeomKind, rx: f64, ry: f64) -> Self {
        match kind {
            GeomKind::Ellipsoid => Shape::Ellipsoid { rx, ry },
            GeomKind::Cuboid => Shape::Cuboid { rx, ry },
        }
    }

    /// Radial extent of the footprint along `relheading`, an angle in the
    /// shape's local frame wrapped into (-PI, PI].
    pub fn extent_at(&self, relheading: f64) -> f64 {
        match *self {
            Shape::Ellipsoid { rx, ry } => {
                let a = rx * (-relheading).cos();
                let b = ry * (-relheading).sin();
                (a * a + b * b).sqrt()
            }
            Shape::Cuboid { rx, ry } => {
                // Corner angle splits the ray directions into the four sides.
                let phi = ry.atan2(rx);
                if relheading.abs() <= phi.abs() {
                    // right
                    rx / relheading.cos()
                } else if relheading.abs() >= std::f64::consts::PI - phi.abs() {
                    // left
                    -rx / relheading.cos()
                } else if relheading >= phi && relheading <= std::f64::consts::PI - phi {
                    // top
                    ry / relheading.sin()
                } else {
                    // bottom
                    -ry / relheading.sin()
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    /// Position in the owning scene; reassigned on insert.
    pub object_id: usize,
    pub class_id: usize,
    kind: GeomKind,
    half_extents: [f64; 3],
    pub pose: Pose,
    proposals: Vec<Pose>,
}

impl Model {
    pub fn new(name: impl Into<String>, class: &ObjectClass, half_extents: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            object_id: 0,
            class_id: class.class_id,
            kind: class.kind,
            half_extents,
            pose: Pose::default(),
            proposals: Vec::new(),
        }
    }

    /// Same half extent on every axis.
    pub fn with_radius(name: impl Into<String>, class: &ObjectClass, radius: f64) -> Self {
        Self::new(name, class, [radius; 3])
    }

    pub fn at(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Take the footprint family from `class`, the catalog entry it is
    /// being filed under.
    pub(crate) fn adopt_class(&mut self, class: &ObjectClass) {
        self.class_id = class.class_id;
        self.kind = class.kind;
    }

    pub fn half_extents(&self) -> [f64; 3] {
        self.half_extents
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.kind, self.half_extents[0], self.half_extents[1])
    }

    /// `sqrt(rx^2 + ry^2)`: heading-independent bound on the footprint.
    pub fn half_diagonal(&self) -> f64 {
        self.half_extents[0].hypot(self.half_extents[1])
    }

    /// Signed extent of the footprint towards the planar point (x, y).
    pub fn extent_toward(&self, x: f64, y: f64) -> f64 {
        let relheading = wrap_angle((y - self.pose.y).atan2(x - self.pose.x) - self.pose.heading);
        self.shape().extent_at(relheading)
    }

    pub fn proposals(&self) -> &[Pose] {
        &self.proposals
    }

    /// Fill the scratch buffer with `n` candidate poses: uniform jitter of
    /// `sigma_pos` on x/y and `sigma_rot` on heading, z untouched. Candidates
    /// whose center leaves `boundary` are resampled; after
    /// [`MAX_PROPOSAL_ATTEMPTS`] misses the candidate keeps the current
    /// position (or, if that is outside too, the clamped last draw).
    pub fn propose(
        &mut self,
        n: usize,
        sigma_pos: f64,
        sigma_rot: f64,
        boundary: Option<&Boundary>,
        rng: &mut Pcg32,
    ) {
        self.proposals.clear();
        for _ in 0..n {
            let mut candidate = self.pose;
            let mut attempts = 0;
            loop {
                candidate.x = self.pose.x + sigma_pos * rng.next_signed();
                candidate.y = self.pose.y + sigma_pos * rng.next_signed();
                candidate.heading = self.pose.heading + sigma_rot * rng.next_signed();
                attempts += 1;
                let Some(b) = boundary else { break };
                if b.contains(candidate.x, candidate.y) {
                    break;
                }
                if attempts >= MAX_PROPOSAL_ATTEMPTS {
                    let (x, y) = if b.contains(self.pose.x, self.pose.y) {
                        (self.pose.x, self.pose.y)
                    } else {
                        b.bbox().clamp_xy(candidate.x, candidate.y)
                    };
                    log::warn!(
                        "{}: no in-boundary proposal after {} draws, falling back to ({}, {})",
                        self.name,
                        attempts,
                        x,
                        y
                    );
                    candidate.x = x;
                    candidate.y = y;
                    break;
                }
            }
            self.proposals.push(candidate);
        }
    }

    /// Exchange the live pose with proposal `k`. Calling twice restores.
    pub fn swap_proposal(&mut self, k: usize) {
        std::mem::swap(&mut self.pose, &mut self.proposals[k]);
    }
}

// Proposals are scratch space and take no part in equality.
impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.object_id == other.object_id
            && self.class_id == other.class_id
            && self.kind == other.kind
            && self.half_extents == other.half_extents
            && self.pose == other.pose
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [rx, ry, rz] = self.half_extents;
        write!(
            f,
            "Model[{}, {}, {}, Rad({}, {}, {}), {}]",
            self.name, self.object_id, self.class_id, rx, ry, rz, self.pose
        )
    }
}

//! Scene: the placed objects, their class catalog and the cost model.
//!
//! Every pairwise and triple-wise quantity is indexed by object id (the
//! model's position in the scene), never by class id.

use std::f64::consts::PI;
use std::fmt;

use rayon::prelude::*;

use crate::catalog::{ClassCatalog, ObjectClass};
use crate::error::{Error, Result};
use crate::geometry::{Aabb, Boundary, Pose};
use crate::model::Model;
use crate::prng::Pcg32;

pub const DEFAULT_PARAM_ALPHA: f64 = 2.0;

// Cost model weights.
const W_OVERLAP_FIXED: f64 = 1000.0;
const W_OVERLAP_MOVABLE: f64 = 500.0;
const W_PAIRWISE_DIST: f64 = 0.1;
const W_VISIBILITY: f64 = 0.05;
const W_FIXED_ANGLE: f64 = 3.0;
const W_FIXED_DIST: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct Scene {
    catalog: ClassCatalog,
    models: Vec<Model>,
    boundary: Option<Boundary>,
    param_alpha: f64,
    seed: u64,
}

impl Scene {
    pub fn new(catalog: ClassCatalog) -> Self {
        Self {
            catalog,
            models: Vec::new(),
            boundary: None,
            param_alpha: DEFAULT_PARAM_ALPHA,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Append a model. Its object id is forced to its position and its
    /// geometry kind to the one this scene's catalog gives its class.
    pub fn insert(&mut self, mut model: Model) -> Result<usize> {
        let class = self.catalog.get(model.class_id)?;
        model.adopt_class(class);
        let id = self.models.len();
        model.object_id = id;
        self.models.push(model);
        Ok(id)
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    pub fn class_of(&self, object_id: usize) -> &ObjectClass {
        &self.catalog.classes()[self.models[object_id].class_id]
    }

    pub fn is_fixed(&self, object_id: usize) -> bool {
        self.catalog.is_fixed(self.models[object_id].class_id)
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, object_id: usize) -> &Model {
        &self.models[object_id]
    }

    /// Checked variant of [`Scene::model`].
    pub fn get(&self, object_id: usize) -> Result<&Model> {
        self.models.get(object_id).ok_or(Error::InvalidObjectReference {
            object_id,
            num_objects: self.models.len(),
        })
    }

    pub(crate) fn model_mut(&mut self, object_id: usize) -> &mut Model {
        &mut self.models[object_id]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn set_pose(&mut self, object_id: usize, pose: Pose) -> Result<()> {
        let num_objects = self.models.len();
        let model = self
            .models
            .get_mut(object_id)
            .ok_or(Error::InvalidObjectReference {
                object_id,
                num_objects,
            })?;
        model.pose = pose;
        Ok(())
    }

    /// Live poses in object-id order.
    pub fn poses(&self) -> Vec<Pose> {
        self.models.iter().map(|m| m.pose).collect()
    }

    pub(crate) fn poses_mut(&mut self) -> impl Iterator<Item = &mut Pose> + '_ {
        self.models.iter_mut().map(|m| &mut m.pose)
    }

    /// Overwrite live poses from a snapshot taken with [`Scene::poses`].
    pub fn restore_poses(&mut self, poses: &[Pose]) {
        for (live, saved) in self.poses_mut().zip(poses) {
            *live = *saved;
        }
    }

    pub fn set_boundary(&mut self, bbox: Aabb) {
        self.boundary = Some(Boundary::from_box(bbox));
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.boundary.as_ref()
    }

    pub fn param_alpha(&self) -> f64 {
        self.param_alpha
    }

    pub fn set_param_alpha(&mut self, alpha: f64) {
        self.param_alpha = alpha;
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    // -- Geometric quantities ------------------------------------------

    /// Planar distance between the two centers.
    pub fn center_distance(&self, a: usize, b: usize) -> f64 {
        let (pa, pb) = (&self.models[a].pose, &self.models[b].pose);
        (pa.x - pb.x).hypot(pa.y - pb.y)
    }

    /// Sum of each footprint's extent towards the other's center.
    pub fn silhouette_distance(&self, a: usize, b: usize) -> f64 {
        let (ma, mb) = (&self.models[a], &self.models[b]);
        ma.extent_toward(mb.pose.x, mb.pose.y) + mb.extent_toward(ma.pose.x, ma.pose.y)
    }

    /// Sum of the half diagonals; ignores headings.
    pub fn diag_distance(&self, a: usize, b: usize) -> f64 {
        self.models[a].half_diagonal() + self.models[b].half_diagonal()
    }

    pub fn max_recommended_distance(&self, a: usize, b: usize) -> f64 {
        self.catalog
            .max_reco_dist(self.models[a].class_id, self.models[b].class_id)
    }

    pub fn recommended_distance(&self, a: usize, b: usize) -> f64 {
        self.catalog
            .reco_dist(self.models[a].class_id, self.models[b].class_id)
    }

    pub fn recommended_angles(&self, a: usize, b: usize) -> &[f64] {
        self.catalog
            .reco_angles(self.models[a].class_id, self.models[b].class_id)
    }

    /// Heading of `a` minus heading of `b`, not wrapped.
    pub fn relative_heading(&self, a: usize, b: usize) -> f64 {
        self.models[a].pose.heading - self.models[b].pose.heading
    }

    /// Distance from `a` to the midpoint of `b` and `c` (z included).
    pub fn centroid_distance(&self, a: usize, b: usize, c: usize) -> f64 {
        let (pa, pb, pc) = (&self.models[a].pose, &self.models[b].pose, &self.models[c].pose);
        let dx = pa.x - 0.5 * (pb.x + pc.x);
        let dy = pa.y - 0.5 * (pb.y + pc.y);
        let dz = pa.z - 0.5 * (pb.z + pc.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Upper bound on how close `a` may come to the b-c midpoint before it
    /// blocks the line of sight between `b` and `c`.
    pub fn triple_silhouette_distance(&self, a: usize, b: usize, c: usize) -> f64 {
        let (ma, mb, mc) = (&self.models[a], &self.models[b], &self.models[c]);
        let mid_x = 0.5 * (mb.pose.x + mc.pose.x);
        let mid_y = 0.5 * (mb.pose.y + mc.pose.y);
        ma.extent_toward(mid_x, mid_y)
            + mb.extent_toward(mb.pose.x, mb.pose.y)
            + mc.extent_toward(mc.pose.x, mc.pose.y)
            + self.center_distance(b, c)
    }

    // -- Cost terms ----------------------------------------------------

    pub fn overlap_cost(&self, a: usize, b: usize) -> f64 {
        (self.silhouette_distance(a, b) - self.center_distance(a, b)).max(0.0)
    }

    pub fn overlap_cost_diagonal(&self, a: usize, b: usize) -> f64 {
        (self.diag_distance(a, b) - self.center_distance(a, b)).max(0.0)
    }

    /// Penalty for being closer than the footprints allow or farther than
    /// the class pair's maximum. The far check runs last and wins.
    /// A non-positive maximum means the pair has no upper bound.
    pub fn pairwise_distance_cost(&self, a: usize, b: usize) -> f64 {
        let mut cost = 0.0;
        let silhouette = self.silhouette_distance(a, b);
        let dist = self.center_distance(a, b);
        if dist < silhouette {
            cost = (silhouette / dist).powf(self.param_alpha);
        }
        let max_dist = self.max_recommended_distance(a, b);
        if max_dist > 0.0 && dist > max_dist {
            cost = (dist / max_dist).powf(self.param_alpha);
        }
        cost
    }

    /// Penalty for `a` standing between `b` and `c`.
    pub fn visibility_cost(&self, a: usize, b: usize, c: usize) -> f64 {
        (self.triple_silhouette_distance(a, b, c) - self.centroid_distance(a, b, c)).max(0.0)
    }

    pub fn fixed_distance_cost(&self, a: usize, b: usize) -> f64 {
        let diff = self.center_distance(a, b) - self.recommended_distance(a, b);
        diff * diff
    }

    /// Smallest squared wrapped deviation of the relative heading from any
    /// preferred relative heading of the class pair.
    pub fn fixed_angle_cost(&self, a: usize, b: usize) -> Result<f64> {
        let angle = self.relative_heading(a, b);
        self.recommended_angles(a, b)
            .iter()
            .map(|&preferred| {
                let diff = preferred - angle;
                let wrapped = diff.sin().atan2(diff.cos());
                wrapped * wrapped
            })
            .reduce(f64::min)
            .ok_or(Error::EmptyAngleConstraint { a, b })
    }

    /// Closest fixed object to `object_id` by center distance; the lowest
    /// id wins ties.
    pub fn nearest_fixed(&self, object_id: usize) -> Option<usize> {
        let mut nearest = None;
        let mut nearest_dist = f64::MAX;
        for j in 0..self.models.len() {
            if j == object_id || !self.is_fixed(j) {
                continue;
            }
            let d = self.center_distance(object_id, j);
            if d < nearest_dist {
                nearest_dist = d;
                nearest = Some(j);
            }
        }
        nearest
    }

    /// Anchor terms for a movable object against its nearest fixed one.
    fn anchor_cost(&self, i: usize) -> f64 {
        let Some(j) = self.nearest_fixed(i) else {
            return 0.0;
        };
        // Pairs without preferred headings contribute no angle penalty.
        let angle_cost = self.fixed_angle_cost(i, j).unwrap_or(0.0);
        W_FIXED_ANGLE * angle_cost + W_FIXED_DIST * self.fixed_distance_cost(i, j)
    }

    /// All terms whose outer pair index is `i`.
    fn partial_cost(&self, i: usize) -> f64 {
        let n = self.models.len();
        let fixed_i = self.is_fixed(i);
        let mut cost = 0.0;
        for j in (i + 1)..n {
            let fixed_j = self.is_fixed(j);
            if fixed_i && fixed_j {
                continue;
            }
            if fixed_i || fixed_j {
                cost += W_OVERLAP_FIXED * self.overlap_cost(i, j);
            } else {
                cost += W_OVERLAP_MOVABLE * self.overlap_cost_diagonal(i, j);
            }
            cost += W_PAIRWISE_DIST * self.pairwise_distance_cost(i, j);
            for k in 0..n {
                if k == i || k == j {
                    continue;
                }
                cost += W_VISIBILITY * self.visibility_cost(k, i, j);
            }
        }
        if !fixed_i {
            cost += self.anchor_cost(i);
        }
        cost
    }

    /// The annealing objective. Outer indices are scored in parallel and
    /// the partial sums are added in index order, so the result does not
    /// depend on thread scheduling.
    pub fn total_cost(&self) -> f64 {
        let partials: Vec<f64> = (0..self.models.len())
            .into_par_iter()
            .map(|i| self.partial_cost(i))
            .collect();
        partials.iter().sum()
    }

    // -- Randomization -------------------------------------------------

    /// Uniform pose inside the boundary box (or [-1, 1]^2 without one),
    /// heading uniform in [-PI, PI).
    pub fn random_pose(&self, rng: &mut Pcg32) -> Pose {
        let (x, y) = match &self.boundary {
            Some(b) => {
                let bbox = b.bbox();
                (
                    bbox.center[0] + bbox.half_extents[0] * rng.next_signed(),
                    bbox.center[1] + bbox.half_extents[1] * rng.next_signed(),
                )
            }
            None => (rng.next_signed(), rng.next_signed()),
        };
        Pose::new(x, y, 0.0, PI * rng.next_signed())
    }

    /// Re-place every movable object at a random pose.
    pub fn scatter(&mut self, rng: &mut Pcg32) {
        for i in 0..self.models.len() {
            if !self.is_fixed(i) {
                self.models[i].pose = self.random_pose(rng);
            }
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene[")?;
        for model in &self.models {
            write!(f, "{model}, ")?;
        }
        write!(f, "]")
    }
}

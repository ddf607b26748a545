//! Data types for the layout engine JSON schema.
//!
//! Every struct here derives Serialize + Deserialize so it can
//! round-trip through the JSON interchange format.

use serde::{Deserialize, Serialize};

use crate::annealer::{CostTrace, DEFAULT_MAX_ITERS, DEFAULT_NUM_PROPOSALS};
use crate::catalog::GeomKind;
use crate::geometry::{Aabb, Pose};
use crate::scene::DEFAULT_PARAM_ALPHA;

// -- Scene snapshot ------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    pub kind: GeomKind,
    #[serde(default)]
    pub is_fixed: bool,
}

/// Preferences for the unordered class pair {a, b}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSpec {
    pub a: usize,
    pub b: usize,
    #[serde(default)]
    pub max_reco_dist: f64,
    #[serde(default)]
    pub reco_dist: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reco_angles: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    /// Informational; reassigned to the model's position on load.
    #[serde(default)]
    pub object_id: usize,
    pub class_id: usize,
    pub half_extents: [f64; 3],
    #[serde(default)]
    pub pose: Pose,
}

fn default_param_alpha() -> f64 {
    DEFAULT_PARAM_ALPHA
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default = "default_param_alpha")]
    pub param_alpha: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Aabb>,
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
    #[serde(default)]
    pub pair_tables: Vec<PairSpec>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

// -- Solver I/O ----------------------------------------------------

fn default_max_iters() -> u32 {
    DEFAULT_MAX_ITERS
}

fn default_num_proposals() -> u32 {
    DEFAULT_NUM_PROPOSALS as u32
}

fn default_record_trace() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveParams {
    pub seed: u64,
    pub scene: SceneSnapshot,
    #[serde(default = "default_max_iters")]
    pub max_iters: u32,
    #[serde(default = "default_num_proposals")]
    pub num_proposals: u32,
    #[serde(default = "default_record_trace")]
    pub record_trace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    /// The scene with every model at its best-found pose.
    pub scene: SceneSnapshot,
    pub initial_cost: f64,
    pub best_cost: f64,
    #[serde(default)]
    pub iterations_completed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<CostTrace>,
}

// -- Tests ---------------------------------------------------------

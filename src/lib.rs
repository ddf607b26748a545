//! Constraint-driven furniture layout by simulated annealing.
//!
//! A [`Scene`] holds fixed objects (walls) and movable ones (furniture),
//! each with a class from a [`ClassCatalog`] that carries pairwise distance
//! and heading preferences. [`Scene::total_cost`] scores a layout and the
//! [`Annealer`] searches poses that minimize it.
//!
//! The JSON entry point [`solve_json`] accepts a string matching
//! [`SolveParams`] and returns a string matching [`SolveResult`]. With the
//! `python` feature the same function is importable from Python.

pub mod annealer;
pub mod catalog;
pub mod error;
pub mod geometry;
pub mod model;
pub mod prng;
pub mod scene;
pub mod snapshot;
pub mod solve;
pub mod types;

pub use annealer::{Annealer, CostTrace, Frame, FrameKind, RenderHook};
pub use catalog::{ClassCatalog, GeomKind, ObjectClass};
pub use error::{Error, Result};
pub use geometry::{Aabb, Pose};
pub use model::Model;
pub use scene::Scene;
pub use types::{SceneSnapshot, SolveParams, SolveResult};

/// Run the layout engine on a JSON `SolveParams` document and return the
/// JSON `SolveResult`.
pub fn solve_json(params_json: &str) -> Result<String> {
    let params: SolveParams = serde_json::from_str(params_json)?;
    let result = solve::solve(&params)?;
    Ok(serde_json::to_string(&result)?)
}

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;

    /// Run the layout engine.
    ///
    /// Takes a JSON string matching the `SolveParams` schema and
    /// returns a JSON string matching the `SolveResult` schema.
    #[pyfunction]
    fn solve_json(params_json: &str) -> PyResult<String> {
        super::solve_json(params_json).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("layout solve failed: {e}"))
        })
    }

    /// Layout engine, importable from Python.
    #[pymodule]
    fn layout_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(solve_json, m)?)?;
        Ok(())
    }
}

//! Main entry point: build the scene, anneal it, report the best layout.

use crate::annealer::Annealer;
use crate::error::Result;
use crate::types::{SceneSnapshot, SolveParams, SolveResult};

/// Run one annealing pass as described by `params`.
///
/// `params.seed` overrides the seed stored in the scene snapshot; the
/// returned snapshot carries the seed that was actually used.
pub fn solve(params: &SolveParams) -> Result<SolveResult> {
    let mut scene = params.scene.to_scene()?;
    scene.set_seed(params.seed);

    let mut annealer = Annealer::new(&mut scene)
        .with_max_iters(params.max_iters)
        .with_num_proposals(params.num_proposals as usize)
        .with_trace(params.record_trace);
    annealer.initialise();
    let initial_cost = annealer.best_cost();
    let best_cost = annealer.run();
    let iterations_completed = annealer.iteration();
    let trace = annealer.take_trace();

    log::info!(
        "solve seed={} iters={} cost {} -> {}",
        params.seed,
        iterations_completed,
        initial_cost,
        best_cost
    );

    Ok(SolveResult {
        scene: SceneSnapshot::from_scene(&scene),
        initial_cost,
        best_cost,
        iterations_completed,
        trace,
    })
}

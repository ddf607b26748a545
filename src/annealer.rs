//! Simulated annealing over object poses.
//!
//! One epoch visits every object once in a random order. Movable objects
//! draw `num_proposals` candidate poses, and each candidate is swapped in,
//! scored, and either kept or swapped back:
//!
//! - a candidate that beats the best cost so far is always kept and the
//!   whole layout is snapshotted as the new best;
//! - otherwise it is kept when it beats the current cost, or with a
//!   Metropolis probability `exp((old - new) / beta)` where
//!   `beta = 1 / iteration^2`.
//!
//! The temperature `beta` follows the iteration count alone. The cooling
//! schedule value only scales how far proposals may jump.

use std::f64::consts::{SQRT_2, TAU};
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::geometry::Pose;
use crate::prng::Pcg32;
use crate::scene::Scene;

pub const DEFAULT_MAX_ITERS: u32 = 500;
pub const DEFAULT_NUM_PROPOSALS: usize = 1;

/// Proposal spread scale for iteration `iteration` (0-based) of `max_iters`.
pub type Schedule = fn(u32, u32) -> f64;

/// `1 - d + d^2 (1 - d^2)` with `d = iteration / max_iters`. Starts at 1,
/// dips below the linear ramp and widens again before the end.
pub fn default_schedule(iteration: u32, max_iters: u32) -> f64 {
    let d = iteration as f64 / max_iters as f64;
    let d2 = d * d;
    1.0 - d + d2 * (1.0 - d2)
}

/// Metropolis test for a non-improving candidate.
///
/// Improvements over `old_cost` are accepted without consuming randomness.
/// Otherwise draws once and accepts with probability
/// `exp((old_cost - new_cost) / beta)`.
pub fn metropolis_accept(old_cost: f64, new_cost: f64, beta: f64, rng: &mut Pcg32) -> bool {
    if new_cost < old_cost {
        return true;
    }
    let ratio = ((old_cost - new_cost) / beta).exp();
    ratio > 0.5 * (rng.next_signed() + 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Scene right after scattering.
    Initial,
    /// A candidate pose has just been swapped in.
    Candidate,
    /// An epoch finished.
    EpochEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub iteration: u32,
    pub max_iters: u32,
    pub kind: FrameKind,
}

/// Observer for drawing or recording the layout while it anneals.
pub trait RenderHook {
    fn on_frame(&mut self, frame: Frame, scene: &Scene);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub index: usize,
    pub current: f64,
    pub best: f64,
}

/// Current and best cost sampled before every object visit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTrace {
    points: Vec<TracePoint>,
}

impl CostTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, current: f64, best: f64) {
        let index = self.points.len();
        self.points.push(TracePoint {
            index,
            current,
            best,
        });
    }

    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// One `"<index> <current> <best>"` line per point.
    pub fn write_text<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for p in &self.points {
            writeln!(out, "{} {} {}", p.index, p.current, p.best)?;
        }
        Ok(())
    }
}

pub struct Annealer<'a> {
    scene: &'a mut Scene,
    rng: Pcg32,
    old_cost: f64,
    new_cost: f64,
    best_cost: f64,
    best_poses: Vec<Pose>,
    iteration: u32,
    max_iters: u32,
    num_proposals: usize,
    schedule: Schedule,
    hook: Option<&'a mut dyn RenderHook>,
    trace: Option<CostTrace>,
}

impl<'a> Annealer<'a> {
    /// Borrow `scene` for one run, seeding the generator from the scene seed.
    pub fn new(scene: &'a mut Scene) -> Self {
        let rng = Pcg32::from_seed(scene.seed());
        let best_poses = scene.poses();
        Self {
            scene,
            rng,
            old_cost: f64::MAX,
            new_cost: f64::MAX,
            best_cost: f64::MAX,
            best_poses,
            iteration: 0,
            max_iters: DEFAULT_MAX_ITERS,
            num_proposals: DEFAULT_NUM_PROPOSALS,
            schedule: default_schedule,
            hook: None,
            trace: Some(CostTrace::new()),
        }
    }

    pub fn with_max_iters(mut self, max_iters: u32) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_num_proposals(mut self, num_proposals: usize) -> Self {
        self.num_proposals = num_proposals;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_render_hook(mut self, hook: &'a mut dyn RenderHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Disable or enable the cost trace.
    pub fn with_trace(mut self, record: bool) -> Self {
        self.trace = record.then(CostTrace::new);
        self
    }

    pub fn scene(&self) -> &Scene {
        &*self.scene
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn max_iters(&self) -> u32 {
        self.max_iters
    }

    pub fn current_cost(&self) -> f64 {
        self.new_cost
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn best_poses(&self) -> &[Pose] {
        &self.best_poses
    }

    pub fn trace(&self) -> Option<&CostTrace> {
        self.trace.as_ref()
    }

    pub fn take_trace(&mut self) -> Option<CostTrace> {
        self.trace.take()
    }

    /// Copy the live scene poses into the best snapshot.
    pub fn snapshot_best(&mut self) {
        self.best_poses.clear();
        self.best_poses.extend(self.scene.models().iter().map(|m| m.pose));
    }

    /// Copy the best snapshot back into the live scene.
    pub fn restore_best(&mut self) {
        self.scene.restore_poses(&self.best_poses);
    }

    fn emit(&mut self, kind: FrameKind) {
        if let Some(hook) = self.hook.as_deref_mut() {
            let frame = Frame {
                iteration: self.iteration,
                max_iters: self.max_iters,
                kind,
            };
            hook.on_frame(frame, &*self.scene);
        }
    }

    /// Scatter movable objects and reset every cost to the scattered layout.
    pub fn initialise(&mut self) {
        self.scene.scatter(&mut self.rng);
        self.iteration = 0;
        self.old_cost = self.scene.total_cost();
        self.new_cost = self.old_cost;
        self.best_cost = self.new_cost;
        self.snapshot_best();
        if let Some(trace) = self.trace.as_mut() {
            trace.points.clear();
        }
        log::debug!("initialised {} objects, cost {}", self.scene.len(), self.best_cost);
        self.emit(FrameKind::Initial);
    }

    /// Half diagonal of the boundary box, or of the [-1, 1]^2 scatter square
    /// when the scene has no boundary.
    fn room_half_diagonal(&self) -> f64 {
        self.scene
            .boundary()
            .map_or(SQRT_2, |b| b.bbox().half_diagonal())
    }

    /// Run one epoch with proposal spreads scaled by `schedule_value`.
    pub fn iterate(&mut self, schedule_value: f64) {
        self.iteration += 1;
        let it = self.iteration as f64;
        let beta = 1.0 / (it * it);
        let sigma_pos = 0.5 * schedule_value * self.room_half_diagonal();
        let sigma_rot = 0.5 * schedule_value * TAU;

        let boundary = self.scene.boundary().cloned();
        let order = self.rng.permutation(self.scene.len());
        for object_id in order {
            let (current, best) = (self.new_cost, self.best_cost);
            if let Some(trace) = self.trace.as_mut() {
                trace.push(current, best);
            }
            if self.scene.is_fixed(object_id) {
                continue;
            }

            self.scene.model_mut(object_id).propose(
                self.num_proposals,
                sigma_pos,
                sigma_rot,
                boundary.as_ref(),
                &mut self.rng,
            );

            for k in 0..self.num_proposals {
                self.scene.model_mut(object_id).swap_proposal(k);
                self.emit(FrameKind::Candidate);
                self.new_cost = self.scene.total_cost();

                if self.new_cost < self.best_cost {
                    self.best_cost = self.new_cost;
                    self.snapshot_best();
                    continue;
                }
                if metropolis_accept(self.old_cost, self.new_cost, beta, &mut self.rng) {
                    self.old_cost = self.new_cost;
                } else {
                    self.scene.model_mut(object_id).swap_proposal(k);
                }
            }
        }

        log::debug!(
            "iteration {}/{}: spread {:.4}, current {}, best {}",
            self.iteration,
            self.max_iters,
            schedule_value,
            self.new_cost,
            self.best_cost
        );
        self.emit(FrameKind::EpochEnd);
    }

    /// Initialise, then [`Annealer::run`]. Returns the best cost.
    pub fn solve(&mut self) -> f64 {
        log::info!(
            "annealing {} objects for {} iterations, {} proposals each",
            self.scene.len(),
            self.max_iters,
            self.num_proposals
        );
        self.initialise();
        self.run()
    }

    /// Run `max_iters` epochs on the schedule from the initialised state,
    /// then leave the best layout found in the scene.
    pub fn run(&mut self) -> f64 {
        let initial = self.best_cost;
        for i in 0..self.max_iters {
            let scale = (self.schedule)(i, self.max_iters);
            self.iterate(scale);
        }
        self.restore_best();
        log::info!("annealing done: cost {} -> {}", initial, self.best_cost);
        self.best_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ClassCatalog, GeomKind};
    use crate::geometry::Aabb;
    use crate::model::Model;
    use approx::assert_relative_eq;

    fn small_room(seed: u64, fixed_only: bool) -> Scene {
        let mut catalog = ClassCatalog::new();
        let wall = catalog.add("wall", GeomKind::Cuboid, true).unwrap();
        let chair = catalog.add("chair", GeomKind::Cuboid, false).unwrap();
        catalog.set_pair(wall, chair, 0.0, 0.5, vec![0.0]).unwrap();
        catalog.set_pair(chair, chair, 2.0, 0.8, vec![0.0]).unwrap();
        let wall_class = catalog.get(wall).unwrap().clone();
        let chair_class = catalog.get(chair).unwrap().clone();

        let mut scene = Scene::new(catalog).with_seed(seed);
        scene.set_boundary(Aabb::new([0.0; 3], [3.0, 2.0, 1.0]));
        scene
            .insert(
                Model::new("wall", &wall_class, [3.0, 0.5, 1.0])
                    .at(Pose::new(0.0, 2.5, 0.0, 0.0)),
            )
            .unwrap();
        if !fixed_only {
            for n in 0..3 {
                scene
                    .insert(Model::new(format!("chair_{n}"), &chair_class, [0.3, 0.3, 0.5]))
                    .unwrap();
            }
        }
        scene
    }

    #[derive(Default)]
    struct Counter {
        initial: usize,
        candidate: usize,
        epoch_end: usize,
        last_iteration: u32,
    }

    impl RenderHook for Counter {
        fn on_frame(&mut self, frame: Frame, _scene: &Scene) {
            match frame.kind {
                FrameKind::Initial => self.initial += 1,
                FrameKind::Candidate => self.candidate += 1,
                FrameKind::EpochEnd => self.epoch_end += 1,
            }
            self.last_iteration = frame.iteration;
        }
    }

    #[test]
    fn schedule_shape() {
        assert_eq!(default_schedule(0, 100), 1.0);
        assert_relative_eq!(default_schedule(50, 100), 0.6875);
        assert_relative_eq!(default_schedule(99, 100), 1.0 - 0.99 + 0.9801 * (1.0 - 0.9801), epsilon = 1e-12);
        assert!(default_schedule(99, 100) < 0.05);
    }

    #[test]
    fn metropolis_improvement_consumes_no_randomness() {
        let mut a = Pcg32::from_seed(3);
        let mut b = Pcg32::from_seed(3);
        assert!(metropolis_accept(5.0, 4.0, 1e-6, &mut a));
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn metropolis_rejects_large_uphill_when_cold() {
        let mut rng = Pcg32::from_seed(9);
        for _ in 0..100 {
            assert!(!metropolis_accept(1.0, 2.0, 1e-4, &mut rng));
        }
    }

    #[test]
    fn metropolis_rate_matches_ratio() {
        let mut rng = Pcg32::from_seed(123);
        let trials = 10_000;
        let accepted = (0..trials)
            .filter(|_| metropolis_accept(1.0, 2.0, 1.0, &mut rng))
            .count();
        let rate = accepted as f64 / trials as f64;
        let expected = (-1.0_f64).exp();
        assert!((rate - expected).abs() < 0.03, "rate {rate} vs {expected}");
    }

    #[test]
    fn best_trace_never_increases() {
        let mut scene = small_room(1, false);
        let mut annealer = Annealer::new(&mut scene)
            .with_max_iters(40)
            .with_num_proposals(3);
        let best = annealer.solve();
        let trace = annealer.trace().unwrap();
        assert_eq!(trace.len(), 40 * 4);
        for pair in trace.points().windows(2) {
            assert!(pair[1].best <= pair[0].best);
            assert_eq!(pair[1].index, pair[0].index + 1);
        }
        assert!(best <= trace.points()[0].best);
    }

    #[test]
    fn solve_leaves_best_layout_in_scene() {
        let mut scene = small_room(2, false);
        let best = Annealer::new(&mut scene)
            .with_max_iters(30)
            .with_num_proposals(2)
            .solve();
        assert_eq!(scene.total_cost().to_bits(), best.to_bits());
    }

    #[test]
    fn best_snapshot_tracks_improvements() {
        let mut scene = small_room(3, false);
        let mut annealer = Annealer::new(&mut scene).with_num_proposals(4);
        annealer.initialise();
        let start = annealer.best_cost();
        for i in 0..20 {
            annealer.iterate(default_schedule(i, 20));
            // The snapshot always reproduces the recorded best cost.
            let live = annealer.scene().poses();
            let best = annealer.best_poses().to_vec();
            annealer.restore_best();
            assert_eq!(annealer.scene().poses(), best);
            assert_eq!(annealer.scene().total_cost().to_bits(), annealer.best_cost().to_bits());
            annealer.scene.restore_poses(&live);
        }
        assert!(annealer.best_cost() <= start);
    }

    #[test]
    fn same_seed_same_result() {
        let run = |seed| {
            let mut scene = small_room(seed, false);
            let cost = Annealer::new(&mut scene).with_max_iters(15).solve();
            (cost, scene.poses())
        };
        let (c1, p1) = run(7);
        let (c2, p2) = run(7);
        assert_eq!(c1.to_bits(), c2.to_bits());
        assert_eq!(p1, p2);
    }

    #[test]
    fn only_fixed_objects_is_a_no_op() {
        let mut scene = small_room(4, true);
        let before = scene.poses();
        let mut annealer = Annealer::new(&mut scene).with_max_iters(10);
        annealer.initialise();
        let initial = annealer.best_cost();
        let best = annealer.run();
        assert_eq!(best, initial);
        assert_eq!(scene.poses(), before);
    }

    #[test]
    fn hook_sees_every_frame() {
        let mut scene = small_room(5, false);
        let mut counter = Counter::default();
        Annealer::new(&mut scene)
            .with_max_iters(6)
            .with_num_proposals(2)
            .with_render_hook(&mut counter)
            .solve();
        assert_eq!(counter.initial, 1);
        assert_eq!(counter.epoch_end, 6);
        // Three chairs, two candidates each, every epoch.
        assert_eq!(counter.candidate, 6 * 3 * 2);
        assert_eq!(counter.last_iteration, 6);
    }

    #[test]
    fn trace_can_be_disabled() {
        let mut scene = small_room(6, false);
        let mut annealer = Annealer::new(&mut scene).with_max_iters(3).with_trace(false);
        annealer.solve();
        assert!(annealer.trace().is_none());
    }

    #[test]
    fn trace_text_format() {
        let mut trace = CostTrace::new();
        trace.push(3.5, 2.0);
        trace.push(2.0, 2.0);
        let mut out = Vec::new();
        trace.write_text(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 3.5 2\n1 2 2\n");
    }
}

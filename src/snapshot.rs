//! Conversion between a live [`Scene`] and its serializable snapshot.
//!
//! Loading goes through the same catalog and scene insert paths as
//! programmatic construction, so a reloaded scene has symmetric pair tables
//! and object ids equal to positions regardless of what the document says.

use std::fs;
use std::path::Path;

use crate::catalog::{ClassCatalog, ObjectClass};
use crate::error::Result;
use crate::model::Model;
use crate::scene::Scene;
use crate::types::{ClassSpec, ModelSpec, PairSpec, SceneSnapshot};

impl SceneSnapshot {
    pub fn from_scene(scene: &Scene) -> Self {
        let catalog = scene.catalog();
        let classes = catalog
            .classes()
            .iter()
            .map(|c| ClassSpec {
                name: c.name.clone(),
                kind: c.kind,
                is_fixed: c.is_fixed,
            })
            .collect();

        // Upper triangle only; untouched entries are left out.
        let mut pair_tables = Vec::new();
        for a in 0..catalog.len() {
            for b in a..catalog.len() {
                let max_reco_dist = catalog.max_reco_dist(a, b);
                let reco_dist = catalog.reco_dist(a, b);
                let reco_angles = catalog.reco_angles(a, b);
                if max_reco_dist == 0.0 && reco_dist == 0.0 && reco_angles.is_empty() {
                    continue;
                }
                pair_tables.push(PairSpec {
                    a,
                    b,
                    max_reco_dist,
                    reco_dist,
                    reco_angles: reco_angles.to_vec(),
                });
            }
        }

        let models = scene
            .models()
            .iter()
            .map(|m| ModelSpec {
                name: m.name.clone(),
                object_id: m.object_id,
                class_id: m.class_id,
                half_extents: m.half_extents(),
                pose: m.pose,
            })
            .collect();

        Self {
            param_alpha: scene.param_alpha(),
            seed: scene.seed(),
            boundary: scene.boundary().map(|b| *b.bbox()),
            classes,
            pair_tables,
            models,
        }
    }

    /// Rebuild the scene, validating every class reference.
    pub fn to_scene(&self) -> Result<Scene> {
        let mut catalog = ClassCatalog::new();
        for spec in &self.classes {
            catalog.insert(ObjectClass::new(spec.name.clone(), spec.kind, spec.is_fixed))?;
        }
        for pair in &self.pair_tables {
            catalog.set_pair(
                pair.a,
                pair.b,
                pair.max_reco_dist,
                pair.reco_dist,
                pair.reco_angles.clone(),
            )?;
        }

        let mut scene = Scene::new(catalog).with_seed(self.seed);
        scene.set_param_alpha(self.param_alpha);
        if let Some(bbox) = self.boundary {
            scene.set_boundary(bbox);
        }
        for spec in &self.models {
            let class = scene.catalog().get(spec.class_id)?.clone();
            scene.insert(Model::new(spec.name.clone(), &class, spec.half_extents).at(spec.pose))?;
        }
        log::debug!(
            "loaded scene: {} classes, {} models",
            scene.catalog().len(),
            scene.len()
        );
        Ok(scene)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Scene {
    pub fn to_json(&self) -> Result<String> {
        SceneSnapshot::from_scene(self).to_json()
    }

    pub fn from_json(json: &str) -> Result<Scene> {
        SceneSnapshot::from_json(json)?.to_scene()
    }

    /// Write the scene as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("saved scene ({} models) to {}", self.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Scene> {
        let path = path.as_ref();
        let scene = Scene::from_json(&fs::read_to_string(path)?)?;
        log::info!("loaded scene ({} models) from {}", scene.len(), path.display());
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GeomKind;
    use crate::error::Error;
    use crate::geometry::{Aabb, Pose};

    fn sample() -> Scene {
        let mut catalog = ClassCatalog::new();
        catalog.add("wall", GeomKind::Cuboid, true).unwrap();
        catalog.add("table", GeomKind::Ellipsoid, false).unwrap();
        catalog.set_pair(0, 1, 0.0, 0.4, vec![0.0, 1.5]).unwrap();
        catalog.set_pair(1, 1, 3.0, 0.0, vec![]).unwrap();
        let wall = catalog.get(0).unwrap().clone();
        let table = catalog.get(1).unwrap().clone();

        let mut scene = Scene::new(catalog).with_seed(77);
        scene.set_param_alpha(2.5);
        scene.set_boundary(Aabb::new([0.5, 0.0, 0.0], [3.0, 2.0, 1.0]));
        scene
            .insert(Model::new("wall", &wall, [3.0, 0.5, 1.0]).at(Pose::new(0.5, 2.5, 0.0, 0.0)))
            .unwrap();
        scene
            .insert(
                Model::new("table", &table, [0.6, 0.4, 0.4])
                    .at(Pose::new(0.1, -0.3, 0.0, 0.1 + 0.2)),
            )
            .unwrap();
        scene
    }

    #[test]
    fn snapshot_keeps_only_set_pairs() {
        let snap = SceneSnapshot::from_scene(&sample());
        assert_eq!(snap.pair_tables.len(), 2);
        assert_eq!((snap.pair_tables[0].a, snap.pair_tables[0].b), (0, 1));
        assert_eq!((snap.pair_tables[1].a, snap.pair_tables[1].b), (1, 1));
        assert_eq!(snap.boundary.unwrap().center, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn reload_is_exact() {
        let scene = sample();
        let json = scene.to_json().unwrap();
        let back = Scene::from_json(&json).unwrap();
        assert_eq!(back.catalog(), scene.catalog());
        assert_eq!(back.models(), scene.models());
        assert_eq!(back.seed(), 77);
        assert_eq!(back.param_alpha(), 2.5);
        assert_eq!(back.total_cost().to_bits(), scene.total_cost().to_bits());
        // Reloading twice changes nothing.
        assert_eq!(back.to_json().unwrap(), json);
    }

    #[test]
    fn object_ids_follow_position() {
        let mut snap = SceneSnapshot::from_scene(&sample());
        snap.models[0].object_id = 9;
        snap.models[1].object_id = 9;
        let scene = snap.to_scene().unwrap();
        assert_eq!(scene.model(0).object_id, 0);
        assert_eq!(scene.model(1).object_id, 1);
    }

    #[test]
    fn bad_references_are_rejected() {
        let mut snap = SceneSnapshot::from_scene(&sample());
        snap.models[1].class_id = 5;
        assert!(matches!(
            snap.to_scene(),
            Err(Error::InvalidClassReference { class_id: 5, num_classes: 2 })
        ));

        let mut snap = SceneSnapshot::from_scene(&sample());
        snap.pair_tables[0].b = 4;
        assert!(matches!(
            snap.to_scene(),
            Err(Error::InvalidClassReference { class_id: 4, .. })
        ));

        let mut snap = SceneSnapshot::from_scene(&sample());
        snap.classes[1].name = "wall".into();
        assert!(matches!(snap.to_scene(), Err(Error::DuplicateClassName(_))));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(Scene::from_json("{\"models\": 3}"), Err(Error::Json(_))));
    }

    #[test]
    fn file_round_trip() {
        let scene = sample();
        let path = std::env::temp_dir().join(format!(
            "layout_engine_snapshot_{}.json",
            std::process::id()
        ));
        scene.save(&path).unwrap();
        let back = Scene::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back.models(), scene.models());
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("layout_engine_no_such_scene.json");
        assert!(matches!(Scene::load(path), Err(Error::Io(_))));
    }
}

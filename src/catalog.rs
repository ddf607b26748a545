//! Object classes and the pairwise placement preferences between them.
//!
//! The three class-pair tables are square (one row and column per class)
//! and symmetric: every write goes through [`ClassCatalog::set_pair`] or its
//! single-table siblings, which mirror the value across the diagonal.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Footprint shape family of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeomKind {
    Ellipsoid,
    Cuboid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectClass {
    pub name: String,
    pub kind: GeomKind,
    pub is_fixed: bool,
    /// Index in the owning catalog; assigned on insert.
    pub class_id: usize,
}

impl ObjectClass {
    pub fn new(name: impl Into<String>, kind: GeomKind, is_fixed: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            is_fixed,
            class_id: 0,
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            GeomKind::Cuboid => "Cuboid",
            GeomKind::Ellipsoid => "Ellipsoid",
        };
        let mobility = if self.is_fixed { "fixed" } else { "var" };
        write!(f, "Class[{}, {}, {}, {}]", self.name, self.class_id, kind, mobility)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassCatalog {
    classes: Vec<ObjectClass>,
    by_name: HashMap<String, usize>,
    max_reco_dist: Vec<Vec<f64>>,
    reco_dist: Vec<Vec<f64>>,
    reco_angles: Vec<Vec<Vec<f64>>>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a class, growing every pair table by one row and column of
    /// "unconstrained" entries. Returns the assigned class id.
    pub fn insert(&mut self, mut class: ObjectClass) -> Result<usize> {
        if self.by_name.contains_key(&class.name) {
            return Err(Error::DuplicateClassName(class.name));
        }
        let id = self.classes.len();
        class.class_id = id;
        self.by_name.insert(class.name.clone(), id);
        self.classes.push(class);

        for row in &mut self.max_reco_dist {
            row.push(0.0);
        }
        for row in &mut self.reco_dist {
            row.push(0.0);
        }
        for row in &mut self.reco_angles {
            row.push(Vec::new());
        }
        self.max_reco_dist.push(vec![0.0; id + 1]);
        self.reco_dist.push(vec![0.0; id + 1]);
        self.reco_angles.push(vec![Vec::new(); id + 1]);
        Ok(id)
    }

    /// Convenience for `insert(ObjectClass::new(..))`.
    pub fn add(&mut self, name: &str, kind: GeomKind, is_fixed: bool) -> Result<usize> {
        self.insert(ObjectClass::new(name, kind, is_fixed))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[ObjectClass] {
        &self.classes
    }

    pub fn get(&self, class_id: usize) -> Result<&ObjectClass> {
        self.classes.get(class_id).ok_or(Error::InvalidClassReference {
            class_id,
            num_classes: self.classes.len(),
        })
    }

    pub fn get_by_name(&self, name: &str) -> Result<&ObjectClass> {
        self.by_name
            .get(name)
            .map(|&id| &self.classes[id])
            .ok_or_else(|| Error::UnknownClassName(name.to_string()))
    }

    pub fn id_of(&self, name: &str) -> Result<usize> {
        self.get_by_name(name).map(|c| c.class_id)
    }

    fn check_pair(&self, a: usize, b: usize) -> Result<()> {
        let n = self.classes.len();
        for class_id in [a, b] {
            if class_id >= n {
                return Err(Error::InvalidClassReference {
                    class_id,
                    num_classes: n,
                });
            }
        }
        Ok(())
    }

    /// Set all three preferences for the unordered pair {a, b}.
    pub fn set_pair(
        &mut self,
        a: usize,
        b: usize,
        max_reco_dist: f64,
        reco_dist: f64,
        reco_angles: Vec<f64>,
    ) -> Result<()> {
        self.set_max_reco_dist(a, b, max_reco_dist)?;
        self.set_reco_dist(a, b, reco_dist)?;
        self.set_reco_angles(a, b, reco_angles)
    }

    pub fn set_max_reco_dist(&mut self, a: usize, b: usize, value: f64) -> Result<()> {
        self.check_pair(a, b)?;
        self.max_reco_dist[a][b] = value;
        self.max_reco_dist[b][a] = value;
        Ok(())
    }

    pub fn set_reco_dist(&mut self, a: usize, b: usize, value: f64) -> Result<()> {
        self.check_pair(a, b)?;
        self.reco_dist[a][b] = value;
        self.reco_dist[b][a] = value;
        Ok(())
    }

    pub fn set_reco_angles(&mut self, a: usize, b: usize, angles: Vec<f64>) -> Result<()> {
        self.check_pair(a, b)?;
        self.reco_angles[a][b] = angles.clone();
        self.reco_angles[b][a] = angles;
        Ok(())
    }

    // Unchecked readers: the scene only passes class ids it validated on
    // insert.

    pub fn max_reco_dist(&self, a: usize, b: usize) -> f64 {
        self.max_reco_dist[a][b]
    }

    pub fn reco_dist(&self, a: usize, b: usize) -> f64 {
        self.reco_dist[a][b]
    }

    pub fn reco_angles(&self, a: usize, b: usize) -> &[f64] {
        &self.reco_angles[a][b]
    }

    pub fn is_fixed(&self, class_id: usize) -> bool {
        self.classes[class_id].is_fixed
    }
}

impl fmt::Display for ClassCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Catalog[")?;
        for class in &self.classes {
            write!(f, "{class}, ")?;
        }
        write!(f, "]")
    }
}

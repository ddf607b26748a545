//! Shared fixtures: a 6 x 4 room with four walls, a bed, a table and four
//! chairs.

#![allow(dead_code)]

use std::f64::consts::PI;

use layout_engine::{Aabb, ClassCatalog, GeomKind, Model, Pose, Scene};

pub const WALL_THICKNESS: f64 = 1.0;
pub const ROOM_LENGTH: f64 = 6.0;
pub const ROOM_BREADTH: f64 = 4.0;

pub fn furniture_catalog() -> ClassCatalog {
    let mut c = ClassCatalog::new();
    let wall = c.add("wall", GeomKind::Cuboid, true).unwrap();
    let bed = c.add("bed", GeomKind::Cuboid, false).unwrap();
    let table = c.add("table", GeomKind::Ellipsoid, false).unwrap();
    let chair = c.add("chair", GeomKind::Cuboid, false).unwrap();

    let square = || vec![0.0, 0.5 * PI, PI, 1.5 * PI];
    c.set_pair(wall, bed, 2.0, 0.1, square()).unwrap();
    c.set_pair(wall, table, 2.0, 0.5, square()).unwrap();
    c.set_pair(wall, chair, 3.0, 0.5, square()).unwrap();
    c.set_pair(bed, bed, 8.0, 5.0, square()).unwrap();
    c.set_pair(bed, table, 6.0, 2.5, square()).unwrap();
    c.set_pair(bed, chair, 3.0, 2.5, square()).unwrap();
    c.set_pair(table, table, 5.0, 3.5, square()).unwrap();
    c.set_pair(table, chair, 1.0, 0.48, square()).unwrap();
    c.set_pair(chair, chair, 5.0, 2.25, square()).unwrap();
    c
}

pub fn furnished_room(seed: u64) -> Scene {
    let catalog = furniture_catalog();
    let class = |name: &str| catalog.get_by_name(name).unwrap().clone();
    let (wall, bed, table, chair) = (class("wall"), class("bed"), class("table"), class("chair"));

    let mut scene = Scene::new(catalog.clone()).with_seed(seed);
    let (l, b, t) = (ROOM_LENGTH, ROOM_BREADTH, WALL_THICKNESS);
    let walls = [
        (Pose::new(0.5 * (l + t), -0.5 * t, 0.0, 0.5 * PI), 0.5 * (b + t)),
        (Pose::new(0.5 * t, 0.5 * (b + t), 0.0, PI), 0.5 * (l + t)),
        (Pose::new(-0.5 * (l + t), 0.5 * t, 0.0, 1.5 * PI), 0.5 * (b + t)),
        (Pose::new(-0.5 * t, -0.5 * (b + t), 0.0, 0.0), 0.5 * (l + t)),
    ];
    for (n, (pose, half_length)) in walls.into_iter().enumerate() {
        scene
            .insert(Model::new(format!("wall_{n}"), &wall, [half_length, 0.5 * t, 1.0]).at(pose))
            .unwrap();
    }
    scene.insert(Model::new("bed_0", &bed, [1.0, 0.7, 1.0])).unwrap();
    scene.insert(Model::new("table_0", &table, [0.5, 0.5, 1.0])).unwrap();
    for n in 0..4 {
        scene
            .insert(Model::new(format!("chair_{n}"), &chair, [0.25, 0.25, 1.0]))
            .unwrap();
    }
    scene.set_boundary(Aabb::new([0.0; 3], [0.5 * l, 0.5 * b, 1.0]));
    scene
}

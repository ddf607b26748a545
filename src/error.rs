//! Error types for the layout engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("class id {class_id} is out of range ({num_classes} classes)")]
    InvalidClassReference { class_id: usize, num_classes: usize },

    #[error("class name `{0}` is already in the catalog")]
    DuplicateClassName(String),

    #[error("no class named `{0}`")]
    UnknownClassName(String),

    #[error("objects {a} and {b} have no preferred relative headings")]
    EmptyAngleConstraint { a: usize, b: usize },

    #[error("object id {object_id} is out of range ({num_objects} objects)")]
    InvalidObjectReference { object_id: usize, num_objects: usize },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

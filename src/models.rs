//
// models.rs
// Modality-Classifier-rs
//
// Defines the serializable data structures shared by the pipeline, CLI, and web layers.
//
// Thales Matheus Mendonça Santos - December 2025

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "MRI")]
    Mri,
    #[serde(rename = "CT")]
    Ct,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Mri => write!(f, "MRI"),
            Modality::Ct => write!(f, "CT"),
        }
    }
}

/// Outcome of a single classification run: the label plus the raw model score.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Classification {
    pub modality: Modality,
    pub score: f32,
}

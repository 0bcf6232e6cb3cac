//! Classifiers serialized as JSON.
//!
//! Two shapes are understood, selected by `"kind"`:
//!
//! - `forest`: an ensemble of binary decision trees. A split node sends the
//!   sample left when `x[feature] <= threshold`. Each leaf holds per-class
//!   weights; they are normalized per tree, averaged over the ensemble and the
//!   class with the highest mean wins.
//! - `linear`: `argmax(W·x + b)`. A single coefficient row with two classes
//!   is the binary form: a positive score picks `classes[1]`.
//!
//! Structure is checked once at load so `predict` never indexes out of range.

use std::path::Path;

use serde::Deserialize;

use super::{check_len, ClassLabel, Classifier, InferenceError};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NativeModel {
    Forest(Forest),
    Linear(Linear),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Forest {
    pub n_features: usize,
    pub classes: Vec<ClassLabel>,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    /// Node 0 is the root.
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Linear {
    pub n_features: usize,
    pub classes: Vec<ClassLabel>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl NativeModel {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, InferenceError> {
        let model: Self =
            serde_json::from_str(raw).map_err(|e| InferenceError::ModelLoad(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), InferenceError> {
        match self {
            Self::Forest(f) => f.validate(),
            Self::Linear(l) => l.validate(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> InferenceError {
    InferenceError::ModelLoad(msg.into())
}

impl Forest {
    fn validate(&self) -> Result<(), InferenceError> {
        if self.classes.is_empty() {
            return Err(invalid("forest has no classes"));
        }
        if self.trees.is_empty() {
            return Err(invalid("forest has no trees"));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(invalid(format!("tree {t} has no nodes")));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= self.n_features {
                            return Err(invalid(format!(
                                "tree {t} node {i}: feature {feature} out of range"
                            )));
                        }
                        // Children after parents rules out cycles
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(invalid(format!(
                                    "tree {t} node {i}: bad child index {child}"
                                )));
                            }
                        }
                    }
                    Node::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(invalid(format!(
                                "tree {t} node {i}: {} leaf values for {} classes",
                                value.len(),
                                self.classes.len()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Per-class probability averaged over all trees.
    pub fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, InferenceError> {
        check_len(features, self.n_features)?;
        let mut totals = vec![0.0f64; self.classes.len()];

        for tree in &self.trees {
            let leaf = tree.leaf_for(features);
            let sum: f64 = leaf.iter().sum();
            if sum > 0.0 {
                for (total, v) in totals.iter_mut().zip(leaf) {
                    *total += v / sum;
                }
            }
        }

        let n = self.trees.len() as f64;
        for total in &mut totals {
            *total /= n;
        }
        Ok(totals)
    }
}

impl Tree {
    fn leaf_for(&self, features: &[f32]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if f64::from(features[*feature]) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl Linear {
    fn is_binary(&self) -> bool {
        self.coef.len() == 1 && self.classes.len() == 2
    }

    fn validate(&self) -> Result<(), InferenceError> {
        if self.classes.len() < 2 {
            return Err(invalid("linear model needs at least two classes"));
        }
        if !self.is_binary() && self.coef.len() != self.classes.len() {
            return Err(invalid(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                self.classes.len()
            )));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(invalid(format!(
                "{} intercepts for {} coefficient rows",
                self.intercept.len(),
                self.coef.len()
            )));
        }
        if let Some(row) = self.coef.iter().find(|row| row.len() != self.n_features) {
            return Err(invalid(format!(
                "coefficient row has {} values, expected {}",
                row.len(),
                self.n_features
            )));
        }
        Ok(())
    }

    /// Raw decision scores, one per coefficient row.
    pub fn decision_function(&self, features: &[f32]) -> Result<Vec<f64>, InferenceError> {
        check_len(features, self.n_features)?;
        Ok(self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| {
                row.iter()
                    .zip(features)
                    .map(|(w, x)| w * f64::from(*x))
                    .sum::<f64>()
                    + b
            })
            .collect())
    }
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

impl Classifier for NativeModel {
    fn predict(&self, features: &[f32]) -> Result<ClassLabel, InferenceError> {
        let (classes, idx) = match self {
            Self::Forest(f) => (&f.classes, argmax(&f.predict_proba(features)?)),
            Self::Linear(l) => {
                let scores = l.decision_function(features)?;
                let idx = if l.is_binary() {
                    usize::from(scores[0] > 0.0)
                } else {
                    argmax(&scores)
                };
                (&l.classes, idx)
            }
        };
        classes
            .get(idx)
            .cloned()
            .ok_or_else(|| InferenceError::Runtime(format!("class index {idx} out of range")))
    }

    fn n_features(&self) -> usize {
        match self {
            Self::Forest(f) => f.n_features,
            Self::Linear(l) => l.n_features,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Forest(_) => "forest",
            Self::Linear(_) => "linear",
        }
    }
}

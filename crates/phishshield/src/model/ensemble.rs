//! Gradient-boosted tree ensemble read from an XGBoost JSON model.
//!
//! Only what binary classification needs is supported: the `gbtree` booster
//! with numerical splits and a logistic (or raw-margin) objective. Scoring
//! follows XGBoost's semantics: inputs are `f32`, a node goes left when
//! `x < split_condition`, a missing (NaN) value follows `default_left`, and
//! leaf values are summed onto the base margin before the link function.

use crate::error::ModelError;
use crate::features::vector::FEATURE_COUNT;
use crate::model::scaler::{check_column_names, ScaledVector};
use crate::model::ProbabilityModel;
use serde::Deserialize;
use std::path::Path;

// ── On-disk model layout ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ModelDocument {
    learner: LearnerDocument,
}

#[derive(Debug, Deserialize)]
struct LearnerDocument {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: BoosterDocument,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveDocument,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct BoosterDocument {
    name: String,
    #[serde(default)]
    model: Option<GbTreeDocument>,
}

#[derive(Debug, Deserialize)]
struct GbTreeDocument {
    trees: Vec<TreeDocument>,
}

#[derive(Debug, Deserialize)]
struct TreeDocument {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    /// Stored as 0/1 integers by most XGBoost versions, booleans by some.
    default_left: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveDocument {
    name: String,
}

// ── Compiled form ───────────────────────────────────────────────────────────

/// How the summed margin becomes a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    /// `binary:logistic`, `reg:logistic`: base score is a probability.
    Logistic,
    /// `binary:logitraw`: base score is already a margin.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
    Leaf(f32),
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Compile one tree, checking every index so evaluation cannot go out of
    /// bounds or loop. Children always sit after their parent.
    fn compile(index: usize, doc: TreeDocument) -> Result<Self, ModelError> {
        let malformed = |reason: String| ModelError::MalformedTree {
            tree: index,
            reason,
        };
        let n = doc.left_children.len();
        if n == 0 {
            return Err(malformed("tree has no nodes".into()));
        }
        if [
            doc.right_children.len(),
            doc.split_indices.len(),
            doc.split_conditions.len(),
            doc.default_left.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(malformed("node arrays differ in length".into()));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (doc.left_children[i], doc.right_children[i]);
            if left == -1 && right == -1 {
                nodes.push(Node::Leaf(doc.split_conditions[i]));
                continue;
            }
            let child_ok = |c: i64| c > i as i64 && (c as usize) < n;
            if !child_ok(left) || !child_ok(right) {
                return Err(malformed(format!("node {i} has invalid children ({left}, {right})")));
            }
            let feature = doc.split_indices[i];
            if feature < 0 || feature as usize >= FEATURE_COUNT {
                return Err(malformed(format!("node {i} splits on feature {feature}")));
            }
            let default_left = match &doc.default_left[i] {
                serde_json::Value::Bool(b) => *b,
                other => other.as_u64().unwrap_or(0) != 0,
            };
            nodes.push(Node::Split {
                feature: feature as usize,
                threshold: doc.split_conditions[i],
                left: left as usize,
                right: right as usize,
                default_left,
            });
        }
        Ok(Self { nodes })
    }

    fn leaf_value(&self, row: &[f32; FEATURE_COUNT]) -> f32 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = row[feature];
                    i = if x.is_nan() {
                        if default_left {
                            left
                        } else {
                            right
                        }
                    } else if x < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// The loaded ensemble. Immutable once built.
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    trees: Vec<Tree>,
    base_margin: f32,
    link: Link,
}

impl TreeEnsemble {
    /// Parse an XGBoost JSON model (`Booster.save_model("*.json")`).
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let doc: ModelDocument = serde_json::from_str(json)?;
        let learner = doc.learner;

        let num_feature: usize = learner
            .learner_model_param
            .num_feature
            .trim()
            .parse()
            .unwrap_or(0);
        if num_feature != FEATURE_COUNT {
            return Err(ModelError::FeatureCount {
                artifact: "model",
                expected: FEATURE_COUNT,
                found: num_feature,
            });
        }
        if !learner.feature_names.is_empty() {
            check_column_names("model", &learner.feature_names)?;
        }

        let link = match learner.objective.name.as_str() {
            "binary:logistic" | "reg:logistic" => Link::Logistic,
            "binary:logitraw" => Link::Raw,
            other => return Err(ModelError::UnsupportedObjective(other.to_string())),
        };
        let base_margin = base_margin(&learner.learner_model_param.base_score, link)?;

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelError::UnsupportedBooster(learner.gradient_booster.name));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelError::UnsupportedBooster("gbtree without model".into()))?;

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| Tree::compile(i, tree))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            base_margin,
            link,
        })
    }

    /// Load an XGBoost JSON model from disk.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Number of trees in the ensemble.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw margin for one row: base margin plus the sum of leaf values.
    pub fn margin(&self, scaled: &ScaledVector) -> f32 {
        let mut row = [0.0f32; FEATURE_COUNT];
        for (slot, value) in row.iter_mut().zip(scaled.0) {
            *slot = value as f32;
        }
        self.trees
            .iter()
            .fold(self.base_margin, |acc, tree| acc + tree.leaf_value(&row))
    }
}

impl ProbabilityModel for TreeEnsemble {
    fn score(&self, scaled: &ScaledVector) -> f64 {
        f64::from(sigmoid(self.margin(scaled)))
    }
}

fn sigmoid(margin: f32) -> f32 {
    1.0 / (1.0 + (-margin).exp())
}

/// Parse `base_score` (`"5E-1"`, or `"[5E-1]"` in newer releases) and map it
/// into margin space.
fn base_margin(raw: &str, link: Link) -> Result<f32, ModelError> {
    let invalid = || ModelError::InvalidBaseScore(raw.to_string());
    let value: f32 = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse()
        .map_err(|_| invalid())?;

    match link {
        Link::Raw if value.is_finite() => Ok(value),
        Link::Logistic if value > 0.0 && value < 1.0 => Ok((value / (1.0 - value)).ln()),
        _ => Err(invalid()),
    }
}

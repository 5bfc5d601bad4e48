//! CART regression tree (squared-error criterion)
//!
//! Nodes live in a flat arena; index 0 is the root. A row goes left when
//! `row[feature] <= threshold`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0); `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it may split
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Terminal node predicting the mean target of its samples
    Leaf {
        /// Predicted value
        value: f64,
    },
    /// Internal node
    Split {
        /// Feature column index
        feature: usize,
        /// Rows with `row[feature] <= threshold` go left
        threshold: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
}

/// Fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct Grower<'a> {
    rows: &'a [Vec<f64>],
    target: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit a tree on the rows selected by `sample`
    ///
    /// `sample` may repeat indices (bootstrap draws).
    ///
    /// # Errors
    /// Returns [`Error::Computation`] if `sample` is empty, references a row
    /// out of range, or if a selected value is not finite
    pub fn fit(
        rows: &[Vec<f64>],
        target: &[f64],
        sample: &[usize],
        params: TreeParams,
    ) -> Result<Self> {
        if sample.is_empty() {
            return Err(Error::Computation("cannot fit a tree on zero samples".into()));
        }
        let n_features = rows.first().map_or(0, Vec::len);
        for &i in sample {
            let (Some(row), Some(y)) = (rows.get(i), target.get(i)) else {
                return Err(Error::Computation(format!("sample index {i} out of range")));
            };
            if !y.is_finite() || row.iter().any(|v| !v.is_finite()) {
                return Err(Error::Computation(format!("row {i} contains a non-finite value")));
            }
        }

        let mut grower = Grower {
            rows,
            target,
            params,
            nodes: Vec::new(),
        };
        grower.grow(sample.to_vec(), 0);

        Ok(Self {
            nodes: grower.nodes,
            n_features,
        })
    }

    /// Number of features the tree was fitted on
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Arena of nodes, root first
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Depth of the deepest leaf
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Check the arena shape of a deserialized tree
    ///
    /// Children always sit after their parent in the arena, so a valid tree
    /// has no cycles and every walk ends at a leaf.
    ///
    /// # Errors
    /// Returns [`Error::Computation`] if the tree is empty, a child index is
    /// not after its parent or out of range, or a split names a feature the
    /// tree was not fitted on
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::Computation("tree has no nodes".into()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= self.n_features {
                    return Err(Error::Computation(format!(
                        "node {idx} splits on feature {feature} of {}",
                        self.n_features
                    )));
                }
                for child in [left, right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(Error::Computation(format!(
                            "node {idx} has invalid child index {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Predict a single row
    ///
    /// Callers check the row width; an out-of-range feature index means the
    /// arena is corrupt and is reported as an error.
    ///
    /// # Errors
    /// Returns [`Error::Computation`] if the tree is empty or malformed
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        let mut idx = 0;
        // A root-to-leaf path visits each node at most once
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).ok_or_else(|| {
                        Error::Computation(format!("split references missing feature {feature}"))
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(Error::Computation(format!("tree has no node {idx}")));
                }
            }
        }
        Err(Error::Computation(format!(
            "tree walk did not reach a leaf within {} nodes",
            self.nodes.len()
        )))
    }
}

impl Grower<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        #[allow(clippy::cast_precision_loss)]
        let mean = indices.iter().map(|&i| self.target[i]).sum::<f64>() / indices.len() as f64;

        let at_max_depth = self.params.max_depth.is_some_and(|max| depth >= max);
        if at_max_depth || indices.len() < self.params.min_samples_split || self.is_pure(&indices) {
            return self.push(Node::Leaf { value: mean });
        }

        let Some(best) = self.best_split(&indices) else {
            return self.push(Node::Leaf { value: mean });
        };

        let slot = self.push(Node::Leaf { value: mean });
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.rows[i][best.feature] <= best.threshold);

        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[slot] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        slot
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn is_pure(&self, indices: &[usize]) -> bool {
        let first = self.target[indices[0]];
        indices.iter().all(|&i| self.target[i] == first)
    }

    /// Maximise `sum_l^2 / n_l + sum_r^2 / n_r`, equivalent to minimising
    /// the summed squared error of the children.
    #[allow(clippy::cast_precision_loss)]
    fn best_split(&self, indices: &[usize]) -> Option<BestSplit> {
        let n = indices.len();
        let total: f64 = indices.iter().map(|&i| self.target[i]).sum();
        let parent_score = total * total / n as f64;
        let min_leaf = self.params.min_samples_leaf.max(1);
        let n_features = self.rows[indices[0]].len();

        let mut best: Option<BestSplit> = None;
        let mut order = indices.to_vec();

        for feature in 0..n_features {
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += self.target[order[k]];
                let left_n = k + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let here = self.rows[order[k]][feature];
                let next = self.rows[order[k + 1]][feature];
                if here >= next {
                    continue;
                }

                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;
                if best.as_ref().map_or(true, |b| score > b.score) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best.filter(|b| b.score > parent_score + parent_score.abs() * 1e-12)
    }
}

use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::config::AnomalyDetectionConfig;

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Isolation forest over dense feature rows.
///
/// Each tree isolates points with random axis-aligned splits; points that need
/// fewer splits to isolate score lower. Fitting is seeded, so the same input
/// always yields the same scores.
#[derive(Debug)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl IsolationForest {
    pub fn fit(rows: &[Vec<f64>], config: &AnomalyDetectionConfig) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        let sample_size = config.max_samples.min(rows.len());
        let height_limit = (sample_size.max(2) as f64).log2().ceil() as usize;

        let trees = (0..config.n_estimators)
            .map(|_| {
                let picked: Vec<&[f64]> = sample(&mut rng, rows.len(), sample_size)
                    .into_iter()
                    .map(|i| rows[i].as_slice())
                    .collect();
                grow(&picked, 0, height_limit, &mut rng)
            })
            .collect();

        Self { trees, sample_size }
    }

    /// Negated isolation anomaly score: values near -1 are anomalous,
    /// values near -0.5 are normal.
    pub fn score_samples(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        let norm = average_path_length(self.sample_size);
        rows.iter()
            .map(|row| {
                if self.trees.is_empty() || norm <= 0.0 {
                    return -0.5;
                }
                let mean_depth = self
                    .trees
                    .iter()
                    .map(|tree| path_length(tree, row, 0))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                -(2f64).powf(-mean_depth / norm)
            })
            .collect()
    }
}

/// Fit on `rows` and return decision scores, shifted so the `contamination`
/// share of lowest scores falls below zero.
pub fn decision_scores(rows: &[Vec<f64>], config: &AnomalyDetectionConfig) -> Vec<f64> {
    let forest = IsolationForest::fit(rows, config);
    let scores = forest.score_samples(rows);
    let offset = percentile(&scores, config.contamination * 100.0);
    scores.into_iter().map(|s| s - offset).collect()
}

fn grow<R: Rng>(rows: &[&[f64]], depth: usize, height_limit: usize, rng: &mut R) -> Node {
    if depth >= height_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    let dims = rows[0].len();
    let splittable: Vec<(usize, f64, f64)> = (0..dims)
        .filter_map(|feature| {
            let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r[feature]), hi.max(r[feature]))
            });
            // A span past f64::MAX cannot be sampled uniformly
            (min < max && (max - min).is_finite()).then_some((feature, min, max))
        })
        .collect();

    // Identical points cannot be separated
    if splittable.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<&[f64]>, Vec<&[f64]>) =
        rows.iter().copied().partition(|r| r[feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(&left, depth + 1, height_limit, rng)),
        right: Box::new(grow(&right, depth + 1, height_limit, rng)),
    }
}

fn path_length(node: &Node, row: &[f64], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if row[*feature] <= *threshold {
                path_length(left, row, depth + 1)
            } else {
                path_length(right, row, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in 0..=100.
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 5.0);
        assert!((percentile(&values, 5.0) - 1.2).abs() < 1e-12);
        assert_eq!(percentile(&values, 50.0), 3.0);
    }

    #[test]
    fn test_far_point_scores_lowest() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![1.0 + (i % 5) as f64 * 0.05, 300.0 + (i % 3) as f64])
            .chain(std::iter::once(vec![250.0, 10.0]))
            .collect();
        let forest = IsolationForest::fit(&rows, &AnomalyDetectionConfig::default());
        let scores = forest.score_samples(&rows);
        let (lowest, _) = scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(lowest, 30);
        assert!(scores.iter().all(|s| (-1.0..=0.0).contains(s)));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i * i) as f64]).collect();
        let config = AnomalyDetectionConfig::default();
        assert_eq!(decision_scores(&rows, &config), decision_scores(&rows, &config));
    }

    #[test]
    fn test_identical_rows_are_not_outliers() {
        let rows = vec![vec![1.0, 60.0]; 8];
        let decisions = decision_scores(&rows, &AnomalyDetectionConfig::default());
        assert!(decisions.iter().all(|d| *d >= 0.0));
    }

    #[test]
    fn test_unbounded_span_is_not_split() {
        let mut rows: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64 * 30.0]).collect();
        rows.push(vec![1e308, 400.0]);
        rows.push(vec![-1e308, 410.0]);
        rows.push(vec![f64::INFINITY, 420.0]);

        let decisions = decision_scores(&rows, &AnomalyDetectionConfig::default());
        assert_eq!(decisions.len(), rows.len());
        assert!(decisions.iter().all(|d| d.is_finite()));
    }

    #[test]
    fn test_single_unsplittable_feature_is_a_leaf() {
        let rows = vec![vec![-1e308], vec![1e308], vec![0.0]];
        let decisions = decision_scores(&rows, &AnomalyDetectionConfig::default());
        assert!(decisions.iter().all(|d| *d >= 0.0));
    }
}

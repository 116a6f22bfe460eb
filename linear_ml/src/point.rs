use std::slice;

/// One training record. The features are immutable during training; the
/// label is only ever rewritten by prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub features: FeatureVec,
    pub label: f64,
}

impl LabeledPoint {
    pub fn dense(features: Vec<f64>, label: f64) -> Self {
        Self {
            features: FeatureVec::Dense(features),
            label,
        }
    }

    pub fn sparse(features: Vec<(usize, f64)>, label: f64) -> Self {
        Self {
            features: FeatureVec::Sparse(features),
            label,
        }
    }
}

/// A feature vector, dense or as `(index, value)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureVec {
    Dense(Vec<f64>),
    Sparse(Vec<(usize, f64)>),
}

impl FeatureVec {
    /// Iterates the `(index, value)` components of the vector.
    pub fn components(&self) -> Components<'_> {
        match self {
            FeatureVec::Dense(values) => Components::Dense(values.iter().enumerate()),
            FeatureVec::Sparse(pairs) => Components::Sparse(pairs.iter()),
        }
    }

    /// Dot product against a dense parameter slice. Indices beyond the slice
    /// contribute nothing.
    pub fn dot(&self, params: &[f64]) -> f64 {
        self.components()
            .map(|(i, x)| x * params.get(i).copied().unwrap_or(0.0))
            .sum()
    }
}

pub enum Components<'a> {
    Dense(std::iter::Enumerate<slice::Iter<'a, f64>>),
    Sparse(slice::Iter<'a, (usize, f64)>),
}

impl Iterator for Components<'_> {
    type Item = (usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Components::Dense(iter) => iter.next().map(|(i, &x)| (i, x)),
            Components::Sparse(iter) => iter.next().copied(),
        }
    }
}

/// A sparse gradient: the nonzero `(index, value)` components of one step
/// direction. Values are the *descent* direction; the optimizer adds them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gradient(Vec<(usize, f64)>);

impl Gradient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a component; zero values are dropped so that "no update"
    /// costs nothing downstream.
    pub fn push(&mut self, index: usize, value: f64) {
        if value != 0.0 {
            self.0.push((index, value));
        }
    }

    pub fn components(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_and_sparse_dot_agree() {
        let params = [1.0, 2.0, 3.0, 0.5];
        let dense = FeatureVec::Dense(vec![2.0, 0.0, 1.0]);
        let sparse = FeatureVec::Sparse(vec![(0, 2.0), (2, 1.0)]);

        assert_eq!(dense.dot(&params), 5.0);
        assert_eq!(sparse.dot(&params), 5.0);
    }

    #[test]
    fn dot_ignores_indices_past_the_params() {
        let sparse = FeatureVec::Sparse(vec![(0, 1.0), (9, 4.0)]);
        assert_eq!(sparse.dot(&[3.0, 1.0]), 3.0);
    }

    #[test]
    fn gradient_drops_zero_components() {
        let mut grad = Gradient::new();
        grad.push(0, 0.0);
        grad.push(3, -1.5);
        grad.push(7, 0.0);

        let components: Vec<_> = grad.components().collect();
        assert_eq!(components, vec![(3, -1.5)]);
        assert!(!grad.is_empty());
    }
}

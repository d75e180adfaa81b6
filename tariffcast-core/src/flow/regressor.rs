//! Ridge regression over standardised route features.
//!
//! Solves `(ZᵀZ + λI) w = Zᵀ(y − ȳ)` by Cholesky, where `Z` is the
//! standardised design matrix. If the system is not positive definite the
//! model degrades to predicting the training mean.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::text::StandardScaler;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegressorError {
    #[error("no training samples")]
    Empty,
    #[error("{features} feature rows but {targets} targets")]
    LengthMismatch { features: usize, targets: usize },
    #[error("feature rows have inconsistent width")]
    Ragged,
    #[error("training data contains non-finite values")]
    NonFinite,
    #[error("ridge lambda must be finite and non-negative, got {0}")]
    InvalidLambda(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegressor {
    scaler: StandardScaler,
    weights: Vec<f64>,
    intercept: f64,
}

impl RidgeRegressor {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], lambda: f64) -> Result<Self, RegressorError> {
        if rows.is_empty() {
            return Err(RegressorError::Empty);
        }
        if rows.len() != targets.len() {
            return Err(RegressorError::LengthMismatch {
                features: rows.len(),
                targets: targets.len(),
            });
        }
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(RegressorError::InvalidLambda(lambda));
        }
        if rows.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(RegressorError::NonFinite);
        }
        let scaler = StandardScaler::fit(rows).ok_or(RegressorError::Ragged)?;
        let width = scaler.width();

        let n = rows.len();
        let intercept = targets.iter().sum::<f64>() / n as f64;
        let standardised: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();
        let z = DMatrix::from_fn(n, width, |i, j| standardised[i][j]);
        let centred = DVector::from_iterator(n, targets.iter().map(|y| y - intercept));

        let gram = z.tr_mul(&z) + DMatrix::<f64>::identity(width, width) * lambda;
        let rhs = z.tr_mul(&centred);
        let weights = match gram.cholesky() {
            Some(chol) => chol.solve(&rhs).iter().copied().collect(),
            None => {
                warn!(samples = n, "ridge system is singular, using mean predictor");
                vec![0.0; width]
            }
        };

        Ok(Self {
            scaler,
            weights,
            intercept,
        })
    }

    /// Model that always predicts `value`.
    pub fn constant(value: f64, width: usize) -> Self {
        Self {
            scaler: StandardScaler::identity(width),
            weights: vec![0.0; width],
            intercept: value,
        }
    }

    pub fn width(&self) -> usize {
        self.weights.len()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Extra trailing features are ignored; missing ones contribute nothing.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let z = self.scaler.transform(features);
        self.intercept + z.iter().zip(&self.weights).map(|(x, w)| x * w).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_linear_relation() {
        let rows: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = rows.iter().map(|r| 2.0 * r[0] - r[1] + 3.0).collect();
        let m = RidgeRegressor::fit(&rows, &y, 1e-9).unwrap();
        assert!((m.predict(&[10.0, 3.0]) - 20.0).abs() < 1e-4);
    }

    #[test]
    fn ridge_shrinks_towards_mean() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let weak = RidgeRegressor::fit(&rows, &y, 0.0).unwrap();
        let strong = RidgeRegressor::fit(&rows, &y, 1e6).unwrap();
        let mean = 9.5;
        assert!((strong.predict(&[19.0]) - mean).abs() < (weak.predict(&[19.0]) - mean).abs());
    }

    #[test]
    fn constant_columns_do_not_break_the_solve() {
        let rows = vec![vec![1.0, 5.0], vec![1.0, 5.0], vec![1.0, 5.0]];
        let m = RidgeRegressor::fit(&rows, &[1.0, 2.0, 3.0], 0.0).unwrap();
        assert!((m.predict(&[1.0, 5.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(RidgeRegressor::fit(&[], &[], 1.0).unwrap_err(), RegressorError::Empty);
        assert!(matches!(
            RidgeRegressor::fit(&[vec![1.0]], &[1.0, 2.0], 1.0),
            Err(RegressorError::LengthMismatch { .. })
        ));
        assert_eq!(
            RidgeRegressor::fit(&[vec![f64::NAN]], &[1.0], 1.0).unwrap_err(),
            RegressorError::NonFinite
        );
        assert!(matches!(
            RidgeRegressor::fit(&[vec![1.0]], &[1.0], -1.0),
            Err(RegressorError::InvalidLambda(_))
        ));
    }

    #[test]
    fn constant_model() {
        let m = RidgeRegressor::constant(-0.1, 8);
        assert_eq!(m.predict(&[1.0; 8]), -0.1);
        assert_eq!(m.width(), 8);
    }
}

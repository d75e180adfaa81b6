use serde::{Deserialize, Serialize};

/// Per-column standardisation: `(x - mean) / std`.
///
/// Zero-variance columns get `std = 1` so they map to `x - mean`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major samples. Returns `None` for an empty or ragged matrix.
    pub fn fit(rows: &[Vec<f64>]) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return None;
        }
        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut std = vec![0.0; width];
        for row in rows {
            for ((s, x), m) in std.iter_mut().zip(row).zip(&mean) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in &mut std {
            *s = s.sqrt();
            if *s < 1e-12 || !s.is_finite() {
                *s = 1.0;
            }
        }
        Some(Self { mean, std })
    }

    /// Identity scaler for `width` columns.
    pub fn identity(width: usize) -> Self {
        Self {
            mean: vec![0.0; width],
            std: vec![1.0; width],
        }
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardises_columns() {
        let s = StandardScaler::fit(&[vec![1.0, 10.0], vec![3.0, 10.0]]).unwrap();
        assert_eq!(s.transform(&[2.0, 10.0]), vec![0.0, 0.0]);
        assert_eq!(s.transform(&[3.0, 12.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn rejects_empty_and_ragged() {
        assert!(StandardScaler::fit(&[]).is_none());
        assert!(StandardScaler::fit(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn identity_passes_through() {
        assert_eq!(StandardScaler::identity(2).transform(&[4.0, -1.0]), vec![4.0, -1.0]);
    }
}

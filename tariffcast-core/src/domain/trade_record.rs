use serde::{Deserialize, Serialize};

use super::ids::DatasetHash;

/// One row of the historical bilateral trade dataset.
///
/// Consumed only at fit time to build the trade network. Field names match
/// the CSV header of the dataset files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub origin: String,
    pub destination: String,
    pub hs_code: String,
    /// Trade value in USD.
    pub trade_value: f64,
    /// Transport cost as a fraction of trade value.
    pub transport_cost: f64,
    /// Lead time in days.
    pub lead_time: f64,
    pub year: i32,
}

impl TradeRecord {
    /// True if every numeric field is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.trade_value, self.transport_cost, self.lead_time]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
            && !self.origin.trim().is_empty()
            && !self.destination.trim().is_empty()
    }

    /// Feed the canonical byte encoding of this row into a hasher.
    pub fn hash_into(&self, hasher: &mut blake3::Hasher) {
        hasher.update(self.origin.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(self.destination.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(self.hs_code.as_bytes());
        hasher.update(&self.trade_value.to_le_bytes());
        hasher.update(&self.transport_cost.to_le_bytes());
        hasher.update(&self.lead_time.to_le_bytes());
        hasher.update(&self.year.to_le_bytes());
    }
}

/// BLAKE3 over the canonical encoding of every row, in order.
pub fn dataset_hash(records: &[TradeRecord]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for record in records {
        record.hash_into(&mut hasher);
        hasher.update(b"\x1e");
    }
    DatasetHash::from_hash(hasher.finalize().to_hex().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> TradeRecord {
        TradeRecord {
            origin: "China".into(),
            destination: "United States".into(),
            hs_code: "8517".into(),
            trade_value: 1_000.0,
            transport_cost: 0.05,
            lead_time: 25.0,
            year: 2023,
        }
    }

    #[test]
    fn valid_row_passes() {
        assert!(row().is_valid());
    }

    #[test]
    fn negative_or_nan_rejected() {
        let mut r = row();
        r.trade_value = -1.0;
        assert!(!r.is_valid());
        let mut r = row();
        r.lead_time = f64::NAN;
        assert!(!r.is_valid());
        let mut r = row();
        r.origin = "  ".into();
        assert!(!r.is_valid());
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let a = dataset_hash(&[row()]);
        assert_eq!(a, dataset_hash(&[row()]));
        let mut changed = row();
        changed.year = 2024;
        assert_ne!(a, dataset_hash(&[changed]));
        assert_ne!(a, dataset_hash(&[]));
    }
}

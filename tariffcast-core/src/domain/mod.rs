//! Domain types for tariffcast

pub mod ids;
pub mod shock;
pub mod trade_record;

pub use ids::{DatasetHash, GraphVersion, ShockId};
pub use shock::TariffShock;
pub use trade_record::{dataset_hash, TradeRecord};

/// Canonical country name type alias
pub type Country = String;

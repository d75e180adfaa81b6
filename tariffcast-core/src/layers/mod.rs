//! Downstream layers — deterministic closed-form transforms.
//!
//! Each layer reads only its predecessor's output and applies fixed
//! coefficients per sector. There is nothing to learn, so `fit` only flips
//! the state to `Fitted`; `predict` still refuses to run before that.
//!
//! INDUSTRY ← TradeFlowPrediction
//! FIRM ← IndustryResponse
//! CONSUMER ← FirmImpact
//! GEOPOLITICAL ← ConsumerImpact

pub mod consumer;
pub mod firm;
pub mod geopolitical;
pub mod industry;
pub mod sectors;

pub use consumer::{ConsumerImpact, ConsumerLayer, ConsumerSectorImpact};
pub use firm::{FirmImpact, FirmLayer, FirmSectorImpact};
pub use geopolitical::{
    EscalationLevel, GeopoliticalImpact, GeopoliticalLayer, GeopoliticalSectorImpact,
};
pub use industry::{IndustryLayer, IndustryResponse, SectorResponse};
pub use sectors::Sector;

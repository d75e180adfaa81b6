//! TRADE_FLOW stage: ridge regressors over route features, tariff scaling,
//! disruption aggregation and the reallocation matrix.

pub mod predictor;
pub mod regressor;
pub mod types;

pub use predictor::{scale_flow_change, TradeFlowConfig, TradeFlowPredictor};
pub use regressor::{RegressorError, RidgeRegressor};
pub use types::{chapter_key, route_key, AffectedRoute, ReallocationMatrix, TradeFlowPrediction};

//! Model-type decider — a pure function of the integration orders.

use serde::{Deserialize, Serialize};

/// Which model family fits a block of series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Every series is I(0).
    FullStationary,
    /// Every series is I(1).
    FullNonStationary,
    /// Anything else, including I(2) or an empty list.
    Mixed,
}

impl ModelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::FullStationary => "full_stationary",
            ModelType::FullNonStationary => "full_non_stationary",
            ModelType::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn decide(orders: &[usize]) -> ModelType {
    if orders.is_empty() {
        ModelType::Mixed
    } else if orders.iter().all(|&o| o == 0) {
        ModelType::FullStationary
    } else if orders.iter().all(|&o| o == 1) {
        ModelType::FullNonStationary
    } else {
        ModelType::Mixed
    }
}

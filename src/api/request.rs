//! Request bodies of the work-time accounting API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of the close and reopen endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRequest {
    /// Who performs the transition; recorded on the monthly value.
    pub actor: String,
}

/// Body of the range recalculation endpoint. Both dates are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalcRequest {
    /// First day to recalculate.
    pub from: NaiveDate,
    /// Last day to recalculate.
    pub to: NaiveDate,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::repo_types::AvailabilityWindow;

/// `windows` entries use the compound form `day-fromOffset-toOffset`, e.g. `1-480-720`.
#[derive(Debug, Deserialize)]
pub struct ReplaceAvailabilityRequest {
    pub windows: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub user_id: Uuid,
    pub windows: Vec<AvailabilityWindow>,
}

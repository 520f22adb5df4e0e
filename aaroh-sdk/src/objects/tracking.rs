use serde::{Deserialize, Serialize};

/// Result of a courier lookup for a shipment tracking id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub tracking_id: String,
    pub courier: String,
    /// Public tracking page, absent when the courier is unknown.
    pub tracking_url: Option<String>,
}

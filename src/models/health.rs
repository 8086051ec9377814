use serde::Serialize;
use chrono::{DateTime, Utc};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    // Emails en échec gardés en mémoire (100 au plus)
    pub failed_emails: usize,
    pub time: DateTime<Utc>,
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::mentorship::MentorshipRequestRow;
use crate::training::phase::UnknownValue;

/// Lifecycle of a request. Only `Open -> Accepted` is driven by this service;
/// there is no way back to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    Accepted,
    Solved,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Solved => "solved",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(RequestStatus::Open),
            "accepted" => Ok(RequestStatus::Accepted),
            "solved" => Ok(RequestStatus::Solved),
            other => Err(UnknownValue::new("request status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentorshipRequest {
    pub id: Uuid,
    pub explorer_id: Uuid,
    /// Free-text career field as the requester typed it.
    pub field: String,
    pub title: String,
    pub description: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl MentorshipRequest {
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Open
    }
}

impl TryFrom<MentorshipRequestRow> for MentorshipRequest {
    type Error = UnknownValue;

    fn try_from(row: MentorshipRequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status.parse()?,
            id: row.id,
            explorer_id: row.explorer_id,
            field: row.field,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> MentorshipRequestRow {
        MentorshipRequestRow {
            id: Uuid::new_v4(),
            explorer_id: Uuid::new_v4(),
            field: "Design".to_string(),
            title: "Portfolio review".to_string(),
            description: String::new(),
            status: status.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_status_is_parsed() {
        let request = MentorshipRequest::try_from(row("accepted")).unwrap();
        assert_eq!(request.status, RequestStatus::Accepted);
        assert!(!request.is_open());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = MentorshipRequest::try_from(row("closed")).unwrap_err();
        assert_eq!(err.value, "closed");
    }
}

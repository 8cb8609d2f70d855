use serde::Deserialize;

use crate::{DispatchError, FailureKind};

/// One row of the backend's recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecentActivity {
    pub title: String,
    #[serde(default, alias = "timestamp")]
    pub time: String,
    #[serde(default)]
    pub status: String,
}

/// The feed has been served both bare and wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Feed {
    Bare(Vec<RecentActivity>),
    Wrapped { activities: Vec<RecentActivity> },
}

pub(crate) fn parse_feed(body: &[u8]) -> Result<Vec<RecentActivity>, DispatchError> {
    match serde_json::from_slice::<Feed>(body) {
        Ok(Feed::Bare(entries)) | Ok(Feed::Wrapped { activities: entries }) => Ok(entries),
        Err(err) => Err(DispatchError::new(FailureKind::Decode, err.to_string())),
    }
}

//! Persisting dashboard filters in the navigable location.
//!
//! Three optional parameters are used: `view` (`list` | `kanban`), `search`
//! and `status`. `status` may arrive once or repeated; both shapes normalise
//! to the same ordered, duplicate-free list.

use serde::{Deserialize, Serialize};
use shared::domain::IssueStatus;
use tracing::warn;
use url::Url;

use crate::dashboard::{dedup_statuses, ViewMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusParam {
    One(String),
    Many(Vec<String>),
}

impl StatusParam {
    pub fn into_values(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Parameters as found in the location, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQueryParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusParam>,
}

impl RawQueryParams {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "view" => params.view = Some(value),
                "search" => params.search = Some(value),
                "status" => {
                    params.status = Some(match params.status.take() {
                        None => StatusParam::One(value),
                        Some(previous) => {
                            let mut values = previous.into_values();
                            values.push(value);
                            StatusParam::Many(values)
                        }
                    });
                }
                _ => {}
            }
        }
        params
    }

    pub fn from_query_string(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(
            query.trim_start_matches('?').as_bytes(),
        ))
    }

    pub fn normalize(self) -> DashboardQuery {
        let statuses = self
            .status
            .map(StatusParam::into_values)
            .unwrap_or_default()
            .into_iter()
            .filter(|value| !value.is_empty())
            .filter_map(|value| match value.parse::<IssueStatus>() {
                Ok(status) => Some(status),
                Err(err) => {
                    warn!(error = %err, "ignoring status filter from location");
                    None
                }
            });
        DashboardQuery {
            view: ViewMode::from_param(self.view.as_deref()),
            search: self.search.unwrap_or_default(),
            statuses: dedup_statuses(statuses),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub view: ViewMode,
    pub search: String,
    pub statuses: Vec<IssueStatus>,
}

impl DashboardQuery {
    /// Key/value pairs in write order; empty search and status are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("view", self.view.as_str().to_string())];
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs.extend(
            self.statuses
                .iter()
                .map(|status| ("status", status.as_str().to_string())),
        );
        pairs
    }

    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_pairs())
            .finish()
    }
}

pub trait QuerySync: Send {
    fn read(&self) -> RawQueryParams;
    fn write(&mut self, query: &DashboardQuery);
}

/// Keeps the dashboard query in an in-memory location URL.
#[derive(Debug, Clone)]
pub struct UrlQuerySync {
    location: Url,
}

impl UrlQuerySync {
    pub fn new(location: Url) -> Self {
        Self { location }
    }

    pub fn location(&self) -> &Url {
        &self.location
    }
}

impl QuerySync for UrlQuerySync {
    fn read(&self) -> RawQueryParams {
        RawQueryParams::from_pairs(self.location.query_pairs())
    }

    fn write(&mut self, query: &DashboardQuery) {
        self.location
            .query_pairs_mut()
            .clear()
            .extend_pairs(query.to_pairs());
    }
}

#[cfg(test)]
#[path = "tests/query_sync_tests.rs"]
mod tests;

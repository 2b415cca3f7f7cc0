//! Pending counts behind the navigation badges.
//!
//! Both lists go through the query cache, so they are fetched once per
//! identity and dropped together with it on logout or principal switch.
//! Only their lengths are used.

#[cfg(test)]
#[path = "counts_test.rs"]
mod counts_test;

use std::rc::Rc;

use serde_json::Value;

use crate::net::api::{ApiError, ClinicApi};
use crate::net::types::Role;
use crate::state::query_cache::{Fetcher, QueryError, SessionCache};

pub const INCOMPLETE_PATIENTS_KEY: &str = "patients/incomplete";
pub const UPCOMING_EVENTS_KEY: &str = "events/upcoming";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingCounts {
    pub incomplete_patients: usize,
    pub upcoming_events: usize,
}

impl PendingCounts {
    /// Total shown on the header badge.
    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.incomplete_patients + self.upcoming_events
    }
}

fn list_fetcher<F>(api: &Rc<dyn ClinicApi>, call: F) -> Fetcher
where
    F: for<'a> FnOnce(&'a dyn ClinicApi) -> futures::future::LocalBoxFuture<'a, Result<Vec<Value>, ApiError>> + 'static,
{
    let api = Rc::clone(api);
    Box::new(move || {
        Box::pin(async move {
            call(api.as_ref()).await.map(Value::Array).map_err(|e| QueryError::Failed(e.to_string()))
        })
    })
}

fn length_or_zero(key: &str, result: Result<Value, QueryError>) -> usize {
    match result {
        Ok(Value::Array(items)) => items.len(),
        Ok(other) => {
            tracing::warn!(key, kind = %value_kind(&other), "pending list is not an array");
            0
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "pending list unavailable");
            0
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Mark both lists stale so the next load goes to the backend.
pub fn invalidate_pending_counts(cache: &dyn SessionCache) {
    cache.invalidate(INCOMPLETE_PATIENTS_KEY);
    cache.invalidate(UPCOMING_EVENTS_KEY);
}

/// Load both pending counts for `role`. No role means nothing is fetched.
pub async fn load_pending_counts(cache: &dyn SessionCache, api: &Rc<dyn ClinicApi>, role: Option<Role>) -> PendingCounts {
    if role.is_none() {
        return PendingCounts::default();
    }

    let patients = list_fetcher(api, |api| api.incomplete_patients());
    let events = list_fetcher(api, |api| api.upcoming_events());
    let (patients, events) =
        futures::join!(cache.fetch(INCOMPLETE_PATIENTS_KEY, patients), cache.fetch(UPCOMING_EVENTS_KEY, events));

    PendingCounts {
        incomplete_patients: length_or_zero(INCOMPLETE_PATIENTS_KEY, patients),
        upcoming_events: length_or_zero(UPCOMING_EVENTS_KEY, events),
    }
}

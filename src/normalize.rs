//! Picks the canonical payload out of whichever wrapper the backend used.
//!
//! Depending on the route version the same entity may arrive bare, under
//! `data`, or under `data.<name>` / `<name>`. Callers name the candidate key
//! paths once (see [`shapes`]) and get back the first non-null match.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::view_state::Blank;

/// Ordered candidate key paths for each payload the screens read.
pub mod shapes {
    pub const PARENT: &[&str] = &["data.parent", "parent", "data", ""];
    pub const ADMIN: &[&str] = &["data.admin", "admin", "data", ""];
    pub const CHILDREN: &[&str] = &[
        "data.parent.children",
        "parent.children",
        "data.children",
        "children",
    ];
    /// Generic list payload: `data.data`, then `data`, then the bare body.
    pub const LIST: &[&str] = &["data.data", "data", ""];
    pub const ATTENDANCE: &[&str] = &[
        "data.attendance",
        "attendance",
        "data.records",
        "records",
        "data.data",
        "data",
        "",
    ];
    pub const FEES: &[&str] = &[
        "data.feeDetails",
        "feeDetails",
        "data.fees",
        "fees",
        "data",
        "",
    ];
    pub const PAYMENTS: &[&str] = &[
        "data.payments",
        "payments",
        "data.paymentHistory",
        "paymentHistory",
    ];
    pub const TIMETABLE: &[&str] = &[
        "data.timetable",
        "timetable",
        "data.periods",
        "periods",
        "data",
        "",
    ];
    pub const RESULTS: &[&str] = &["data.results", "results", "data.data", "data", ""];
    pub const ANNOUNCEMENTS: &[&str] = &[
        "data.announcements",
        "announcements",
        "data.data",
        "data",
        "",
    ];
    pub const THREADS: &[&str] = &["data.threads", "threads", "data.data", "data", ""];
    pub const THREAD: &[&str] = &["data.thread", "thread", "data", ""];
    pub const MESSAGES: &[&str] = &["data.messages", "messages"];
}

/// Follows a dot-separated key path. The empty path is the body itself.
fn lookup<'a>(resp: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(resp);
    }
    path.split('.')
        .try_fold(resp, |node, key| node.as_object()?.get(key))
}

/// Returns the first non-null value found along `paths`, tried left to right.
pub fn extract<'a>(resp: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| lookup(resp, path))
        .find(|value| !value.is_null())
}

/// First candidate that is a JSON object, or `{}`.
pub fn extract_object(resp: &Value, paths: &[&str]) -> Map<String, Value> {
    paths
        .iter()
        .filter_map(|path| lookup(resp, path))
        .find_map(|value| value.as_object().cloned())
        .unwrap_or_default()
}

/// First candidate that is a JSON array, or `[]`.
pub fn extract_list(resp: &Value, paths: &[&str]) -> Vec<Value> {
    paths
        .iter()
        .filter_map(|path| lookup(resp, path))
        .find_map(|value| value.as_array().cloned())
        .unwrap_or_default()
}

/// Deserializes the first candidate that fits `T`.
///
/// A miss is "no data", not a failure: it is logged and reported as `None`.
pub fn extract_as<T: DeserializeOwned>(resp: &Value, paths: &[&str]) -> Option<T> {
    let found = paths
        .iter()
        .filter_map(|path| lookup(resp, path))
        .filter(|value| !value.is_null())
        .find_map(|value| serde_json::from_value::<T>(value.clone()).ok());

    if found.is_none() {
        tracing::debug!(
            paths = paths.join(","),
            target_type = std::any::type_name::<T>(),
            "No candidate payload matched the expected shape"
        );
    }
    found
}

/// Like [`extract_as`], but a candidate that parses to a blank entity only
/// wins when no later candidate carries data.
pub fn extract_entity<T: DeserializeOwned + Blank>(resp: &Value, paths: &[&str]) -> Option<T> {
    let mut blank = None;
    for value in paths
        .iter()
        .filter_map(|path| lookup(resp, path))
        .filter(|value| !value.is_null())
    {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(parsed) if !parsed.is_blank() => return Some(parsed),
            Ok(parsed) => {
                blank.get_or_insert(parsed);
            }
            Err(err) => tracing::debug!(error = %err, "Candidate payload rejected"),
        }
    }

    if blank.is_none() {
        tracing::debug!(
            paths = paths.join(","),
            target_type = std::any::type_name::<T>(),
            "No candidate payload matched the expected shape"
        );
    }
    blank
}

/// Deserializes every element of the first list candidate, skipping elements
/// that do not fit `T`.
pub fn extract_items<T: DeserializeOwned>(resp: &Value, paths: &[&str]) -> Vec<T> {
    let items = extract_list(resp, paths);
    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if parsed.len() < total {
        tracing::warn!(
            skipped = total - parsed.len(),
            total,
            "Dropped list items with an unexpected shape"
        );
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picks_first_non_null_candidate() {
        let resp = json!({ "data": { "admin": null, "name": "wrapper" }, "admin": { "name": "Asha" } });
        let found = extract(&resp, shapes::ADMIN).unwrap();
        assert_eq!(found["name"], "Asha");
    }

    #[test]
    fn empty_path_is_the_bare_body() {
        let resp = json!({ "name": "Asha" });
        assert_eq!(extract(&resp, &[""]), Some(&resp));
    }

    #[test]
    fn misses_fall_back_to_empty_containers() {
        let resp = json!({ "status": "ok" });
        assert!(extract_object(&resp, &["data.admin", "admin"]).is_empty());
        assert!(extract_list(&resp, shapes::CHILDREN).is_empty());
        assert!(extract(&resp, &["data"]).is_none());
    }

    #[test]
    fn list_skips_non_array_candidates() {
        let resp = json!({ "data": { "data": [1, 2], "total": 2 } });
        assert_eq!(extract_list(&resp, shapes::LIST), vec![json!(1), json!(2)]);

        let flat = json!({ "data": [3] });
        assert_eq!(extract_list(&flat, shapes::LIST), vec![json!(3)]);

        let bare = json!([4, 5]);
        assert_eq!(extract_list(&bare, shapes::LIST).len(), 2);
    }

    #[test]
    fn typed_extract_reports_shape_miss_as_none() {
        #[derive(serde::Deserialize)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }
        let resp = json!({ "data": [1, 2, 3] });
        assert!(extract_as::<Named>(&resp, &["data"]).is_none());
    }

    #[test]
    fn entity_extract_passes_over_blank_wrappers() {
        use crate::models::Profile;

        let resp = json!({ "data": { "status": "ok" }, "_id": "p1", "name": "Asha" });
        let profile: Profile = extract_entity(&resp, &["data", ""]).unwrap();
        assert_eq!(profile.name, "Asha");

        let empty = json!({ "data": { "status": "ok" } });
        let blank: Profile = extract_entity(&empty, &["data"]).unwrap();
        assert!(blank.is_blank());
    }
}

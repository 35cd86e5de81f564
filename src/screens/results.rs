use std::path::{Path, PathBuf};

use crate::api::{Endpoint, Query, Transport};
use crate::error::{PortalError, PortalResult};
use crate::models::ExamResult;
use crate::normalize::{self, shapes};
use crate::notify::Notifications;
use crate::view_state::{Phase, ViewState};

use super::fees::save_download;
use super::sanitize_file_stem;

#[derive(Default)]
pub struct ResultsView {
    pub state: ViewState<Vec<ExamResult>>,
    search: String,
}

fn matches(result: &ExamResult, needle: &str) -> bool {
    needle.is_empty()
        || result.exam_name.to_lowercase().contains(needle)
        || result.exam_type.to_lowercase().contains(needle)
}

/// Latest academic year first, then exam name.
fn sort_results(results: &mut [ExamResult]) {
    results.sort_by(|a, b| {
        b.academic_year
            .cmp(&a.academic_year)
            .then_with(|| a.exam_name.cmp(&b.exam_name))
    });
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Narrows the already-fetched list without a round trip.
    pub fn set_search(&mut self, text: &str) {
        self.search = text.trim().to_string();
    }

    pub fn visible(&self) -> Vec<&ExamResult> {
        let needle = self.search.to_lowercase();
        self.state
            .data()
            .map(|results| results.iter().filter(|r| matches(r, &needle)).collect())
            .unwrap_or_default()
    }

    pub async fn load(
        &mut self,
        api: &dyn Transport,
        child_id: &str,
        notices: &mut Notifications,
    ) -> Phase {
        let ticket = self.state.begin(Some(child_id));
        let result = fetch(api, child_id, &self.search).await;
        self.state.resolve(&ticket, result);
        if self.state.phase() == Phase::Error {
            let err = self.state.error().unwrap_or_default().to_string();
            notices.error("Failed to load results:", err);
        }
        self.state.phase()
    }

    pub async fn download_result(
        &self,
        api: &dyn Transport,
        result_id: &str,
        dir: &Path,
        notices: &mut Notifications,
    ) -> PortalResult<PathBuf> {
        let result = self
            .state
            .data()
            .and_then(|results| results.iter().find(|r| r.id == result_id))
            .ok_or_else(|| PortalError::not_found("result", result_id))?;

        let stem = if result.exam_name.is_empty() {
            &result.id
        } else {
            &result.exam_name
        };
        let file_name = format!("result-{}.pdf", sanitize_file_stem(stem));
        let endpoint = Endpoint::DownloadResult(result_id.to_string());
        match save_download(api, &endpoint, dir, &file_name).await {
            Ok(path) => {
                notices.success("Result downloaded");
                Ok(path)
            }
            Err(err) => {
                notices.error("Failed to download result:", &err);
                Err(err)
            }
        }
    }
}

/// The search is sent to the backend and re-applied locally, since not every
/// route honours it.
pub async fn fetch(
    api: &dyn Transport,
    child_id: &str,
    search: &str,
) -> PortalResult<Vec<ExamResult>> {
    let query = if search.is_empty() {
        Query::new()
    } else {
        Query::new().with("search", search)
    };
    let resp = api
        .get(&Endpoint::ChildResults(child_id.to_string()), &query)
        .await?;

    let needle = search.to_lowercase();
    let mut results: Vec<ExamResult> = normalize::extract_items::<ExamResult>(&resp, shapes::RESULTS)
        .into_iter()
        .filter(|r| matches(r, &needle))
        .collect();
    sort_results(&mut results);
    Ok(results)
}

//! Parent dashboard: the parent's profile, the list of children, and the
//! attendance/fees/timetable/results of whichever child is selected.
//!
//! Selecting a child issues exactly one fetch per dependent resource. Each
//! fetch is tied to a [`SelectionTicket`]; results arriving for a selection
//! that has since been replaced are dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::Transport;
use crate::config::DEFAULT_DOWNLOAD_DIR;
use crate::error::{PortalError, PortalResult};
use crate::forms::PaymentForm;
use crate::models::{AttendanceRecord, Child, ExamResult, FeeDetails, Profile};
use crate::notify::Notifications;
use crate::view_state::{Phase, Resolution, Ticket, ViewState};

use super::attendance::{self, AttendanceFilter, AttendanceView};
use super::fees::{self, FeeOverview, FeeView};
use super::profile::{fetch_profile, ProfileConfig};
use super::results::{self, ResultsView};
use super::timetable::{self, TimetableView, WeeklyTimetable};

#[derive(Debug, Clone)]
pub struct SelectionTicket {
    child_id: String,
    attendance: Ticket,
    fees: Ticket,
    timetable: Ticket,
    results: Ticket,
}

impl SelectionTicket {
    pub fn child_id(&self) -> &str {
        &self.child_id
    }
}

/// Outcome of the dependent fetches for one selection.
pub struct DependentData {
    pub attendance: PortalResult<Vec<AttendanceRecord>>,
    pub fees: PortalResult<FeeOverview>,
    pub timetable: PortalResult<WeeklyTimetable>,
    pub results: PortalResult<Vec<ExamResult>>,
}

pub struct ParentDashboard {
    api: Arc<dyn Transport>,
    config: ProfileConfig,
    pub profile: ViewState<Profile>,
    selected: Option<String>,
    pub attendance: AttendanceView,
    pub fees: FeeView,
    pub timetable: TimetableView,
    pub results: ResultsView,
    pub notices: Notifications,
    download_dir: PathBuf,
}

impl ParentDashboard {
    pub fn new(api: Arc<dyn Transport>, filter: AttendanceFilter) -> Self {
        Self {
            api,
            config: ProfileConfig::parent(),
            profile: ViewState::new(),
            selected: None,
            attendance: AttendanceView::new(filter),
            fees: FeeView::new(),
            timetable: TimetableView::new(),
            results: ResultsView::new(),
            notices: Notifications::default(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
        }
    }

    /// Directory receipts and result sheets are saved into.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn children(&self) -> &[Child] {
        self.profile
            .data()
            .map(|p| p.children.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_child(&self) -> Option<&Child> {
        let id = self.selected.as_deref()?;
        self.children().iter().find(|c| c.id == id)
    }

    /// Loads the parent and, if there are children, selects the first one.
    pub async fn mount(&mut self) -> Phase {
        let ticket = self.profile.begin(None);
        let result = fetch_profile(self.api.as_ref(), &self.config).await;
        self.profile.resolve(&ticket, result);

        if self.profile.phase() == Phase::Error {
            let err = self.profile.error().unwrap_or_default().to_string();
            self.notices.error("Failed to load parent details:", err);
        }

        let still_present = self
            .selected
            .as_deref()
            .is_some_and(|id| self.children().iter().any(|c| c.id == id));
        let target = if still_present {
            self.selected.clone()
        } else {
            self.children().first().map(|c| c.id.clone())
        };

        match target {
            Some(child_id) => {
                if let Err(err) = self.select_and_load(&child_id).await {
                    tracing::warn!(error = %err, child_id = %child_id, "Default child selection failed");
                }
            }
            None => {
                if self.profile.phase() == Phase::Populated {
                    tracing::info!("Parent has no children registered");
                }
                self.clear_selection();
            }
        }
        self.profile.phase()
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.fees.fallback = None;
        self.attendance.state.reset();
        self.fees.state.reset();
        self.timetable.state.reset();
        self.results.state.reset();
    }

    fn child_fee_details(&self, child_id: &str) -> Option<FeeDetails> {
        self.children()
            .iter()
            .find(|c| c.id == child_id)
            .and_then(|c| c.fee_details)
    }

    /// Switches the selection and starts one load per dependent view.
    pub fn select_child(&mut self, child_id: &str) -> PortalResult<SelectionTicket> {
        if !self.children().iter().any(|c| c.id == child_id) {
            return Err(PortalError::not_found("child", child_id));
        }
        self.selected = Some(child_id.to_string());
        self.fees.fallback = self.child_fee_details(child_id);
        tracing::debug!(child_id, "Selected child");

        Ok(SelectionTicket {
            child_id: child_id.to_string(),
            attendance: self.attendance.state.begin(Some(child_id)),
            fees: self.fees.state.begin(Some(child_id)),
            timetable: self.timetable.state.begin(Some(child_id)),
            results: self.results.state.begin(Some(child_id)),
        })
    }

    pub async fn fetch_dependents(&self, ticket: &SelectionTicket) -> DependentData {
        let api = self.api.as_ref();
        let child_id = ticket.child_id.as_str();
        let search = self.results.search().to_string();
        let (attendance, fees, timetable, results) = tokio::join!(
            attendance::fetch(api, child_id, &self.attendance.filter),
            fees::fetch(api, child_id, self.child_fee_details(child_id)),
            timetable::fetch(api, child_id),
            results::fetch(api, child_id, &search),
        );
        DependentData {
            attendance,
            fees,
            timetable,
            results,
        }
    }

    /// Returns false when the ticket belongs to a superseded selection.
    pub fn apply_dependents(&mut self, ticket: &SelectionTicket, data: DependentData) -> bool {
        let outcomes = [
            (
                "attendance",
                self.attendance.state.resolve(&ticket.attendance, data.attendance),
                self.attendance.state.error().map(str::to_string),
            ),
            (
                "fee details",
                self.fees.state.resolve(&ticket.fees, data.fees),
                self.fees.state.error().map(str::to_string),
            ),
            (
                "timetable",
                self.timetable.state.resolve(&ticket.timetable, data.timetable),
                self.timetable.state.error().map(str::to_string),
            ),
            (
                "results",
                self.results.state.resolve(&ticket.results, data.results),
                self.results.state.error().map(str::to_string),
            ),
        ];

        let mut applied = false;
        for (name, resolution, error) in outcomes {
            match resolution {
                Resolution::Discarded => {}
                Resolution::Applied(Phase::Error) => {
                    applied = true;
                    self.notices.error(
                        &format!("Failed to load {name}:"),
                        error.unwrap_or_default(),
                    );
                }
                Resolution::Applied(_) => applied = true,
            }
        }

        if !applied {
            tracing::debug!(child_id = %ticket.child_id, "Dropped results for a superseded selection");
        }
        applied
    }

    pub async fn select_and_load(&mut self, child_id: &str) -> PortalResult<bool> {
        let ticket = self.select_child(child_id)?;
        let data = self.fetch_dependents(&ticket).await;
        Ok(self.apply_dependents(&ticket, data))
    }

    pub async fn change_attendance_filter(&mut self, filter: AttendanceFilter) -> Phase {
        self.attendance.filter = filter;
        match self.selected.clone() {
            Some(child_id) => {
                self.attendance
                    .load(self.api.as_ref(), &child_id, &mut self.notices)
                    .await
            }
            None => self.attendance.state.phase(),
        }
    }

    pub async fn search_results(&mut self, text: &str) -> Phase {
        self.results.set_search(text);
        match self.selected.clone() {
            Some(child_id) => {
                self.results
                    .load(self.api.as_ref(), &child_id, &mut self.notices)
                    .await
            }
            None => self.results.state.phase(),
        }
    }

    pub async fn submit_payment(&mut self, form: &PaymentForm) -> PortalResult<()> {
        let child_id = self.require_selection()?;
        self.fees
            .submit_payment(self.api.as_ref(), &child_id, form, &mut self.notices)
            .await
    }

    pub async fn download_receipt(&mut self, payment_id: &str) -> PortalResult<PathBuf> {
        self.fees
            .download_receipt(
                self.api.as_ref(),
                payment_id,
                &self.download_dir,
                &mut self.notices,
            )
            .await
    }

    pub async fn download_result(&mut self, result_id: &str) -> PortalResult<PathBuf> {
        self.results
            .download_result(
                self.api.as_ref(),
                result_id,
                &self.download_dir,
                &mut self.notices,
            )
            .await
    }

    fn require_selection(&mut self) -> PortalResult<String> {
        match self.selected.clone() {
            Some(id) => Ok(id),
            None => {
                self.notices.warning("Select a child first");
                Err(PortalError::not_found("child", "none selected"))
            }
        }
    }
}

//! Loading lifecycle for one fetched resource.
//!
//! `Idle -> Loading -> {Populated | Empty | Error}`. Starting a load bumps a
//! generation counter and hands out a [`Ticket`]; only the ticket of the most
//! recent load may resolve the state, so a slow response for a superseded
//! selection is dropped instead of overwriting newer data.

use crate::error::PortalError;
use crate::models::{
    AttendanceRecord, Child, ExamResult, FeeDetails, FeePayment, MessageThread, Profile,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Populated,
    Empty,
    Error,
}

/// Decides whether a successful result should render as the empty state.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Blank> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.as_ref().map_or(true, Blank::is_blank)
    }
}

impl Blank for Profile {
    fn is_blank(&self) -> bool {
        self.id.is_empty() && self.name.is_empty() && self.email.is_empty()
    }
}

impl Blank for Child {
    fn is_blank(&self) -> bool {
        self.id.is_empty()
    }
}

impl Blank for FeeDetails {
    fn is_blank(&self) -> bool {
        *self == FeeDetails::default()
    }
}

impl Blank for MessageThread {
    fn is_blank(&self) -> bool {
        self.id.is_empty() && self.messages.is_empty()
    }
}

impl Blank for AttendanceRecord {
    fn is_blank(&self) -> bool {
        self.date.is_none()
    }
}

impl Blank for FeePayment {
    fn is_blank(&self) -> bool {
        self.id.is_empty() && self.receipt_number.is_empty()
    }
}

impl Blank for ExamResult {
    fn is_blank(&self) -> bool {
        self.id.is_empty() && self.exam_name.is_empty()
    }
}

/// Proof that a load was started, tagged with what it was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    tag: Option<String>,
}

impl Ticket {
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied(Phase),
    Discarded,
}

#[derive(Debug, Clone)]
pub struct ViewState<T> {
    phase: Phase,
    data: Option<T>,
    error: Option<String>,
    generation: u64,
    tag: Option<String>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            data: None,
            error: None,
            generation: 0,
            tag: None,
        }
    }
}

impl<T: Blank> ViewState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Last-known-good data; kept while reloading and after a failure.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        self.data.as_mut()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The tag of the load that produced (or is producing) the current state.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn begin(&mut self, tag: Option<&str>) -> Ticket {
        self.generation += 1;
        self.phase = Phase::Loading;
        self.tag = tag.map(str::to_string);
        Ticket {
            generation: self.generation,
            tag: self.tag.clone(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
    }

    pub fn resolve(&mut self, ticket: &Ticket, result: Result<T, PortalError>) -> Resolution {
        if !self.is_current(ticket) {
            tracing::debug!(
                stale_tag = ticket.tag().unwrap_or_default(),
                current_tag = self.tag().unwrap_or_default(),
                "Discarding stale response"
            );
            return Resolution::Discarded;
        }

        self.phase = match result {
            Ok(data) if data.is_blank() => {
                self.data = None;
                self.error = None;
                Phase::Empty
            }
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                Phase::Populated
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Phase::Error
            }
        };
        Resolution::Applied(self.phase)
    }

    /// Terminates a load that will never resolve, e.g. when its request could not be built.
    pub fn fail_pending(&mut self, message: impl Into<String>) {
        if self.phase == Phase::Loading {
            self.phase = Phase::Error;
            self.error = Some(message.into());
        }
    }

    /// Replaces the data locally after a successful write, without a round trip.
    pub fn replace(&mut self, data: T) {
        self.phase = if data.is_blank() {
            Phase::Empty
        } else {
            Phase::Populated
        };
        self.data = Some(data).filter(|d| !d.is_blank());
        self.error = None;
    }

    /// Forgets everything, e.g. when the selection it depended on disappears.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = Phase::Idle;
        self.data = None;
        self.error = None;
        self.tag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;

    fn failure() -> PortalError {
        RequestError::Network("connection refused".into()).into()
    }

    #[test]
    fn empty_and_populated_outcomes() {
        let mut state: ViewState<Vec<u32>> = ViewState::new();
        assert_eq!(state.phase(), Phase::Idle);

        let ticket = state.begin(None);
        assert!(state.is_loading());
        assert_eq!(state.resolve(&ticket, Ok(vec![])), Resolution::Applied(Phase::Empty));
        assert!(state.data().is_none());

        let ticket = state.begin(None);
        state.resolve(&ticket, Ok(vec![7]));
        assert_eq!(state.phase(), Phase::Populated);
        assert_eq!(state.data(), Some(&vec![7]));
    }

    #[test]
    fn failure_keeps_last_known_good() {
        let mut state: ViewState<Vec<u32>> = ViewState::new();
        let ticket = state.begin(None);
        state.resolve(&ticket, Ok(vec![1, 2]));

        let ticket = state.begin(None);
        assert_eq!(state.data(), Some(&vec![1, 2]));
        state.resolve(&ticket, Err(failure()));

        assert_eq!(state.phase(), Phase::Error);
        assert_eq!(state.data(), Some(&vec![1, 2]));
        assert_eq!(state.error(), Some("Server unreachable: connection refused"));
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let mut state: ViewState<Vec<&str>> = ViewState::new();
        let first = state.begin(Some("child-a"));
        let second = state.begin(Some("child-b"));

        assert_eq!(state.resolve(&second, Ok(vec!["b"])), Resolution::Applied(Phase::Populated));
        assert_eq!(state.resolve(&first, Ok(vec!["a"])), Resolution::Discarded);
        assert_eq!(state.data(), Some(&vec!["b"]));
        assert_eq!(state.tag(), Some("child-b"));
    }

    #[test]
    fn fail_pending_only_touches_loading_state() {
        let mut state: ViewState<Vec<u8>> = ViewState::new();
        state.fail_pending("nope");
        assert_eq!(state.phase(), Phase::Idle);

        state.begin(None);
        state.fail_pending("gave up");
        assert_eq!(state.phase(), Phase::Error);
        assert_eq!(state.error(), Some("gave up"));
    }
}

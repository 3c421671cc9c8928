use sm_core::{Result, StreamEvent};

use crate::machine::ProgressStateMachine;

pub const SEARCH_STARTED_MESSAGE: &str = "Retrieving sources...";
pub const SYNC_FAILED_MESSAGE: &str = "There is a problem syncing data";
pub const CANCELLED_MESSAGE: &str = "Search cancelled";

/// Everything the UI shows for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user_id: String,
    pub update_flag: bool,
    pub syncing: bool,
    pub loading: bool,
    pub input_disabled: bool,
    pub notification: String,
    pub progress: ProgressStateMachine,
    pub final_received: bool,
}

#[derive(Debug, Clone)]
pub enum SessionAction {
    Initialized { user_id: String, update_flag: bool },
    SyncStarted,
    SyncFinished,
    SyncFailed,
    SearchStarted,
    Event(StreamEvent),
    StreamEnded,
    Cancelled,
    Notify(String),
    UpdateDismissed,
}

/// Pure transition function of the session.
pub fn reduce(state: SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::Initialized {
            user_id,
            update_flag,
        } => SessionState {
            user_id,
            update_flag,
            ..state
        },
        SessionAction::SyncStarted => SessionState {
            syncing: true,
            ..state
        },
        SessionAction::SyncFinished => SessionState {
            syncing: false,
            ..state
        },
        SessionAction::SyncFailed => SessionState {
            syncing: false,
            notification: SYNC_FAILED_MESSAGE.to_string(),
            ..state
        },
        SessionAction::SearchStarted => SessionState {
            loading: true,
            input_disabled: true,
            notification: SEARCH_STARTED_MESSAGE.to_string(),
            progress: ProgressStateMachine::new(),
            final_received: false,
            ..state
        },
        SessionAction::Event(event) => {
            let progress = state.progress.clone().apply(&event);
            settle(state, progress)
        }
        SessionAction::StreamEnded => {
            let progress = state.progress.clone().end_of_stream();
            settle(state, progress)
        }
        SessionAction::Cancelled => SessionState {
            loading: false,
            input_disabled: false,
            notification: CANCELLED_MESSAGE.to_string(),
            progress: ProgressStateMachine::new(),
            final_received: false,
            ..state
        },
        SessionAction::Notify(notification) => SessionState {
            notification,
            ..state
        },
        SessionAction::UpdateDismissed => SessionState {
            update_flag: true,
            ..state
        },
    }
}

fn settle(state: SessionState, progress: ProgressStateMachine) -> SessionState {
    let finished = progress.is_terminal();
    SessionState {
        notification: progress.status().to_string(),
        loading: state.loading && !finished,
        input_disabled: state.input_disabled && !finished,
        final_received: state.final_received || finished,
        progress,
        ..state
    }
}

/// Owner of the session state; the only writer.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn dispatch(&mut self, action: SessionAction) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    /// Enter the searching state, refusing while another search is in flight.
    pub fn begin_search(&mut self) -> Result<()> {
        if self.state.loading {
            return Err(sm_core::Error::SearchInFlight);
        }
        self.dispatch(SessionAction::SearchStarted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Phase, NO_RESULTS_MESSAGE};
    use serde_json::{json, Map, Value};
    use sm_core::Step;

    fn event(step: Step, data: Value) -> StreamEvent {
        let Value::Object(data) = data else {
            return StreamEvent::new(step, Map::new());
        };
        StreamEvent::new(step, data)
    }

    #[test]
    fn test_in_flight_guard() {
        let mut session = Session::new();
        session.begin_search().unwrap();
        assert!(session.state().loading);
        assert!(session.state().input_disabled);
        assert_eq!(session.state().notification, SEARCH_STARTED_MESSAGE);
        assert!(matches!(session.begin_search(), Err(sm_core::Error::SearchInFlight)));

        session.dispatch(SessionAction::Event(event(Step::Final, json!({"docs": []}))));
        assert!(!session.state().loading);
        assert!(session.begin_search().is_ok());
        assert_eq!(session.state().progress.phase(), Phase::Idle);
        assert!(!session.state().final_received);
    }

    #[test]
    fn test_progress_updates_notification() {
        let mut session = Session::new();
        session.begin_search().unwrap();
        session.dispatch(SessionAction::Event(event(Step::RetrievedParents, json!({"count": 7}))));
        assert_eq!(session.state().notification, "Retrieved 7 sources...");
        assert!(session.state().loading);

        session.dispatch(SessionAction::Event(event(Step::Final, json!({"docs": [], "result": "x"}))));
        let state = session.state();
        assert_eq!(state.notification, NO_RESULTS_MESSAGE);
        assert!(state.final_received);
        assert!(!state.input_disabled);
        assert_eq!(state.progress.phase(), Phase::Done);
    }

    #[test]
    fn test_sync_failure() {
        let state = reduce(SessionState::default(), SessionAction::SyncStarted);
        assert!(state.syncing);
        let state = reduce(state, SessionAction::SyncFailed);
        assert!(!state.syncing);
        assert_eq!(state.notification, SYNC_FAILED_MESSAGE);
    }

    #[test]
    fn test_cancel_releases_input() {
        let mut session = Session::new();
        session.dispatch(SessionAction::Initialized {
            user_id: "u1".into(),
            update_flag: false,
        });
        session.begin_search().unwrap();
        session.dispatch(SessionAction::Cancelled);

        let state = session.state();
        assert!(!state.loading);
        assert!(!state.input_disabled);
        assert!(state.progress.outcome().is_none());
        assert_eq!(state.user_id, "u1");
    }
}

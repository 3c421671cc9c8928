use futures_util::{Stream, StreamExt};
use sm_core::{SearchOutcome, StreamEvent};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::machine::STREAM_ENDED_MESSAGE;
use crate::session::{Session, SessionAction, SessionState};

/// Feed `events` into `session` until a terminal state, calling `on_update` after
/// every transition.
///
/// The session must already be in the searching state (see [`Session::begin_search`]).
/// Returns the outcome of the search, or `None` when `cancel` fired first.
pub async fn drive<S, F>(
    session: &mut Session,
    events: S,
    cancel: &CancellationToken,
    mut on_update: F,
) -> Option<SearchOutcome>
where
    S: Stream<Item = StreamEvent>,
    F: FnMut(&SessionState),
{
    futures_util::pin_mut!(events);

    while let Some(event) = events.next().await {
        debug!("Stream event: {}", event.step);
        session.dispatch(SessionAction::Event(event));
        on_update(session.state());
        if session.state().progress.is_terminal() {
            break;
        }
    }

    if !session.state().progress.is_terminal() {
        if cancel.is_cancelled() {
            session.dispatch(SessionAction::Cancelled);
            on_update(session.state());
            return None;
        }
        session.dispatch(SessionAction::StreamEnded);
        on_update(session.state());
    }

    Some(
        session
            .state()
            .progress
            .outcome()
            .cloned()
            .unwrap_or_else(|| SearchOutcome::failed(STREAM_ENDED_MESSAGE)),
    )
}

//! Search progress: the per-invocation state machine, the session reducer that
//! wraps it, and the driver folding an event stream into a final outcome.

pub mod driver;
pub mod machine;
pub mod session;

pub use driver::drive;
pub use machine::{Phase, ProgressProjection, ProgressStateMachine, ProjectionContent};
pub use session::{reduce, Session, SessionAction, SessionState};

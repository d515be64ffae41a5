//! Producer-consumer frame pipeline.
//!
//! The grab loop pulls frames from the driver as fast as it delivers them,
//! queues owned copies through an unbounded channel, and a dedicated worker
//! thread feeds the encoder. Every queued frame reaches the output file
//! before the session closes, including on a user-requested stop. These are
//! the only two threads in the program.

mod capture;
mod channel;
mod frame;
#[cfg(test)]
pub(crate) mod harness;
mod session;
mod worker;

pub use capture::StopToken;
pub use frame::FrameBuffer;
pub use session::{FrameTarget, Session, SessionError, SessionPlan, SessionReport, SessionState};

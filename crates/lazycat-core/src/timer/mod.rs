mod clock;
mod engine;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{TickOutcome, TimerEngine, TimerState, DEFAULT_NEAR_EXPIRY_SECS};

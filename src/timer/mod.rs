//! Countdown reconciliation timer.
//!
//! # Data Flow
//! ```text
//! Transport (transport/)
//!     → events.rs (decode & validate payloads into TimerEvent)
//!     → driver.rs (mpsc channel, single owner task)
//!     → state.rs (overwrite deadline, record resets)
//!
//! Local interval (driver.rs)
//!     → state.rs tick (remaining = max(0, deadline - now))
//!     → watch channel → renderer
//! ```
//!
//! # Design Decisions
//! - Deadline is absolute; display is derived from it on every tick
//! - Disconnects degrade the display, they never pause or reset it
//! - Reconnecting is the transport's job, not the timer's
//! - Time is read through `Clock` so tests can move it by hand

pub mod clock;
pub mod driver;
pub mod events;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::TimerDriver;
pub use events::{PayloadError, ResetInfo, Snapshot, TimerEvent, MAX_COUNTDOWN_SECS};
pub use state::{ReconciliationTimer, ResetRecord, TimerSettings, TimerView};

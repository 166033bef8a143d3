pub mod controller;
pub mod state;

pub use controller::{FocusController, FocusSnapshot};
pub use state::{format_clock, FocusState, FocusStatus, TickOutcome};

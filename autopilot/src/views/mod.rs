//! Per-page view state
//!
//! Views own everything a page renders. They never talk HTTP directly; every
//! remote call goes through a [`autopilot_sdk::GenerationBackend`] handed in
//! by the caller.

mod files;
mod log_panel;
mod status;

pub use files::{ContentTicket, FilesView, OptimizeTicket, ResultLine};
pub use log_panel::{LogPanel, DEFAULT_CAPACITY};
pub use status::StatusView;

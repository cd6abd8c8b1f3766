//! # pawlink-client
//!
//! The conversation sync engine for the Pawlink lost-and-found pet
//! platform. It keeps an in-memory view of the user's conversations in
//! lockstep with the backend across a lossy push transport:
//!
//! - [`spawn_session`] runs the engine in a background tokio task, driven
//!   by [`SessionCommand`]s and observed through [`SessionEvent`]s;
//! - [`ChatState`] holds the pure, order-tolerant merge rules (unread
//!   reconciliation, dedup, activity ordering);
//! - [`AnnouncementBrowser`] derives the filtered, sorted, paged view of
//!   the announcement board.
//!
//! Network access goes through the `pawlink-net` traits, so tests drive
//! the whole engine with in-process fakes.

pub mod announcements;
pub mod config;
pub mod session;
pub mod state;

pub use announcements::{AnnouncementBrowser, BrowseFilter, SortOrder};
pub use config::ClientConfig;
pub use session::{
    spawn_session, LinkState, NoticeLevel, SendOutcome, SessionCommand, SessionEvent,
};
pub use state::{ChatState, Inbound, LogPhase};

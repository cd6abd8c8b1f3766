//! Paging and timing contracts shared with the backend.

use std::time::Duration;

/// Conversations fetched per refresh (page 1 only; the backend caps at 50).
pub const CONVERSATION_PAGE_SIZE: u32 = 50;

/// Most recent messages loaded when a conversation is opened.
pub const MESSAGE_HISTORY_LIMIT: u32 = 50;

/// Fixed delay before re-dialing the push transport after it closes.
/// No backoff, no retry cap.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Cap on a single push connect attempt. A connect that exceeds this is
/// treated as failed and re-dialed on the normal reconnect cadence.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Announcement cards shown per page in the browse view.
pub const ANNOUNCEMENTS_PER_PAGE: usize = 9;

//! Announcement browse pipeline: client-side filter, sort, and paging over
//! the fetched announcement list. Pure derived state; the fetch itself goes
//! through [`pawlink_net::ChatApi::list_announcements`] at the caller's edge.

use pawlink_shared::constants::ANNOUNCEMENTS_PER_PAGE;
use pawlink_shared::models::{Announcement, AnnouncementStatus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseFilter {
    /// `None` means "all".
    pub status: Option<AnnouncementStatus>,
    pub pet_type: Option<String>,
    pub gender: Option<String>,
    /// Case-insensitive match against the pet name or the location address.
    pub search: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Newest,
    Oldest,
}

#[derive(Debug)]
pub struct AnnouncementBrowser {
    items: Vec<Announcement>,
    filter: BrowseFilter,
    sort: SortOrder,
    page: usize,
    per_page: usize,
}

impl AnnouncementBrowser {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            filter: BrowseFilter::default(),
            sort: SortOrder::Newest,
            page: 1,
            per_page: ANNOUNCEMENTS_PER_PAGE,
        }
    }

    pub fn replace_items(&mut self, items: Vec<Announcement>) {
        self.items = items;
        self.page = 1;
    }

    pub fn filter(&self) -> &BrowseFilter {
        &self.filter
    }

    /// Changing any filter facet jumps back to page 1.
    pub fn set_filter(&mut self, filter: BrowseFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count().max(1));
    }

    pub fn page_count(&self) -> usize {
        let matching = self.filtered().len();
        matching.div_ceil(self.per_page)
    }

    /// The current page of announcements after filter and sort.
    pub fn visible(&self) -> Vec<&Announcement> {
        let mut matching = self.filtered();
        matching.sort_by(|a, b| match self.sort {
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
        });
        let start = (self.page - 1) * self.per_page;
        matching.into_iter().skip(start).take(self.per_page).collect()
    }

    fn filtered(&self) -> Vec<&Announcement> {
        let needle = self.filter.search.to_lowercase();
        self.items
            .iter()
            .filter(|a| {
                let status_ok = self.filter.status.map_or(true, |s| a.status == s);
                let type_ok = self
                    .filter
                    .pet_type
                    .as_deref()
                    .map_or(true, |t| a.pet.pet_type == t);
                let gender_ok = self
                    .filter
                    .gender
                    .as_deref()
                    .map_or(true, |g| a.pet.gender.as_deref() == Some(g));
                let search_ok = needle.is_empty()
                    || a.pet.name.to_lowercase().contains(&needle)
                    || a.location
                        .as_ref()
                        .and_then(|l| l.address.as_deref())
                        .is_some_and(|addr| addr.to_lowercase().contains(&needle));
                status_ok && type_ok && gender_ok && search_ok
            })
            .collect()
    }
}

impl Default for AnnouncementBrowser {
    fn default() -> Self {
        Self::new()
    }
}

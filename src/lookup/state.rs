//! Lookup states and the pagination cursor.

use std::collections::HashSet;
use std::fmt;

use url::Url;

/// Progress of one provider lookup.
///
/// `Constructing → Fetching(region) → Paginating* → Converting → Done`, with
/// `Failed` reachable from every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupState {
    Constructing,
    Fetching { region: Option<String> },
    Paginating { page: usize },
    Converting,
    Done,
    Failed,
}

impl LookupState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for LookupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructing => f.write_str("constructing"),
            Self::Fetching { region: Some(region) } => write!(f, "fetching ({})", region),
            Self::Fetching { region: None } => f.write_str("fetching"),
            Self::Paginating { page } => write!(f, "paginating (page {})", page),
            Self::Converting => f.write_str("converting"),
            Self::Done => f.write_str("done"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Upper bound on the pages of one lookup.
pub const MAX_PAGES: usize = 100;

/// Why a paginated fetch cannot continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationStop {
    #[error("Pagination cycle: {0} was already fetched")]
    Cycle(Url),

    #[error("Pagination exceeds {0} pages")]
    Limit(usize),
}

/// Follows "next page" links strictly one page at a time.
///
/// Every link handed out is remembered; a link that points back to a page
/// already fetched, or more than [`MAX_PAGES`] pages, stops the walk.
#[derive(Debug, Clone, Default)]
pub struct PageCursor {
    next: Option<Url>,
    pages: usize,
    visited: HashSet<Url>,
}

impl PageCursor {
    /// Start after the first page, which linked to `next`.
    pub fn after_first(next: Option<Url>) -> Self {
        Self {
            next,
            pages: 1,
            visited: HashSet::new(),
        }
    }

    /// Take the link of the page to fetch next, if any.
    pub fn next_page(&mut self) -> Option<Url> {
        let url = self.next.take()?;
        self.visited.insert(url.clone());
        Some(url)
    }

    /// Record a fetched page and the link it carried.
    pub fn advance(&mut self, next: Option<Url>) -> Result<(), PaginationStop> {
        self.pages += 1;
        let Some(next) = next else {
            return Ok(());
        };
        if self.visited.contains(&next) {
            return Err(PaginationStop::Cycle(next));
        }
        if self.pages >= MAX_PAGES {
            return Err(PaginationStop::Limit(MAX_PAGES));
        }
        self.next = Some(next);
        Ok(())
    }

    /// Number of pages fetched so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

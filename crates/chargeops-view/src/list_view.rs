//! Screen state: canonical collection plus derived view state

use crate::enrich::enrich;
use crate::filter::{FilterSpec, Selection};
use crate::paginate::{PageError, PageInfo, Paginator};
use crate::screens::ScreenDef;
use crate::sort::{SortSpec, sort_records};
use crate::ViewError;
use chargeops_core::{EntityKind, Record, RecordId};
use tracing::{debug, warn};

/// Loading state of a screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// First fetch outstanding
    Loading,
    /// Collection reflects the last successful fetch
    Ready,
    /// Last fetch failed with this message
    Failed(String),
}

/// One visible page of a screen
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// Records on the page, in sorted order
    pub rows: Vec<&'a Record>,
    /// Rendering metadata over the filtered set
    pub info: PageInfo,
}

/// List screen owning its collection and view state
///
/// Filtered, sorted and paged views are derived on every read. Filter and
/// sort changes go back to page 1. Collection changes keep the page but
/// clamp it to the new page count.
#[derive(Debug, Clone)]
pub struct ListView {
    screen: &'static ScreenDef,
    collection: Vec<Record>,
    enriched: Option<Vec<Record>>,
    filter: FilterSpec,
    sort: SortSpec,
    pager: Paginator,
    state: LoadState,
}

impl ListView {
    /// Create an empty view for a screen
    #[must_use]
    pub fn new(screen: &'static ScreenDef, page_size: usize) -> Self {
        Self {
            screen,
            collection: Vec::new(),
            enriched: screen.enrich.then(Vec::new),
            filter: screen.filter_spec(),
            sort: screen.initial_sort(),
            pager: Paginator::new(page_size),
            state: LoadState::Idle,
        }
    }

    /// Create an empty view for an entity kind
    #[must_use]
    pub fn for_kind(kind: EntityKind, page_size: usize) -> Self {
        Self::new(ScreenDef::for_kind(kind), page_size)
    }

    /// Screen definition
    #[must_use]
    pub const fn screen(&self) -> &'static ScreenDef {
        self.screen
    }

    /// Entity kind listed
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.screen.kind
    }

    /// Canonical collection as last fetched or mutated
    #[must_use]
    pub fn collection(&self) -> &[Record] {
        &self.collection
    }

    /// Records the pipeline runs over (enriched when the screen enriches)
    #[must_use]
    pub fn source(&self) -> &[Record] {
        self.enriched.as_deref().unwrap_or(&self.collection)
    }

    /// Loading state
    #[must_use]
    pub const fn state(&self) -> &LoadState {
        &self.state
    }

    /// Mark the first fetch as outstanding
    pub fn begin_load(&mut self) {
        self.state = LoadState::Loading;
    }

    /// Record a failed fetch; the collection is left as it was
    pub fn fail_load(&mut self, message: impl Into<String>) {
        self.state = LoadState::Failed(message.into());
    }

    /// Replace the collection wholesale
    pub fn replace_collection(&mut self, records: Vec<Record>) {
        debug!(kind = %self.kind(), count = records.len(), "Replacing collection");
        self.collection = records;
        self.state = LoadState::Ready;
        self.collection_changed();
    }

    /// Find a record by id
    #[must_use]
    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.collection.iter().find(|r| r.id().as_ref() == Some(id))
    }

    /// Replace the record with the same id, or append it
    ///
    /// Records without an id are not server data and are ignored.
    pub fn upsert(&mut self, record: Record) {
        let Some(id) = record.id() else {
            warn!(kind = %self.kind(), "Ignoring record without an id");
            return;
        };
        match self
            .collection
            .iter_mut()
            .find(|r| r.id().as_ref() == Some(&id))
        {
            Some(slot) => *slot = record,
            None => self.collection.push(record),
        }
        self.collection_changed();
    }

    /// Remove a record by id
    pub fn remove(&mut self, id: &RecordId) -> Option<Record> {
        let index = self
            .collection
            .iter()
            .position(|r| r.id().as_ref() == Some(id))?;
        let removed = self.collection.remove(index);
        self.collection_changed();
        Some(removed)
    }

    fn collection_changed(&mut self) {
        if self.enriched.is_some() {
            self.enriched = Some(enrich(&self.collection));
        }
        let visible = self.filtered().len();
        self.pager.clamp(visible);
    }

    /// Current search term
    #[must_use]
    pub fn term(&self) -> &str {
        self.filter.term()
    }

    /// Filter state
    #[must_use]
    pub const fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Change the search term
    pub fn set_term(&mut self, term: impl Into<String>) {
        self.filter.set_term(term);
        self.pager.reset();
    }

    /// Change a categorical filter
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::UnknownFilter`] when the screen has no filter on
    /// `field`.
    pub fn select(&mut self, field: &str, selection: Selection) -> Result<(), ViewError> {
        if !self.filter.select(field, selection) {
            return Err(ViewError::UnknownFilter {
                screen: self.kind().to_string(),
                field: field.to_string(),
            });
        }
        self.pager.reset();
        Ok(())
    }

    /// Clear the term and every filter
    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.pager.reset();
    }

    /// Current sort
    #[must_use]
    pub const fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Replace the sort
    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.pager.reset();
    }

    /// Column-header click on `field`
    pub fn toggle_sort(&mut self, field: &str) {
        self.sort.toggle(field);
        self.pager.reset();
    }

    /// Current page number
    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.pager.page()
    }

    /// Jump to a page of the filtered set
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] and keeps the page when `n` is not a
    /// valid page.
    pub fn go_to(&mut self, n: usize) -> Result<(), PageError> {
        let visible = self.filtered().len();
        self.pager.go_to(n, visible)
    }

    /// Advance one page; `false` on the last page
    pub fn next_page(&mut self) -> bool {
        let visible = self.filtered().len();
        self.pager.next(visible)
    }

    /// Go back one page; `false` on the first page
    pub fn prev_page(&mut self) -> bool {
        self.pager.prev()
    }

    /// Records passing the filter, in collection order
    #[must_use]
    pub fn filtered(&self) -> Vec<&Record> {
        self.filter.apply(self.source())
    }

    /// Filtered records in sort order
    #[must_use]
    pub fn sorted(&self) -> Vec<&Record> {
        let mut rows = self.filtered();
        sort_records(&mut rows, &self.sort, self.screen.field_kind(&self.sort.field));
        rows
    }

    /// The current page
    #[must_use]
    pub fn page(&self) -> Page<'_> {
        let sorted = self.sorted();
        let info = self.pager.info(sorted.len());
        let rows = self.pager.slice(&sorted).to_vec();
        Page { rows, info }
    }
}

use std::{cell::RefCell, future::Future, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    listeners::{ListenerKey, Listeners},
    PageSource, PaginationOptions, RequestError,
};

/// Message used when a failed page load carries no message of its own.
pub const DEFAULT_PAGE_ERROR_MESSAGE: &str = "Failed to load data";

/// One page as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items of this page, in order.
    #[serde(alias = "data")]
    pub items: Vec<T>,
    /// Whether a page after this one exists.
    pub has_more: bool,
    /// Number of items across all pages.
    pub total: u64,
}

/// Which kind of load, if any, a [`Pagination`] controller is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Nothing outstanding.
    #[default]
    Idle,
    /// Loading the first page without a refresh.
    Loading,
    /// Reloading from the first page.
    Refreshing,
    /// Loading a page after the first.
    LoadingMore,
}

/// Snapshot of a [`Pagination`] controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState<T> {
    /// Accumulated items, in page order.
    pub items: Vec<T>,
    /// Last successfully loaded page.
    pub page: u32,
    /// Whether a page after `page` exists.
    pub has_more: bool,
    /// Backend-reported number of items across all pages.
    pub total: u64,
    /// The outstanding load.
    pub phase: LoadPhase,
    /// Message of the most recent failed load.
    pub error: Option<String>,
}

impl<T> PaginationState<T> {
    fn fresh(initial_page: u32) -> Self {
        Self {
            items: Vec::new(),
            page: initial_page,
            has_more: true,
            total: 0,
            phase: LoadPhase::Idle,
            error: None,
        }
    }

    /// True while the first page loads outside a refresh.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading)
    }

    /// True while a refresh is outstanding.
    pub fn is_refreshing(&self) -> bool {
        matches!(self.phase, LoadPhase::Refreshing)
    }

    /// True while a later page loads.
    pub fn is_loading_more(&self) -> bool {
        matches!(self.phase, LoadPhase::LoadingMore)
    }
}

/// Drives a [`PageSource`] across an open-ended sequence of pages.
///
/// - [`refresh`](Self::refresh) restarts from the first page and replaces everything.
/// - [`load_more`](Self::load_more) appends the next page, and does nothing while
///   one is already loading or the backend reported no more pages.
/// - [`load_data`](Self::load_data) loads any page directly.
///
/// Overlapping `load_data` calls are not ordered. Whichever settles last wins.
pub struct Pagination<T> {
    state: Rc<RefCell<PaginationState<T>>>,
    source: Rc<dyn PageSource<T>>,
    options: Rc<PaginationOptions>,
    listeners: Listeners<PaginationState<T>>,
}

impl<T> Clone for Pagination<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            source: self.source.clone(),
            options: self.options.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Pagination<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pagination")
            .field("state", &self.state.borrow())
            .field("source", &"...")
            .field("options", &self.options)
            .finish()
    }
}

impl<T> Pagination<T>
where
    T: crate::StateValue + 'static,
{
    /// Creates a controller over `source`. Nothing is fetched until a load is requested.
    pub fn new(source: impl PageSource<T> + 'static, options: PaginationOptions) -> Self {
        let options = options.validate();
        Self {
            state: Rc::new(RefCell::new(PaginationState::fresh(options.initial_page))),
            source: Rc::new(source),
            options: Rc::new(options),
            listeners: Listeners::default(),
        }
    }

    /// Creates a controller over a fetch function `(page, limit) -> Page`.
    pub fn from_fn<F, Fu, E>(fetch: F, options: PaginationOptions) -> Self
    where
        F: Fn(u32, u32) -> Fu + 'static,
        Fu: Future<Output = Result<Page<T>, E>> + 'static,
        E: Into<RequestError> + 'static,
    {
        Self::new(fetch, options)
    }

    /// The current state.
    pub fn state(&self) -> PaginationState<T> {
        self.state.borrow().clone()
    }

    /// Reads the current state without cloning it.
    pub fn with_state<R>(&self, func: impl FnOnce(&PaginationState<T>) -> R) -> R {
        func(&self.state.borrow())
    }

    /// Calls `listener` with a snapshot after every state change.
    pub fn subscribe(&self, listener: impl Fn(&PaginationState<T>) + 'static) -> ListenerKey {
        self.listeners.add(listener)
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, key: ListenerKey) -> bool {
        self.listeners.remove(key)
    }

    /// Loads page `page`.
    ///
    /// A refresh clears the items and rewinds to the first page before fetching.
    /// The first page replaces the items, any later page is appended. A failure
    /// only records the error. Every load clears the busy phase when it settles.
    ///
    /// Resolves to the number of items fetched, or `None` on failure.
    ///
    /// The fetch starts when the returned future is first polled. Dropping the
    /// future before it settles abandons the load and clears the busy phase it
    /// set, so a later [`load_more`](Self::load_more) is not blocked by it.
    pub fn load_data(
        &self,
        page: u32,
        is_refresh: bool,
    ) -> impl Future<Output = Option<usize>> + 'static {
        let initial_page = self.options.initial_page;
        let limit = self.options.page_size;

        let phase = if is_refresh {
            LoadPhase::Refreshing
        } else if page > initial_page {
            LoadPhase::LoadingMore
        } else {
            LoadPhase::Loading
        };
        self.update_state(|state| {
            if is_refresh {
                state.page = initial_page;
                state.items.clear();
            }
            state.phase = phase;
            state.error = None;
        });

        let mut pending = PendingLoad {
            pagination: self.clone(),
            phase,
            settled: false,
        };
        async move {
            let result = pending.pagination.source.fetch_page(page, limit).await;
            let this = pending.settle();
            match result {
                Ok(fetched) => {
                    let count = fetched.items.len();
                    this.update_state(|state| {
                        if is_refresh || page == initial_page {
                            state.items = fetched.items;
                        } else {
                            state.items.extend(fetched.items);
                        }
                        state.has_more = fetched.has_more;
                        state.total = fetched.total;
                        state.page = page;
                        state.phase = LoadPhase::Idle;
                    });
                    Some(count)
                }
                Err(error) => {
                    let message = error.message_or(DEFAULT_PAGE_ERROR_MESSAGE);
                    log::debug!("Failed to load page {page}: {message}");
                    this.update_state(|state| {
                        state.error = Some(message);
                        state.phase = LoadPhase::Idle;
                    });
                    if let Some(on_error) = &this.options.on_error {
                        on_error(&error);
                    }
                    None
                }
            }
        }
    }

    /// Reloads from the first page, discarding everything accumulated.
    pub fn refresh(&self) -> impl Future<Output = Option<usize>> + 'static {
        self.load_data(self.options.initial_page, true)
    }

    /// Appends the page after the last loaded one.
    ///
    /// Does nothing while a later page is loading or when there are no more pages.
    pub fn load_more(&self) -> impl Future<Output = Option<usize>> + 'static {
        let next_page = self.with_state(|state| {
            (!state.is_loading_more() && state.has_more).then(|| state.page.saturating_add(1))
        });

        let load = match next_page {
            Some(page) => Some(self.load_data(page, false)),
            None => {
                log::debug!("Skipping load_more: a page is loading or none remain");
                None
            }
        };

        async move {
            match load {
                Some(load) => load.await,
                None => None,
            }
        }
    }

    /// Clears everything back to the initial state without fetching.
    pub fn reset(&self) {
        let initial_page = self.options.initial_page;
        self.update_state(|state| *state = PaginationState::fresh(initial_page));
    }

    fn update_state(&self, update_fn: impl FnOnce(&mut PaginationState<T>)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            update_fn(&mut state);
            state.clone()
        };
        self.listeners.notify(&snapshot);
    }
}

// Clears the phase of a load whose future was dropped before it settled.
struct PendingLoad<T>
where
    T: crate::StateValue + 'static,
{
    pagination: Pagination<T>,
    phase: LoadPhase,
    settled: bool,
}

impl<T> PendingLoad<T>
where
    T: crate::StateValue + 'static,
{
    fn settle(&mut self) -> Pagination<T> {
        self.settled = true;
        self.pagination.clone()
    }
}

impl<T> Drop for PendingLoad<T>
where
    T: crate::StateValue + 'static,
{
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        log::debug!("Abandoned {:?} load", self.phase);
        let phase = self.phase;
        self.pagination.update_state(|state| {
            if state.phase == phase {
                state.phase = LoadPhase::Idle;
            }
        });
    }
}

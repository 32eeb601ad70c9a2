#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # About API State
//!
//! Leptos API State manages the state of asynchronous requests made by a view:
//! whether one is in flight, what it last returned, and why it last failed.
//!
//! It provides:
//! - request lifecycle tracking (loading, refreshing, error)
//! - cancellation of superseded requests
//! - optimistic updates with rollback
//! - paginated collections with refresh and load-more
//! - user-facing failure alerts
//!
//! ## The main entry points are:
//! - [`ApiStateController`] - Runs one request at a time. Only the most recently started request may commit.
//! - [`OptimisticUpdate`] - Shows a speculative value until its request confirms or rolls it back.
//! - [`Pagination`] - Accumulates pages from a [`PageSource`].
//! - [`use_api_state`], [`use_optimistic_update`] and [`use_pagination`] - The same controllers, mirrored into signals.
//!
//! # Feature Flags
//! - `csr` Client-side rendering: Alerts use `window.alert`.
//! - `hydrate` Hydration: Same as `csr`.
//! - `ssr` Server-side rendering: Alerts go to the `log` facade.
//!
//! # A Simple Example
//!
//! ```
//! use leptos_api_state::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Event {
//!     name: String,
//! }
//!
//! async fn fetch_events(page: u32, limit: u32) -> Result<Page<Event>, RequestError> {
//!     let _ = (page, limit);
//!     Ok(Page {
//!         items: vec![Event { name: "Cars & Coffee".to_string() }],
//!         has_more: false,
//!         total: 1,
//!     })
//! }
//!
//! # futures::executor::block_on(async {
//! let events = Pagination::from_fn(fetch_events, PaginationOptions::default());
//!
//! events.refresh().await;
//! assert_eq!(events.state().items.len(), 1);
//!
//! // No more pages, so nothing is fetched.
//! assert_eq!(events.load_more().await, None);
//! # });
//! ```
//!
//! Failures never surface as `Err`. They are recorded in state and reported to
//! the configured callbacks:
//!
//! ```
//! use leptos_api_state::*;
//!
//! # futures::executor::block_on(async {
//! let profile = ApiStateController::<String>::new(
//!     ApiStateOptions::default()
//!         .set_initial_data(Some("guest".to_string()))
//!         .set_show_error_alert(false),
//! );
//!
//! let result = profile.execute(|| async { Err::<String, _>("session expired") }).await;
//!
//! assert_eq!(result, None);
//! assert_eq!(profile.state().data.as_deref(), Some("guest"));
//! assert_eq!(profile.state().error.as_deref(), Some("session expired"));
//! # });
//! ```

mod alert;
mod api_state;
mod api_state_controller;
mod error;
mod instant;
mod listeners;
mod optimistic;
mod options;
mod page_source;
mod pagination;
mod use_api_state;

pub use alert::*;
pub use api_state::*;
pub use api_state_controller::*;
pub use error::*;
pub use instant::*;
pub use listeners::ListenerKey;
pub use optimistic::*;
pub use options::*;
pub use page_source::*;
pub use pagination::*;
pub use use_api_state::*;

/// Convenience trait for the values a controller holds.
pub trait StateValue: Clone {}
impl<T> StateValue for T where T: Clone {}

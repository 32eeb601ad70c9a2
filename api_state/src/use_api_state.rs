use std::future::Future;

use leptos::*;

use crate::{
    listeners::ListenerKey, ApiState, ApiStateController, ApiStateOptions, OptimisticOptions,
    OptimisticState, OptimisticUpdate, Page, Pagination, PaginationOptions, PaginationState,
    RequestError,
};

/// Reactive view of an [`ApiStateController`].
#[derive(Clone)]
pub struct UseApiState<T: 'static> {
    /// The full state.
    pub state: Signal<ApiState<T>>,
    /// Last committed result, or the seed value.
    pub data: Signal<Option<T>>,
    /// Message of the most recent failure.
    pub error: Signal<Option<String>>,
    /// True while an `execute` cycle is outstanding.
    pub is_loading: Signal<bool>,
    /// True while a `refresh` cycle is outstanding.
    pub is_refreshing: Signal<bool>,
    /// The controller behind the signals.
    pub controller: ApiStateController<T>,
}

/// Creates an [`ApiStateController`] whose state is mirrored into signals
/// for as long as the current scope lives.
///
/// Example
/// ```
/// use leptos::*;
/// use leptos_api_state::*;
///
/// #[derive(Debug, Clone)]
/// struct Garage {
///     cars: Vec<String>,
/// }
///
/// async fn fetch_garage() -> Result<Garage, RequestError> {
///     todo!()
/// }
///
/// // Cars in the user's garage, fetched once the view is created.
/// fn garage_cars() -> Signal<Option<Garage>> {
///     let garage = use_api_state(ApiStateOptions::default().set_error_title("Garage"));
///     garage.spawn_execute(fetch_garage);
///     garage.data
/// }
/// ```
pub fn use_api_state<T>(options: ApiStateOptions<T>) -> UseApiState<T>
where
    T: crate::StateValue + 'static,
{
    let controller = ApiStateController::new(options);

    let state = mirror_state(
        controller.state(),
        |signal| controller.subscribe(move |state| signal.set(state.clone())),
        {
            let controller = controller.clone();
            move |key| controller.unsubscribe(key)
        },
    );

    UseApiState {
        state: state.into(),
        data: Signal::derive(move || state.with(|state| state.data.clone())),
        error: Signal::derive(move || state.with(|state| state.error.clone())),
        is_loading: Signal::derive(move || state.with(|state| state.is_loading())),
        is_refreshing: Signal::derive(move || state.with(|state| state.is_refreshing())),
        controller,
    }
}

impl<T> UseApiState<T>
where
    T: crate::StateValue + 'static,
{
    /// Runs [`ApiStateController::execute`] on the local executor.
    pub fn spawn_execute<F, Fu, E>(&self, producer: F)
    where
        F: FnOnce() -> Fu,
        Fu: Future<Output = Result<T, E>> + 'static,
        E: Into<RequestError> + 'static,
    {
        let execution = self.controller.execute(producer);
        spawn_local(async move {
            execution.await;
        });
    }

    /// Runs [`ApiStateController::refresh`] on the local executor.
    pub fn spawn_refresh<F, Fu, E>(&self, producer: F)
    where
        F: FnOnce() -> Fu,
        Fu: Future<Output = Result<T, E>> + 'static,
        E: Into<RequestError> + 'static,
    {
        let refresh = self.controller.refresh(producer);
        spawn_local(async move {
            refresh.await;
        });
    }
}

/// Reactive view of an [`OptimisticUpdate`].
#[derive(Clone)]
pub struct UseOptimisticUpdate<T: 'static> {
    /// The full state.
    pub state: Signal<OptimisticState<T>>,
    /// The displayed value, speculative or confirmed.
    pub data: Signal<T>,
    /// Whether a speculative value is displayed.
    pub is_optimistic: Signal<bool>,
    /// The controller behind the signals.
    pub update: OptimisticUpdate<T>,
}

/// Creates an [`OptimisticUpdate`] mirrored into signals.
pub fn use_optimistic_update<T>(
    current: T,
    update_fn: impl Fn(&T) -> T + 'static,
    options: OptimisticOptions<T>,
) -> UseOptimisticUpdate<T>
where
    T: crate::StateValue + 'static,
{
    let update = OptimisticUpdate::new(current, update_fn, options);

    let state = mirror_state(
        update.state(),
        |signal| update.subscribe(move |state| signal.set(state.clone())),
        {
            let update = update.clone();
            move |key| update.unsubscribe(key)
        },
    );

    UseOptimisticUpdate {
        state: state.into(),
        data: Signal::derive(move || state.with(|state| state.data.clone())),
        is_optimistic: Signal::derive(move || state.with(|state| state.is_optimistic)),
        update,
    }
}

impl<T> UseOptimisticUpdate<T>
where
    T: crate::StateValue + 'static,
{
    /// Runs [`OptimisticUpdate::execute_optimistic`] on the local executor.
    pub fn spawn_execute<F, Fu, E>(&self, producer: F)
    where
        F: FnOnce() -> Fu,
        Fu: Future<Output = Result<T, E>> + 'static,
        E: Into<RequestError> + 'static,
    {
        let execution = self.update.execute_optimistic(producer);
        spawn_local(async move {
            execution.await;
        });
    }
}

/// Reactive view of a [`Pagination`] controller.
#[derive(Clone)]
pub struct UsePagination<T: 'static> {
    /// The full state.
    pub state: Signal<PaginationState<T>>,
    /// Accumulated items.
    pub items: Signal<Vec<T>>,
    /// Whether a page after the last loaded one exists.
    pub has_more: Signal<bool>,
    /// Backend-reported number of items.
    pub total: Signal<u64>,
    /// Message of the most recent failed load.
    pub error: Signal<Option<String>>,
    /// True while the first page loads outside a refresh.
    pub is_loading: Signal<bool>,
    /// True while a refresh is outstanding.
    pub is_refreshing: Signal<bool>,
    /// True while a later page loads.
    pub is_loading_more: Signal<bool>,
    /// The controller behind the signals.
    pub pagination: Pagination<T>,
}

/// Creates a [`Pagination`] controller over `fetch`, mirrored into signals.
pub fn use_pagination<T, F, Fu, E>(fetch: F, options: PaginationOptions) -> UsePagination<T>
where
    T: crate::StateValue + 'static,
    F: Fn(u32, u32) -> Fu + 'static,
    Fu: Future<Output = Result<Page<T>, E>> + 'static,
    E: Into<RequestError> + 'static,
{
    let pagination = Pagination::from_fn(fetch, options);

    let state = mirror_state(
        pagination.state(),
        |signal| pagination.subscribe(move |state| signal.set(state.clone())),
        {
            let pagination = pagination.clone();
            move |key| pagination.unsubscribe(key)
        },
    );

    UsePagination {
        state: state.into(),
        items: Signal::derive(move || state.with(|state| state.items.clone())),
        has_more: Signal::derive(move || state.with(|state| state.has_more)),
        total: Signal::derive(move || state.with(|state| state.total)),
        error: Signal::derive(move || state.with(|state| state.error.clone())),
        is_loading: Signal::derive(move || state.with(|state| state.is_loading())),
        is_refreshing: Signal::derive(move || state.with(|state| state.is_refreshing())),
        is_loading_more: Signal::derive(move || state.with(|state| state.is_loading_more())),
        pagination,
    }
}

impl<T> UsePagination<T>
where
    T: crate::StateValue + 'static,
{
    /// Runs [`Pagination::refresh`] on the local executor.
    pub fn spawn_refresh(&self) {
        let refresh = self.pagination.refresh();
        spawn_local(async move {
            refresh.await;
        });
    }

    /// Runs [`Pagination::load_more`] on the local executor.
    pub fn spawn_load_more(&self) {
        let load_more = self.pagination.load_more();
        spawn_local(async move {
            load_more.await;
        });
    }
}

// Keeps a signal in sync with a controller until the scope is cleaned up.
fn mirror_state<S>(
    initial: S,
    subscribe: impl FnOnce(RwSignal<S>) -> ListenerKey,
    unsubscribe: impl FnOnce(ListenerKey) -> bool + 'static,
) -> RwSignal<S>
where
    S: Clone + 'static,
{
    let signal = RwSignal::new(initial);
    let listener = subscribe(signal);

    on_cleanup(move || {
        if !unsubscribe(listener) {
            logging::debug_warn!("Failed to remove listener.");
        }
    });

    signal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_state_signals_follow_controller() {
        let _ = create_runtime();

        let UseApiState {
            data,
            error,
            is_loading,
            controller,
            ..
        } = use_api_state(
            ApiStateOptions::default()
                .set_initial_data(Some(1_u32))
                .set_show_error_alert(false),
        );

        assert_eq!(data.get_untracked(), Some(1));
        assert!(!is_loading.get_untracked());

        controller.set_data(2);
        controller.set_error(Some("flat tire".to_string()));

        assert_eq!(data.get_untracked(), Some(2));
        assert_eq!(error.get_untracked().as_deref(), Some("flat tire"));

        let _pending = controller.execute(|| async { Ok::<_, RequestError>(3) });
        assert!(is_loading.get_untracked());
        assert_eq!(error.get_untracked(), None);
    }

    #[tokio::test]
    async fn optimistic_signals_follow_update() {
        let _ = create_runtime();

        let UseOptimisticUpdate {
            data,
            is_optimistic,
            update,
            ..
        } = use_optimistic_update(10_u32, |count| count + 1, OptimisticOptions::default());

        let pending = update.execute_optimistic(|| async { Err::<u32, _>("offline") });
        assert_eq!(data.get_untracked(), 11);
        assert!(is_optimistic.get_untracked());

        pending.await;
        assert_eq!(data.get_untracked(), 10);
        assert!(!is_optimistic.get_untracked());
    }

    #[tokio::test]
    async fn pagination_signals_follow_controller() {
        let _ = create_runtime();

        let UsePagination {
            items,
            has_more,
            is_loading_more,
            pagination,
            ..
        } = use_pagination(
            |page, limit| async move {
                Ok::<_, RequestError>(Page {
                    items: vec![page; limit as usize],
                    has_more: page < 2,
                    total: 4,
                })
            },
            PaginationOptions::default().set_page_size(2),
        );

        pagination.refresh().await;
        assert_eq!(items.get_untracked(), vec![1, 1]);

        let pending = pagination.load_more();
        assert!(is_loading_more.get_untracked());

        pending.await;
        assert_eq!(items.get_untracked(), vec![1, 1, 2, 2]);
        assert!(!has_more.get_untracked());
    }
}

use std::{cell::RefCell, future::Future, pin::pin, rc::Rc};

use futures_channel::oneshot;

use crate::{
    listeners::{ListenerKey, Listeners},
    Activity, ApiState, ApiStateOptions, Instant, RequestError, DEFAULT_ERROR_MESSAGE,
};

/// Owns the lifecycle of one asynchronous operation at a time.
///
/// Only the most recently started [`execute`](Self::execute) may commit its result.
/// Starting a new one cancels the previous one, and a superseded cycle never
/// touches state again, whether it succeeds or fails.
///
/// The controller is a cheap handle. Clones share the same state.
pub struct ApiStateController<T> {
    // State
    state: Rc<RefCell<ApiState<T>>>,

    // Cancellation
    current_request: Rc<RefCell<CurrentRequest>>,

    options: Rc<ApiStateOptions<T>>,
    listeners: Listeners<ApiState<T>>,
}

#[derive(Default)]
struct CurrentRequest {
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

impl<T> Clone for ApiStateController<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            current_request: self.current_request.clone(),
            options: self.options.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ApiStateController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiStateController")
            .field("state", &self.state.borrow())
            .field("generation", &self.current_request.borrow().generation)
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl<T> ApiStateController<T>
where
    T: crate::StateValue + 'static,
{
    /// Creates a controller seeded with `options.initial_data`.
    pub fn new(options: ApiStateOptions<T>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ApiState::seeded(options.initial_data.clone()))),
            current_request: Rc::new(RefCell::new(CurrentRequest::default())),
            options: Rc::new(options),
            listeners: Listeners::default(),
        }
    }

    /// The current state.
    pub fn state(&self) -> ApiState<T> {
        self.state.borrow().clone()
    }

    /// Reads the current state without cloning it.
    pub fn with_state<R>(&self, func: impl FnOnce(&ApiState<T>) -> R) -> R {
        func(&self.state.borrow())
    }

    /// Calls `listener` with a snapshot after every state change.
    pub fn subscribe(&self, listener: impl Fn(&ApiState<T>) + 'static) -> ListenerKey {
        self.listeners.add(listener)
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, key: ListenerKey) -> bool {
        self.listeners.remove(key)
    }

    /// Starts a new cycle and cancels the previous `execute` cycle, if any.
    ///
    /// State is marked loading before this returns. The returned future
    /// resolves to the committed result, or `None` if the producer failed or
    /// the cycle was superseded. Failures are reported through state, the
    /// alert presenter and the error callback, never returned.
    pub fn execute<F, Fu, E>(&self, producer: F) -> impl Future<Output = Option<T>> + 'static
    where
        F: FnOnce() -> Fu,
        Fu: Future<Output = Result<T, E>> + 'static,
        E: Into<RequestError> + 'static,
    {
        let (generation, cancellation) = self.new_execution();
        self.update_state(|state| {
            state.activity = Activity::Loading;
            state.error = None;
        });

        let fetch = producer();
        let controller = self.clone();
        async move {
            let fetch = pin!(fetch);
            match execute_with_cancellation(fetch, cancellation).await {
                Some(result) if controller.is_current(generation) => {
                    controller.finalize_execution(generation);
                    controller.settle(Activity::Loading, result.map_err(Into::into))
                }
                _ => {
                    log::debug!("Discarding superseded request {generation}");
                    None
                }
            }
        }
    }

    /// Same contract as [`execute`](Self::execute), but marks state as
    /// refreshing and takes no part in cancellation.
    pub fn refresh<F, Fu, E>(&self, producer: F) -> impl Future<Output = Option<T>> + 'static
    where
        F: FnOnce() -> Fu,
        Fu: Future<Output = Result<T, E>> + 'static,
        E: Into<RequestError> + 'static,
    {
        self.update_state(|state| {
            state.activity = Activity::Refreshing;
            state.error = None;
        });

        let fetch = producer();
        let controller = self.clone();
        async move {
            let result = fetch.await.map_err(Into::into);
            controller.settle(Activity::Refreshing, result)
        }
    }

    /// Cancels the outstanding `execute` cycle and restores the seed value.
    pub fn reset(&self) {
        self.cancel();
        let initial_data = self.options.initial_data.clone();
        self.update_state(|state| *state = ApiState::seeded(initial_data));
    }

    /// Overrides the data without touching the busy flags.
    pub fn set_data(&self, data: T) {
        self.update_state(|state| state.data = Some(data));
    }

    /// Overrides the error without touching the busy flags.
    pub fn set_error(&self, error: Option<String>) {
        self.update_state(|state| state.error = error);
    }

    fn settle(&self, activity: Activity, result: Result<T, RequestError>) -> Option<T> {
        match result {
            Ok(data) => {
                self.update_state(|state| {
                    state.data = Some(data.clone());
                    state.error = None;
                    state.updated_at = Some(Instant::now());
                    if state.activity == activity {
                        state.activity = Activity::Idle;
                    }
                });
                if let Some(on_success) = &self.options.on_success {
                    on_success(&data);
                }
                Some(data)
            }
            Err(RequestError::Aborted) => {
                log::debug!("Request aborted by its producer");
                None
            }
            Err(error) => {
                let message = error.message_or(DEFAULT_ERROR_MESSAGE);
                self.update_state(|state| {
                    state.error = Some(message.clone());
                    if state.activity == activity {
                        state.activity = Activity::Idle;
                    }
                });
                if self.options.show_error_alert {
                    self.options.alert.alert(&self.options.error_title, &message);
                }
                if let Some(on_error) = &self.options.on_error {
                    on_error(&error);
                }
                None
            }
        }
    }

    fn update_state(&self, update_fn: impl FnOnce(&mut ApiState<T>)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            update_fn(&mut state);
            state.clone()
        };
        self.listeners.notify(&snapshot);
    }

    /**
     * Execution and Cancellation.
     */

    // Supersedes whatever request is outstanding.
    fn new_execution(&self) -> (u64, oneshot::Receiver<()>) {
        let mut current = self.current_request.borrow_mut();
        if let Some(previous) = current.cancel.take() {
            if previous.send(()).is_err() {
                log::debug!("Request {} was already dropped", current.generation);
            }
        }
        current.generation += 1;

        let (sender, receiver) = oneshot::channel();
        current.cancel = Some(sender);
        (current.generation, receiver)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current_request.borrow().generation == generation
    }

    fn finalize_execution(&self, generation: u64) {
        let mut current = self.current_request.borrow_mut();
        if current.generation == generation {
            current.cancel = None;
        }
    }

    fn cancel(&self) -> bool {
        let mut current = self.current_request.borrow_mut();
        current.generation += 1;
        match current.cancel.take() {
            Some(request) => request.send(()).is_ok(),
            None => false,
        }
    }
}

async fn execute_with_cancellation<V, Fu>(
    fut: Fu,
    cancellation: oneshot::Receiver<()>,
) -> Option<V>
where
    Fu: Future<Output = V> + Unpin,
{
    use futures::future::Either;

    match futures::future::select(fut, cancellation).await {
        Either::Left((result, _)) => Some(result),
        Either::Right((cancelled, _)) => {
            if cancelled.is_err() {
                log::debug!("Request cancellation was dropped.");
            }
            None
        }
    }
}

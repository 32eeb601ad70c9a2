use std::{cell::RefCell, future::Future, rc::Rc};

use crate::{
    listeners::{ListenerKey, Listeners},
    OptimisticOptions, RequestError,
};

/// Snapshot of an [`OptimisticUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticState<T> {
    /// The confirmed value, or a speculative one while `is_optimistic`.
    pub data: T,
    /// True from the moment a speculative value is applied until its cycle settles.
    pub is_optimistic: bool,
}

/// Applies a speculative value before its confirming operation completes,
/// and rolls it back if the operation fails.
///
/// At most one cycle is expected in flight per instance. There is no
/// cancellation between overlapping cycles.
pub struct OptimisticUpdate<T> {
    state: Rc<RefCell<OptimisticState<T>>>,
    confirmed: Rc<RefCell<T>>,
    update_fn: Rc<dyn Fn(&T) -> T>,
    options: Rc<OptimisticOptions<T>>,
    listeners: Listeners<OptimisticState<T>>,
}

impl<T> Clone for OptimisticUpdate<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            confirmed: self.confirmed.clone(),
            update_fn: self.update_fn.clone(),
            options: self.options.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for OptimisticUpdate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticUpdate")
            .field("state", &self.state.borrow())
            .field("confirmed", &self.confirmed.borrow())
            .field("update_fn", &"...")
            .finish()
    }
}

impl<T> OptimisticUpdate<T>
where
    T: crate::StateValue + 'static,
{
    /// Creates an instance whose confirmed value is `current`.
    pub fn new(
        current: T,
        update_fn: impl Fn(&T) -> T + 'static,
        options: OptimisticOptions<T>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(OptimisticState {
                data: current.clone(),
                is_optimistic: false,
            })),
            confirmed: Rc::new(RefCell::new(current)),
            update_fn: Rc::new(update_fn),
            options: Rc::new(options),
            listeners: Listeners::default(),
        }
    }

    /// The current state.
    pub fn state(&self) -> OptimisticState<T> {
        self.state.borrow().clone()
    }

    /// The displayed value, speculative or confirmed.
    pub fn data(&self) -> T {
        self.state.borrow().data.clone()
    }

    /// Whether a speculative value is displayed.
    pub fn is_optimistic(&self) -> bool {
        self.state.borrow().is_optimistic
    }

    /// Calls `listener` with a snapshot after every state change.
    pub fn subscribe(&self, listener: impl Fn(&OptimisticState<T>) + 'static) -> ListenerKey {
        self.listeners.add(listener)
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, key: ListenerKey) -> bool {
        self.listeners.remove(key)
    }

    /// Replaces the confirmed value the next cycle starts from.
    /// The displayed value follows unless a cycle is in flight.
    pub fn set_confirmed(&self, value: T) {
        *self.confirmed.borrow_mut() = value.clone();
        if !self.is_optimistic() {
            self.update_state(|state| state.data = value);
        }
    }

    /// Applies the configured update function, then confirms or rolls back
    /// with the producer's outcome.
    ///
    /// The speculative value is visible before this returns.
    pub fn execute_optimistic<F, Fu, E>(
        &self,
        producer: F,
    ) -> impl Future<Output = Option<T>> + 'static
    where
        F: FnOnce() -> Fu,
        Fu: Future<Output = Result<T, E>> + 'static,
        E: Into<RequestError> + 'static,
    {
        let update_fn = self.update_fn.clone();
        self.execute_optimistic_with(producer, move |data| update_fn(data))
    }

    /// Like [`execute_optimistic`](Self::execute_optimistic), with a one-off update function.
    pub fn execute_optimistic_with<F, Fu, E>(
        &self,
        producer: F,
        update: impl FnOnce(&T) -> T,
    ) -> impl Future<Output = Option<T>> + 'static
    where
        F: FnOnce() -> Fu,
        Fu: Future<Output = Result<T, E>> + 'static,
        E: Into<RequestError> + 'static,
    {
        let original = self.confirmed.borrow().clone();
        let speculative = update(&original);
        self.update_state(|state| {
            state.data = speculative;
            state.is_optimistic = true;
        });

        let fetch = producer();
        let this = self.clone();
        async move {
            match fetch.await.map_err(Into::into) {
                Ok(data) => {
                    *this.confirmed.borrow_mut() = data.clone();
                    this.update_state(|state| {
                        state.data = data.clone();
                        state.is_optimistic = false;
                    });
                    if let Some(on_success) = &this.options.on_success {
                        on_success(&data);
                    }
                    Some(data)
                }
                Err(error) => {
                    log::debug!("Rolling back optimistic update: {error}");
                    this.update_state(|state| {
                        state.data = original.clone();
                        state.is_optimistic = false;
                    });
                    if let Some(on_error) = &this.options.on_error {
                        on_error(&error, &original);
                    }
                    None
                }
            }
        }
    }

    fn update_state(&self, update_fn: impl FnOnce(&mut OptimisticState<T>)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            update_fn(&mut state);
            state.clone()
        };
        self.listeners.notify(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_channel::oneshot;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Like {
        liked: bool,
        count: u32,
    }

    fn toggle(like: &Like) -> Like {
        Like {
            liked: !like.liked,
            count: if like.liked { like.count - 1 } else { like.count + 1 },
        }
    }

    fn unliked() -> Like {
        Like {
            liked: false,
            count: 3,
        }
    }

    #[tokio::test]
    async fn speculative_value_is_applied_immediately() {
        let update = OptimisticUpdate::new(unliked(), toggle, OptimisticOptions::default());
        let (gate, receiver) = oneshot::channel::<Result<Like, RequestError>>();

        let pending = update.execute_optimistic(move || async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(RequestError::failed("gate dropped")))
        });

        assert!(update.is_optimistic());
        assert_eq!(update.data(), toggle(&unliked()));

        let confirmed = Like {
            liked: true,
            count: 10,
        };
        gate.send(Ok(confirmed.clone())).unwrap();

        assert_eq!(pending.await, Some(confirmed.clone()));
        assert_eq!(
            update.state(),
            OptimisticState {
                data: confirmed,
                is_optimistic: false
            }
        );
    }

    #[tokio::test]
    async fn failure_rolls_back_to_confirmed_value() {
        let rollbacks: Rc<RefCell<Vec<(String, Like)>>> = Rc::default();
        let options = OptimisticOptions::default().set_on_error({
            let rollbacks = rollbacks.clone();
            move |error: &RequestError, original: &Like| {
                rollbacks
                    .borrow_mut()
                    .push((error.to_string(), original.clone()))
            }
        });
        let update = OptimisticUpdate::new(unliked(), toggle, options);

        let result = update
            .execute_optimistic(|| async { Err::<Like, _>("like failed") })
            .await;

        assert_eq!(result, None);
        assert_eq!(update.data(), unliked());
        assert!(!update.is_optimistic());
        assert_eq!(
            rollbacks.borrow().as_slice(),
            &[("like failed".to_string(), unliked())]
        );
    }

    #[tokio::test]
    async fn one_off_update_overrides_configured_one() {
        let update = OptimisticUpdate::new(unliked(), toggle, OptimisticOptions::default());

        let pending = update.execute_optimistic_with(
            || async { Err::<Like, _>(RequestError::unknown()) },
            |like| Like {
                count: like.count + 100,
                ..like.clone()
            },
        );
        assert_eq!(update.data().count, 103);

        assert_eq!(pending.await, None);
        assert_eq!(update.data(), unliked());
    }

    #[tokio::test]
    async fn cycles_start_from_the_last_confirmed_value() {
        let successes: Rc<RefCell<Vec<Like>>> = Rc::default();
        let options = OptimisticOptions::default().set_on_success({
            let successes = successes.clone();
            move |like: &Like| successes.borrow_mut().push(like.clone())
        });
        let update = OptimisticUpdate::new(unliked(), toggle, options);

        let liked = toggle(&unliked());
        let confirmed = liked.clone();
        update
            .execute_optimistic(move || async move { Ok::<_, RequestError>(confirmed) })
            .await;

        let result = update
            .execute_optimistic(|| async { Err::<Like, _>("unlike failed") })
            .await;

        assert_eq!(result, None);
        assert_eq!(update.data(), liked, "rollback restores the confirmed value");
        assert_eq!(successes.borrow().len(), 1);
    }

    #[test]
    fn set_confirmed_updates_idle_display() {
        let update = OptimisticUpdate::new(unliked(), toggle, OptimisticOptions::default());
        let seen: Rc<RefCell<Vec<OptimisticState<Like>>>> = Rc::default();
        update.subscribe({
            let seen = seen.clone();
            move |state: &OptimisticState<Like>| seen.borrow_mut().push(state.clone())
        });

        let server = Like {
            liked: true,
            count: 42,
        };
        update.set_confirmed(server.clone());

        assert_eq!(update.data(), server);
        assert_eq!(seen.borrow().len(), 1);
    }
}

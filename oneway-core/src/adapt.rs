//! Store projection: narrow a store to the state and actions a view needs
//!
//! [`AnyViewStore`] hides the backing store's concrete types behind
//! closures. All mutation and notification still happens in the backing
//! store; the projection only maps values on the way in and out.

use std::fmt;
use std::sync::Arc;

use tracing::Level;

use crate::definition::StoreDefinition;
use crate::store::Store;

type StateFn<S> = dyn Fn() -> S + Send + Sync;
type ObserveFn<S> = dyn Fn(Box<dyn FnMut(&S) + Send>) + Send + Sync;
type DispatchFn<A> = dyn Fn(A) + Send + Sync;

/// Read-only, type-erased view of a store.
///
/// A view store made from a [`Store`] does not keep it alive. Once the
/// store is torn down, reads return its last state and dispatches are
/// dropped.
pub struct AnyViewStore<S, A> {
    state: Arc<StateFn<S>>,
    observe: Arc<ObserveFn<S>>,
    dispatch: Arc<DispatchFn<A>>,
}

impl<S, A> Clone for AnyViewStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            observe: Arc::clone(&self.observe),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<S, A> fmt::Debug for AnyViewStore<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyViewStore").finish_non_exhaustive()
    }
}

impl<S: 'static, A: 'static> AnyViewStore<S, A> {
    /// Build a view store from its three operations.
    ///
    /// Useful for views backed by something other than a [`Store`], e.g. a
    /// fixed state in tests.
    pub fn from_parts(
        state: impl Fn() -> S + Send + Sync + 'static,
        observe: impl Fn(Box<dyn FnMut(&S) + Send>) + Send + Sync + 'static,
        dispatch: impl Fn(A) + Send + Sync + 'static,
    ) -> Self {
        Self {
            state: Arc::new(state),
            observe: Arc::new(observe),
            dispatch: Arc::new(dispatch),
        }
    }

    /// The projected current state
    pub fn state(&self) -> S {
        (self.state)()
    }

    /// Observe projected states, with the same delivery rules as
    /// [`Store::observe_state`].
    pub fn observe_state(&self, observer: impl FnMut(&S) + Send + 'static) {
        (self.observe)(Box::new(observer))
    }

    /// Forward an action to the backing store
    pub fn dispatch_action(&self, action: A) {
        (self.dispatch)(action)
    }

    /// Project this view further.
    ///
    /// `action_map` returning `None` drops the action.
    pub fn adapt_to<VS, VA>(
        &self,
        state_map: impl Fn(&S) -> VS + Send + Sync + 'static,
        action_map: impl Fn(VA) -> Option<A> + Send + Sync + 'static,
    ) -> AnyViewStore<VS, VA>
    where
        VS: 'static,
        VA: fmt::Debug + 'static,
    {
        let state_map = Arc::new(state_map);

        let state = {
            let read = Arc::clone(&self.state);
            let state_map = Arc::clone(&state_map);
            move || state_map(&read())
        };

        let observe = {
            let observe = Arc::clone(&self.observe);
            move |mut observer: Box<dyn FnMut(&VS) + Send>| {
                let state_map = Arc::clone(&state_map);
                observe(Box::new(move |state: &S| observer(&state_map(state))))
            }
        };

        let dispatch = {
            let dispatch = Arc::clone(&self.dispatch);
            move |action: VA| {
                let name = tracing::enabled!(Level::TRACE).then(|| format!("{action:?}"));
                match action_map(action) {
                    Some(mapped) => dispatch(mapped),
                    None => tracing::trace!(
                        action = name.as_deref().unwrap_or_default(),
                        "View action has no mapping, dropped"
                    ),
                }
            }
        };

        AnyViewStore::from_parts(state, observe, dispatch)
    }

    /// Project only the state, passing actions through unchanged
    pub fn map_state<VS: 'static>(
        &self,
        state_map: impl Fn(&S) -> VS + Send + Sync + 'static,
    ) -> AnyViewStore<VS, A> {
        let state_map = Arc::new(state_map);

        let state = {
            let read = Arc::clone(&self.state);
            let state_map = Arc::clone(&state_map);
            move || state_map(&read())
        };

        let observe = {
            let observe = Arc::clone(&self.observe);
            move |mut observer: Box<dyn FnMut(&VS) + Send>| {
                let state_map = Arc::clone(&state_map);
                observe(Box::new(move |state: &S| observer(&state_map(state))))
            }
        };

        AnyViewStore {
            state: Arc::new(state),
            observe: Arc::new(observe),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<D: StoreDefinition> Store<D> {
    /// The store itself as a view store
    pub fn as_view_store(&self) -> AnyViewStore<D::State, D::Action> {
        let read = self.state_reader();
        let observer = self.downgrade();
        let dispatcher = self.downgrade();
        let label = self.label().to_owned();
        AnyViewStore::from_parts(
            move || D::State::clone(&read()),
            move |callback| match observer.upgrade() {
                Some(store) => store.observe_state(callback),
                None => tracing::trace!("Store torn down, observer not registered"),
            },
            move |action| match dispatcher.upgrade() {
                Some(store) => store.dispatch_action(action),
                None => tracing::debug!(store = %label, "Store torn down, view action dropped"),
            },
        )
    }

    /// Project the store to the state and actions of one view.
    ///
    /// ```ignore
    /// let header = store.adapt_to(
    ///     |state: &LotteryState| state.coins,
    ///     |action: HeaderAction| match action {
    ///         HeaderAction::Play => Some(LotteryAction::Play),
    ///         HeaderAction::Hover => None,
    ///     },
    /// );
    /// ```
    pub fn adapt_to<VS, VA>(
        &self,
        state_map: impl Fn(&D::State) -> VS + Send + Sync + 'static,
        action_map: impl Fn(VA) -> Option<D::Action> + Send + Sync + 'static,
    ) -> AnyViewStore<VS, VA>
    where
        VS: 'static,
        VA: fmt::Debug + 'static,
    {
        self.as_view_store().adapt_to(state_map, action_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Change, Never};
    use crate::delivery::DeliveryContext;
    use crate::reduction::Reduction;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Profile {
        name: String,
        visits: u32,
    }

    #[derive(Debug)]
    enum ProfileAction {
        Visit,
    }

    impl Action for ProfileAction {
        fn name(&self) -> &'static str {
            "Visit"
        }
    }

    #[derive(Debug)]
    enum ProfileChange {
        Rename(String),
    }

    impl Change for ProfileChange {
        fn name(&self) -> &'static str {
            "Rename"
        }
    }

    struct Profiles;

    impl StoreDefinition for Profiles {
        type State = Profile;
        type Action = ProfileAction;
        type Change = ProfileChange;
        type Output = Never;
        type Effect = Never;

        fn reduce(&self, state: &mut Profile, action: ProfileAction) -> Reduction<Never, Never> {
            match action {
                ProfileAction::Visit => {
                    state.visits += 1;
                    Reduction::changed()
                }
            }
        }

        fn fold(&self, state: &mut Profile, change: ProfileChange) {
            match change {
                ProfileChange::Rename(name) => state.name = name,
            }
        }
    }

    #[derive(Debug)]
    enum BadgeAction {
        Tap,
        LongPress,
    }

    fn badge_view(store: &Store<Profiles>) -> AnyViewStore<String, BadgeAction> {
        store.adapt_to(
            |profile: &Profile| format!("{} ({})", profile.name, profile.visits),
            |action: BadgeAction| match action {
                BadgeAction::Tap => Some(ProfileAction::Visit),
                BadgeAction::LongPress => None,
            },
        )
    }

    #[tokio::test]
    async fn test_projected_state_tracks_backing_store() {
        let (delivery, _queue) = DeliveryContext::manual();
        let store = Store::builder(Profiles, Profile::default())
            .deliver_on(delivery)
            .build();
        let badge = badge_view(&store);

        store.dispatch_change(ProfileChange::Rename("ada".into()));
        assert_eq!(badge.state(), "ada (0)");
    }

    #[tokio::test]
    async fn test_projected_actions_are_mapped_or_dropped() {
        let (delivery, _queue) = DeliveryContext::manual();
        let store = Store::builder(Profiles, Profile::default())
            .deliver_on(delivery)
            .build();
        let badge = badge_view(&store);

        badge.dispatch_action(BadgeAction::Tap);
        badge.dispatch_action(BadgeAction::LongPress);
        badge.dispatch_action(BadgeAction::Tap);
        store.flush().await.unwrap();

        assert_eq!(store.state().visits, 2);
    }

    #[tokio::test]
    async fn test_projected_observer_receives_mapped_states() {
        let (delivery, mut queue) = DeliveryContext::manual();
        let store = Store::builder(Profiles, Profile::default())
            .deliver_on(delivery)
            .build();
        let badge = badge_view(&store);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            badge.observe_state(move |label: &String| seen.lock().push(label.clone()));
        }

        store.dispatch_change(ProfileChange::Rename("bo".into()));
        queue.drain();

        assert_eq!(*seen.lock(), vec![" (0)".to_string(), "bo (0)".to_string()]);
    }

    #[tokio::test]
    async fn test_projections_chain() {
        let (delivery, _queue) = DeliveryContext::manual();
        let store = Store::builder(Profiles, Profile::default())
            .deliver_on(delivery)
            .build();
        let length = badge_view(&store)
            .map_state(|label: &String| label.len())
            .adapt_to(|len: &usize| *len * 2, |_: ()| Some(BadgeAction::Tap));

        length.dispatch_action(());
        store.flush().await.unwrap();

        assert_eq!(store.state().visits, 1);
        assert_eq!(length.state(), " (1)".len() * 2);
    }

    #[tokio::test]
    async fn test_view_store_does_not_keep_store_alive() {
        let (delivery, _queue) = DeliveryContext::manual();
        let store = Store::builder(Profiles, Profile::default())
            .deliver_on(delivery)
            .build();
        let badge = badge_view(&store);
        let sender = store.sender();

        store.dispatch_change(ProfileChange::Rename("cy".into()));
        drop(store);

        assert!(sender.is_closed());
        assert_eq!(badge.state(), "cy (0)");
        badge.dispatch_action(BadgeAction::Tap);
        assert_eq!(badge.state(), "cy (0)");
    }

    static FORMATTED: AtomicUsize = AtomicUsize::new(0);

    /// Counts how often it is formatted with `{:?}`
    struct Counted;

    impl fmt::Debug for Counted {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            FORMATTED.fetch_add(1, Ordering::SeqCst);
            f.write_str("Counted")
        }
    }

    #[tokio::test]
    async fn test_mapped_actions_are_not_formatted() {
        let (delivery, _queue) = DeliveryContext::manual();
        let store = Store::builder(Profiles, Profile::default())
            .deliver_on(delivery)
            .build();
        let view = store.adapt_to(|p: &Profile| p.visits, |_: Counted| Some(ProfileAction::Visit));

        view.dispatch_action(Counted);
        view.dispatch_action(Counted);
        store.flush().await.unwrap();

        assert_eq!(store.state().visits, 2);
        assert_eq!(FORMATTED.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_parts_fixed_state() {
        let dispatched = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&dispatched);
        let view: AnyViewStore<u8, &'static str> = AnyViewStore::from_parts(
            || 7,
            |mut observer| observer(&7),
            move |action| sink.lock().push(action),
        );

        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            view.observe_state(move |value| *seen.lock() = Some(*value));
        }
        view.dispatch_action("ping");

        assert_eq!(view.state(), 7);
        assert_eq!(*seen.lock(), Some(7));
        assert_eq!(*dispatched.lock(), vec!["ping"]);
    }
}

//! Views that render store snapshots

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::adapt::AnyViewStore;

/// A UI element that renders a state snapshot
///
/// `render` should be a pure function of the state plus whatever internal
/// UI state (scroll position, selection highlight) the view keeps in
/// `&mut self`. Data mutations go through actions on the view store.
///
/// # Example
///
/// ```ignore
/// struct CoinsLabel {
///     text: String,
/// }
///
/// impl View for CoinsLabel {
///     type State = u64;
///
///     fn render(&mut self, coins: &u64) {
///         self.text = format!("Coins: {coins}");
///     }
/// }
/// ```
pub trait View: Send + 'static {
    /// The projected state this view renders
    type State;

    /// Bring the view up to date with `state`
    fn render(&mut self, state: &Self::State);
}

/// Render every state of `store` into `view`, starting with the current one.
///
/// Only a weak reference to the view is held, so the binding never keeps
/// the view alive. Once the view is dropped, further states are skipped.
pub fn bind<V, A>(view: &Arc<Mutex<V>>, store: &AnyViewStore<V::State, A>)
where
    V: View,
    V::State: 'static,
    A: 'static,
{
    let weak: Weak<Mutex<V>> = Arc::downgrade(view);
    store.observe_state(move |state| {
        if let Some(view) = weak.upgrade() {
            view.lock().render(state);
        }
    });
}

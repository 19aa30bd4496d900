//! Process and flow coordination
//!
//! A [`Process`] is a one-shot controller that owns an entity (usually a
//! [`PresentationContext`]), composes stores, and announces what happened
//! through its own output stream. It holds no store state of its own and
//! adds no concurrency beyond output observation.
//!
//! Two launch shapes are distinguished by marker traits:
//!
//! - [`Flow`]: fire-and-forget, `start(())` drives the context itself.
//! - [`RootFlow`]: `start(())` returns a root the caller presents, see
//!   [`present_root`] and [`push_root`].

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::action::Output;
use crate::delivery::{DeliveryContext, Fanout};

/// The host toolkit's presentation capability.
///
/// `present` shows content modally. `push_or_present` pushes onto the
/// current navigation stack when there is one, and otherwise presents a new
/// stack rooted at `content`. Both are synchronous.
pub trait PresentationContext: Send + Sync + 'static {
    /// What can be shown (a screen, a view controller, a widget tree)
    type Content;
    /// Handle to the navigation stack the content ended up on
    type Navigation;

    fn present(&self, content: Self::Content);

    fn push_or_present(&self, content: Self::Content) -> Self::Navigation;
}

/// Output fan-out for processes, with the same rules as store outputs.
///
/// Outputs are delivered on the delivery context, in emission order, to the
/// observers registered before the emission.
pub struct OutputHub<O: Output> {
    fanout: Arc<Fanout<O>>,
}

impl<O: Output> Clone for OutputHub<O> {
    fn clone(&self) -> Self {
        Self {
            fanout: Arc::clone(&self.fanout),
        }
    }
}

impl<O: Output> fmt::Debug for OutputHub<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputHub").finish_non_exhaustive()
    }
}

impl<O: Output> OutputHub<O> {
    pub fn new(delivery: &DeliveryContext) -> Self {
        Self {
            fanout: Arc::new(Fanout::new(delivery.clone(), CancellationToken::new())),
        }
    }

    /// Observe outputs emitted after this call
    pub fn observe_output(&self, observer: impl FnMut(&O) + Send + 'static) {
        self.fanout.subscribe(Box::new(observer), None::<O>);
    }

    /// Emit an output to current observers
    pub fn emit(&self, output: O) {
        tracing::trace!(output = output.name(), "Process output");
        self.fanout.publish(output);
    }
}

/// A one-shot coordinator keyed by an owned entity.
pub trait Process: Send + Sync + 'static {
    /// The capability the process drives, typically a presentation context
    type Entity;
    /// Argument to [`start`](Process::start)
    type LaunchArg;
    /// What [`start`](Process::start) hands back
    type LaunchReturn;
    /// Events announced to whoever launched the process
    type Output: Output;

    fn entity(&self) -> &Self::Entity;

    fn start(&self, arg: Self::LaunchArg) -> Self::LaunchReturn;

    fn outputs(&self) -> &OutputHub<Self::Output>;

    /// Observe this process's outputs emitted after this call
    fn observe_output(&self, observer: impl FnMut(&Self::Output) + Send + 'static)
    where
        Self: Sized,
    {
        self.outputs().observe_output(observer);
    }
}

/// A process started for its side effects on its entity
pub trait Flow: Process<LaunchArg = (), LaunchReturn = ()> {}

impl<P> Flow for P where P: Process<LaunchArg = (), LaunchReturn = ()> {}

/// A process whose start produces root content for a context of type `C`
pub trait RootFlow<C: PresentationContext>:
    Process<LaunchArg = (), LaunchReturn = C::Content>
{
}

impl<C, P> RootFlow<C> for P
where
    C: PresentationContext,
    P: Process<LaunchArg = (), LaunchReturn = C::Content>,
{
}

/// Start `flow` and present its root modally on `context`
pub fn present_root<C, F>(flow: &F, context: &C)
where
    C: PresentationContext,
    F: RootFlow<C>,
{
    context.present(flow.start(()));
}

/// Start `flow` and push its root onto `context`
pub fn push_root<C, F>(flow: &F, context: &C) -> C::Navigation
where
    C: PresentationContext,
    F: RootFlow<C>,
{
    context.push_or_present(flow.start(()))
}

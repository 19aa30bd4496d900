//! Lottery flow - pushes the lottery screen and reacts to lost rounds

use std::sync::atomic::{AtomicBool, Ordering};

use oneway::{AnyViewStore, DeliveryContext, OutputHub, PresentationContext, Process, Store};

use crate::action::LotteryOutput;
use crate::reducer::Lottery;
use crate::ui::{Alert, LotteryView, LotteryViewAction};

/// Content the lottery flow can put on screen
#[derive(Clone, Debug)]
pub enum Screen {
    Lottery(AnyViewStore<LotteryView, LotteryViewAction>),
    Alert(Alert),
}

#[derive(oneway::Output, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LotteryFlowOutput {
    /// The player lost a round and was shown the alert
    Lost,
}

/// Fire-and-forget flow over any context that can show [`Screen`]s.
///
/// Starts once; later calls to `start` are ignored.
pub struct LotteryFlow<C> {
    context: C,
    store: Store<Lottery>,
    outputs: OutputHub<LotteryFlowOutput>,
    started: AtomicBool,
}

impl<C> LotteryFlow<C>
where
    C: PresentationContext<Content = Screen> + Clone,
{
    pub fn new(context: C, store: Store<Lottery>, delivery: &DeliveryContext) -> Self {
        Self {
            context,
            store,
            outputs: OutputHub::new(delivery),
            started: AtomicBool::new(false),
        }
    }

    /// The projection the lottery screen is driven by
    pub fn view_store(&self) -> AnyViewStore<LotteryView, LotteryViewAction> {
        self.store.adapt_to(LotteryView::project, LotteryViewAction::into_store_action)
    }
}

impl<C> Process for LotteryFlow<C>
where
    C: PresentationContext<Content = Screen> + Clone,
{
    type Entity = C;
    type LaunchArg = ();
    type LaunchReturn = ();
    type Output = LotteryFlowOutput;

    fn entity(&self) -> &C {
        &self.context
    }

    fn start(&self, _: ()) {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!(store = %self.store.label(), "Lottery flow already started");
            return;
        }
        let _ = self.context.push_or_present(Screen::Lottery(self.view_store()));

        let context = self.context.clone();
        let outputs = self.outputs.clone();
        self.store.observe_output(move |output| match output {
            LotteryOutput::DidLose => {
                context.present(Screen::Alert(Alert::lost()));
                outputs.emit(LotteryFlowOutput::Lost);
            }
        });
        tracing::debug!(store = %self.store.label(), "Lottery flow started");
    }

    fn outputs(&self) -> &OutputHub<LotteryFlowOutput> {
        &self.outputs
    }
}

//! Caller hooks invoked on submission and close.

use crate::models::WizardMode;

/// Receives the outcome of a wizard.
pub trait WizardCallbacks<E> {
    /// Called exactly once per successful submission.
    fn on_success(&mut self, entity: E, mode: WizardMode);

    /// Called when the user cancels the wizard.
    fn on_close(&mut self);
}

/// Adapts a pair of closures to [`WizardCallbacks`].
pub struct FnCallbacks<S, C> {
    on_success: S,
    on_close: C,
}

impl<S, C> FnCallbacks<S, C> {
    pub fn new(on_success: S, on_close: C) -> Self {
        Self {
            on_success,
            on_close,
        }
    }
}

impl<E, S, C> WizardCallbacks<E> for FnCallbacks<S, C>
where
    S: FnMut(E, WizardMode),
    C: FnMut(),
{
    fn on_success(&mut self, entity: E, mode: WizardMode) {
        (self.on_success)(entity, mode)
    }

    fn on_close(&mut self) {
        (self.on_close)()
    }
}

/// Records every callback; the FFI handles read submissions back from it.
#[derive(Debug, Clone)]
pub struct CapturedCallbacks<E> {
    pub submissions: Vec<(E, WizardMode)>,
    pub closed: usize,
}

impl<E> Default for CapturedCallbacks<E> {
    fn default() -> Self {
        Self {
            submissions: Vec::new(),
            closed: 0,
        }
    }
}

impl<E> CapturedCallbacks<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&E> {
        self.submissions.last().map(|(entity, _)| entity)
    }
}

impl<E> WizardCallbacks<E> for CapturedCallbacks<E> {
    fn on_success(&mut self, entity: E, mode: WizardMode) {
        self.submissions.push((entity, mode));
    }

    fn on_close(&mut self) {
        self.closed += 1;
    }
}

//! Thread-local registry of timer states.

use std::cell::RefCell;

use crate::TimerState;

thread_local! {
    static TIMER_STATE: RefCell<TimerState> = RefCell::new(TimerState::default());
}

/// Runs `f` with the current thread's [`TimerState`].
///
/// The state is created on first access and lives as long as the thread. Each thread has its
/// own, so sessions on different threads never observe each other's data.
///
/// # Panics
///
/// Panics if called from within `f` itself, as the state is exclusively borrowed for the
/// duration of `f`. Instrumented calls never hold this borrow while running user code.
///
/// Panics if called while the thread is being torn down, after its state has been destroyed.
/// Instrumented calls made at that point run untimed instead.
///
/// # Examples
///
/// ```
/// use call_timer::{SessionPhase, with_timer_state};
///
/// let phase = with_timer_state(|state| state.phase());
/// assert_eq!(phase, SessionPhase::Uninitialized);
/// ```
pub fn with_timer_state<R>(f: impl FnOnce(&mut TimerState) -> R) -> R {
    TIMER_STATE.with_borrow_mut(f)
}

/// Like [`with_timer_state()`] but returns `None` instead of panicking once the thread's state
/// has been destroyed, i.e. when called from another thread-local destructor.
pub(crate) fn try_with_timer_state<R>(f: impl FnOnce(&mut TimerState) -> R) -> Option<R> {
    TIMER_STATE
        .try_with(|state| f(&mut state.borrow_mut()))
        .ok()
}

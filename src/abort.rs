use std::any::Any;
use std::panic;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::did::Did;
use crate::fault::Fault;

static NEXT_INVOCATION: AtomicU64 = AtomicU64::new(1);

/// Identifies one run of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Invocation(u64);

impl Invocation {
    pub(crate) fn next() -> Self {
        Invocation(NEXT_INVOCATION.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared "still running" flag of an invocation.
#[derive(Debug, Clone)]
pub(crate) struct Live(Arc<AtomicBool>);

impl Live {
    pub(crate) fn new() -> Self {
        Live(Arc::new(AtomicBool::new(true)))
    }

    pub(crate) fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Keeps the invocation live until the returned guard drops.
    pub(crate) fn scope(&self) -> Scope {
        Scope(self.clone())
    }
}

/// Held by the wrapper for as long as its unit of work may still run.
pub(crate) struct Scope(Live);

impl Drop for Scope {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::Release);
    }
}

/// Unwind payload for a deliberate abort.
/// Only lives between `raise` and the matching `intercept`.
pub(crate) struct Carrier {
    pub invocation: Invocation,
    pub value: Box<dyn Any + Send>,
    pub fault: Option<Fault>,
}

/// Unwinds to the nearest wrapper. Skips the panic hook.
pub(crate) fn raise(carrier: Carrier) -> ! {
    panic::resume_unwind(Box::new(carrier))
}

/// Turns a caught unwind into the failure outcome of `invocation`.
/// Anything that was not raised by that invocation's handle keeps unwinding.
pub(crate) fn intercept<Y, N: 'static>(
    invocation: Invocation,
    payload: Box<dyn Any + Send>,
) -> Did<Y, N> {
    let carrier = match payload.downcast::<Carrier>() {
        Ok(carrier) if carrier.invocation == invocation => carrier,
        Ok(carrier) => {
            log::debug!(
                "invocation {} passing through abort of {}",
                invocation,
                carrier.invocation
            );
            panic::resume_unwind(carrier)
        }
        Err(other) => {
            log::debug!("invocation {} hit an unexpected fault", invocation);
            panic::resume_unwind(other)
        }
    };

    let Carrier { value, fault, .. } = *carrier;
    match value.downcast::<N>() {
        Ok(n) => {
            log::debug!("invocation {} quit", invocation);
            Did::No {
                n: *n,
                exception: fault,
            }
        }
        // lifts always box an `N`, so this only fires on a crate bug
        Err(value) => raise(Carrier {
            invocation,
            value,
            fault,
        }),
    }
}

/// Resumes in-flight carriers, hands every other payload back.
pub(crate) fn passthrough(payload: Box<dyn Any + Send>) -> Box<dyn Any + Send> {
    match payload.downcast::<Carrier>() {
        Ok(carrier) => panic::resume_unwind(carrier),
        Err(other) => other,
    }
}

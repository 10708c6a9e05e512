use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::abort;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// What a guarded call caught before it turned into an abort.
#[derive(Debug, Error)]
pub enum Fault {
    /// The guarded function returned `Err`.
    #[error("{0}")]
    Error(BoxError),
    /// The guarded function panicked.
    #[error("panicked: {}", panic_display(.0))]
    Panic(PanicPayload),
}

/// A caught panic payload.
///
/// The payload sits behind a mutex so that `Fault` stays `Sync` and can be
/// boxed into a `BoxError`.
pub struct PanicPayload {
    message: Option<String>,
    payload: Mutex<Box<dyn Any + Send>>,
}

impl PanicPayload {
    fn new(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            Some((*s).to_string())
        } else {
            payload.downcast_ref::<String>().cloned()
        };
        PanicPayload {
            message,
            payload: Mutex::new(payload),
        }
    }

    /// Message of a `panic!("...")` style payload.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn into_inner(self) -> Box<dyn Any + Send> {
        self.payload
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_display(payload: &PanicPayload) -> &str {
    payload.message().unwrap_or("<non-string payload>")
}

impl fmt::Debug for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicPayload")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Fault {
    pub(crate) fn error(err: impl Into<BoxError>) -> Self {
        Fault::Error(err.into())
    }

    /// Wraps a caught panic. Carriers of nested aborts are not faults and keep unwinding.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Fault::Panic(PanicPayload::new(abort::passthrough(payload)))
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Fault::Panic(_))
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            Fault::Error(err) => err.downcast_ref::<E>(),
            Fault::Panic(_) => None,
        }
    }

    pub fn panic_message(&self) -> Option<&str> {
        match self {
            Fault::Panic(payload) => payload.message(),
            Fault::Error(_) => None,
        }
    }

    /// Hands back the original panic payload, e.g. for `resume_unwind`.
    pub fn into_panic_payload(self) -> Option<Box<dyn Any + Send>> {
        match self {
            Fault::Panic(payload) => Some(payload.into_inner()),
            Fault::Error(_) => None,
        }
    }
}

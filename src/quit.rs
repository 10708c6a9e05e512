use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[cfg(feature = "async")]
use futures::FutureExt;
#[cfg(feature = "async")]
use std::future::Future;

use crate::abort::{self, Carrier, Invocation, Live, Scope};
use crate::fault::{BoxError, Fault};

type Lift<N> = Arc<dyn Fn(N) -> Box<dyn Any + Send> + Send + Sync>;

/// Handle passed to a unit of work for aborting it with a typed value.
///
/// Every method that aborts unwinds straight to the `notry` call that
/// created the handle, however deep the call stack is at that point.
pub struct Quit<N> {
    invocation: Invocation,
    live: Live,
    lift: Lift<N>,
}

impl<N> Clone for Quit<N> {
    fn clone(&self) -> Self {
        Quit {
            invocation: self.invocation,
            live: self.live.clone(),
            lift: Arc::clone(&self.lift),
        }
    }
}

impl<N> fmt::Debug for Quit<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quit")
            .field("invocation", &self.invocation)
            .finish_non_exhaustive()
    }
}

impl<N: Send + 'static> Quit<N> {
    pub(crate) fn fresh() -> Self {
        Quit {
            invocation: Invocation::next(),
            live: Live::new(),
            lift: Arc::new(|n: N| -> Box<dyn Any + Send> { Box::new(n) }),
        }
    }
}

impl<N> Quit<N> {
    pub(crate) fn invocation(&self) -> Invocation {
        self.invocation
    }

    pub(crate) fn scope(&self) -> Scope {
        self.live.scope()
    }

    fn raise(&self, n: N, fault: Option<Fault>) -> ! {
        if !self.live.is_live() {
            panic!("quit handle used after its notry invocation {} ended", self.invocation);
        }
        abort::raise(Carrier {
            invocation: self.invocation,
            value: (self.lift)(n),
            fault,
        })
    }

    /// Aborts with `n`. Never returns.
    pub fn abort(&self, n: N) -> ! {
        self.raise(n, None)
    }

    /// Aborts with `n` unless `condition` holds.
    pub fn ensure(&self, condition: bool, n: N) {
        if !condition {
            self.raise(n, None)
        }
    }

    /// Unwraps `option`, aborting with `n` on `None`.
    pub fn some<T>(&self, option: Option<T>, n: N) -> T {
        match option {
            Some(value) => value,
            None => self.raise(n, None),
        }
    }

    /// Unwraps `result`, aborting with `n` on `Err` and keeping the error as the fault.
    pub fn ok<T, E>(&self, result: Result<T, E>, n: N) -> T
    where
        E: Into<BoxError>,
    {
        match result {
            Ok(value) => value,
            Err(err) => self.raise(n, Some(Fault::error(err))),
        }
    }

    /// Runs `f`, turning an `Err` or a panic into an abort with `fallback`.
    ///
    /// The caught error or panic payload is reported as the outcome's
    /// exception. An abort raised from inside `f` is left alone.
    ///
    /// A panic in `f` still goes through the panic hook, so the default hook
    /// prints it before it is converted. Return `Err` for quiet failures.
    pub fn catch<R, E, F>(&self, f: F, fallback: N) -> R
    where
        F: FnOnce() -> Result<R, E>,
        E: Into<BoxError>,
    {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => self.raise(fallback, Some(Fault::error(err))),
            Err(payload) => self.raise(fallback, Some(Fault::from_panic(payload))),
        }
    }

    /// Async form of [`Quit::catch`].
    ///
    /// The returned future yields the inner value, or aborts with
    /// `fallback` once the inner future fails or panics. As with `catch`,
    /// panics are reported by the panic hook before conversion.
    #[cfg(feature = "async")]
    pub fn catch_async<R, E, F, Fut>(&self, f: F, fallback: N) -> impl Future<Output = R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Into<BoxError>,
    {
        let pending = match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(pending) => pending,
            Err(payload) => self.raise(fallback, Some(Fault::from_panic(payload))),
        };
        let quit = self.clone();

        async move {
            match AssertUnwindSafe(pending).catch_unwind().await {
                Ok(Ok(value)) => value,
                Ok(Err(err)) => quit.raise(fallback, Some(Fault::error(err))),
                Err(payload) => quit.raise(fallback, Some(Fault::from_panic(payload))),
            }
        }
    }
}

impl<N: 'static> Quit<N> {
    /// Handle for a helper that only aborts with a narrower type.
    pub fn narrow<M>(&self) -> Quit<M>
    where
        M: Into<N> + 'static,
    {
        let lift = Arc::clone(&self.lift);
        Quit {
            invocation: self.invocation,
            live: self.live.clone(),
            lift: Arc::new(move |m: M| lift(m.into())),
        }
    }

    /// Handle for a helper that cannot abort.
    pub fn never(&self) -> Quit<Infallible> {
        Quit {
            invocation: self.invocation,
            live: self.live.clone(),
            lift: Arc::new(|never: Infallible| -> Box<dyn Any + Send> { match never {} }),
        }
    }
}

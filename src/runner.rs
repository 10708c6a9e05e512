use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "async")]
use futures::FutureExt;
#[cfg(feature = "async")]
use std::future::Future;

use crate::abort;
use crate::did::Did;
use crate::quit::Quit;

/// Runs `quitable` with a fresh handle and reports how it ended.
///
/// Panics that did not come from this call's handle are resumed as-is.
/// The handle stops working once this returns; aborting through it
/// afterwards is an ordinary panic.
pub fn notry<Y, N, F>(quitable: F) -> Did<Y, N>
where
    F: FnOnce(Quit<N>) -> Y,
    N: Send + 'static,
{
    let quit = Quit::fresh();
    let invocation = quit.invocation();
    let _scope = quit.scope();
    match panic::catch_unwind(AssertUnwindSafe(move || quitable(quit))) {
        Ok(y) => {
            log::trace!("invocation {} returned", invocation);
            Did::Yes(y)
        }
        Err(payload) => abort::intercept(invocation, payload),
    }
}

/// [`notry`] with arguments passed after the handle.
pub fn notry_with<Y, N, A, F>(quitable: F, args: A) -> Did<Y, N>
where
    F: FnOnce(Quit<N>, A) -> Y,
    N: Send + 'static,
{
    notry(move |quit| quitable(quit, args))
}

/// Async form of [`notry`].
///
/// `quitable` is called right away. An abort before it hands back its
/// future gives an already-finished outcome; a foreign panic at that
/// point propagates from this call rather than from the future.
#[cfg(feature = "async")]
pub fn notry_async<Y, N, F, Fut>(quitable: F) -> impl Future<Output = Did<Y, N>>
where
    F: FnOnce(Quit<N>) -> Fut,
    Fut: Future<Output = Y>,
    N: Send + 'static,
{
    let quit = Quit::fresh();
    let invocation = quit.invocation();
    let scope = quit.scope();
    let started = match panic::catch_unwind(AssertUnwindSafe(move || quitable(quit))) {
        Ok(pending) => Ok(pending),
        Err(payload) => Err(abort::intercept(invocation, payload)),
    };

    async move {
        let _scope = scope;
        let pending = match started {
            Ok(pending) => pending,
            Err(did) => return did,
        };
        match AssertUnwindSafe(pending).catch_unwind().await {
            Ok(y) => {
                log::trace!("invocation {} resolved", invocation);
                Did::Yes(y)
            }
            Err(payload) => abort::intercept(invocation, payload),
        }
    }
}

/// [`notry_async`] with arguments passed after the handle.
#[cfg(feature = "async")]
pub fn notry_async_with<Y, N, A, F, Fut>(quitable: F, args: A) -> impl Future<Output = Did<Y, N>>
where
    F: FnOnce(Quit<N>, A) -> Fut,
    Fut: Future<Output = Y>,
    N: Send + 'static,
{
    notry_async(move |quit| quitable(quit, args))
}

/// A named unit of work.
///
/// Implement this when the abort type needs a name of its own, e.g. for
/// helpers taking `&Quit<Of<MyTask>>`.
pub trait Quitable<Args = ()>: Sized {
    type Output;
    type Abort: Send + 'static;

    fn call(self, quit: Quit<Self::Abort>, args: Args) -> Self::Output;

    fn notry(self, args: Args) -> Did<Self::Output, Self::Abort> {
        notry_with(|quit, args| self.call(quit, args), args)
    }

    #[cfg(feature = "async")]
    fn notry_async(
        self,
        args: Args,
    ) -> impl Future<Output = Did<<Self::Output as Future>::Output, Self::Abort>>
    where
        Self::Output: Future,
    {
        notry_async_with(|quit, args| self.call(quit, args), args)
    }
}

/// Abort type of a [`Quitable`].
pub type Of<Q, Args = ()> = <Q as Quitable<Args>>::Abort;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use crate::fault::Fault;

/// Outcome of a unit of work run through `notry`.
#[derive(Debug)]
#[must_use]
pub enum Did<Y, N> {
    /// Returned normally with `Y`.
    Yes(Y),
    /// Aborted through its handle with `n`. `exception` is set only when the
    /// abort came from a guarded call that caught an error or panic.
    No { n: N, exception: Option<Fault> },
}

/// A `Did::No` turned into an error value.
#[derive(Debug, Error)]
#[error("quit with {n:?}")]
pub struct Quitted<N> {
    pub n: N,
    #[source]
    pub exception: Option<Fault>,
}

impl<Y, N> Did<Y, N> {
    pub fn is_yes(&self) -> bool {
        matches!(self, Did::Yes(_))
    }

    pub fn is_no(&self) -> bool {
        matches!(self, Did::No { .. })
    }

    pub fn yes(self) -> Option<Y> {
        match self {
            Did::Yes(y) => Some(y),
            Did::No { .. } => None,
        }
    }

    pub fn no(self) -> Option<N> {
        match self {
            Did::Yes(_) => None,
            Did::No { n, .. } => Some(n),
        }
    }

    pub fn exception(&self) -> Option<&Fault> {
        match self {
            Did::Yes(_) => None,
            Did::No { exception, .. } => exception.as_ref(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(Y) -> U) -> Did<U, N> {
        match self {
            Did::Yes(y) => Did::Yes(f(y)),
            Did::No { n, exception } => Did::No { n, exception },
        }
    }

    pub fn map_no<M>(self, f: impl FnOnce(N) -> M) -> Did<Y, M> {
        match self {
            Did::Yes(y) => Did::Yes(y),
            Did::No { n, exception } => Did::No {
                n: f(n),
                exception,
            },
        }
    }

    pub fn into_result(self) -> Result<Y, Quitted<N>> {
        match self {
            Did::Yes(y) => Ok(y),
            Did::No { n, exception } => Err(Quitted { n, exception }),
        }
    }
}

impl<Y, N> From<Did<Y, N>> for Result<Y, Quitted<N>> {
    fn from(did: Did<Y, N>) -> Self {
        did.into_result()
    }
}

// {"ok": true, "y": ..} | {"ok": false, "n": .., "exception": ..}
impl<Y: Serialize, N: Serialize> Serialize for Did<Y, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Did::Yes(y) => {
                let mut state = serializer.serialize_struct("Did", 2)?;
                state.serialize_field("ok", &true)?;
                state.serialize_field("y", y)?;
                state.end()
            }
            Did::No { n, exception } => {
                let mut state = serializer.serialize_struct("Did", 3)?;
                state.serialize_field("ok", &false)?;
                state.serialize_field("n", n)?;
                state.serialize_field("exception", &exception.as_ref().map(ToString::to_string))?;
                state.end()
            }
        }
    }
}

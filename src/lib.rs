//! Typed early aborts without `?` at every level.
//!
//! A unit of work receives a [`Quit`] handle. Calling one of its abort
//! methods stops the work on the spot, at any call depth, and the
//! enclosing [`notry`] call reports it as [`Did::No`]. Normal completion
//! is [`Did::Yes`]. Panics that were not raised through the handle are
//! never turned into an outcome; they keep unwinding past `notry`.
//!
//! ```
//! use notry::{notry, Did};
//!
//! fn parse_port(s: &str) -> Did<u16, &'static str> {
//!     notry(|quit| {
//!         quit.ensure(!s.is_empty(), "empty");
//!         let port = quit.catch(|| s.parse::<u16>(), "not a port");
//!         quit.ensure(port != 0, "port zero");
//!         port
//!     })
//! }
//!
//! assert!(matches!(parse_port("8080"), Did::Yes(8080)));
//! assert!(matches!(parse_port("http"), Did::No { n: "not a port", exception: Some(_) }));
//! ```
//!
//! Aborts are carried by unwinding, so the crate needs `panic = "unwind"`.

mod abort;
mod did;
mod fault;
mod quit;
mod runner;

pub use did::{Did, Quitted};
pub use fault::{BoxError, Fault, PanicPayload};
pub use runner::{notry, notry_with, Of, Quitable};
#[cfg(feature = "async")]
pub use runner::{notry_async, notry_async_with};
pub use quit::Quit;

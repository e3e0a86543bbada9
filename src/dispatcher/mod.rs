//! # Dispatcher Module
//!
//! The dispatcher answers `(method, uri)` with a [`DispatchResult`] by reading
//! a compiled [`DispatchTable`](crate::generator::DispatchTable).
//!
//! ## Request Flow
//!
//! 1. Exact lookup of the URI in the static routes of the method
//! 2. The method's combined variable-route regexes, first match wins
//! 3. `HEAD` requests retry steps 1-2 as `GET`
//! 4. Any request retries steps 1-2 with the `*` method
//! 5. Otherwise the methods that *would* accept the URI are reported as
//!    [`DispatchResult::MethodNotAllowed`], or [`DispatchResult::NotFound`]
//!    when there are none
//!
//! An explicitly registered `HEAD` route always wins over the `GET`
//! fallback, since step 1 runs first.
//!
//! ## Example
//!
//! ```rust,ignore
//! use routecraft::{simple_dispatcher, DispatchResult, Strategy};
//!
//! let (dispatcher, _) = simple_dispatcher(Strategy::default(), |r| {
//!     r.get("/users/{id:\\d+}", "show_user")?;
//!     Ok(())
//! })?;
//!
//! if let DispatchResult::Found(m) = dispatcher.dispatch("GET", "/users/42") {
//!     assert_eq!(*m.handler, "show_user");
//!     assert_eq!(m.variable("id"), Some("42"));
//! }
//! ```
//!
//! ## Performance Considerations
//!
//! - Static routes cost one hash lookup
//! - Variables are returned in a `SmallVec`, inline for up to
//!   [`MAX_INLINE_PARAMS`] entries
//! - Method-not-allowed aggregation runs every other method's matcher and is
//!   only paid on the failure path

mod core;

pub use core::{DispatchResult, Dispatcher, Matched, ParamVec, MAX_INLINE_PARAMS};

#[cfg(test)]
mod tests;

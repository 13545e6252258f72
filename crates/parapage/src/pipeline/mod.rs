//! The three task roles of a pagination run.
//!
//! ```text
//! generator --(requests)--> worker 0..N --(pages)--> gatherer
//!     ^                        |
//!     +---- completion signal -+
//! ```
//!
//! - [`generator`] emits page requests in increasing offset order.
//! - [`worker`] fetches them, racing each other on one shared receiver.
//! - [`gatherer`] is the single owner of the result collection.

pub(crate) mod gatherer;
pub(crate) mod generator;
pub(crate) mod worker;

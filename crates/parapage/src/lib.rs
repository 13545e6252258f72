#![doc = include_str!("../README.md")]

mod config;
mod error;
mod paginator;
mod pipeline;
mod request;
mod signal;
mod source;
mod stats;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::paginator::*;
pub use crate::request::*;
pub use crate::signal::*;
pub use crate::source::*;
pub use crate::stats::FetchStats;

//! Mark tracking and tabline rendering.
//!
//! A [`Session`](session::Session) owns the tracked records of one editor
//! instance, reacts to host events and renders the tabline. The host editor
//! is reached only through the [`Host`](host::Host) trait.

pub mod cache;
pub mod config;
pub mod disambiguate;
pub mod host;
pub mod item;
pub mod layout;
pub mod marks;
pub mod recency;
pub mod session;
pub mod snapshot;
pub mod store;

pub use session::Session;

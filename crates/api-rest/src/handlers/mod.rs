//! Request handlers, one module per family of resources.
//!
//! Each module exposes a `routes()` function; [`crate::router`] merges them.

pub mod catalogue;
pub mod chronic;
pub mod early_childhood;
pub mod encounters;
pub mod health;
pub mod life_stages;
pub mod people;
pub mod population;
pub mod screening;

//! # IPS Core
//!
//! Core business logic for the primary-care clinical record API.
//!
//! This crate contains the data model and the operations over it:
//! - Record models for patients, doctors, encounters and every encounter-detail type, with
//!   value-range validation and the computed clinical assessments
//! - The [`store::RecordStore`] table gateway with Postgres and in-memory implementations
//! - [`linked_write::LinkedWrite`], the insert-then-compensate sequence used for multi-table
//!   writes
//! - Services in [`repositories`] that apply the rules for each family of tables
//!
//! **No API concerns**: HTTP routing, status codes and OpenAPI wiring belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod linked_write;
pub mod models;
pub mod repositories;
pub mod store;
pub mod validation;

pub use config::{CoreConfig, StoreBackend};
pub use error::{CoreError, CoreResult};
pub use ips_types::NonEmptyText;

//! FOLIO Application Library
//!
//! Exposes the project modules so integration tests can assemble the
//! application router without going through `main`.

pub mod modules;

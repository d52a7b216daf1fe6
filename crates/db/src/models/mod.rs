//! Row structs and insert DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the table and,
//! where rows are created from outside the repository, a create DTO.

pub mod child;
pub mod learning;
pub mod parent;
pub mod report;
pub mod section;
pub mod session;
pub mod share;
pub mod story;

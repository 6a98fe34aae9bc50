//! Per-table database operations - one file per table
//! (profiles, subjects, question bank).

mod profiles;
mod questions;
mod subjects;

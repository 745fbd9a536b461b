//! JPC: case lifecycle and numbering for community-judge case files
//!
//! Cases are numbered `JC-YYYY-MM-XXXX` per filing month, tracked against the
//! statutory resolution period, extended at most once and moved through a
//! closed set of statuses.

pub mod cli;
pub mod core;
pub mod entities;

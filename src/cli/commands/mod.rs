//! CLI command implementations

pub mod deadline;
pub mod extend;
pub mod file;
pub mod init;
pub mod list;
pub mod log;
pub mod show;
pub mod status;

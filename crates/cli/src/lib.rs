//! Library half of the `malviz` binary: configuration loading and
//! terminal rendering of session progress.

pub mod config;
pub mod render;

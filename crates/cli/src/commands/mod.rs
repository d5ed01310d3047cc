//! CLI Commands

pub mod config;
pub mod parse;
pub mod run;

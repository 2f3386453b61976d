//! Thin command handlers: parse, delegate to the engine, render to stdout.

pub mod download;
pub mod plan;
pub mod serve;

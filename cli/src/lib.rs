pub mod commands;
pub mod evidence_reader;
pub mod pipeline;
#[macro_use]
extern crate log;

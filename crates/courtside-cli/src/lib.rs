// Command-line front end for courtside: argument parsing, rendering and the
// interactive edit session. The binary in main.rs only wires these together.

pub mod cli;
pub mod commands;
pub mod output;
pub mod session;

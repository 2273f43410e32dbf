//! Command-line front end of the `osgp` binary.

pub mod args;
pub(crate) mod io;
mod options;
mod output;
mod symbols;

pub use options::run;

//! TrayChat application library.
//!
//! Wires the session controller to a console front-end and the loopback
//! chat service.

pub mod cli;
pub mod console;
pub mod logging;
pub mod paths;
pub mod signals;

//! Core codec functions for interacting with the XRPL.

pub mod addresscodec;
pub mod exceptions;

#![no_std]
#![allow(dead_code)] // Remove eventually

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

pub mod amount;
pub mod constants;
pub mod core;
pub mod error;
pub mod flow;
pub mod ledger;
pub mod quality;
pub mod step;
pub mod strand;
pub mod types;
pub mod utils;

#![forbid(unsafe_code)]

//! Core types shared across the Sigtuna signature policy library:
//! the error taxonomy and the algorithm URI constants.

pub mod algorithm;
pub mod error;

pub use error::{Error, Result};

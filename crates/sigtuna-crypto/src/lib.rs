#![forbid(unsafe_code)]

//! Cryptographic digest engines, keyed by W3C algorithm URI.

pub mod digest;

pub use digest::DigestAlgorithm;

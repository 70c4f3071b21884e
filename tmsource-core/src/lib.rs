#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod descriptor;
pub mod document;
pub mod location;
pub mod normalize;
pub mod srs;

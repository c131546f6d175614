//! IMU line protocol parsing
//!
//! This crate provides structures and parsing for the newline-delimited
//! ASCII records emitted by the stabilizer's inertial sensor head, plus a
//! framer that reassembles complete lines from a raw byte stream.

mod framer;
mod parser;
mod readings;

pub use framer::LineFramer;
pub use parser::{decode, tag, DecodeError, Record};
pub use readings::{AccReading, GyroReading};

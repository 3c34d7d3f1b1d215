#[cfg(test)]
#[macro_use]
extern crate assert_matches;
extern crate byteorder;
#[macro_use]
extern crate log;

pub mod core;

use std::io::Error as IOError;
use std::result::Result as StdResult;

use core::repr::Ipv4Address;

#[derive(Debug)]
pub enum Error {
    /// Indicates an error where an address or interface could not be resolved.
    Address,
    /// Indicates an error where a buffer is too small or too large.
    Exhausted,
    /// Indicates an error where a frame or packet is malformed.
    Malformed,
    /// Indicates an error where a checksum is invalid.
    Checksum,
    /// Indicates a frame or packet that is not addressed to us or not handled.
    Ignored,
    /// Indicates an error where no route matches a destination.
    Unroutable,
    /// Indicates a frame queued behind an ARP request for the enclosed next hop.
    MacResolution(Ipv4Address),
    /// Indicates a generic IO error.
    IO(IOError),
}

impl From<IOError> for Error {
    fn from(err: IOError) -> Error {
        Error::IO(err)
    }
}

pub type Result<T> = StdResult<T, Error>;

//! Error types.

use nusb::transfer::TransferError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned from BlinkStick operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying control transfer failed.
    #[error("control transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// The device answered with fewer bytes than the request requires.
    #[error("short response: expected {expected} bytes, received {actual}")]
    ShortResponse { expected: usize, actual: usize },

    /// More LEDs were requested than the largest report can carry.
    #[error("requested {requested} LEDs, reports hold at most {capacity}")]
    TooManyLeds { requested: usize, capacity: usize },

    /// Enumerating or opening a USB device failed.
    #[error("unable to access USB device: {0}")]
    Usb(#[from] nusb::Error),

    /// No connected device carries the requested serial number.
    #[error("no BlinkStick with serial {0:?}")]
    NotFound(String),
}

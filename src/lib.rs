//! BlinkStick USB LED control.
//!
//! Discover connected BlinkStick devices and control them through the USB
//! control transfers understood by the BlinkStick firmware.
//!
//! ```no_run
//! use blinkstick::UsbContext;
//!
//! # fn main() -> Result<(), blinkstick::Error> {
//! let context = UsbContext::new();
//! for mut stick in context.find_all()? {
//!     if stick.led_count() < 1 {
//!         stick.set_rgb(0, 0, 255, 255, 255)?;
//!     } else {
//!         stick.set_all_rgb(0, 255, 255, 255)?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! All transfers go through the [`Transport`] trait, so the device logic can
//! run against any control transfer implementation.

pub mod color;
pub mod controller;
pub mod device;
pub mod error;
pub mod report;
pub mod usb;

#[cfg(test)]
mod mock;

pub use crate::color::Rgb;
pub use crate::controller::{ControlRequest, Transport};
pub use crate::device::{BlinkStick, PRODUCT_ID, VENDOR_ID};
pub use crate::error::{Error, Result};
pub use crate::report::Report;
pub use crate::usb::{UsbContext, UsbTransport};

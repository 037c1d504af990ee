//! BlinkStick device control.
//!
//! Every operation maps to exactly one control transfer, except
//! [`BlinkStick::set_all_rgb`] which may first query the LED count.

use log::{debug, trace};

use crate::color::Rgb;
use crate::controller::{ControlRequest, Transport};
use crate::error::{Error, Result};
use crate::report::{self, Report, HEADER_LEN};

/// BlinkStick USB vendor ID.
pub const VENDOR_ID: u16 = 0x20a0;

/// BlinkStick USB product ID.
pub const PRODUCT_ID: u16 = 0x41e5;

/// Report carrying a single `[0, r, g, b]` color.
const COLOR_REPORT: u16 = 0x01;

/// Report holding the first info block, used as the device name.
const NAME_REPORT: u16 = 0x02;

/// Report holding the second info block.
const INFO_REPORT: u16 = 0x03;

/// Report answering with the number of LEDs in its second byte.
const LED_COUNT_REPORT: u16 = 0x81;

/// Response size of the info block reports.
const INFO_BLOCK_LEN: usize = 33;

/// A single connected BlinkStick.
///
/// Operations take `&mut self`, so concurrent access to one device has to go
/// through the caller's own synchronization. Separate devices are independent.
#[derive(Debug)]
pub struct BlinkStick<T> {
    transport: T,
    serial: String,
    inverse: bool,
    led_count: Option<u8>,
}

impl<T: Transport> BlinkStick<T> {
    /// Wrap an opened device.
    pub fn new(transport: T, serial: impl Into<String>) -> Self {
        Self { transport, serial: serial.into(), inverse: false, led_count: None }
    }

    /// Serial number reported at discovery time.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Check if colors are complemented before they are sent.
    pub fn inverse(&self) -> bool {
        self.inverse
    }

    /// Complement every color sent to the device, for single LEDs and LED data
    /// alike. Zero padding of LED reports is left untouched.
    pub fn set_inverse(&mut self, inverse: bool) {
        self.inverse = inverse;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Number of LEDs, or `-1` if the device can't report it.
    ///
    /// Devices with a single fixed LED commonly answer with an error here.
    pub fn led_count(&mut self) -> i32 {
        self.try_led_count().map_or(-1, i32::from)
    }

    /// Number of LEDs.
    ///
    /// The first non-zero answer is cached for the lifetime of this handle.
    /// Failures and a count of 0 are not cached, so the next call asks the
    /// device again.
    pub fn try_led_count(&mut self) -> Result<u8> {
        if let Some(count) = self.led_count {
            debug!("Using cached LED count {count} for {}", self.serial);
            return Ok(count);
        }

        let mut buf = [0; 2];
        let read = self.transport.control_in(ControlRequest::get_report(LED_COUNT_REPORT), &mut buf)?;
        if read < buf.len() {
            return Err(Error::ShortResponse { expected: buf.len(), actual: read });
        }

        self.led_count = Some(buf[1]).filter(|&count| count != 0);
        Ok(buf[1])
    }

    /// Device name, or an empty string if it could not be read.
    ///
    /// The text runs until the first NUL or the end of the 33 byte response.
    /// A leading byte equal to the report ID (`0x02`) is the firmware's report
    /// header and is not part of the name.
    pub fn name(&mut self) -> String {
        self.try_name().unwrap_or_default()
    }

    /// Device name, decoded like [`Self::name`].
    pub fn try_name(&mut self) -> Result<String> {
        self.read_info_block(NAME_REPORT)
    }

    /// Second info block, or an empty string if it could not be read.
    ///
    /// Decoded like [`Self::name`], with `0x03` as the report header byte.
    pub fn info(&mut self) -> String {
        self.try_info().unwrap_or_default()
    }

    /// Second info block.
    pub fn try_info(&mut self) -> Result<String> {
        self.read_info_block(INFO_REPORT)
    }

    /// Write a new device name.
    ///
    /// The firmware stores at most 32 bytes per info block. Nothing is checked
    /// locally, longer names are rejected by the device as a transfer error.
    ///
    /// Info blocks live in EEPROM with limited write endurance, so avoid
    /// calling this in a loop.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.control_out(NAME_REPORT, name.as_bytes())
    }

    /// Write the second info block.
    ///
    /// Same size limit and write endurance caveats as [`Self::set_name`].
    pub fn set_info(&mut self, info: &str) -> Result<()> {
        self.control_out(INFO_REPORT, info.as_bytes())
    }

    /// Set a single LED.
    ///
    /// `channel` and `index` are accepted for API compatibility but not sent:
    /// the color report always addresses the first LED on the first channel.
    pub fn set_rgb(&mut self, channel: u8, index: u8, r: u8, g: u8, b: u8) -> Result<()> {
        let mut color = Rgb::new(r, g, b);
        if self.inverse {
            color = color.inverted();
        }

        trace!("Setting LED {index} on channel {channel} to {color}");

        self.control_out(COLOR_REPORT, &[0x00, color.r, color.g, color.b])
    }

    /// Set a single LED to a random color.
    pub fn set_random_color(&mut self, channel: u8, index: u8) -> Result<()> {
        let color = Rgb::from_u32(fastrand::u32(..));
        self.set_rgb(channel, index, color.r, color.g, color.b)
    }

    /// Set every LED on a channel to the same color.
    ///
    /// Devices which cannot report their LED count are treated as a single LED.
    pub fn set_all_rgb(&mut self, channel: u8, r: u8, g: u8, b: u8) -> Result<()> {
        let count = self.led_count();
        if count < 0 {
            return self.set_rgb(channel, 0, r, g, b);
        }

        let data = report::repeat_color(count as usize, r, g, b);
        self.set_led_data(channel, &data)
    }

    /// Read back the colors of the first `count` LEDs as RGB triples.
    ///
    /// At most 64 LEDs can be read in a single request.
    pub fn led_data(&mut self, count: usize) -> Result<Vec<u8>> {
        let data_len = count.saturating_mul(3);
        let report = Report::for_byte_count(data_len);
        if count > report.capacity {
            return Err(Error::TooManyLeds { requested: count, capacity: report.capacity });
        }

        let mut buf = vec![0; report.buffer_len()];
        let read = self.transport.control_in(ControlRequest::get_report(report.id), &mut buf)?;

        let expected = HEADER_LEN + data_len;
        if read < expected {
            return Err(Error::ShortResponse { expected, actual: read });
        }

        buf.truncate(expected);
        buf.drain(..HEADER_LEN);
        Ok(buf)
    }

    /// Write raw RGB triples for a whole channel.
    ///
    /// The data is zero padded to the selected report size. Anything past
    /// 64 LEDs is dropped. In inverse mode every data byte is complemented.
    pub fn set_led_data(&mut self, channel: u8, data: &[u8]) -> Result<()> {
        let report = Report::for_byte_count(data.len());
        if data.len() > report.data_len() {
            debug!("Dropping {} bytes of LED data past the report size", data.len() - report.data_len());
        }

        let framed = if self.inverse {
            let inverted: Vec<u8> = data.iter().map(|byte| 255 - byte).collect();
            report.frame(channel, &inverted)
        } else {
            report.frame(channel, data)
        };
        self.control_out(report.id, &framed)
    }

    /// Read an info block as a string.
    fn read_info_block(&mut self, report_id: u16) -> Result<String> {
        let mut buf = [0; INFO_BLOCK_LEN];
        let read = self.transport.control_in(ControlRequest::get_report(report_id), &mut buf)?;

        Ok(decode_info_block(report_id, &buf[..read]))
    }

    /// Send a SET_REPORT transfer, discarding the number of bytes written.
    fn control_out(&mut self, report_id: u16, data: &[u8]) -> Result<()> {
        self.transport.control_out(ControlRequest::set_report(report_id), data)?;
        Ok(())
    }
}

/// Decode the bytes of an info block.
///
/// The firmware echoes the report ID in front of the text; the string then runs
/// until the first NUL or the end of the received data.
fn decode_info_block(report_id: u16, bytes: &[u8]) -> String {
    let bytes = match bytes.split_first() {
        Some((&first, rest)) if u16::from(first) == report_id => rest,
        _ => bytes,
    };

    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

//! USB access through `nusb`.

use std::time::Duration;

use log::{debug, trace, warn};
use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient, TransferError};
use nusb::{DeviceInfo, MaybeFuture};

use crate::controller::{ControlRequest, Transport};
use crate::device::{BlinkStick, PRODUCT_ID, VENDOR_ID};
use crate::error::{Error, Result};

/// Default timeout for a single control transfer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

// Windows only exposes the control endpoint through a claimed interface.
#[cfg(any(target_os = "linux", target_os = "macos", target_os = "android"))]
type Handle = nusb::Device;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "android")))]
type Handle = nusb::Interface;

/// Control transfers on an opened USB device.
pub struct UsbTransport {
    handle: Handle,
    timeout: Duration,
}

impl UsbTransport {
    /// Open a device for control transfers.
    pub fn open(info: &DeviceInfo, timeout: Duration) -> Result<Self> {
        let device = info.open().wait()?;

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "android")))]
        let device = device.claim_interface(0).wait()?;

        Ok(Self { handle: device, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for UsbTransport {
    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize> {
        let (control_type, recipient) = decode_request_type(request.request_type)?;
        let length = u16::try_from(buf.len()).map_err(|_| TransferError::InvalidArgument)?;

        trace!("IN {request:02x?} length {length}");

        let data = self
            .handle
            .control_in(
                ControlIn {
                    control_type,
                    recipient,
                    request: request.request,
                    value: request.value,
                    index: request.index,
                    length,
                },
                self.timeout,
            )
            .wait()?;

        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);

        trace!("IN {:02x?}", &buf[..len]);

        Ok(len)
    }

    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize> {
        let (control_type, recipient) = decode_request_type(request.request_type)?;

        trace!("OUT {request:02x?} data {data:02x?}");

        self.handle
            .control_out(
                ControlOut {
                    control_type,
                    recipient,
                    request: request.request,
                    value: request.value,
                    index: request.index,
                    data,
                },
                self.timeout,
            )
            .wait()?;

        Ok(data.len())
    }
}

/// Split `bmRequestType` into the parts `nusb` builds it from.
///
/// The direction bit is implied by the transfer function.
fn decode_request_type(request_type: u8) -> Result<(ControlType, Recipient)> {
    let control_type = match (request_type >> 5) & 0b11 {
        0 => ControlType::Standard,
        1 => ControlType::Class,
        2 => ControlType::Vendor,
        _ => return Err(TransferError::InvalidArgument.into()),
    };

    let recipient = match request_type & 0b1_1111 {
        0 => Recipient::Device,
        1 => Recipient::Interface,
        2 => Recipient::Endpoint,
        3 => Recipient::Other,
        _ => return Err(TransferError::InvalidArgument.into()),
    };

    Ok((control_type, recipient))
}

/// Check if a USB device is a BlinkStick.
pub fn is_blinkstick(info: &DeviceInfo) -> bool {
    info.vendor_id() == VENDOR_ID && info.product_id() == PRODUCT_ID
}

/// Entry point for discovering devices.
///
/// Owned by the caller; dropping it together with every opened device
/// releases all USB resources.
#[derive(Debug, Clone)]
pub struct UsbContext {
    timeout: Duration,
}

impl Default for UsbContext {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT }
    }
}

impl UsbContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom timeout for every transfer on discovered devices.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Open every connected BlinkStick.
    ///
    /// Devices which cannot be opened are skipped.
    pub fn find_all(&self) -> Result<Vec<BlinkStick<UsbTransport>>> {
        let mut blinksticks = Vec::new();

        for info in nusb::list_devices().wait()?.filter(is_blinkstick) {
            match self.open(&info) {
                Ok(blinkstick) => blinksticks.push(blinkstick),
                Err(err) => warn!("Skipping BlinkStick {}: {err}", info.bus_id()),
            }
        }

        debug!("Found {} BlinkStick devices", blinksticks.len());

        Ok(blinksticks)
    }

    /// Open the BlinkStick with a specific serial number.
    ///
    /// Serials are compared case-insensitively, since Windows may report them
    /// in upper case.
    pub fn find_by_serial(&self, serial: &str) -> Result<BlinkStick<UsbTransport>> {
        let info = nusb::list_devices()
            .wait()?
            .filter(is_blinkstick)
            .find(|info| info.serial_number().is_some_and(|s| s.eq_ignore_ascii_case(serial)))
            .ok_or_else(|| Error::NotFound(serial.into()))?;

        self.open(&info)
    }

    fn open(&self, info: &DeviceInfo) -> Result<BlinkStick<UsbTransport>> {
        let serial = match info.serial_number() {
            Some(serial) => serial,
            None => {
                warn!("Could not read serial for BlinkStick {}", info.bus_id());
                ""
            },
        };

        let transport = UsbTransport::open(info, self.timeout)?;
        debug!("Opened BlinkStick {serial}");

        Ok(BlinkStick::new(transport, serial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{REQUEST_TYPE_IN, REQUEST_TYPE_OUT};

    #[test]
    fn decode_blinkstick_request_types() {
        assert!(matches!(decode_request_type(REQUEST_TYPE_IN), Ok((ControlType::Class, Recipient::Device))));
        assert!(matches!(decode_request_type(REQUEST_TYPE_OUT), Ok((ControlType::Class, Recipient::Device))));
    }

    #[test]
    fn decode_other_request_types() {
        assert!(matches!(decode_request_type(0xc1), Ok((ControlType::Vendor, Recipient::Interface))));
        assert!(matches!(decode_request_type(0x03), Ok((ControlType::Standard, Recipient::Other))));
    }

    #[test]
    fn decode_reserved_request_types() {
        assert!(matches!(decode_request_type(0x60), Err(Error::Transfer(TransferError::InvalidArgument))));
        assert!(matches!(decode_request_type(0x24), Err(Error::Transfer(TransferError::InvalidArgument))));
    }

    #[test]
    fn default_context_timeout() {
        assert_eq!(UsbContext::new().timeout(), DEFAULT_TIMEOUT);
        assert_eq!(UsbContext::with_timeout(Duration::from_millis(50)).timeout(), Duration::from_millis(50));
    }
}

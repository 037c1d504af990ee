//! USB control transfer abstraction.

use crate::error::Result;

/// Device-to-host, class request, device recipient.
pub const REQUEST_TYPE_IN: u8 = 0x80 | 0x20;

/// Host-to-device, class request, device recipient.
pub const REQUEST_TYPE_OUT: u8 = 0x20;

/// `bRequest` used to read a report from the device.
pub const GET_REPORT: u8 = 0x01;

/// `bRequest` used to write a report to the device.
pub const SET_REPORT: u8 = 0x09;

/// Setup stage of a control transfer, without the length.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct ControlRequest {
    /// `bmRequestType`.
    pub request_type: u8,
    /// `bRequest`.
    pub request: u8,
    /// `wValue`.
    pub value: u16,
    /// `wIndex`.
    pub index: u16,
}

impl ControlRequest {
    /// Read request for the report with the given ID.
    pub const fn get_report(report_id: u16) -> Self {
        Self { request_type: REQUEST_TYPE_IN, request: GET_REPORT, value: report_id, index: 0 }
    }

    /// Write request for the report with the given ID.
    pub const fn set_report(report_id: u16) -> Self {
        Self { request_type: REQUEST_TYPE_OUT, request: SET_REPORT, value: report_id, index: 0 }
    }

    /// Check if the data stage moves from device to host.
    pub const fn is_in(&self) -> bool {
        self.request_type & 0x80 != 0
    }
}

/// Control transfer primitive for a single opened device.
///
/// Implementations only move bytes; interpreting them is left to
/// [`BlinkStick`](crate::BlinkStick).
pub trait Transport {
    /// Run an IN transfer, filling `buf` and returning the number of bytes received.
    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize>;

    /// Run an OUT transfer with `data` as the data stage, returning the bytes sent.
    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize> {
        (**self).control_in(request, buf)
    }

    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize> {
        (**self).control_out(request, data)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize> {
        (**self).control_in(request, buf)
    }

    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize> {
        (**self).control_out(request, data)
    }
}

//! Recording transport used by the unit tests.

use std::collections::HashMap;

use nusb::transfer::TransferError;

use crate::controller::{ControlRequest, Transport};
use crate::error::{Error, Result};
use crate::report::HEADER_LEN;

/// In-memory stand-in for a BlinkStick.
///
/// IN requests are answered from `responses` first. Without a canned answer,
/// LED report reads return the LED buffer that color writes and LED reports
/// update.
#[derive(Default, Debug)]
pub(crate) struct MockTransport {
    /// Canned answers for IN requests, keyed by `wValue`.
    pub responses: HashMap<u16, Vec<u8>>,
    /// Every IN request in order.
    pub reads: Vec<ControlRequest>,
    /// Every OUT request in order, with its data stage.
    pub writes: Vec<(ControlRequest, Vec<u8>)>,
    /// Fail every transfer with a stall.
    pub fail: bool,
    leds: Vec<u8>,
}

impl MockTransport {
    pub fn with_led_count(count: u8) -> Self {
        let mut mock = Self::default();
        mock.responses.insert(0x81, vec![0x81, count]);
        mock
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Data stage of the most recent OUT transfer.
    pub fn last_write(&self) -> &(ControlRequest, Vec<u8>) {
        self.writes.last().expect("no OUT transfer recorded")
    }
}

impl Transport for MockTransport {
    fn control_in(&mut self, request: ControlRequest, buf: &mut [u8]) -> Result<usize> {
        self.reads.push(request);
        if self.fail {
            return Err(Error::Transfer(TransferError::Stall));
        }

        let response = match self.responses.get(&request.value) {
            Some(response) => response.clone(),
            None if (6..=9).contains(&request.value) => {
                let mut report = vec![request.value as u8, 0];
                report.extend_from_slice(&self.leds);
                report.resize(buf.len().max(HEADER_LEN), 0);
                report
            },
            None => return Err(Error::Transfer(TransferError::Stall)),
        };

        let len = response.len().min(buf.len());
        buf[..len].copy_from_slice(&response[..len]);
        Ok(len)
    }

    fn control_out(&mut self, request: ControlRequest, data: &[u8]) -> Result<usize> {
        self.writes.push((request, data.to_vec()));
        if self.fail {
            return Err(Error::Transfer(TransferError::Stall));
        }

        match request.value {
            0x01 if data.len() == 4 => {
                if self.leds.len() < 3 {
                    self.leds.resize(3, 0);
                }
                self.leds[..3].copy_from_slice(&data[1..]);
            },
            6..=9 => self.leds = data[HEADER_LEN..].to_vec(),
            _ => (),
        }

        Ok(data.len())
    }
}

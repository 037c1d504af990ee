//! LED data report selection and framing.
//!
//! The firmware exposes four fixed-size LED buffers, each addressed by its own
//! report ID. A transfer always uses the smallest buffer that fits the data.

use bytes::{BufMut, Bytes, BytesMut};

/// Bytes preceding the LED data in every LED report.
pub const HEADER_LEN: usize = 2;

/// Largest number of LEDs a single report can address.
pub const MAX_LEDS: usize = 64;

/// Fixed-size LED report format.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct Report {
    /// Report ID sent as `wValue`.
    pub id: u16,
    /// Number of LEDs the report carries.
    pub capacity: usize,
}

impl Report {
    /// Select the report for a payload of `byte_count` LED bytes.
    ///
    /// Anything above 96 bytes maps to the 64 LED report, which is a hard
    /// limit: longer payloads cannot be sent in one transfer.
    pub const fn for_byte_count(byte_count: usize) -> Self {
        if byte_count <= 8 * 3 {
            Self { id: 6, capacity: 8 }
        } else if byte_count <= 16 * 3 {
            Self { id: 7, capacity: 16 }
        } else if byte_count <= 32 * 3 {
            Self { id: 8, capacity: 32 }
        } else {
            Self { id: 9, capacity: MAX_LEDS }
        }
    }

    /// LED data bytes carried by this report.
    pub const fn data_len(&self) -> usize {
        self.capacity * 3
    }

    /// Total size of the report including its header.
    pub const fn buffer_len(&self) -> usize {
        HEADER_LEN + self.data_len()
    }

    /// Frame LED data for a SET_REPORT transfer.
    ///
    /// Data shorter than the report is zero padded, longer data is cut off.
    pub fn frame(&self, channel: u8, data: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.buffer_len());

        // Header.
        buf.put_u8(0x00);
        buf.put_u8(channel);

        // LED data.
        let data = &data[..data.len().min(self.data_len())];
        buf.put_slice(data);

        // Padding.
        buf.put_bytes(0, self.data_len() - data.len());

        buf.freeze()
    }
}

/// Repeat a single color for `count` LEDs.
pub fn repeat_color(count: usize, r: u8, g: u8, b: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(count * 3);
    for _ in 0..count {
        buf.put_u8(r);
        buf.put_u8(g);
        buf.put_u8(b);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        for count in 0..=24 {
            assert_eq!(Report::for_byte_count(count), Report { id: 6, capacity: 8 });
        }
        for count in 25..=48 {
            assert_eq!(Report::for_byte_count(count), Report { id: 7, capacity: 16 });
        }
        for count in 49..=96 {
            assert_eq!(Report::for_byte_count(count), Report { id: 8, capacity: 32 });
        }
        for count in [97, 192, 193, 1000, usize::MAX] {
            assert_eq!(Report::for_byte_count(count), Report { id: 9, capacity: 64 });
        }
    }

    #[test]
    fn frame_pads_short_data() {
        let report = Report::for_byte_count(3);
        let framed = report.frame(2, &[1, 2, 3]);

        assert_eq!(framed.len(), 2 + 24);
        assert_eq!(&framed[..5], &[0, 2, 1, 2, 3]);
        assert!(framed[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn frame_exact_capacity_is_unpadded() {
        let data: Vec<u8> = (1..=48).collect();
        let report = Report::for_byte_count(data.len());
        let framed = report.frame(0, &data);

        assert_eq!(report.capacity, 16);
        assert_eq!(framed.len(), 2 + 48);
        assert_eq!(&framed[2..], &data[..]);
    }

    #[test]
    fn frame_truncates_past_largest_report() {
        let data = vec![0xab; 200];
        let report = Report::for_byte_count(data.len());
        let framed = report.frame(1, &data);

        assert_eq!(framed.len(), 2 + 192);
        assert!(framed[2..].iter().all(|&b| b == 0xab));
    }

    #[test]
    fn repeat_color_triples() {
        let data = repeat_color(4, 0x10, 0x20, 0x30);
        assert_eq!(data.len(), 12);
        assert!(data.chunks(3).all(|led| led == [0x10, 0x20, 0x30]));
        assert!(repeat_color(0, 1, 2, 3).is_empty());
    }
}

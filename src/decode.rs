//! Signal value extraction from frame payloads.
//!
//! A parsed [`Signal`] knows everything needed to pull its raw bits out of a
//! frame and scale them into the physical domain: `physical = raw * factor
//! + offset`. Payloads shorter than eight bytes are zero-padded before the
//! word read.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::network::{ByteOrder as SignalByteOrder, ExtendedValueType, Signal, ValueType};

fn read_word(byte_order: SignalByteOrder, data: &[u8]) -> u64 {
    let mut padded = [0u8; 8];
    let take = data.len().min(8);
    padded[..take].copy_from_slice(&data[..take]);
    match byte_order {
        SignalByteOrder::LittleEndian => LittleEndian::read_u64(&padded),
        SignalByteOrder::BigEndian => BigEndian::read_u64(&padded),
    }
}

fn sign_extend(raw: u64, bit_size: u32) -> i64 {
    if bit_size == 0 || bit_size >= 64 {
        return raw as i64;
    }
    let sign_bit = 1u64 << (bit_size - 1);
    if raw & sign_bit != 0 {
        (raw | !((1u64 << bit_size) - 1)) as i64
    } else {
        raw as i64
    }
}

impl Signal {
    /// Extracts the raw, unscaled field value from a frame payload.
    ///
    /// Returns `None` for an empty payload or a bit layout that does not fit
    /// a 64-bit word.
    pub fn raw_value(&self, data: &[u8]) -> Option<u64> {
        if data.is_empty() || self.bit_size == 0 || self.bit_size > 64 || self.start_bit >= 64 {
            return None;
        }
        let word = read_word(self.byte_order, data) >> self.start_bit;
        let mask = if self.bit_size == 64 {
            u64::max_value()
        } else {
            (1u64 << self.bit_size) - 1
        };
        Some(word & mask)
    }

    /// Extracts the physical value: raw bits interpreted per the signal's
    /// value type, then scaled by factor and offset.
    pub fn physical_value(&self, data: &[u8]) -> Option<f64> {
        let raw = self.raw_value(data)?;
        let value = match self.extended_value_type {
            ExtendedValueType::Float if self.bit_size == 32 => {
                f64::from(f32::from_bits(raw as u32))
            }
            ExtendedValueType::Double if self.bit_size == 64 => f64::from_bits(raw),
            _ => match self.value_type {
                ValueType::Signed => sign_extend(raw, self.bit_size) as f64,
                ValueType::Unsigned => raw as f64,
            },
        };
        Some(value * self.factor + self.offset)
    }
}

/// The collection of functions for parsing frame payloads `N` into their
/// physical signal values.
pub trait ParseFrame<N> {
    /// Parses payload type `N` into the physical signal value on success, or
    /// `None` on failure.
    fn parse_frame(&self, frame: N) -> Option<f64>;

    /// Returns a closure which parses payload type `N` into the physical
    /// signal value on success, or `None` on failure.
    fn parser(&self) -> Box<dyn Fn(N) -> Option<f64>>;
}

impl<'a> ParseFrame<&'a [u8]> for Signal {
    fn parse_frame(&self, frame: &[u8]) -> Option<f64> {
        self.physical_value(frame)
    }

    fn parser(&self) -> Box<dyn Fn(&[u8]) -> Option<f64>> {
        let signal = self.clone();
        Box::new(move |frame: &[u8]| signal.physical_value(frame))
    }
}

impl<'a> ParseFrame<&'a [u8; 8]> for Signal {
    fn parse_frame(&self, frame: &[u8; 8]) -> Option<f64> {
        self.physical_value(&frame[..])
    }

    fn parser(&self) -> Box<dyn Fn(&[u8; 8]) -> Option<f64>> {
        let signal = self.clone();
        Box::new(move |frame: &[u8; 8]| signal.physical_value(&frame[..]))
    }
}

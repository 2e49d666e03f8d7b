use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Bit helpers used by the decoder, the encoder and the status register.
/// Bit indexes go from lsb to msb (right to left).
pub trait Bits
where
    Self: Copy + Into<u64> + TryFrom<u64>,
    <Self as TryFrom<u64>>::Error: Debug,
{
    /// Number of bits of `Self`.
    const WIDTH: u8 = (size_of::<Self>() * 8) as u8;

    fn get_bit(&self, bit_idx: u8) -> bool {
        assert!(
            bit_idx < Self::WIDTH,
            "bit index {bit_idx} out of range for a {}-bit value",
            Self::WIDTH
        );
        let value: u64 = (*self).into();
        (value >> bit_idx) & 1 == 1
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool) {
        assert!(
            bit_idx < Self::WIDTH,
            "bit index {bit_idx} out of range for a {}-bit value",
            Self::WIDTH
        );
        let mut bitwise: u64 = (*self).into();
        if value {
            bitwise |= 1 << bit_idx;
        } else {
            bitwise &= !(1 << bit_idx);
        }
        *self = Self::try_from(bitwise).unwrap();
    }

    /// Extracts the bits in `bits_range` and moves them to position 0.
    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let mask = range_mask(&bits_range);
        let value: u64 = (*self).into();
        Self::try_from((value & mask) >> start).unwrap()
    }

    /// Replaces the bits in `bits_range` with the low bits of `value`.
    /// Bits of `value` that do not fit the range are discarded.
    fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self) {
        let start = *bits_range.start();
        let mask = range_mask(&bits_range);
        let bitwise: u64 = (*self).into();
        let value: u64 = value.into();
        *self = Self::try_from((bitwise & !mask) | ((value << start) & mask)).unwrap();
    }

    /// Returns a sign-extended copy of the value, `number_of_bits` being the
    /// width of the two's complement number stored in the low bits.
    fn sign_extended(&self, number_of_bits: u8) -> Self {
        debug_assert!(number_of_bits > 0 && number_of_bits <= Self::WIDTH);
        let value: u64 = (*self).into();
        let value = value & ((1 << number_of_bits) - 1);

        // Flipping the sign bit and subtracting it back borrows through
        // every upper bit when the sign bit was set.
        let sign: i64 = 1 << (number_of_bits - 1);
        let extended = ((value as i64) ^ sign) - sign;

        let width_mask = if Self::WIDTH == 64 {
            u64::MAX
        } else {
            (1 << Self::WIDTH) - 1
        };
        Self::try_from(extended as u64 & width_mask).unwrap()
    }
}

fn range_mask(bits_range: &RangeInclusive<u8>) -> u64 {
    let start = *bits_range.start();
    let end = *bits_range.end();
    debug_assert!(start <= end && end < 64);
    let length = u32::from(end - start + 1);
    let ones = if length == 64 {
        u64::MAX
    } else {
        (1 << length) - 1
    };
    ones << start
}

impl Bits for u64 {}
impl Bits for u32 {}
impl Bits for u16 {}
impl Bits for u8 {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn get_bit() {
        let b = 0b1011001110_u32;
        assert!(b.get_bit(1));
        assert!(!b.get_bit(0));
        assert!(b.get_bit(2));
        assert!(!b.get_bit(31));
    }

    #[test]
    #[should_panic]
    fn invalid_index() {
        let b = 0u8;
        b.get_bit(8);
    }

    #[test]
    fn set_bit() {
        let mut b = 0b1100110_u32;
        b.set_bit(0, true);
        b.set_bit(1, true);
        b.set_bit(2, false);
        b.set_bit(3, false);
        b.set_bit(31, true);
        assert_eq!(b, 0b1000_0000_0000_0000_0000_0000_0110_0011);
    }

    #[test]
    fn get_bits() {
        let b = 0b1011001110_u32;
        assert_eq!(b.get_bits(0..=3), 0b1110);
        assert_eq!(b.get_bits(1..=1), 0b1);
        assert_eq!(b.get_bits(4..=7), 0b1100);
        assert_eq!(b.get_bits(8..=9), 0b10);
        assert_eq!(b.get_bits(0..=31), 0b10_1100_1110);
        assert_eq!(0xE3A0_0001_u32.get_bits(28..=31), 0xE);
    }

    #[test]
    fn set_bits() {
        let mut b = 0_u32;
        b.set_bits(28..=31, 0xE);
        b.set_bits(21..=24, 0xD);
        b.set_bits(0..=7, 0x1FF);
        assert_eq!(b, 0xE1A0_00FF);

        b.set_bits(28..=31, 0x0);
        assert_eq!(b, 0x01A0_00FF);
    }

    #[test]
    fn check_sign_extended() {
        let a: u32 = 0b1001; // -7 in i4
        assert_eq!(a.sign_extended(4) as i32, -7);

        let b: u32 = 0x00FF_FFFE; // -2 in i24
        assert_eq!(b.sign_extended(24) as i32, -2);

        let c: u32 = 0x007F_FFFF;
        assert_eq!(c.sign_extended(24), 0x007F_FFFF);
    }
}

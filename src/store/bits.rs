//! Bit-packed boolean storage.
//!
//! Both store formats may keep boolean sequences packed eight to a byte,
//! least significant bit first. Values must be unpacked to `bool` before
//! flattening; the packed bytes are never exposed as a byte sequence.

use anyhow::{Result, ensure};

pub fn packed_len(bit_count: usize) -> usize {
    bit_count.div_ceil(8)
}

/// Unpacks bits `start..end` of `bytes`.
pub fn unpack_range(bytes: &[u8], start: usize, end: usize) -> Result<Vec<bool>> {
    ensure!(start <= end, "Bit range {start}..{end} is reversed");
    ensure!(
        packed_len(end) <= bytes.len(),
        "Bit range {start}..{end} needs {} byte(s) but only {} are stored",
        packed_len(end),
        bytes.len()
    );
    Ok((start..end)
        .map(|index| (bytes[index / 8] >> (index % 8)) & 1 == 1)
        .collect())
}

pub fn unpack(bytes: &[u8], len: usize) -> Result<Vec<bool>> {
    unpack_range(bytes, 0, len)
}

pub fn pack(values: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; packed_len(values.len())];
    for (index, value) in values.iter().enumerate() {
        if *value {
            bytes[index / 8] |= 1 << (index % 8);
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unpack_reads_least_significant_bit_first() {
        let bits = unpack(&[0b0000_0101, 0b0000_0001], 9).expect("unpack");
        assert_eq!(
            bits,
            vec![true, false, true, false, false, false, false, false, true]
        );
    }

    #[test]
    fn unpack_rejects_short_buffers() {
        let err = unpack(&[0xff], 9).expect_err("too few bytes");
        assert!(err.to_string().contains("needs 2 byte(s)"));
    }

    #[test]
    fn unpack_range_slices_across_byte_boundaries() {
        let packed = pack(&[false, false, false, false, false, false, true, true, false, true]);
        assert_eq!(
            unpack_range(&packed, 6, 10).expect("range"),
            vec![true, true, false, true]
        );
        assert!(unpack_range(&packed, 4, 2).is_err());
    }

    proptest! {
        #[test]
        fn pack_then_unpack_recovers_values(values in proptest::collection::vec(any::<bool>(), 0..70)) {
            let packed = pack(&values);
            prop_assert_eq!(packed.len(), packed_len(values.len()));
            prop_assert_eq!(unpack(&packed, values.len()).unwrap(), values);
        }
    }
}

//! 16-bit XOR-fold checksum.
//!
//! The input is read as big-endian 16-bit words (odd-length input is padded
//! on the right with one zero byte) and all words are XORed together.
//!
//! Any single-bit flip changes exactly one bit of the fold, so it is always
//! detected. Multi-bit errors that flip the same bit position in an even
//! number of words cancel out and go unnoticed: the checksum detects errors,
//! it does not guarantee catching all of them.

/// Compute the XOR fold of `data`.
pub fn fold(data: &[u8]) -> u16 {
    let mut words = data.chunks_exact(2);
    let mut checksum = words
        .by_ref()
        .fold(0u16, |acc, word| acc ^ u16::from_be_bytes([word[0], word[1]]));

    if let [last] = words.remainder() {
        checksum ^= u16::from_be_bytes([*last, 0x00]);
    }

    checksum
}

/// Check `data` against a previously computed checksum.
pub fn verify(data: &[u8], checksum: u16) -> bool {
    fold(data) == checksum
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fold_empty() {
        assert_eq!(fold(&[]), 0);
    }

    #[test]
    fn test_fold_known_vector() {
        // 0x40DF ^ 0x5266 = 0x12B9
        let data = [0x40, 0xDF, 0x52, 0x66];
        assert_eq!(fold(&data), 0x12B9);
        assert!(verify(&data, 0x12B9));
    }

    #[test]
    fn test_fold_pads_odd_length() {
        assert_eq!(fold(&[0xAB]), 0xAB00);
        assert_eq!(fold(&[0x12, 0x34, 0x56]), 0x1234 ^ 0x5600);
    }

    #[test]
    fn test_bad_data_rejected() {
        let good = [0x40, 0xDF, 0x52, 0x66];
        let bad = [0x41, 0xDF, 0x51, 0x61];
        let checksum = fold(&good);

        assert!(verify(&good, checksum));
        assert!(!verify(&bad, checksum));
    }

    #[test]
    fn test_cancelling_errors_are_a_known_gap() {
        // Same bit flipped in two different words cancels under XOR.
        let data = [0x00, 0x00, 0x00, 0x00];
        let tampered = [0x80, 0x00, 0x80, 0x00];
        assert!(verify(&tampered, fold(&data)));
    }

    proptest! {
        #[test]
        fn prop_single_bit_flip_detected(
            data in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let checksum = fold(&data);
            let mut flipped = data.clone();
            let i = index.index(flipped.len());
            flipped[i] ^= 1 << bit;
            prop_assert!(!verify(&flipped, checksum));
        }

        #[test]
        fn prop_verify_accepts_own_fold(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            prop_assert!(verify(&data, fold(&data)));
        }
    }
}

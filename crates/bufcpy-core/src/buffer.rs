// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Buffer preparation and inspection helpers for harnesses and tests.

/// Writes the per-index marker `buf[i] = i mod 256`.
#[allow(clippy::cast_possible_truncation)]
pub fn fill_sequence(buf: &mut [u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = (i & 0xFF) as u8;
    }
}

/// Resets every byte to zero.
pub fn zero(buf: &mut [u8]) {
    buf.fill(0);
}

/// Number of differing bytes over the common prefix of `a` and `b`.
pub fn diff_count(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_wraps_at_256() {
        let mut buf = vec![0xAAu8; 300];
        fill_sequence(&mut buf);
        assert_eq!(buf[0], 0);
        assert_eq!(buf[255], 255);
        assert_eq!(buf[256], 0);
        assert_eq!(buf[299], 43);
    }

    #[test]
    fn zero_and_diff() {
        let mut a = vec![0u8; 16];
        fill_sequence(&mut a);
        let b = vec![0u8; 20];
        // Index 0 is zero in both.
        assert_eq!(diff_count(&a, &b), 15);
        zero(&mut a);
        assert_eq!(diff_count(&a, &b), 0);
    }
}

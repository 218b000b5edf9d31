//! Packed bit vectors used for validity masks and boolean payloads.
//!
//! Bits are stored LSB-first within each byte, matching the on-disk layout of
//! the column file format: bit `i` lives in byte `i / 8` at position `i % 8`.

/// A growable, packed bit vector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bitmap {
    bytes: Vec<u8>,
    len: usize,
}

impl Bitmap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// A bitmap of `len` set bits (all rows valid).
    #[must_use]
    pub fn all_set(len: usize) -> Self {
        let mut bytes = vec![0xFF; len.div_ceil(8)];
        clear_tail(&mut bytes, len);
        Self { bytes, len }
    }

    /// A bitmap of `len` unset bits (all rows null).
    #[must_use]
    pub fn all_unset(len: usize) -> Self {
        Self {
            bytes: vec![0; len.div_ceil(8)],
            len,
        }
    }

    /// Rebuild a bitmap from its packed bytes.
    ///
    /// Returns `None` when `bytes` is not exactly `ceil(len / 8)` long. Padding
    /// bits past `len` are cleared so equality stays logical.
    #[must_use]
    pub fn from_bytes(mut bytes: Vec<u8>, len: usize) -> Option<Self> {
        if bytes.len() != len.div_ceil(8) {
            return None;
        }
        clear_tail(&mut bytes, len);
        Some(Self { bytes, len })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// # Panics
    /// Panics if `idx >= len`.
    #[inline]
    #[must_use]
    pub fn get(&self, idx: usize) -> bool {
        assert!(idx < self.len, "bit index {idx} out of range for length {}", self.len);
        (self.bytes[idx >> 3] >> (idx & 7)) & 1 == 1
    }

    /// # Panics
    /// Panics if `idx >= len`.
    #[inline]
    pub fn set(&mut self, idx: usize, value: bool) {
        assert!(idx < self.len, "bit index {idx} out of range for length {}", self.len);
        let mask = 1u8 << (idx & 7);
        if value {
            self.bytes[idx >> 3] |= mask;
        } else {
            self.bytes[idx >> 3] &= !mask;
        }
    }

    pub fn push(&mut self, value: bool) {
        if self.len & 7 == 0 {
            self.bytes.push(0);
        }
        self.len += 1;
        self.set(self.len - 1, value);
    }

    pub fn extend_from(&mut self, other: &Self) {
        for bit in other.iter() {
            self.push(bit);
        }
    }

    /// Number of unset bits.
    #[must_use]
    pub fn count_unset(&self) -> usize {
        let set: usize = self.bytes.iter().map(|b| b.count_ones() as usize).sum();
        self.len - set
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| self.get(i))
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut out = Self::with_capacity(iter.size_hint().0);
        for bit in iter {
            out.push(bit);
        }
        out
    }
}

fn clear_tail(bytes: &mut [u8], len: usize) {
    let rem = len & 7;
    if rem != 0
        && let Some(last) = bytes.last_mut()
    {
        *last &= (1u8 << rem) - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_get_cross_byte_boundary() {
        let bits: Bitmap = (0..19).map(|i| i % 3 == 0).collect();
        assert_eq!(bits.len(), 19);
        assert_eq!(bits.as_bytes().len(), 3);
        for i in 0..19 {
            assert_eq!(bits.get(i), i % 3 == 0, "bit {i}");
        }
        assert_eq!(bits.count_unset(), 12);
    }

    #[test]
    fn all_set_clears_padding() {
        let bits = Bitmap::all_set(10);
        assert_eq!(bits.as_bytes(), &[0xFF, 0b0000_0011]);
        assert_eq!(bits.count_unset(), 0);
    }

    #[test]
    fn from_bytes_rejects_wrong_length_and_masks_padding() {
        assert!(Bitmap::from_bytes(vec![0xFF], 9).is_none());
        let bits = Bitmap::from_bytes(vec![0xFF, 0xFF], 9).unwrap();
        assert_eq!(bits, Bitmap::all_set(9));
    }

    #[test]
    fn set_toggles_single_bit() {
        let mut bits = Bitmap::all_unset(12);
        bits.set(9, true);
        assert!(bits.get(9));
        bits.set(9, false);
        assert!(!bits.get(9));
        assert_eq!(bits.count_unset(), 12);
    }
}

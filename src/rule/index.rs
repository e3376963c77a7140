/// The largest pattern a [`PatternKey`] can hold, enough for a 5x5x5 window
pub const MAX_PATTERN_LEN: usize = u128::BITS as usize;

/// A neighborhood vector packed into a fixed-width bit pattern
///
/// Bit `i` holds the canonical form of entry `i` of the vector: `1` for any
/// non-zero (occupied) value, `0` otherwise. Codebook keys and lookup vectors
/// both pass through [`PatternKey::from_vector`], so they always share one
/// canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternKey(u128);

impl PatternKey {
    #[inline]
    fn canonical(value: i32) -> u128 {
        u128::from(value != 0)
    }

    /// Packs a vector, returning [`None`] if it is longer than [`MAX_PATTERN_LEN`]
    pub fn from_vector(vector: &[i32]) -> Option<Self> {
        if vector.len() > MAX_PATTERN_LEN {
            return None;
        }
        let bits = vector
            .iter()
            .enumerate()
            .fold(0, |acc, (i, &v)| acc | (Self::canonical(v) << i));
        Some(Self(bits))
    }

    #[inline]
    pub fn bits(self) -> u128 {
        self.0
    }

    /// Squared euclidean distance between the two canonical patterns
    ///
    /// Entries are 0 or 1, so this is the number of differing bits.
    #[inline]
    pub fn distance(self, other: Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Unpacks the first `len` entries back into a vector of 0/1 values
    pub fn to_vector(self, len: usize) -> Vec<i32> {
        (0..len.min(MAX_PATTERN_LEN))
            .map(|i| ((self.0 >> i) & 1) as i32)
            .collect()
    }
}

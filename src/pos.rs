use std::{
    cmp::Ordering,
    ops::{Add, Neg, Sub},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}
impl Pos3 {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
    #[inline]
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }
}
impl Default for Pos3 {
    #[inline]
    fn default() -> Self {
        Self::zero()
    }
}
impl PartialOrd for Pos3 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Pos3 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        // row-major: x is the slowest axis and z the fastest, matching the
        // flat layout of a volume
        Ord::cmp(&self.x, &other.x)
            .then(Ord::cmp(&self.y, &other.y))
            .then(Ord::cmp(&self.z, &other.z))
    }
}
impl Neg for Pos3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}
impl Add for Pos3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}
impl Sub for Pos3 {
    type Output = Pos3;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_row_major() {
        let mut positions = vec![
            Pos3::new(1, 0, 0),
            Pos3::new(0, 1, 0),
            Pos3::new(0, 0, 1),
            Pos3::new(0, 0, 0),
        ];
        positions.sort();

        assert_eq!(
            positions,
            vec![
                Pos3::new(0, 0, 0),
                Pos3::new(0, 0, 1),
                Pos3::new(0, 1, 0),
                Pos3::new(1, 0, 0),
            ]
        );
    }

    #[test]
    fn offsets_compose() {
        let center = Pos3::new(2, -1, 4);
        let offset = Pos3::new(1, 1, -1);

        assert_eq!(center + offset - offset, center);
        assert_eq!(center + -offset, center - offset);
        assert_eq!(Pos3::default(), Pos3::zero());
    }
}

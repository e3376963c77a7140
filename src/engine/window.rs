use crate::{Pos3, Volume};

/// A single pass over every cell's neighborhood vector
///
/// Yields `(position, vector)` in row-major order. Cells outside the volume
/// read as `0`. Created by [`Volume::neighborhoods`].
pub struct Neighborhoods<'a> {
    volume: &'a Volume,
    window: usize,
    next_idx: usize,
}
impl<'a> Neighborhoods<'a> {
    pub(crate) fn new(volume: &'a Volume, window: usize) -> Self {
        Self {
            volume,
            window,
            next_idx: 0,
        }
    }

    /// Side length of the window
    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Index of the center cell inside every yielded vector
    #[inline]
    pub fn center_index(&self) -> usize {
        self.window.pow(3) / 2
    }
}

impl Iterator for Neighborhoods<'_> {
    type Item = (Pos3, Vec<i32>);

    fn next(&mut self) -> Option<Self::Item> {
        let shape = self.volume.shape();
        if self.next_idx >= shape.len() {
            return None;
        }
        let pos = shape.pos_of(self.next_idx);
        self.next_idx += 1;

        let mut vector = Vec::with_capacity(self.window.pow(3));
        self.volume.neighborhood_into(pos, self.window, &mut vector);
        Some((pos, vector))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.volume.shape().len() - self.next_idx;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Neighborhoods<'_> {}

#[cfg(test)]
mod tests {
    use crate::{Pos3, Shape, Volume};

    #[test]
    fn yields_every_cell_once_in_order() {
        let volume = Volume::zeros(Shape::new(2, 3, 2)).unwrap();
        let positions: Vec<Pos3> = volume.neighborhoods(3).unwrap().map(|(p, _)| p).collect();

        assert_eq!(positions.len(), 12);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn fresh_call_restarts_the_scan() {
        let mut volume = Volume::zeros(Shape::new(2, 2, 2)).unwrap();
        volume.set(Pos3::new(1, 1, 1), 2);

        let first: Vec<_> = volume.neighborhoods(3).unwrap().collect();
        let second: Vec<_> = volume.neighborhoods(3).unwrap().collect();

        assert_eq!(first, second);
    }

    #[test]
    fn window_of_one_is_the_cell_itself() {
        let mut volume = Volume::zeros(Shape::new(1, 2, 2)).unwrap();
        volume.set(Pos3::new(0, 1, 0), 7);

        let hood = volume.neighborhoods(1).unwrap();
        assert_eq!(hood.center_index(), 0);
        let values: Vec<Vec<i32>> = hood.map(|(_, v)| v).collect();

        assert_eq!(values, vec![vec![0], vec![0], vec![7], vec![0]]);
    }
}

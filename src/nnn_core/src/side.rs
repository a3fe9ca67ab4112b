use fxhash::FxHashMap;
use log::trace;

use crate::face::Face;

/// One of the four edges of a side, named by compass direction when looking
/// straight at the face.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EdgeDir {
    North,
    West,
    South,
    East,
}

impl EdgeDir {
    pub const ALL: [Self; 4] = [EdgeDir::North, EdgeDir::West, EdgeDir::South, EdgeDir::East];
}

/// A view onto the positions of a single face. Positions are indexes into the
/// cube's facelet array, so they are shared by every method that reads the
/// state.
///
/// North and south edges run left to right, west and east edges run top to
/// bottom.
#[derive(Debug, Clone)]
pub struct Side {
    pub face: Face,
    pub size: usize,
    pub min_pos: usize,
    pub max_pos: usize,
    pub mid_pos: Option<usize>,
    /// Top left, top right, bottom left, bottom right.
    pub corner_pos: [usize; 4],
    pub center_pos: Vec<usize>,
    /// The four corners of the center block, empty for 2x2x2.
    pub center_corner_pos: Vec<usize>,
    /// The middle of each center block edge, only present from 5x5x5 up.
    pub center_edge_pos: Vec<usize>,
    pub edge_north_pos: Vec<usize>,
    pub edge_west_pos: Vec<usize>,
    pub edge_south_pos: Vec<usize>,
    pub edge_east_pos: Vec<usize>,
    pub(crate) wing_partner: FxHashMap<usize, usize>,
}

impl Side {
    #[must_use]
    pub fn new(face: Face, size: usize) -> Self {
        let squares_per_side = size * size;
        let min_pos = face.index() * squares_per_side + 1;
        let max_pos = min_pos + squares_per_side - 1;
        let pos = |row: usize, col: usize| min_pos + row * size + col;

        let mid_pos = (size % 2 == 1).then(|| (min_pos + max_pos) / 2);
        let corner_pos = [
            pos(0, 0),
            pos(0, size - 1),
            pos(size - 1, 0),
            pos(size - 1, size - 1),
        ];

        let inner = 1..size.saturating_sub(1);
        let edge_north_pos = inner.clone().map(|col| pos(0, col)).collect();
        let edge_south_pos = inner.clone().map(|col| pos(size - 1, col)).collect();
        let edge_west_pos = inner.clone().map(|row| pos(row, 0)).collect();
        let edge_east_pos = inner.clone().map(|row| pos(row, size - 1)).collect();
        let center_pos = inner
            .clone()
            .flat_map(|row| inner.clone().map(move |col| pos(row, col)))
            .collect();

        let center_corner_pos = if size >= 3 {
            vec![
                pos(1, 1),
                pos(1, size - 2),
                pos(size - 2, 1),
                pos(size - 2, size - 2),
            ]
        } else {
            vec![]
        };

        let center_edge_pos = if size >= 5 {
            vec![
                pos(1, 2),
                pos(2, 1),
                pos(2, size - 2),
                pos(size - 2, 2),
            ]
        } else {
            vec![]
        };

        let side = Side {
            face,
            size,
            min_pos,
            max_pos,
            mid_pos,
            corner_pos,
            center_pos,
            center_corner_pos,
            center_edge_pos,
            edge_north_pos,
            edge_west_pos,
            edge_south_pos,
            edge_east_pos,
            wing_partner: FxHashMap::default(),
        };
        trace!(
            "Side {face}: positions {}..={}, corners {:?}, center corners {:?}",
            side.min_pos, side.max_pos, side.corner_pos, side.center_corner_pos
        );
        side
    }

    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        (self.min_pos..=self.max_pos).contains(&position)
    }

    #[must_use]
    pub fn edge(&self, dir: EdgeDir) -> &[usize] {
        match dir {
            EdgeDir::North => &self.edge_north_pos,
            EdgeDir::West => &self.edge_west_pos,
            EdgeDir::South => &self.edge_south_pos,
            EdgeDir::East => &self.edge_east_pos,
        }
    }

    /// Which edge of this side `position` lies on, `None` for corners and
    /// centers.
    #[must_use]
    pub fn edge_dir_of(&self, position: usize) -> Option<EdgeDir> {
        EdgeDir::ALL
            .into_iter()
            .find(|dir| self.edge(*dir).contains(&position))
    }

    pub fn edge_pos(&self) -> impl Iterator<Item = usize> + '_ {
        EdgeDir::ALL
            .into_iter()
            .flat_map(|dir| self.edge(dir).iter().copied())
    }

    #[must_use]
    pub fn get_wing_partner(&self, position: usize) -> Option<usize> {
        self.wing_partner.get(&position).copied()
    }

    /// The position used to decide which color this side "is". Odd cubes have
    /// a fixed middle; even cubes fall back to the first center corner and
    /// 2x2x2 to the first corner.
    #[must_use]
    pub fn reference_pos(&self) -> usize {
        self.mid_pos
            .or_else(|| self.center_corner_pos.first().copied())
            .unwrap_or(self.corner_pos[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_layout_4x4() {
        let side = Side::new(Face::L, 4);
        assert_eq!(side.min_pos, 17);
        assert_eq!(side.max_pos, 32);
        assert_eq!(side.corner_pos, [17, 20, 29, 32]);
        assert_eq!(side.edge_north_pos, [18, 19]);
        assert_eq!(side.edge_south_pos, [30, 31]);
        assert_eq!(side.edge_west_pos, [21, 25]);
        assert_eq!(side.edge_east_pos, [24, 28]);
        assert_eq!(side.center_pos, [22, 23, 26, 27]);
        assert_eq!(side.center_corner_pos, [22, 23, 26, 27]);
        assert!(side.center_edge_pos.is_empty());
        assert_eq!(side.mid_pos, None);
    }

    #[test]
    fn side_layout_5x5() {
        let side = Side::new(Face::U, 5);
        assert_eq!(side.mid_pos, Some(13));
        assert_eq!(side.center_corner_pos, [7, 9, 17, 19]);
        assert_eq!(side.center_edge_pos, [8, 12, 14, 18]);
        assert_eq!(side.edge_dir_of(16), Some(EdgeDir::West));
        assert_eq!(side.edge_dir_of(1), None);
        assert_eq!(side.edge_dir_of(13), None);
        assert_eq!(side.reference_pos(), 13);
    }
}

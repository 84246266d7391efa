use serde::{Deserialize, Serialize};

/// Neighbourhood rule between terminal cells of equal level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Adjacency {
    /// Shared edge (4-connected).
    Edge,
    /// Shared edge or the rising diagonal (6-connected).
    EdgeAndRisingDiagonal,
    /// Shared edge or corner (8-connected).
    #[default]
    EdgeAndCorner,
}

const EDGE: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const RISING: [(i64, i64); 6] = [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, 1)];
const CORNER: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Adjacency {
    pub fn offsets(self) -> &'static [(i64, i64)] {
        match self {
            Adjacency::Edge => &EDGE,
            Adjacency::EdgeAndRisingDiagonal => &RISING,
            Adjacency::EdgeAndCorner => &CORNER,
        }
    }

    /// In-range neighbour cells of `(ix, iy)`. The θ axis does not wrap.
    pub fn neighbours(self, (ix, iy): (u32, u32)) -> impl Iterator<Item = (u32, u32)> {
        self.offsets().iter().filter_map(move |&(dx, dy)| {
            let x = ix as i64 + dx;
            let y = iy as i64 + dy;
            if x < 0 || y < 0 || x > u32::MAX as i64 || y > u32::MAX as i64 {
                None
            } else {
                Some((x as u32, y as u32))
            }
        })
    }
}

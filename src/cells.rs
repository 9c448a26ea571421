use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::convert::From;

use crate::units::Width;

#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Cartesian2DCoordinate {
    pub x: u32,
    pub y: u32,
}

impl Cartesian2DCoordinate {
    pub fn new(x: u32, y: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate { x, y }
    }

    #[inline]
    pub fn from_row_major_index(index: usize, width: Width) -> Cartesian2DCoordinate {
        let Width(w) = width;
        let x = index % w;
        let y = index / w;
        Cartesian2DCoordinate::new(x as u32, y as u32)
    }
}

impl From<(u32, u32)> for Cartesian2DCoordinate {
    fn from(x_y_pair: (u32, u32)) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate::new(x_y_pair.0, x_y_pair.1)
    }
}

pub type CoordinateSmallVec = SmallVec<[Cartesian2DCoordinate; 4]>;
pub type CoordinateOptionSmallVec = SmallVec<[Option<Cartesian2DCoordinate>; 4]>;

#[derive(Eq, PartialEq, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum CompassPrimary {
    North,
    South,
    East,
    West,
}

pub const COMPASS_PRIMARIES: [CompassPrimary; 4] = [CompassPrimary::North,
                                                    CompassPrimary::South,
                                                    CompassPrimary::East,
                                                    CompassPrimary::West];

impl CompassPrimary {
    pub fn opposite(self) -> CompassPrimary {
        match self {
            CompassPrimary::North => CompassPrimary::South,
            CompassPrimary::South => CompassPrimary::North,
            CompassPrimary::East => CompassPrimary::West,
            CompassPrimary::West => CompassPrimary::East,
        }
    }
}

/// Creates a new `Cartesian2DCoordinate` offset 1 cell away in the given direction.
/// Returns None if the coordinate is not representable (u32 underflow going
/// north or west). Validity against any particular grid's dimensions is the
/// grid's own decision.
pub fn offset_coordinate(coord: Cartesian2DCoordinate,
                         dir: CompassPrimary)
                         -> Option<Cartesian2DCoordinate> {
    let (x, y) = (coord.x, coord.y);
    match dir {
        CompassPrimary::North => {
            if y > 0 {
                Some(Cartesian2DCoordinate { x, y: y - 1 })
            } else {
                None
            }
        }
        CompassPrimary::South => Some(Cartesian2DCoordinate { x, y: y + 1 }),
        CompassPrimary::East => Some(Cartesian2DCoordinate { x: x + 1, y }),
        CompassPrimary::West => {
            if x > 0 {
                Some(Cartesian2DCoordinate { x: x - 1, y })
            } else {
                None
            }
        }
    }
}

/// One boolean per cell edge. A set flag is a *local* claim that the edge is
/// walled; whether the wall actually blocks passage between two adjacent
/// cells requires both facing flags to agree (see the grid's queries).
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct WallFlags {
    north: bool,
    south: bool,
    east: bool,
    west: bool,
}

impl WallFlags {
    #[inline]
    pub fn is_set(&self, dir: CompassPrimary) -> bool {
        match dir {
            CompassPrimary::North => self.north,
            CompassPrimary::South => self.south,
            CompassPrimary::East => self.east,
            CompassPrimary::West => self.west,
        }
    }

    #[inline]
    pub fn set(&mut self, dir: CompassPrimary) {
        self.put(dir, true);
    }

    #[inline]
    pub fn clear(&mut self, dir: CompassPrimary) {
        self.put(dir, false);
    }

    fn put(&mut self, dir: CompassPrimary, walled: bool) {
        match dir {
            CompassPrimary::North => self.north = walled,
            CompassPrimary::South => self.south = walled,
            CompassPrimary::East => self.east = walled,
            CompassPrimary::West => self.west = walled,
        }
    }
}

/// Per cell data owned by the grid: the four wall flags and the transient
/// subregion tag. The tag is partition scratch state, binary (0/1) while a
/// split is in progress and `None` otherwise.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct CellState {
    pub walls: WallFlags,
    pub subregion: Option<u8>,
}

use error_chain::bail;
use petgraph::graph::NodeIndex;
use petgraph::{Graph, Undirected};
use rand::{Rng, XorShiftRng};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::cells::{offset_coordinate, Cartesian2DCoordinate, CellState, CompassPrimary,
                   CoordinateOptionSmallVec, CoordinateSmallVec, COMPASS_PRIMARIES};
use crate::errors::*;
use crate::units::{CellSize, Height, Width};

/// Render the contents of a grid cell as text.
/// The String should be 3 glyphs long, padded if required.
pub trait GridDisplay {
    fn render_cell_body(&self, _: Cartesian2DCoordinate) -> String {
        String::from("   ")
    }
}

/// A rectangular arena of cells with Von Neumann adjacency.
///
/// The grid is the sole owner of every cell: neighbour "references" are
/// bounds checked coordinate offsets into the arena, so the adjacency is
/// symmetric by construction and never mutated after `new`. Only wall flags
/// and subregion tags change over the grid's lifetime.
pub struct Grid {
    width: Width,
    height: Height,
    cell_size: CellSize,
    cells: Vec<CellState>,
    grid_display: Option<Rc<dyn GridDisplay>>,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "Grid :: width: {:?}, height: {:?}, cell_size: {:?}",
               self.width,
               self.height,
               self.cell_size)
    }
}

impl Grid {
    /// Allocate a `width` x `height` grid of cells with all wall flags clear
    /// and no subregion tags. Fails fast when either dimension is zero.
    pub fn new(width: Width, height: Height, cell_size: CellSize) -> Result<Grid> {
        if width.0 == 0 || height.0 == 0 {
            bail!(ErrorKind::InvalidGridDimensions(width.0, height.0));
        }

        let cells_count = width.0 * height.0;
        Ok(Grid {
            width,
            height,
            cell_size,
            cells: vec![CellState::default(); cells_count],
            grid_display: None,
        })
    }

    #[inline]
    pub fn set_grid_display(&mut self, grid_display: Option<Rc<dyn GridDisplay>>) {
        self.grid_display = grid_display;
    }

    #[inline]
    pub fn grid_display(&self) -> &Option<Rc<dyn GridDisplay>> {
        &self.grid_display
    }

    #[inline]
    pub fn width(&self) -> Width {
        self.width
    }

    #[inline]
    pub fn height(&self) -> Height {
        self.height
    }

    #[inline]
    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.width.0 * self.height.0
    }

    #[inline]
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        (x as usize) < self.width.0 && (y as usize) < self.height.0
    }

    #[inline]
    pub fn is_valid_coordinate(&self, coord: Cartesian2DCoordinate) -> bool {
        self.in_bounds(coord.x, coord.y)
    }

    /// Convert a grid coordinate to a one dimensional index in the range
    /// 0...grid.size(). Returns None if the grid coordinate is invalid.
    #[inline]
    pub fn grid_coordinate_to_index(&self, coord: Cartesian2DCoordinate) -> Option<usize> {
        if self.is_valid_coordinate(coord) {
            Some(coord.y as usize * self.width.0 + coord.x as usize)
        } else {
            None
        }
    }

    pub fn random_cell(&self, rng: &mut XorShiftRng) -> Cartesian2DCoordinate {
        let index = rng.gen::<usize>() % self.size();
        Cartesian2DCoordinate::from_row_major_index(index, self.width)
    }

    /// Cell nodes that are to the North, South, East or West of a particular
    /// node, whether or not any walls sit between them.
    pub fn neighbours(&self, coord: Cartesian2DCoordinate) -> CoordinateSmallVec {
        COMPASS_PRIMARIES.iter()
            .filter_map(|dir| self.neighbour_at_direction(coord, *dir))
            .collect()
    }

    pub fn neighbour_at_direction(&self,
                                  coord: Cartesian2DCoordinate,
                                  direction: CompassPrimary)
                                  -> Option<Cartesian2DCoordinate> {
        offset_coordinate(coord, direction)
            .and_then(|neighbour_coord| if self.is_valid_coordinate(neighbour_coord) {
                Some(neighbour_coord)
            } else {
                None
            })
    }

    pub fn neighbours_at_directions(&self,
                                    coord: Cartesian2DCoordinate,
                                    dirs: &[CompassPrimary])
                                    -> CoordinateOptionSmallVec {
        dirs.iter()
            .map(|direction| self.neighbour_at_direction(coord, *direction))
            .collect()
    }

    /// The local wall flag on `coord`'s side of the given edge.
    ///
    /// Panics if the coordinate is not within the grid.
    #[inline]
    pub fn wall(&self, coord: Cartesian2DCoordinate, direction: CompassPrimary) -> bool {
        self.cell(coord).walls.is_set(direction)
    }

    /// Set the local wall flag on `coord`'s side of the given edge.
    ///
    /// Panics if the coordinate is not within the grid.
    #[inline]
    pub fn set_wall(&mut self, coord: Cartesian2DCoordinate, direction: CompassPrimary) {
        self.cell_mut(coord).walls.set(direction);
    }

    /// Clear the local wall flag on `coord`'s side of the given edge.
    ///
    /// Panics if the coordinate is not within the grid.
    #[inline]
    pub fn clear_wall(&mut self, coord: Cartesian2DCoordinate, direction: CompassPrimary) {
        self.cell_mut(coord).walls.clear(direction);
    }

    /// Is there a real wall on this edge - one that blocks movement and is
    /// rendered?
    ///
    /// A wall flag on one side is only a local claim. The wall counts when
    /// both facing flags agree, or when there is no neighbour because the
    /// edge lies on the grid boundary.
    pub fn is_wall_blocking(&self, coord: Cartesian2DCoordinate, direction: CompassPrimary) -> bool {
        if !self.wall(coord, direction) {
            return false;
        }
        match self.neighbour_at_direction(coord, direction) {
            Some(neighbour) => self.wall(neighbour, direction.opposite()),
            None => true,
        }
    }

    /// Is a move from `coord` in `direction` legal?
    ///
    /// Legal iff the target neighbour exists and it is not the case that both
    /// the current cell's flag and the neighbour's opposing flag are set -
    /// the same double confirmation rule the renderer uses.
    pub fn can_move(&self, coord: Cartesian2DCoordinate, direction: CompassPrimary) -> bool {
        match self.neighbour_at_direction(coord, direction) {
            Some(neighbour) => {
                !(self.wall(coord, direction) && self.wall(neighbour, direction.opposite()))
            }
            None => false,
        }
    }

    /// Neighbouring cells reachable in one legal move.
    pub fn open_neighbours(&self, coord: Cartesian2DCoordinate) -> CoordinateSmallVec {
        COMPASS_PRIMARIES.iter()
            .filter(|dir| self.can_move(coord, **dir))
            .filter_map(|dir| self.neighbour_at_direction(coord, *dir))
            .collect()
    }

    #[inline]
    pub fn subregion(&self, coord: Cartesian2DCoordinate) -> Option<u8> {
        self.cell(coord).subregion
    }

    #[inline]
    pub fn set_subregion(&mut self, coord: Cartesian2DCoordinate, tag: u8) {
        self.cell_mut(coord).subregion = Some(tag);
    }

    /// Clear the transient subregion tag on every cell. Idempotent.
    pub fn reset_subregions(&mut self) {
        for cell in &mut self.cells {
            cell.subregion = None;
        }
    }

    /// The number of open passages in the grid, counting each cell pair once.
    /// A perfect maze over n cells has exactly n - 1 of them.
    pub fn passages_count(&self) -> usize {
        self.iter()
            .map(|coord| {
                [CompassPrimary::East, CompassPrimary::South]
                    .iter()
                    .filter(|dir| self.can_move(coord, **dir))
                    .count()
            })
            .sum()
    }

    /// View of the open passages as an undirected graph, one node per cell in
    /// row major order. Lets callers lean on graph algorithms for analysis,
    /// e.g. `petgraph::algo::connected_components` for reachability.
    pub fn passage_graph(&self) -> Graph<(), (), Undirected> {
        let mut graph = Graph::with_capacity(self.size(), self.size() * 2);
        for _ in 0..self.size() {
            let _ = graph.add_node(());
        }

        for coord in self.iter() {
            for dir in [CompassPrimary::East, CompassPrimary::South].iter() {
                if self.can_move(coord, *dir) {
                    let neighbour = self.neighbour_at_direction(coord, *dir)
                        .expect("open passage always has a neighbour");
                    let a = self.grid_coordinate_to_index(coord)
                        .expect("iterated coordinate is always valid");
                    let b = self.grid_coordinate_to_index(neighbour)
                        .expect("neighbour coordinate is always valid");
                    let _ = graph.update_edge(NodeIndex::new(a), NodeIndex::new(b), ());
                }
            }
        }

        graph
    }

    /// An owned copy of the grid's observable state, cheap enough to emit
    /// once per generation step and suitable for persistence.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width.0,
            height: self.height.0,
            cell_size: self.cell_size.0,
            cells: self.cells.clone(),
        }
    }

    #[inline]
    pub fn iter(&self) -> CellIter {
        CellIter {
            current_cell_number: 0,
            width: self.width,
            cells_count: self.size(),
        }
    }

    pub fn iter_row(&self) -> BatchIter {
        BatchIter {
            iter_type: BatchIterType::Row,
            current_index: 0,
            width: self.width,
            height: self.height,
        }
    }

    pub fn iter_column(&self) -> BatchIter {
        BatchIter {
            iter_type: BatchIterType::Column,
            current_index: 0,
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    fn cell(&self, coord: Cartesian2DCoordinate) -> &CellState {
        let index = self.grid_coordinate_to_index(coord)
            .expect("cell coordinate out of grid bounds");
        &self.cells[index]
    }

    #[inline]
    fn cell_mut(&mut self, coord: Cartesian2DCoordinate) -> &mut CellState {
        let index = self.grid_coordinate_to_index(coord)
            .expect("cell coordinate out of grid bounds");
        &mut self.cells[index]
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {

        const WALL_L: &str = "╴";
        const WALL_R: &str = "╶";
        const WALL_U: &str = "╵";
        const WALL_D: &str = "╷";
        const WALL_LR_3: &str = "───";
        const WALL_LR: &str = "─";
        const WALL_UD: &str = "│";
        const WALL_LD: &str = "┐";
        const WALL_RU: &str = "└";
        const WALL_LU: &str = "┘";
        const WALL_RD: &str = "┌";
        const WALL_LRU: &str = "┴";
        const WALL_LRD: &str = "┬";
        const WALL_LRUD: &str = "┼";
        const WALL_RUD: &str = "├";
        const WALL_LUD: &str = "┤";

        let (columns, rows) = (self.width.0, self.height.0);
        let gc = |x: usize, y: usize| Cartesian2DCoordinate::new(x as u32, y as u32);

        // A horizontal wall segment below grid line `line` at column `x` is
        // visible when the facing cells (or boundary) confirm it. Same double
        // confirmation rule as movement blocking.
        let horizontal_segment = |x: usize, line: usize| -> bool {
            if line < rows {
                self.is_wall_blocking(gc(x, line), CompassPrimary::North)
            } else {
                self.is_wall_blocking(gc(x, line - 1), CompassPrimary::South)
            }
        };
        let vertical_segment = |line: usize, y: usize| -> bool {
            if line < columns {
                self.is_wall_blocking(gc(line, y), CompassPrimary::West)
            } else {
                self.is_wall_blocking(gc(line - 1, y), CompassPrimary::East)
            }
        };

        let render_cell_body = |coord: Cartesian2DCoordinate| -> String {
            if let Some(ref displayer) = self.grid_display {
                displayer.render_cell_body(coord)
            } else if let Some(tag) = self.subregion(coord) {
                format!(" {} ", tag)
            } else {
                String::from("   ")
            }
        };

        let mut output = String::new();
        for corner_y in 0..(rows + 1) {

            // Corner glyphs join up to four incident wall segments. Resolve
            // which of the four directions out of the corner point show a wall.
            for corner_x in 0..(columns + 1) {
                let show_left_section = corner_x > 0 && horizontal_segment(corner_x - 1, corner_y);
                let show_right_section = corner_x < columns &&
                                         horizontal_segment(corner_x, corner_y);
                let show_up_section = corner_y > 0 && vertical_segment(corner_x, corner_y - 1);
                let show_down_section = corner_y < rows && vertical_segment(corner_x, corner_y);

                let corner = match (show_left_section,
                                    show_right_section,
                                    show_up_section,
                                    show_down_section) {
                    (true, true, true, true) => WALL_LRUD,
                    (true, true, true, false) => WALL_LRU,
                    (true, true, false, true) => WALL_LRD,
                    (true, false, true, true) => WALL_LUD,
                    (false, true, true, true) => WALL_RUD,
                    (true, true, false, false) => WALL_LR,
                    (false, false, true, true) => WALL_UD,
                    (false, true, true, false) => WALL_RU,
                    (true, false, false, true) => WALL_LD,
                    (true, false, true, false) => WALL_LU,
                    (false, true, false, true) => WALL_RD,
                    (true, false, false, false) => WALL_L,
                    (false, true, false, false) => WALL_R,
                    (false, false, true, false) => WALL_U,
                    (false, false, false, true) => WALL_D,
                    _ => " ",
                };
                output.push_str(corner);

                if corner_x < columns {
                    if horizontal_segment(corner_x, corner_y) {
                        output.push_str(WALL_LR_3);
                    } else {
                        output.push_str("   ");
                    }
                }
            }
            output.push('\n');

            if corner_y < rows {
                for line_x in 0..(columns + 1) {
                    if vertical_segment(line_x, corner_y) {
                        output.push_str(WALL_UD);
                    } else {
                        output.push(' ');
                    }
                    if line_x < columns {
                        output.push_str(&render_cell_body(gc(line_x, corner_y)));
                    }
                }
                output.push('\n');
            }
        }

        write!(f, "{}", output)
    }
}

/// One generation step's view of the whole grid. Owned data, serializable,
/// detached from the live grid.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    width: usize,
    height: usize,
    cell_size: u32,
    cells: Vec<CellState>,
}

impl GridSnapshot {
    #[inline]
    pub fn width(&self) -> Width {
        Width(self.width)
    }

    #[inline]
    pub fn height(&self) -> Height {
        Height(self.height)
    }

    #[inline]
    pub fn cell_size(&self) -> CellSize {
        CellSize(self.cell_size)
    }

    pub fn wall(&self, coord: Cartesian2DCoordinate, direction: CompassPrimary) -> bool {
        self.cell(coord).map_or(false, |cell| cell.walls.is_set(direction))
    }

    pub fn subregion(&self, coord: Cartesian2DCoordinate) -> Option<u8> {
        self.cell(coord).and_then(|cell| cell.subregion)
    }

    fn cell(&self, coord: Cartesian2DCoordinate) -> Option<&CellState> {
        if (coord.x as usize) < self.width && (coord.y as usize) < self.height {
            self.cells.get(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct CellIter {
    current_cell_number: usize,
    width: Width,
    cells_count: usize,
}
impl Iterator for CellIter {
    type Item = Cartesian2DCoordinate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.current_cell_number < self.cells_count {
            let coord = Cartesian2DCoordinate::from_row_major_index(self.current_cell_number,
                                                                    self.width);
            self.current_cell_number += 1;
            Some(coord)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let lower_bound = self.cells_count - self.current_cell_number;
        let upper_bound = lower_bound;
        (lower_bound, Some(upper_bound))
    }
}
impl ExactSizeIterator for CellIter {} // default impl using size_hint()

// Converting a &Grid into an iterator CellIter - the default most sensible.
impl<'a> IntoIterator for &'a Grid {
    type Item = Cartesian2DCoordinate;
    type IntoIter = CellIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Copy, Clone)]
enum BatchIterType {
    Row,
    Column,
}

#[derive(Debug, Copy, Clone)]
pub struct BatchIter {
    iter_type: BatchIterType,
    current_index: usize,
    width: Width,
    height: Height,
}
impl Iterator for BatchIter {
    type Item = Vec<Cartesian2DCoordinate>;
    fn next(&mut self) -> Option<Self::Item> {
        let (batches, length) = if let BatchIterType::Row = self.iter_type {
            (self.height.0, self.width.0)
        } else {
            (self.width.0, self.height.0)
        };

        if self.current_index < batches {
            let coords = (0..length)
                .map(|i| if let BatchIterType::Row = self.iter_type {
                    Cartesian2DCoordinate::new(i as u32, self.current_index as u32)
                } else {
                    Cartesian2DCoordinate::new(self.current_index as u32, i as u32)
                })
                .collect();
            self.current_index += 1;
            Some(coords)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let batches = if let BatchIterType::Row = self.iter_type {
            self.height.0
        } else {
            self.width.0
        };
        let lower_bound = batches - self.current_index;
        let upper_bound = lower_bound;
        (lower_bound, Some(upper_bound))
    }
}
impl ExactSizeIterator for BatchIter {} // default impl using size_hint()

#[cfg(test)]
mod tests {

    use itertools::Itertools; // a trait
    use petgraph::algo::connected_components;
    use rand;

    use super::*;
    use crate::cells::COMPASS_PRIMARIES;
    use crate::units::{CellSize, Height, Width};

    fn small_grid(w: usize, h: usize) -> Grid {
        Grid::new(Width(w), Height(h), CellSize(10)).expect("grid dimensions are invalid")
    }

    #[test]
    fn zero_sized_grids_are_rejected() {
        assert!(Grid::new(Width(0), Height(4), CellSize(10)).is_err());
        assert!(Grid::new(Width(4), Height(0), CellSize(10)).is_err());
        assert!(Grid::new(Width(0), Height(0), CellSize(10)).is_err());
    }

    #[test]
    fn grid_size() {
        let g = small_grid(10, 10);
        assert_eq!(g.size(), 100);
    }

    #[test]
    fn bounds_checks() {
        let g = small_grid(3, 2);
        assert!(g.in_bounds(0, 0));
        assert!(g.in_bounds(2, 1));
        assert!(!g.in_bounds(3, 0));
        assert!(!g.in_bounds(0, 2));
        assert!(!g.is_valid_coordinate(Cartesian2DCoordinate::new(3, 2)));
    }

    #[test]
    fn neighbour_cells() {
        let g = small_grid(10, 10);

        let check_expected_neighbours = |coord, expected_neighbours: &[Cartesian2DCoordinate]| {
            let neighbours: Vec<Cartesian2DCoordinate> = g.neighbours(coord)
                .iter()
                .cloned()
                .sorted();
            let expected: Vec<Cartesian2DCoordinate> =
                expected_neighbours.iter().cloned().sorted();
            assert_eq!(neighbours, expected);
        };
        let gc = |x, y| Cartesian2DCoordinate::new(x, y);

        // corners
        check_expected_neighbours(gc(0, 0), &[gc(1, 0), gc(0, 1)]);
        check_expected_neighbours(gc(9, 0), &[gc(8, 0), gc(9, 1)]);
        check_expected_neighbours(gc(0, 9), &[gc(0, 8), gc(1, 9)]);
        check_expected_neighbours(gc(9, 9), &[gc(9, 8), gc(8, 9)]);

        // side element examples
        check_expected_neighbours(gc(1, 0), &[gc(0, 0), gc(1, 1), gc(2, 0)]);
        check_expected_neighbours(gc(0, 1), &[gc(0, 0), gc(0, 2), gc(1, 1)]);

        // Some place with 4 neighbours inside the grid
        check_expected_neighbours(gc(1, 1), &[gc(0, 1), gc(1, 0), gc(2, 1), gc(1, 2)]);
    }

    #[test]
    fn neighbour_at_dir() {
        let g = small_grid(2, 2);
        let gc = |x, y| Cartesian2DCoordinate::new(x, y);
        let check_neighbour = |coord, dir: CompassPrimary, expected| {
            assert_eq!(g.neighbour_at_direction(coord, dir), expected);
        };
        check_neighbour(gc(0, 0), CompassPrimary::North, None);
        check_neighbour(gc(0, 0), CompassPrimary::South, Some(gc(0, 1)));
        check_neighbour(gc(0, 0), CompassPrimary::East, Some(gc(1, 0)));
        check_neighbour(gc(0, 0), CompassPrimary::West, None);

        check_neighbour(gc(1, 1), CompassPrimary::North, Some(gc(1, 0)));
        check_neighbour(gc(1, 1), CompassPrimary::South, None);
        check_neighbour(gc(1, 1), CompassPrimary::East, None);
        check_neighbour(gc(1, 1), CompassPrimary::West, Some(gc(0, 1)));
    }

    #[test]
    fn adjacency_is_always_symmetric() {
        let g = small_grid(5, 4);
        for coord in g.iter() {
            for dir in COMPASS_PRIMARIES.iter() {
                if let Some(neighbour) = g.neighbour_at_direction(coord, *dir) {
                    assert_eq!(g.neighbour_at_direction(neighbour, dir.opposite()),
                               Some(coord));
                }
            }
        }
    }

    #[test]
    fn walls_start_clear_and_passages_open() {
        let g = small_grid(3, 3);
        let centre = Cartesian2DCoordinate::new(1, 1);
        for dir in COMPASS_PRIMARIES.iter() {
            assert!(!g.wall(centre, *dir));
            assert!(!g.is_wall_blocking(centre, *dir));
            assert!(g.can_move(centre, *dir));
        }
    }

    #[test]
    fn one_sided_wall_does_not_block() {
        let mut g = small_grid(2, 1);
        let west_cell = Cartesian2DCoordinate::new(0, 0);
        let east_cell = Cartesian2DCoordinate::new(1, 0);

        g.set_wall(west_cell, CompassPrimary::East);
        assert!(g.wall(west_cell, CompassPrimary::East));
        assert!(!g.is_wall_blocking(west_cell, CompassPrimary::East));
        assert!(g.can_move(west_cell, CompassPrimary::East));
        assert!(g.can_move(east_cell, CompassPrimary::West));

        // The neighbour confirming the wall makes it real both ways.
        g.set_wall(east_cell, CompassPrimary::West);
        assert!(g.is_wall_blocking(west_cell, CompassPrimary::East));
        assert!(g.is_wall_blocking(east_cell, CompassPrimary::West));
        assert!(!g.can_move(west_cell, CompassPrimary::East));
        assert!(!g.can_move(east_cell, CompassPrimary::West));
    }

    #[test]
    fn boundary_edges_never_allow_movement() {
        let g = small_grid(2, 2);
        let origin = Cartesian2DCoordinate::new(0, 0);
        assert!(!g.can_move(origin, CompassPrimary::North));
        assert!(!g.can_move(origin, CompassPrimary::West));
    }

    #[test]
    fn boundary_wall_blocks_with_only_the_local_flag() {
        let mut g = small_grid(2, 2);
        let origin = Cartesian2DCoordinate::new(0, 0);
        assert!(!g.is_wall_blocking(origin, CompassPrimary::North));
        g.set_wall(origin, CompassPrimary::North);
        assert!(g.is_wall_blocking(origin, CompassPrimary::North));
    }

    #[test]
    fn clearing_one_side_reopens_the_passage() {
        let mut g = small_grid(2, 1);
        let west_cell = Cartesian2DCoordinate::new(0, 0);
        let east_cell = Cartesian2DCoordinate::new(1, 0);
        g.set_wall(west_cell, CompassPrimary::East);
        g.set_wall(east_cell, CompassPrimary::West);
        assert!(!g.can_move(west_cell, CompassPrimary::East));

        g.clear_wall(east_cell, CompassPrimary::West);
        assert!(g.can_move(west_cell, CompassPrimary::East));
        assert!(g.can_move(east_cell, CompassPrimary::West));
    }

    #[test]
    fn subregion_tags_reset() {
        let mut g = small_grid(3, 3);
        let gc = |x, y| Cartesian2DCoordinate::new(x, y);
        g.set_subregion(gc(0, 0), 0);
        g.set_subregion(gc(2, 2), 1);
        assert_eq!(g.subregion(gc(0, 0)), Some(0));
        assert_eq!(g.subregion(gc(2, 2)), Some(1));

        g.reset_subregions();
        assert!(g.iter().all(|coord| g.subregion(coord).is_none()));

        // Idempotent.
        g.reset_subregions();
        assert!(g.iter().all(|coord| g.subregion(coord).is_none()));
    }

    #[test]
    fn random_cell_is_always_in_bounds() {
        let g = small_grid(4, 3);
        let mut rng = rand::weak_rng();
        for _ in 0..1000 {
            let coord = g.random_cell(&mut rng);
            assert!(g.is_valid_coordinate(coord));
        }
    }

    #[test]
    fn cell_iter() {
        let g = small_grid(2, 2);
        assert_eq!(g.iter().collect::<Vec<Cartesian2DCoordinate>>(),
                   &[Cartesian2DCoordinate::new(0, 0),
                     Cartesian2DCoordinate::new(1, 0),
                     Cartesian2DCoordinate::new(0, 1),
                     Cartesian2DCoordinate::new(1, 1)]);
    }

    #[test]
    fn row_iter() {
        let g = small_grid(2, 2);
        assert_eq!(g.iter_row().collect::<Vec<Vec<Cartesian2DCoordinate>>>(),
                   &[&[Cartesian2DCoordinate::new(0, 0), Cartesian2DCoordinate::new(1, 0)],
                     &[Cartesian2DCoordinate::new(0, 1), Cartesian2DCoordinate::new(1, 1)]]);
    }

    #[test]
    fn column_iter() {
        let g = small_grid(2, 2);
        assert_eq!(g.iter_column().collect::<Vec<Vec<Cartesian2DCoordinate>>>(),
                   &[&[Cartesian2DCoordinate::new(0, 0), Cartesian2DCoordinate::new(0, 1)],
                     &[Cartesian2DCoordinate::new(1, 0), Cartesian2DCoordinate::new(1, 1)]]);
    }

    #[test]
    fn passages_count_on_open_grid() {
        // Every adjacent pair of a fully open w*h grid is a passage:
        // horizontal pairs (w-1)*h plus vertical pairs w*(h-1).
        let g = small_grid(3, 2);
        assert_eq!(g.passages_count(), 2 * 2 + 3 * 1);
    }

    #[test]
    fn passage_graph_components() {
        let mut g = small_grid(2, 1);
        assert_eq!(connected_components(&g.passage_graph()), 1);

        let west_cell = Cartesian2DCoordinate::new(0, 0);
        let east_cell = Cartesian2DCoordinate::new(1, 0);
        g.set_wall(west_cell, CompassPrimary::East);
        g.set_wall(east_cell, CompassPrimary::West);
        assert_eq!(connected_components(&g.passage_graph()), 2);
    }

    #[test]
    fn snapshots_are_detached_copies() {
        let mut g = small_grid(2, 2);
        let gc = |x, y| Cartesian2DCoordinate::new(x, y);
        g.set_wall(gc(0, 0), CompassPrimary::East);
        g.set_subregion(gc(1, 1), 1);

        let snap = g.snapshot();
        assert_eq!(snap.width(), Width(2));
        assert_eq!(snap.height(), Height(2));
        assert_eq!(snap.cell_size(), CellSize(10));
        assert!(snap.wall(gc(0, 0), CompassPrimary::East));
        assert_eq!(snap.subregion(gc(1, 1)), Some(1));

        // Later grid mutation does not touch the snapshot.
        g.clear_wall(gc(0, 0), CompassPrimary::East);
        assert!(snap.wall(gc(0, 0), CompassPrimary::East));
    }

    #[test]
    fn display_renders_confirmed_walls_only() {
        let mut g = small_grid(2, 1);
        let west_cell = Cartesian2DCoordinate::new(0, 0);
        let east_cell = Cartesian2DCoordinate::new(1, 0);

        // Half agreed wall: nothing rendered between the two cells.
        g.set_wall(west_cell, CompassPrimary::East);
        let text = format!("{}", g);
        assert!(!text.contains('│'));

        g.set_wall(east_cell, CompassPrimary::West);
        let text = format!("{}", g);
        assert!(text.contains('│'));
    }
}

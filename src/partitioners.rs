use bit_set::BitSet;
use rand::{Rng, XorShiftRng};

use crate::cells::{Cartesian2DCoordinate, CompassPrimary, COMPASS_PRIMARIES};
use crate::grid::Grid;
use crate::units::{DepthLimit, MinRegionSize, MinRoomSize};

/// The outcome of asking a partitioner to process one region.
#[derive(Debug)]
pub enum PartitionStep<R> {
    /// The region is done: too small or out of budget. No walls carved.
    Leaf,
    /// The region was split in two. The shared boundary has been carved with
    /// exactly one open passage, the halves tagged 0 and 1.
    Split(R, R),
}

/// A strategy for recursively splitting grid areas in two.
///
/// Both implementations share the same carving contract: a split covers the
/// input area with two disjoint halves, and the boundary between them is
/// blocked on both sides of every cell pair except a single guaranteed
/// opening. The sequencer drives the recursion; a partitioner only ever sees
/// one region at a time.
pub trait RegionPartitioner {
    type Region;

    /// The whole grid as a single region to start recursion from.
    fn root_region(&self, grid: &Grid) -> Self::Region;

    /// Split one region or declare it a leaf. Subregion tags on the grid are
    /// reset on entry, so after a split only the current two halves carry
    /// tags - that is what an observer of the step sequence sees.
    fn partition(&self,
                 grid: &mut Grid,
                 region: Self::Region,
                 rng: &mut XorShiftRng)
                 -> PartitionStep<Self::Region>;
}

/// Randomized frontier growth partitioning.
///
/// Two seed cells are picked at random and grown into each other with a two
/// source flood fill, giving organically shaped halves - regions are plain
/// cell lists, never rectangles. Areas smaller than `min_region_size` are
/// left as open leaves, so minimums above 2 produce open rooms in the
/// finished maze.
#[derive(Debug, Copy, Clone)]
pub struct GrowthPartitioner {
    min_region_size: MinRegionSize,
}

impl GrowthPartitioner {
    /// `min_region_size` below 2 leaves seed selection unguarded and will
    /// panic as soon as a one cell area is partitioned.
    pub fn new(min_region_size: MinRegionSize) -> GrowthPartitioner {
        GrowthPartitioner { min_region_size }
    }

    /// Pick the two distinct flood fill seeds from an area.
    ///
    /// Panics if the area holds fewer than two cells: the minimum region size
    /// check is the caller's guard and skipping it is a programming error,
    /// not a recoverable condition.
    fn choose_seeds(area: &[Cartesian2DCoordinate],
                    rng: &mut XorShiftRng)
                    -> [Cartesian2DCoordinate; 2] {
        let seeds = rand::sample(rng, area.iter().cloned(), 2);
        assert!(seeds.len() == 2,
                "growth partitioning needs at least 2 cells in an area to seed subregions");
        [seeds[0], seeds[1]]
    }

    /// Two source flood fill: pop a random frontier cell and claim its
    /// unlabelled in-area neighbours for that cell's subregion, until the
    /// frontier drains. Every cell ends up connected to its own seed without
    /// crossing the other half.
    fn grow_subregions(grid: &mut Grid,
                       membership: &BitSet,
                       seeds: [Cartesian2DCoordinate; 2],
                       rng: &mut XorShiftRng) {
        grid.set_subregion(seeds[0], 0);
        grid.set_subregion(seeds[1], 1);

        let mut frontier = vec![seeds[0], seeds[1]];
        while !frontier.is_empty() {
            let pop_index = rng.gen::<usize>() % frontier.len();
            let current = frontier.swap_remove(pop_index);
            let label = grid.subregion(current).expect("frontier cells are always labelled");

            for dir in COMPASS_PRIMARIES.iter() {
                if let Some(neighbour) = grid.neighbour_at_direction(current, *dir) {
                    let in_area = grid.grid_coordinate_to_index(neighbour)
                        .map_or(false, |index| membership.contains(index));
                    if in_area && grid.subregion(neighbour).is_none() {
                        grid.set_subregion(neighbour, label);
                        frontier.push(neighbour);
                    }
                }
            }
        }
    }

    /// Block the boundary between the two labelled halves, leaving one
    /// opening.
    ///
    /// Single pass reservoir selection: every directed boundary adjacency
    /// gets its wall flag set on the scanning cell's side, and is accepted as
    /// the opening candidate with probability 1/sqrt(|area|) - on average one
    /// acceptance per scan without enumerating the boundary up front. The
    /// last accepted candidate wins and has its recorded side cleared after
    /// the scan; the passage opens because a wall only blocks when both
    /// facing flags agree. Should no candidate be accepted at all, the last
    /// boundary adjacency seen is opened instead - the guaranteed passage is
    /// unconditional.
    fn carve_boundary_walls(grid: &mut Grid,
                            area: &[Cartesian2DCoordinate],
                            membership: &BitSet,
                            rng: &mut XorShiftRng) {
        let removal_chance = 1.0 / (area.len() as f64).sqrt();
        let mut opening: Option<(Cartesian2DCoordinate, CompassPrimary)> = None;
        let mut last_boundary: Option<(Cartesian2DCoordinate, CompassPrimary)> = None;

        for &cell in area {
            let label = grid.subregion(cell);
            for dir in COMPASS_PRIMARIES.iter() {
                if let Some(neighbour) = grid.neighbour_at_direction(cell, *dir) {
                    let in_area = grid.grid_coordinate_to_index(neighbour)
                        .map_or(false, |index| membership.contains(index));
                    if in_area && grid.subregion(neighbour) != label {
                        grid.set_wall(cell, *dir);
                        last_boundary = Some((cell, *dir));
                        if rng.gen::<f64>() < removal_chance {
                            opening = Some((cell, *dir));
                        }
                    }
                }
            }
        }

        if let Some((cell, dir)) = opening.or(last_boundary) {
            grid.clear_wall(cell, dir);
        }
    }

    fn membership_set(grid: &Grid, area: &[Cartesian2DCoordinate]) -> BitSet {
        let mut membership = BitSet::with_capacity(grid.size());
        for coord in area {
            let index = grid.grid_coordinate_to_index(*coord)
                .expect("area cells always lie within their grid");
            membership.insert(index);
        }
        membership
    }
}

impl RegionPartitioner for GrowthPartitioner {
    type Region = Vec<Cartesian2DCoordinate>;

    fn root_region(&self, grid: &Grid) -> Self::Region {
        grid.iter().collect()
    }

    fn partition(&self,
                 grid: &mut Grid,
                 region: Self::Region,
                 rng: &mut XorShiftRng)
                 -> PartitionStep<Self::Region> {

        if region.len() < self.min_region_size.0 {
            return PartitionStep::Leaf;
        }

        grid.reset_subregions();
        let membership = Self::membership_set(grid, &region);
        let seeds = Self::choose_seeds(&region, rng);
        Self::grow_subregions(grid, &membership, seeds, rng);
        Self::carve_boundary_walls(grid, &region, &membership, rng);

        let first_half: Vec<Cartesian2DCoordinate> = region.iter()
            .cloned()
            .filter(|coord| grid.subregion(*coord) == Some(0))
            .collect();
        let second_half: Vec<Cartesian2DCoordinate> = region.iter()
            .cloned()
            .filter(|coord| grid.subregion(*coord) == Some(1))
            .collect();
        assert!(first_half.len() + second_half.len() == region.len(),
                "flood fill must label the whole area");

        PartitionStep::Split(first_half, second_half)
    }
}

/// Which half's cells record the wall writes when a bisection boundary is
/// carved. Alternates with recursion depth parity, independently of the
/// geometric split axis - a purely stylistic knob kept from the source
/// algorithm, not a geometric one.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum CarveOrientation {
    Horizontal,
    Vertical,
}

impl CarveOrientation {
    pub fn from_depth(depth: usize) -> CarveOrientation {
        if depth % 2 == 0 {
            CarveOrientation::Horizontal
        } else {
            CarveOrientation::Vertical
        }
    }
}

/// An axis aligned sub rectangle of the grid, with the remaining recursion
/// budget for the bisection strategy.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct RectRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub depth: usize,
}

impl RectRegion {
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Deterministic alternating bisection partitioning.
///
/// Rectangles split at the midpoint of their longer axis (ties cut
/// vertically), the boundary line is fully blocked and a single random cell
/// pair on it reopened. The depth budget terminates recursion even when the
/// room size check never fires, e.g. on one cell wide strips.
#[derive(Debug, Copy, Clone)]
pub struct BisectionPartitioner {
    min_room_size: MinRoomSize,
    depth_limit: DepthLimit,
}

impl BisectionPartitioner {
    pub fn new(min_room_size: MinRoomSize, depth_limit: DepthLimit) -> BisectionPartitioner {
        BisectionPartitioner {
            min_room_size,
            depth_limit,
        }
    }

    /// Block every cell pair across the boundary on both sides, then reopen
    /// one uniformly chosen pair on both sides. `orientation` decides which
    /// half's cells the writes are recorded from; with both sides always
    /// written the carved result is the same either way.
    fn carve_rect_boundary(grid: &mut Grid,
                           pairs: &[(Cartesian2DCoordinate, CompassPrimary)],
                           orientation: CarveOrientation,
                           rng: &mut XorShiftRng) {
        let carve_pair = |grid: &mut Grid, cell: Cartesian2DCoordinate, dir: CompassPrimary| {
            let neighbour = grid.neighbour_at_direction(cell, dir)
                .expect("boundary pairs always have both cells in the grid");
            match orientation {
                CarveOrientation::Horizontal => {
                    grid.set_wall(cell, dir);
                    grid.set_wall(neighbour, dir.opposite());
                }
                CarveOrientation::Vertical => {
                    grid.set_wall(neighbour, dir.opposite());
                    grid.set_wall(cell, dir);
                }
            }
        };

        for &(cell, dir) in pairs {
            carve_pair(grid, cell, dir);
        }

        let (open_cell, open_dir) = pairs[rng.gen::<usize>() % pairs.len()];
        let open_neighbour = grid.neighbour_at_direction(open_cell, open_dir)
            .expect("boundary pairs always have both cells in the grid");
        grid.clear_wall(open_cell, open_dir);
        grid.clear_wall(open_neighbour, open_dir.opposite());
    }

    fn tag_rect(grid: &mut Grid, rect: &RectRegion, tag: u8) {
        for y in rect.y..(rect.y + rect.height) {
            for x in rect.x..(rect.x + rect.width) {
                grid.set_subregion(Cartesian2DCoordinate::new(x, y), tag);
            }
        }
    }
}

impl RegionPartitioner for BisectionPartitioner {
    type Region = RectRegion;

    fn root_region(&self, grid: &Grid) -> Self::Region {
        RectRegion {
            x: 0,
            y: 0,
            width: grid.width().0 as u32,
            height: grid.height().0 as u32,
            depth: self.depth_limit.0,
        }
    }

    fn partition(&self,
                 grid: &mut Grid,
                 region: Self::Region,
                 rng: &mut XorShiftRng)
                 -> PartitionStep<Self::Region> {

        if region.cell_count() <= self.min_room_size.0 || region.depth == 0 {
            return PartitionStep::Leaf;
        }

        grid.reset_subregions();

        // The wall carving orientation tracks recursion depth parity only;
        // the geometric cut axis is chosen by the longer side below.
        let orientation = CarveOrientation::from_depth(region.depth);
        let vertical_cut = region.width >= region.height;

        let (first, second, boundary_pairs) = if vertical_cut {
            // Integer floor midpoint: the first half takes the smaller share
            // of an odd width.
            let first_width = region.width / 2;
            let first = RectRegion {
                width: first_width,
                depth: region.depth - 1,
                ..region
            };
            let second = RectRegion {
                x: region.x + first_width,
                width: region.width - first_width,
                depth: region.depth - 1,
                ..region
            };
            let boundary_column = region.x + first_width - 1;
            let pairs = (region.y..(region.y + region.height))
                .map(|y| (Cartesian2DCoordinate::new(boundary_column, y), CompassPrimary::East))
                .collect::<Vec<_>>();
            (first, second, pairs)
        } else {
            let first_height = region.height / 2;
            let first = RectRegion {
                height: first_height,
                depth: region.depth - 1,
                ..region
            };
            let second = RectRegion {
                y: region.y + first_height,
                height: region.height - first_height,
                depth: region.depth - 1,
                ..region
            };
            let boundary_row = region.y + first_height - 1;
            let pairs = (region.x..(region.x + region.width))
                .map(|x| (Cartesian2DCoordinate::new(x, boundary_row), CompassPrimary::South))
                .collect::<Vec<_>>();
            (first, second, pairs)
        };

        Self::carve_rect_boundary(grid, &boundary_pairs, orientation, rng);
        Self::tag_rect(grid, &first, 0);
        Self::tag_rect(grid, &second, 1);

        PartitionStep::Split(first, second)
    }
}

#[cfg(test)]
mod tests {

    use rand;

    use super::*;
    use crate::cells::{Cartesian2DCoordinate, CompassPrimary};
    use crate::grid::Grid;
    use crate::units::{CellSize, DepthLimit, Height, MinRegionSize, MinRoomSize, Width};

    fn small_grid(w: usize, h: usize) -> Grid {
        Grid::new(Width(w), Height(h), CellSize(10)).expect("grid dimensions are invalid")
    }

    fn gc(x: u32, y: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate::new(x, y)
    }

    #[test]
    fn growth_leaves_undersized_areas_alone() {
        let mut g = small_grid(2, 2);
        let partitioner = GrowthPartitioner::new(MinRegionSize(5));
        let mut rng = rand::weak_rng();

        let region = partitioner.root_region(&g);
        match partitioner.partition(&mut g, region, &mut rng) {
            PartitionStep::Leaf => {}
            PartitionStep::Split(..) => panic!("area below the minimum size must stay a leaf"),
        }
        // A leaf performs no carving at all.
        for coord in g.iter() {
            for dir in crate::cells::COMPASS_PRIMARIES.iter() {
                assert!(!g.wall(coord, *dir));
            }
        }
    }

    #[test]
    #[should_panic(expected = "at least 2 cells")]
    fn growth_on_a_one_cell_area_is_a_precondition_violation() {
        // A minimum region size below 2 fails to guard seed selection. That
        // is a caller bug and it dies loudly rather than silently proceeding.
        let mut g = small_grid(1, 1);
        let partitioner = GrowthPartitioner::new(MinRegionSize(1));
        let mut rng = rand::weak_rng();

        let region = partitioner.root_region(&g);
        let _ = partitioner.partition(&mut g, region, &mut rng);
    }

    #[test]
    fn growth_split_covers_the_area_with_two_tagged_halves() {
        let mut g = small_grid(3, 3);
        let partitioner = GrowthPartitioner::new(MinRegionSize(2));
        let mut rng = rand::weak_rng();

        let region = partitioner.root_region(&g);
        let region_len = region.len();
        match partitioner.partition(&mut g, region, &mut rng) {
            PartitionStep::Split(first, second) => {
                assert!(!first.is_empty());
                assert!(!second.is_empty());
                assert_eq!(first.len() + second.len(), region_len);
                assert!(first.iter().all(|c| g.subregion(*c) == Some(0)));
                assert!(second.iter().all(|c| g.subregion(*c) == Some(1)));
                assert!(first.iter().all(|c| !second.contains(c)));
            }
            PartitionStep::Leaf => panic!("a 9 cell area must split"),
        }
    }

    #[test]
    fn growth_boundary_has_exactly_one_opening() {
        let mut rng = rand::weak_rng();
        for _ in 0..50 {
            let mut g = small_grid(4, 4);
            let partitioner = GrowthPartitioner::new(MinRegionSize(2));
            let region = partitioner.root_region(&g);
            match partitioner.partition(&mut g, region, &mut rng) {
                PartitionStep::Split(first, second) => {
                    let open_crossings = first.iter()
                        .map(|&cell| {
                            crate::cells::COMPASS_PRIMARIES.iter()
                                .filter(|dir| {
                                    g.neighbour_at_direction(cell, **dir)
                                        .map_or(false, |n| {
                                            second.contains(&n) && g.can_move(cell, **dir)
                                        })
                                })
                                .count()
                        })
                        .sum::<usize>();
                    assert_eq!(open_crossings, 1);
                }
                PartitionStep::Leaf => panic!("a 16 cell area must split"),
            }
        }
    }

    #[test]
    fn bisection_respects_the_depth_budget() {
        let mut g = small_grid(4, 4);
        let partitioner = BisectionPartitioner::new(MinRoomSize(1), DepthLimit(0));
        let mut rng = rand::weak_rng();

        let region = partitioner.root_region(&g);
        match partitioner.partition(&mut g, region, &mut rng) {
            PartitionStep::Leaf => {}
            PartitionStep::Split(..) => panic!("an exhausted depth budget must stop splitting"),
        }
    }

    #[test]
    fn bisection_one_cell_grid_is_a_leaf() {
        let mut g = small_grid(1, 1);
        let partitioner = BisectionPartitioner::new(MinRoomSize(1), DepthLimit(4));
        let mut rng = rand::weak_rng();

        let region = partitioner.root_region(&g);
        match partitioner.partition(&mut g, region, &mut rng) {
            PartitionStep::Leaf => {}
            PartitionStep::Split(..) => panic!("a single cell cannot split"),
        }
        assert!(!g.wall(gc(0, 0), CompassPrimary::North));
        assert!(!g.wall(gc(0, 0), CompassPrimary::South));
        assert!(!g.wall(gc(0, 0), CompassPrimary::East));
        assert!(!g.wall(gc(0, 0), CompassPrimary::West));
    }

    #[test]
    fn bisection_two_by_one_grid_yields_one_passage() {
        let mut g = small_grid(2, 1);
        let partitioner = BisectionPartitioner::new(MinRoomSize(1), DepthLimit(1));
        let mut rng = rand::weak_rng();

        let region = partitioner.root_region(&g);
        match partitioner.partition(&mut g, region, &mut rng) {
            PartitionStep::Split(first, second) => {
                assert_eq!((first.width, first.height), (1, 1));
                assert_eq!((second.width, second.height), (1, 1));
            }
            PartitionStep::Leaf => panic!("a 2x1 grid with budget must split"),
        }

        // The single boundary pair is the guaranteed opening: cleared on both
        // sides, leaving the two cells mutually reachable.
        assert!(!g.wall(gc(0, 0), CompassPrimary::East));
        assert!(!g.wall(gc(1, 0), CompassPrimary::West));
        assert!(g.can_move(gc(0, 0), CompassPrimary::East));
        assert_eq!(g.passages_count(), 1);
    }

    #[test]
    fn bisection_cuts_the_longer_axis_with_ties_vertical() {
        let partitioner = BisectionPartitioner::new(MinRoomSize(1), DepthLimit(8));
        let mut rng = rand::weak_rng();

        // Taller than wide: horizontal cut, smaller share on the first half.
        let mut tall = small_grid(3, 5);
        let region = partitioner.root_region(&tall);
        match partitioner.partition(&mut tall, region, &mut rng) {
            PartitionStep::Split(first, second) => {
                assert_eq!((first.x, first.y, first.width, first.height), (0, 0, 3, 2));
                assert_eq!((second.x, second.y, second.width, second.height), (0, 2, 3, 3));
            }
            PartitionStep::Leaf => panic!("must split"),
        }

        // Square: tie broken towards a vertical cut.
        let mut square = small_grid(3, 3);
        let region = partitioner.root_region(&square);
        match partitioner.partition(&mut square, region, &mut rng) {
            PartitionStep::Split(first, second) => {
                assert_eq!((first.x, first.y, first.width, first.height), (0, 0, 1, 3));
                assert_eq!((second.x, second.y, second.width, second.height), (1, 0, 2, 3));
            }
            PartitionStep::Leaf => panic!("must split"),
        }
    }

    #[test]
    fn bisection_boundary_blocked_except_one_pair() {
        let mut rng = rand::weak_rng();
        for _ in 0..50 {
            let mut g = small_grid(2, 2);
            let partitioner = BisectionPartitioner::new(MinRoomSize(1), DepthLimit(1));
            let region = partitioner.root_region(&g);
            match partitioner.partition(&mut g, region, &mut rng) {
                PartitionStep::Split(..) => {}
                PartitionStep::Leaf => panic!("must split"),
            }

            // Vertical tie cut between the two columns: two crossing pairs,
            // exactly one of them open, the other blocked on both sides.
            let crossings = [(gc(0, 0), gc(1, 0)), (gc(0, 1), gc(1, 1))];
            let open = crossings.iter()
                .filter(|&&(a, _)| g.can_move(a, CompassPrimary::East))
                .count();
            assert_eq!(open, 1);
            let blocked = crossings.iter()
                .filter(|&&(a, b)| {
                    g.wall(a, CompassPrimary::East) && g.wall(b, CompassPrimary::West)
                })
                .count();
            assert_eq!(blocked, 1);
        }
    }

    #[test]
    fn bisection_tags_first_half_zero_second_half_one() {
        let mut g = small_grid(4, 1);
        let partitioner = BisectionPartitioner::new(MinRoomSize(1), DepthLimit(3));
        let mut rng = rand::weak_rng();

        let region = partitioner.root_region(&g);
        match partitioner.partition(&mut g, region, &mut rng) {
            PartitionStep::Split(first, second) => {
                for y in first.y..(first.y + first.height) {
                    for x in first.x..(first.x + first.width) {
                        assert_eq!(g.subregion(gc(x, y)), Some(0));
                    }
                }
                for y in second.y..(second.y + second.height) {
                    for x in second.x..(second.x + second.width) {
                        assert_eq!(g.subregion(gc(x, y)), Some(1));
                    }
                }
            }
            PartitionStep::Leaf => panic!("must split"),
        }
    }

    #[test]
    fn carve_orientation_alternates_with_depth_parity() {
        assert_eq!(CarveOrientation::from_depth(0), CarveOrientation::Horizontal);
        assert_eq!(CarveOrientation::from_depth(1), CarveOrientation::Vertical);
        for depth in 1..16 {
            assert!(CarveOrientation::from_depth(depth) !=
                    CarveOrientation::from_depth(depth - 1));
        }
    }
}

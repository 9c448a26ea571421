use std::fmt::{Debug, Display, LowerHex};
use std::hash::{BuildHasherDefault, Hash};
use std::collections::{HashMap, HashSet};
use std::ops::Add;

use fnv::FnvHasher;
use itertools::Itertools;
use num::traits::{Bounded, One, Unsigned, Zero};
use smallvec::SmallVec;

use crate::cells::{Cartesian2DCoordinate, CoordinateSmallVec};
use crate::grid::{Grid, GridDisplay};

/// The hashing algorithm is much faster than the default on short keys such
/// as integers and small strings, at the cost of being less robust against
/// key collision attacks - irrelevant for grid coordinates.
pub type FnvHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FnvHasher>>;
pub type FnvHashSet<T> = HashSet<T, BuildHasherDefault<FnvHasher>>;

fn fnv_hashmap<K: Hash + Eq, V>(capacity: usize) -> FnvHashMap<K, V> {
    let fnv = BuildHasherDefault::<FnvHasher>::default();
    HashMap::<K, V, _>::with_capacity_and_hasher(capacity, fnv)
}

// Trait (hack) used purely as a generic type parameter alias because it looks
// ugly to type this out each time. Note generic parameter type aliases are
// not in the language - `type X = Y;` only works with concrete types.
pub trait MaxDistance
    : Zero + One + Bounded + Unsigned + Add + Debug + Clone + Copy + Display + LowerHex + Ord
    {
}
impl<T: Zero + One + Bounded + Unsigned + Add + Debug + Clone + Copy + Display + LowerHex + Ord> MaxDistance for T {}

/// Breadth first flood fill from a start cell over every passage the
/// movement contract allows - an edge is traversed only when it is not
/// blocked on both of its sides. Unreached cells have no recorded distance,
/// which makes this the reachability oracle for the maze properties.
#[derive(Debug, Clone)]
pub struct Distances<MaxDistanceT = u32> {
    start_coordinate: Cartesian2DCoordinate,
    distances: FnvHashMap<Cartesian2DCoordinate, MaxDistanceT>,
    max_distance: MaxDistanceT,
}

impl<MaxDistanceT> Distances<MaxDistanceT>
    where MaxDistanceT: MaxDistance
{
    pub fn new(grid: &Grid, start_coordinate: Cartesian2DCoordinate)
               -> Option<Distances<MaxDistanceT>> {

        if !grid.is_valid_coordinate(start_coordinate) {
            return None;
        }

        let mut max = Zero::zero();
        let mut distances = fnv_hashmap(grid.size());
        distances.insert(start_coordinate, Zero::zero());

        // No weights on the edges - every step costs one from the previous
        // cell, so the first recorded distance to a cell is already the
        // shortest and the map doubles as the visited set.
        let mut frontier = vec![start_coordinate];
        while !frontier.is_empty() {

            let mut new_frontier = vec![];
            for cell_coord in &frontier {

                let distance_to_cell: MaxDistanceT = *distances.entry(*cell_coord)
                    .or_insert_with(Bounded::max_value);
                if distance_to_cell > max {
                    max = distance_to_cell;
                }

                for open_coordinate in &*grid.open_neighbours(*cell_coord) {

                    let distance_to_open_cell: MaxDistanceT = *distances
                        .entry(*open_coordinate)
                        .or_insert_with(Bounded::max_value);
                    if distance_to_open_cell == Bounded::max_value() {

                        distances.insert(*open_coordinate, distance_to_cell + One::one());
                        new_frontier.push(*open_coordinate);
                    }
                }
            }
            frontier = new_frontier;
        }

        Some(Distances {
            start_coordinate,
            distances,
            max_distance: max,
        })
    }

    #[inline(always)]
    pub fn start(&self) -> Cartesian2DCoordinate {
        self.start_coordinate
    }

    #[inline(always)]
    pub fn max(&self) -> MaxDistanceT {
        self.max_distance
    }

    #[inline(always)]
    pub fn distance_from_start_to(&self, coord: Cartesian2DCoordinate) -> Option<MaxDistanceT> {
        self.distances.get(&coord).cloned()
    }

    /// How many cells the flood fill reached, the start included.
    #[inline]
    pub fn reached_count(&self) -> usize {
        self.distances.len()
    }

    pub fn furthest_points_on_grid(&self) -> SmallVec<[Cartesian2DCoordinate; 8]> {
        let mut furthest = SmallVec::<[Cartesian2DCoordinate; 8]>::new();
        let furthest_distance = self.max();

        for (coord, distance) in self.distances.iter() {
            if *distance == furthest_distance {
                furthest.push(*coord);
            }
        }
        furthest
    }
}

impl<MaxDistanceT> GridDisplay for Distances<MaxDistanceT>
    where MaxDistanceT: MaxDistance
{
    fn render_cell_body(&self, coord: Cartesian2DCoordinate) -> String {
        if let Some(d) = self.distances.get(&coord) {
            // centre align, padding 3, lowercase hexadecimal
            format!("{:^3x}", d)
        } else {
            String::from("   ")
        }
    }
}

#[derive(Debug)]
pub struct StartEndPointsDisplay {
    start_coordinates: CoordinateSmallVec,
    end_coordinates: CoordinateSmallVec,
}
impl StartEndPointsDisplay {
    pub fn new(starts: CoordinateSmallVec, ends: CoordinateSmallVec) -> StartEndPointsDisplay {
        StartEndPointsDisplay {
            start_coordinates: starts,
            end_coordinates: ends,
        }
    }
}
impl GridDisplay for StartEndPointsDisplay {
    fn render_cell_body(&self, coord: Cartesian2DCoordinate) -> String {

        let contains_coordinate =
            |coordinates: &CoordinateSmallVec| coordinates.iter().any(|&c| c == coord);

        if contains_coordinate(&self.start_coordinates) {
            String::from(" S ")
        } else if contains_coordinate(&self.end_coordinates) {
            String::from(" E ")
        } else {
            String::from("   ")
        }
    }
}

#[derive(Debug)]
pub struct PathDisplay {
    on_path_coordinates: FnvHashSet<Cartesian2DCoordinate>,
}
impl PathDisplay {
    pub fn new(path: &[Cartesian2DCoordinate]) -> Self {
        PathDisplay { on_path_coordinates: path.iter().cloned().collect() }
    }
}
impl GridDisplay for PathDisplay {
    fn render_cell_body(&self, coord: Cartesian2DCoordinate) -> String {
        if self.on_path_coordinates.contains(&coord) {
            String::from(" . ")
        } else {
            String::from("   ")
        }
    }
}

/// Walk from the end point back towards the start, always stepping to an
/// open neighbour strictly closer to the start. None when the end is not
/// reachable at all.
pub fn shortest_path<MaxDistanceT>(grid: &Grid,
                                   distances_from_start: &Distances<MaxDistanceT>,
                                   end_point: Cartesian2DCoordinate)
                                   -> Option<Vec<Cartesian2DCoordinate>>
    where MaxDistanceT: MaxDistance
{
    if distances_from_start.distance_from_start_to(end_point).is_none() {
        // The end point is not reachable from start.
        return None;
    }

    let mut path = vec![end_point];
    let start = distances_from_start.start();
    let mut current_coord = end_point;

    while current_coord != start {

        let current_distance_to_start = distances_from_start.distance_from_start_to(current_coord)
            .expect("Coordinate invalid for distances_from_start data.");

        let open_neighbours = grid.open_neighbours(current_coord);
        let neighbour_distances = open_neighbours.iter()
            .map(|coord| {
                (*coord,
                 distances_from_start.distance_from_start_to(*coord)
                     .expect("Coordinate invalid for distances_from_start data."))
            })
            .collect::<SmallVec<[(Cartesian2DCoordinate, MaxDistanceT); 8]>>();
        let closest_to_start = neighbour_distances.iter()
            .cloned()
            .fold1(|closest_accumulator, closest_candidate| {
                if closest_candidate.1 < closest_accumulator.1 {
                    closest_candidate
                } else {
                    closest_accumulator
                }
            });

        if let Some((closer_coord, closer_distance)) = closest_to_start {

            if closer_distance >= current_distance_to_start {
                // We have not got any closer to the final goal, so there is no path there.
                return None;
            }

            current_coord = closer_coord;
            path.push(current_coord);

        } else {
            // There are no open neighbours at all - this input data is broken.
            return None;
        }
    }

    path.reverse();
    Some(path)
}

/// Works only as long as we are looking at a perfect maze, otherwise you get
/// back some arbitrary path.
pub fn dijkstra_longest_path<MaxDistanceT>(grid: &Grid) -> Option<Vec<Cartesian2DCoordinate>>
    where MaxDistanceT: MaxDistance
{
    // Distances to everywhere from an arbitrary start coordinate
    let arbitrary_start_point = Cartesian2DCoordinate::new(0, 0);
    let first_distances = Distances::<MaxDistanceT>::new(grid, arbitrary_start_point)?;

    // The start of the longest path is just the point furthest away from an
    // arbitrary initial point
    let long_path_start_coordinate = first_distances.furthest_points_on_grid()[0];

    let distances_from_start = Distances::<MaxDistanceT>::new(grid, long_path_start_coordinate)?;
    let end_point = distances_from_start.furthest_points_on_grid()[0];

    shortest_path(grid, &distances_from_start, end_point)
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Width(pub usize);
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Height(pub usize);

/// Pixel length of one cell side. A rendering hint carried by the grid and
/// persisted with it, opaque to the generation algorithms.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct CellSize(pub u32);

/// Areas with fewer cells than this are left as open leaf regions by the
/// growth partitioner. Must be at least 2 so the size check always guards
/// seed selection.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct MinRegionSize(pub usize);

/// Rectangles with at most this many cells are left unsplit by the
/// bisection partitioner.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct MinRoomSize(pub usize);

/// Bound on bisection recursion depth, applied independently of the room
/// size check so that degenerate one-cell-wide strips still terminate.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct DepthLimit(pub usize);

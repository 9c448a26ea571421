use rand::{self, XorShiftRng};

use crate::grid::{Grid, GridSnapshot};
use crate::partitioners::{BisectionPartitioner, GrowthPartitioner, PartitionStep,
                          RegionPartitioner};
use crate::units::{DepthLimit, MinRegionSize, MinRoomSize};

/// Drives a partitioner over the whole grid and exposes the construction as
/// a lazy, finite sequence of grid snapshots - one per completed split.
///
/// The recursion is run off an explicit worklist stack rather than native
/// call recursion, since regions can nest as deep as the cell count and
/// step-at-a-time observation needs resumable state anyway. Regions are
/// processed depth first: the first half of every split is fully resolved
/// before its sibling is touched, which fixes the animation order.
///
/// Dropping the sequencer early is safe - the grid then reflects exactly the
/// steps already executed. There is no in place restart: build a new
/// sequencer to generate again, and seed the rng to reproduce a maze.
pub struct GenerationSequencer<'g, P: RegionPartitioner> {
    grid: &'g mut Grid,
    partitioner: P,
    rng: XorShiftRng,
    worklist: Vec<P::Region>,
}

impl<'g, P: RegionPartitioner> GenerationSequencer<'g, P> {
    pub fn new(grid: &'g mut Grid,
               partitioner: P,
               rng: XorShiftRng)
               -> GenerationSequencer<'g, P> {
        let root = partitioner.root_region(grid);
        GenerationSequencer {
            grid,
            partitioner,
            rng,
            worklist: vec![root],
        }
    }
}

impl<'g, P: RegionPartitioner> Iterator for GenerationSequencer<'g, P> {
    type Item = GridSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        // Leaves produce no observable mutation, so keep popping until a
        // region actually splits. Every iteration strictly shrinks a region
        // or its remaining budget, so the loop always terminates.
        while let Some(region) = self.worklist.pop() {
            match self.partitioner.partition(self.grid, region, &mut self.rng) {
                PartitionStep::Leaf => continue,
                PartitionStep::Split(first, second) => {
                    self.worklist.push(second);
                    self.worklist.push(first);
                    return Some(self.grid.snapshot());
                }
            }
        }

        // Generation is complete; the tags were only ever partition scratch.
        self.grid.reset_subregions();
        None
    }
}

/// Run `partitioner` over the whole of `grid` with an injected random
/// source. All randomized choices draw from `rng`, so a fixed seed
/// reproduces the same maze.
pub fn generate<P: RegionPartitioner>(grid: &mut Grid,
                                      partitioner: P,
                                      rng: XorShiftRng)
                                      -> GenerationSequencer<P> {
    GenerationSequencer::new(grid, partitioner, rng)
}

/// Growth strategy entry point with a freshly seeded rng.
pub fn growth_generate(grid: &mut Grid,
                       min_region_size: MinRegionSize)
                       -> GenerationSequencer<GrowthPartitioner> {
    generate(grid, GrowthPartitioner::new(min_region_size), rand::weak_rng())
}

/// Bisection strategy entry point with a freshly seeded rng. Splits all the
/// way down to single cells within the depth budget.
pub fn bisection_generate(grid: &mut Grid,
                          depth_limit: DepthLimit)
                          -> GenerationSequencer<BisectionPartitioner> {
    generate(grid,
             BisectionPartitioner::new(MinRoomSize(1), depth_limit),
             rand::weak_rng())
}

use error_chain::bail;
use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use crate::cells::COMPASS_PRIMARIES;
use crate::errors::*;
use crate::grid::{Grid, GridSnapshot};
use crate::units::{CellSize, Height, Width};

/// The durable form of a maze: the sizing needed to rebuild a grid, plus the
/// optional step-by-step snapshot history for replaying the construction.
///
/// The generator itself never writes here - a consumer collects the
/// sequencer's lazy snapshot sequence and hands it to `save` if replay is
/// wanted. Loading restores the record whole or fails; there is no partial
/// reconstruction of corrupt data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeRecord {
    pub width: usize,
    pub height: usize,
    pub cell_size: u32,
    pub snapshot_history: Option<Vec<GridSnapshot>>,
}

impl MazeRecord {
    pub fn of_grid(grid: &Grid, snapshot_history: Option<&[GridSnapshot]>) -> MazeRecord {
        MazeRecord {
            width: grid.width().0,
            height: grid.height().0,
            cell_size: grid.cell_size().0,
            snapshot_history: snapshot_history.map(|history| history.to_vec()),
        }
    }

    /// Rebuild a grid from the record.
    ///
    /// The minimal contract only restores sizing - a record saved without a
    /// history produces a fresh, wall-less grid of the right dimensions.
    /// When a history was recorded, the final snapshot's wall state is
    /// replayed onto the new grid so the finished maze comes back too.
    pub fn reconstruct_grid(&self) -> Result<Grid> {
        let mut grid = Grid::new(Width(self.width),
                                 Height(self.height),
                                 CellSize(self.cell_size))?;

        if let Some(final_snapshot) = self.snapshot_history.as_ref().and_then(|h| h.last()) {
            if final_snapshot.width() != grid.width() ||
               final_snapshot.height() != grid.height() {
                bail!(ErrorKind::MismatchedGridRecord);
            }
            for coord in grid.iter() {
                for dir in COMPASS_PRIMARIES.iter() {
                    if final_snapshot.wall(coord, *dir) {
                        grid.set_wall(coord, *dir);
                    }
                }
            }
        }

        Ok(grid)
    }
}

/// Serialize the grid's sizing and optional snapshot history to a file.
pub fn save<P: AsRef<Path>>(grid: &Grid,
                            snapshot_history: Option<&[GridSnapshot]>,
                            destination: P)
                            -> Result<()> {
    let record = MazeRecord::of_grid(grid, snapshot_history);
    let file = File::create(destination.as_ref())
        .chain_err(|| format!("Failed to create maze record file {}",
                              destination.as_ref().display()))?;
    serde_json::to_writer(file, &record)?;
    Ok(())
}

/// Read a maze record back. Missing files and malformed data both surface as
/// errors to the caller.
pub fn load<P: AsRef<Path>>(source: P) -> Result<MazeRecord> {
    let file = File::open(source.as_ref())
        .chain_err(|| format!("Failed to open maze record file {}",
                              source.as_ref().display()))?;
    let record = serde_json::from_reader(file)?;
    Ok(record)
}

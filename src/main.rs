use docopt::Docopt;
use rand::{self, SeedableRng, XorShiftRng};
use serde_derive::Deserialize;

use mazegen::{
    cells::{Cartesian2DCoordinate, CoordinateSmallVec},
    grid::{Grid, GridDisplay, GridSnapshot},
    partitioners::{BisectionPartitioner, GrowthPartitioner},
    pathing,
    sequencer,
    store,
    units::{CellSize, DepthLimit, Height, MinRegionSize, MinRoomSize, Width},
};
use std::{
    fs::File,
    io,
    io::prelude::*,
    rc::Rc,
};

const USAGE: &str = "Mazegen

Usage:
    mazegen_driver -h | --help
    mazegen_driver generate (growth|bisection) [(--grid-size=<n>|[--grid-width=<w> --grid-height=<h>])] [--cell-size=<c>] [--min-region=<m>] [--depth-limit=<d>] [--seed=<s>] [--text-out=<path>] [(--show-distances|--show-path)] [--save=<path>] [--save-edges=<path>]
    mazegen_driver show <record>

Options:
    -h --help              Show this screen.
    --grid-size=<n>        The grid size is n * n.
    --grid-width=<w>       The grid width in a w*h grid [default: 20].
    --grid-height=<h>      The grid height in a w*h grid [default: 20].
    --cell-size=<c>        Cell side length hint stored with the maze for renderers [default: 40].
    --min-region=<m>       Growth strategy: areas smaller than this stay open rooms, minimum 2 [default: 4].
    --depth-limit=<d>      Bisection strategy: recursion budget. 0 picks one deep enough to reach single cells [default: 0].
    --seed=<s>             Fix the random source so the same maze is generated every run.
    --text-out=<path>      Output file path for a textual rendering of the maze instead of stdout.
    --show-distances       Show the distance from the longest path's start to every reachable cell.
    --show-path            Show the longest path through the maze.
    --save=<path>          Save the maze record, including the full generation snapshot history.
    --save-edges=<path>    Serialize the maze's passages to a text file: line 1 is n(#vertices) m(#edges), then one edge of 1-based vertex indices per line.
";

#[derive(Debug, Deserialize)]
struct MazeArgs {
    cmd_generate: bool,
    cmd_growth: bool,
    cmd_bisection: bool,
    cmd_show: bool,
    arg_record: String,
    flag_grid_size: Option<usize>,
    flag_grid_width: usize,
    flag_grid_height: usize,
    flag_cell_size: u32,
    flag_min_region: usize,
    flag_depth_limit: usize,
    flag_seed: Option<u64>,
    flag_text_out: String,
    flag_show_distances: bool,
    flag_show_path: bool,
    flag_save: String,
    flag_save_edges: String,
}

// We'll put our errors in an `errors` module, and other modules in
// this crate will `use errors::*;` to get access to everything
// `error_chain!` creates.
mod errors {
    use error_chain::*;
    error_chain! {

        links {
            Mazegen(::mazegen::errors::Error, ::mazegen::errors::ErrorKind);
        }

        foreign_links {
            DocOptFailure(::docopt::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    if args.cmd_show {
        return show_record(&args.arg_record);
    }

    let (width, height) = if let Some(square_grid_size) = args.flag_grid_size {
        (square_grid_size, square_grid_size)
    } else {
        (args.flag_grid_width, args.flag_grid_height)
    };

    let mut maze_grid = Grid::new(Width(width), Height(height), CellSize(args.flag_cell_size))
        .chain_err(|| "Refusing to generate a maze on an empty grid")?;

    let snapshot_history = generate_maze_on_grid(&mut maze_grid, &args)?;

    if !args.flag_save.is_empty() {
        store::save(&maze_grid, Some(&snapshot_history), &args.flag_save)
            .chain_err(|| format!("Failed to save maze record to {}", args.flag_save))?;
    }

    if !args.flag_save_edges.is_empty() {
        save_passage_edges(&maze_grid, &args.flag_save_edges)?;
    }

    set_maze_griddisplay(&mut maze_grid, &args)?;

    if args.flag_text_out.is_empty() {
        println!("{}", maze_grid);
    } else {
        write_text_to_file(&format!("{}", maze_grid), &args.flag_text_out)
            .chain_err(|| format!("Failed to write maze to text file {}", args.flag_text_out))?;
    }

    Ok(())
}

fn generate_maze_on_grid(maze_grid: &mut Grid, maze_args: &MazeArgs) -> Result<Vec<GridSnapshot>> {

    let rng = if let Some(seed) = maze_args.flag_seed {
        XorShiftRng::from_seed(spread_seed(seed))
    } else {
        rand::weak_rng()
    };

    let history = if maze_args.cmd_growth {
        if maze_args.flag_min_region < 2 {
            return Err("--min-region must be at least 2, the growth strategy seeds two subregions"
                .into());
        }
        sequencer::generate(maze_grid,
                            GrowthPartitioner::new(MinRegionSize(maze_args.flag_min_region)),
                            rng)
            .collect()
    } else {
        let cells = maze_grid.size();
        let depth = if maze_args.flag_depth_limit == 0 {
            depth_to_single_cells(cells)
        } else {
            maze_args.flag_depth_limit
        };
        sequencer::generate(maze_grid,
                            BisectionPartitioner::new(MinRoomSize(1), DepthLimit(depth)),
                            rng)
            .collect()
    };

    Ok(history)
}

/// Decide how the grid should display cell bodies as text:
/// - Distances from the longest path's start to all other cells
/// - The longest path through the maze
/// - Otherwise just the longest path's endpoints as S and E markers
fn set_maze_griddisplay(maze_grid: &mut Grid, maze_args: &MazeArgs) -> Result<()> {

    if maze_args.flag_show_distances {

        let start = longest_path_start(maze_grid);
        let distances = Rc::new(pathing::Distances::<u32>::new(maze_grid, start)
            .ok_or("Invalid start coordinate from which to show path distances.")?);
        maze_grid.set_grid_display(Some(distances as Rc<dyn GridDisplay>));

    } else if maze_args.flag_show_path {

        let path = pathing::dijkstra_longest_path::<u32>(maze_grid)
            .ok_or("Failed to find any path through the maze.")?;
        let display_path = Rc::new(pathing::PathDisplay::new(&path));
        maze_grid.set_grid_display(Some(display_path as Rc<dyn GridDisplay>));

    } else if let Some(path) = pathing::dijkstra_longest_path::<u32>(maze_grid) {

        let start_points = as_coordinate_smallvec(*path.first().expect("paths are never empty"));
        let end_points = as_coordinate_smallvec(*path.last().expect("paths are never empty"));
        let display_start_end_points =
            Rc::new(pathing::StartEndPointsDisplay::new(start_points, end_points));
        maze_grid.set_grid_display(Some(display_start_end_points as Rc<dyn GridDisplay>));
    }

    Ok(())
}

fn longest_path_start(maze_grid: &Grid) -> Cartesian2DCoordinate {
    pathing::dijkstra_longest_path::<u32>(maze_grid)
        .and_then(|path| path.first().cloned())
        .unwrap_or_else(|| Cartesian2DCoordinate::new(0, 0))
}

fn as_coordinate_smallvec(coord: Cartesian2DCoordinate) -> CoordinateSmallVec {
    [coord].iter().cloned().collect::<CoordinateSmallVec>()
}

fn show_record(record_path: &str) -> Result<()> {

    let record = store::load(record_path)
        .chain_err(|| format!("Failed to load maze record {}", record_path))?;

    let steps = record.snapshot_history.as_ref().map_or(0, |history| history.len());
    println!("{}x{} maze, cell size {}, {} recorded generation steps",
             record.width,
             record.height,
             record.cell_size,
             steps);

    let maze_grid = record.reconstruct_grid()
        .chain_err(|| format!("Failed to rebuild the maze stored in {}", record_path))?;
    println!("{}", maze_grid);

    Ok(())
}

fn save_passage_edges(maze_grid: &Grid, file_path: &str) -> Result<()> {

    let graph = maze_grid.passage_graph();

    let mut graph_data = String::new();
    graph_data.push_str(maze_grid.size().to_string().as_ref());
    graph_data.push(' ');
    graph_data.push_str(graph.edge_count().to_string().as_ref());
    graph_data.push('\n');

    for edge in graph.raw_edges() {
        let src_as_1_based_index = edge.source().index() + 1;
        let dst_as_1_based_index = edge.target().index() + 1;

        graph_data.push_str(src_as_1_based_index.to_string().as_ref());
        graph_data.push(' ');
        graph_data.push_str(dst_as_1_based_index.to_string().as_ref());
        graph_data.push('\n');
    }

    write_text_to_file(&graph_data, file_path)
        .chain_err(|| format!("Failed to write maze passages to text file {}", file_path))?;

    Ok(())
}

// The xorshift state must not be all zeroes, so pad the user's seed with
// arbitrary odd constants.
fn spread_seed(seed: u64) -> [u32; 4] {
    [seed as u32, (seed >> 32) as u32, 0x193a_6754, 0x9728_3fb1]
}

fn depth_to_single_cells(cells_count: usize) -> usize {
    let mut depth = 0;
    while (1usize << depth) < cells_count {
        depth += 1;
    }
    depth
}

fn write_text_to_file(data: &str, file_name: &str) -> io::Result<()> {
    let mut f = File::create(file_name)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}

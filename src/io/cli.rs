//! Command-line interface over map documents
//!
//! Small batch tooling around the persistence formats: inspect a document,
//! render its occupancy snapshot, upgrade legacy cell buffers and generate
//! seeded demo maps for experimentation.

use clap::{Parser, Subcommand, ValueEnum};
use ndarray::Array2;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::catalog::StaticCatalog;
use crate::geometry::config::{CellShape, GridGeometry, GridLayout, OffsetAxis};
use crate::io::buffer::{self, BufferFormat};
use crate::io::configuration::{
    DEFAULT_GENERATE_SIZE, DEFAULT_SEED, GENERATE_SMOOTHING_PASSES,
};
use crate::io::document::MapDocument;
use crate::io::error::{Result, file_error};
use crate::io::progress::ProgressReporter;
use crate::io::visualization::export_occupancy_png;
use crate::map::cell::CellRef;
use crate::map::map::GridMap;

/// Command-line arguments for the map tooling
#[derive(Parser)]
#[command(name = "gridmap")]
#[command(author, version, about = "Inspect, convert and render grid map documents")]
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Operations over map documents and cell buffers
#[derive(Subcommand)]
pub enum Command {
    /// Print a document's layers and cell statistics
    Info {
        /// Map document to inspect
        file: PathBuf,
    },

    /// Render a document's occupancy snapshot as a PNG
    Render {
        /// Map document to render
        file: PathBuf,

        /// Cell shape of the grid
        #[arg(long, value_enum, default_value = "square")]
        shape: ShapeArg,

        /// Offset axis for half-offset shapes
        #[arg(long, value_enum, default_value = "horizontal")]
        axis: AxisArg,

        /// Coordinate layout for half-offset shapes
        #[arg(long, value_enum, default_value = "stacked")]
        layout: LayoutArg,

        /// Cell width in world units
        #[arg(long, default_value_t = 16.0)]
        cell_width: f64,

        /// Cell height in world units
        #[arg(long, default_value_t = 16.0)]
        cell_height: f64,

        /// Output path (defaults to `<input>_snapshot.png`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a legacy raw cell buffer in the current format
    Upgrade {
        /// Raw cell buffer to upgrade
        file: PathBuf,

        /// Layout of the input records
        #[arg(long, value_enum)]
        from: LegacyFormatArg,

        /// Output path for the upgraded buffer
        output: PathBuf,
    },

    /// Generate a seeded demo map document
    Generate {
        /// Output path for the document
        output: PathBuf,

        /// Random seed for reproducible generation
        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Side length of the generated map, in cells
        #[arg(long, default_value_t = DEFAULT_GENERATE_SIZE)]
        size: usize,
    },
}

/// Cell shape selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShapeArg {
    /// Axis-aligned squares
    Square,
    /// Isometric diamonds
    Isometric,
    /// Half-offset squares
    HalfOffsetSquare,
    /// Hexagons
    Hexagon,
}

/// Offset axis selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AxisArg {
    /// Odd rows shift along x
    Horizontal,
    /// Odd columns shift along y
    Vertical,
}

/// Layout selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// Rows stack vertically, odd rows shifted
    Stacked,
    /// Rows stack vertically, even rows shifted
    StackedOffset,
    /// Staircase running right
    StairsRight,
    /// Staircase running down
    StairsDown,
    /// Diamond axes running right
    DiamondRight,
    /// Diamond axes running down
    DiamondDown,
}

/// Legacy buffer layout selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LegacyFormatArg {
    /// 8-byte records predating sub-tile coordinates
    V1,
    /// 12-byte records predating the variant field
    V2,
}

impl LegacyFormatArg {
    const fn format(self) -> BufferFormat {
        match self {
            Self::V1 => BufferFormat::LegacyV1,
            Self::V2 => BufferFormat::LegacyV2,
        }
    }
}

/// Executes one CLI invocation
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Runner for the parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected command
    ///
    /// # Errors
    ///
    /// Propagates document, buffer and file system errors from the
    /// underlying operations.
    pub fn run(self) -> Result<()> {
        match &self.cli.command {
            Command::Info { file } => Self::info(file),
            Command::Render {
                file,
                shape,
                axis,
                layout,
                cell_width,
                cell_height,
                output,
            } => {
                let geometry = build_geometry(*shape, *axis, *layout, [*cell_width, *cell_height]);
                Self::render(file, geometry, output.as_deref())
            }
            Command::Upgrade { file, from, output } => Self::upgrade(file, from.format(), output),
            Command::Generate { output, seed, size } => {
                self.generate(output, *seed, (*size).max(1))
            }
        }
    }

    // Summaries go to stdout by design; this is the command's output.
    #[allow(clippy::print_stdout)]
    fn info(file: &Path) -> Result<()> {
        let document = MapDocument::read_file(file)?;

        println!("format: {}", document.format);
        println!("layers: {}", document.layers.len());
        for (index, layer) in document.layers.iter().enumerate() {
            let name = if layer.settings.name.is_empty() {
                "<unnamed>"
            } else {
                &layer.settings.name
            };
            println!(
                "  [{index}] {name}: {} cells, enabled={}, z_index={}, y_sort={}",
                layer.cells.len(),
                layer.settings.enabled,
                layer.settings.z_index,
                layer.settings.y_sort_enabled,
            );
        }

        let mut bounds: Option<([i32; 2], [i32; 2])> = None;
        for layer in &document.layers {
            for &(coords, _) in &layer.cells {
                bounds = Some(bounds.map_or((coords, coords), |(min, max)| {
                    (
                        [min[0].min(coords[0]), min[1].min(coords[1])],
                        [max[0].max(coords[0]), max[1].max(coords[1])],
                    )
                }));
            }
        }
        match bounds {
            Some((min, max)) => println!(
                "used rect: ({}, {}) to ({}, {})",
                min[0], min[1], max[0], max[1]
            ),
            None => println!("used rect: empty"),
        }
        Ok(())
    }

    fn render(file: &Path, geometry: GridGeometry, output: Option<&Path>) -> Result<()> {
        let document = MapDocument::read_file(file)?;

        let mut map = GridMap::with_catalog(Rc::new(StaticCatalog::new(geometry)));
        document.apply_to(&mut map)?;

        let target = output.map_or_else(|| derived_output_path(file), Path::to_path_buf);
        export_occupancy_png(&map, &target)
    }

    fn upgrade(file: &Path, format: BufferFormat, output: &Path) -> Result<()> {
        let data = fs::read(file).map_err(|err| file_error(file, "read", err))?;
        let cells = buffer::decode_cells(&data, format)?;
        let upgraded = buffer::encode_cells(&cells);
        fs::write(output, upgraded).map_err(|err| file_error(output, "write", err))
    }

    fn generate(&self, output: &Path, seed: u64, size: usize) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(seed);

        // A smoothed random height field gives contiguous regions instead of
        // per-cell noise.
        let mut field = Array2::<f64>::zeros((size, size));
        for value in &mut field {
            *value = rng.random::<f64>();
        }
        for _ in 0..GENERATE_SMOOTHING_PASSES {
            field = smooth(&field);
        }

        let catalog = StaticCatalog::new(GridGeometry::square([16.0, 16.0]));
        let mut map = GridMap::with_catalog(Rc::new(catalog));

        let progress =
            ProgressReporter::new(!self.cli.quiet, (size * size) as u64, "Generating cells");
        for ((row, col), &value) in field.indexed_iter() {
            let cell = if value > 0.6 {
                CellRef::new(2, [0, 0], 0)
            } else if value > 0.35 {
                CellRef::new(1, [0, 0], 0)
            } else {
                CellRef::INVALID
            };
            map.set_cell(0, [col as i32, row as i32], cell)?;
            progress.advance(1);
        }
        progress.finish();

        MapDocument::from_map(&map).write_file(output)
    }
}

fn build_geometry(
    shape: ShapeArg,
    axis: AxisArg,
    layout: LayoutArg,
    cell_size: [f64; 2],
) -> GridGeometry {
    GridGeometry {
        shape: match shape {
            ShapeArg::Square => CellShape::Square,
            ShapeArg::Isometric => CellShape::Isometric,
            ShapeArg::HalfOffsetSquare => CellShape::HalfOffsetSquare,
            ShapeArg::Hexagon => CellShape::Hexagon,
        },
        offset_axis: match axis {
            AxisArg::Horizontal => OffsetAxis::Horizontal,
            AxisArg::Vertical => OffsetAxis::Vertical,
        },
        layout: match layout {
            LayoutArg::Stacked => GridLayout::Stacked,
            LayoutArg::StackedOffset => GridLayout::StackedOffset,
            LayoutArg::StairsRight => GridLayout::StairsRight,
            LayoutArg::StairsDown => GridLayout::StairsDown,
            LayoutArg::DiamondRight => GridLayout::DiamondRight,
            LayoutArg::DiamondDown => GridLayout::DiamondDown,
        },
        cell_size,
    }
}

fn derived_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let name = format!("{}_snapshot.png", stem.to_string_lossy());
    input.parent().map_or_else(|| PathBuf::from(&name), |parent| parent.join(&name))
}

// 3x3 box blur with edge clamping.
fn smooth(field: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = field.dim();
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let mut sum = 0.0;
        let mut count = 0.0;
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                let (r, c) = (row as i64 + dr, col as i64 + dc);
                if r < 0 || c < 0 {
                    continue;
                }
                if let Some(&value) = field.get([r as usize, c as usize]) {
                    sum += value;
                    count += 1.0;
                }
            }
        }
        sum / count
    })
}

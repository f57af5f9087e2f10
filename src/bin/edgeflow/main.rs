//! Edgeflow CLI - edge-loop editing from the command line.
//!
//! Usage: edgeflow <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `edgeflow --help` for available commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use edgeflow::algo::edgeloop::{
    build_loops, Blend, BlendType, CurveOptions, FitReport, FlowOptions, LinearOptions, Rails,
};
use edgeflow::algo::path::DistanceMode;
use edgeflow::algo::session::{EdgeOperation, EdgeSession, VertexCurveSession};
use edgeflow::algo::vertex_curve::VertexCurveOptions;
use edgeflow::io;
use edgeflow::mesh::{HalfEdgeMesh, Selection, VertexId};

#[derive(Parser)]
#[command(name = "edgeflow")]
#[command(author, version, about = "Edge-loop editing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Also describe the loops of this edge selection
        #[arg(long, value_parser = parse_pair, value_delimiter = ',')]
        edges: Option<Vec<(usize, usize)>>,
    },

    /// Make edge loops follow the curvature of the crossing rings
    Flow {
        #[command(flatten)]
        files: EdgeFiles,

        /// Curve tension
        #[arg(short, long, default_value = "1.8", allow_negative_numbers = true)]
        tension: f64,

        /// Number of iterations
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Crease angle in degrees below which the ring is extrapolated
        #[arg(long, default_value = "0")]
        min_angle: f64,

        #[command(flatten)]
        blend: BlendArgs,

        #[command(flatten)]
        mix: MixArg,
    },

    /// Fit one curve over each open edge loop
    Curve {
        #[command(flatten)]
        files: EdgeFiles,

        /// Handle length relative to half the end-to-end distance
        #[arg(short, long, default_value = "1.0", allow_negative_numbers = true)]
        tension: f64,

        /// Take end tangents from the mesh past the loop
        #[arg(long, value_enum, default_value = "off")]
        rail: RailMode,

        #[command(flatten)]
        blend: BlendArgs,

        #[command(flatten)]
        mix: MixArg,
    },

    /// Straighten each open edge loop between its ends
    Linear {
        #[command(flatten)]
        files: EdgeFiles,

        /// Distribute vertices at equal steps
        #[arg(long)]
        space_evenly: bool,

        #[command(flatten)]
        mix: MixArg,
    },

    /// Place single selected edges between their outer neighbours
    Straighten {
        #[command(flatten)]
        files: EdgeFiles,

        /// Distance of each endpoint from its neighbour
        #[arg(short, long, default_value = "0")]
        distance: f64,

        #[command(flatten)]
        mix: MixArg,
    },

    /// Refit selected edges across each edge ring
    RingCurve {
        #[command(flatten)]
        files: EdgeFiles,

        /// Rail tension
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        tension: f64,

        #[command(flatten)]
        mix: MixArg,
    },

    /// Bend the path through picked vertices onto an arc or spline
    VertexCurve {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Picked vertices in order, e.g. 3,9,14
        #[arg(long, required = true, value_delimiter = ',')]
        verts: Vec<usize>,

        /// Curve tension (-1 is flat)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        tension: f64,

        /// Count path length in edges instead of distance
        #[arg(long)]
        topology_distance: bool,

        /// Bend a two-point arc to the other side
        #[arg(long)]
        flip: bool,

        /// Turn a two-point arc into the surface plane
        #[arg(long)]
        rotate: bool,

        /// One arc-length remap over the whole chain
        #[arg(long)]
        space_evenly: bool,

        #[command(flatten)]
        mix: MixArg,
    },
}

#[derive(Args)]
struct EdgeFiles {
    /// Input mesh file
    input: PathBuf,

    /// Output mesh file
    output: PathBuf,

    /// Selected edges as vertex pairs, e.g. 0-1,1-2
    #[arg(long, required = true, value_parser = parse_pair, value_delimiter = ',')]
    edges: Vec<(usize, usize)>,
}

#[derive(Args)]
struct BlendArgs {
    /// Vertices blended at the start of each loop
    #[arg(long, default_value = "0")]
    blend_start: usize,

    /// Vertices blended at the end of each loop
    #[arg(long, default_value = "0")]
    blend_end: usize,

    /// Blend weight profile
    #[arg(long, value_enum, default_value = "linear")]
    blend_type: BlendKind,
}

impl BlendArgs {
    fn to_blend(&self) -> Blend {
        Blend {
            start: self.blend_start,
            end: self.blend_end,
            kind: match self.blend_type {
                BlendKind::Linear => BlendType::Linear,
                BlendKind::Smooth => BlendType::Smooth,
            },
        }
    }
}

#[derive(Args)]
struct MixArg {
    /// Blend between the original (0) and fitted (1) positions
    #[arg(short, long, default_value = "1.0")]
    mix: f64,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum BlendKind {
    /// Weight grows linearly along the loop
    Linear,
    /// Smoothstep weight
    Smooth,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum RailMode {
    /// Tangents from the loop itself
    Off,
    /// Rail at the first vertex
    Start,
    /// Rail at the last vertex
    End,
    /// Rails at both ends
    Both,
}

impl RailMode {
    fn to_rails(self) -> Rails {
        match self {
            RailMode::Off => Rails::default(),
            RailMode::Start => Rails {
                start: true,
                end: false,
            },
            RailMode::End => Rails {
                start: false,
                end: true,
            },
            RailMode::Both => Rails::both(),
        }
    }
}

/// Parse one `a-b` vertex pair of an `--edges` list.
fn parse_pair(s: &str) -> Result<(usize, usize), String> {
    let (a, b) = s
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("expected a vertex pair like 0-1, got '{}'", s))?;
    let a = a.trim().parse().map_err(|e| format!("bad vertex '{}': {}", a, e))?;
    let b = b.trim().parse().map_err(|e| format!("bad vertex '{}': {}", b, e))?;
    Ok((a, b))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, edges } => {
            cmd_info(&input, edges.as_deref())?;
        }

        Commands::Flow {
            files,
            tension,
            iterations,
            min_angle,
            blend,
            mix,
        } => {
            let options = FlowOptions::default()
                .with_tension(tension)
                .with_iterations(iterations)
                .with_min_angle(min_angle)
                .with_blend(blend.to_blend());
            println!(
                "Applying edge flow (tension={}, {} iterations, min angle={})...",
                tension, iterations, min_angle
            );
            cmd_edges(&files, EdgeOperation::Flow(options), mix.mix)?;
        }

        Commands::Curve {
            files,
            tension,
            rail,
            blend,
            mix,
        } => {
            let options = CurveOptions::default()
                .with_tension(tension)
                .with_rails(rail.to_rails())
                .with_blend(blend.to_blend());
            println!("Fitting loop curves (tension={})...", tension);
            cmd_edges(&files, EdgeOperation::Curve(options), mix.mix)?;
        }

        Commands::Linear {
            files,
            space_evenly,
            mix,
        } => {
            let options = LinearOptions::default().with_space_evenly(space_evenly);
            println!("Straightening loops (space evenly={})...", space_evenly);
            cmd_edges(&files, EdgeOperation::Linear(options), mix.mix)?;
        }

        Commands::Straighten {
            files,
            distance,
            mix,
        } => {
            println!("Straightening single edges (distance={})...", distance);
            cmd_edges(&files, EdgeOperation::Straighten { distance }, mix.mix)?;
        }

        Commands::RingCurve {
            files,
            tension,
            mix,
        } => {
            println!("Fitting ring curves (tension={})...", tension);
            cmd_edges(&files, EdgeOperation::RingCurve { tension }, mix.mix)?;
        }

        Commands::VertexCurve {
            input,
            output,
            verts,
            tension,
            topology_distance,
            flip,
            rotate,
            space_evenly,
            mix,
        } => {
            let mode = if topology_distance {
                DistanceMode::Topology
            } else {
                DistanceMode::EdgeLength
            };
            let options = VertexCurveOptions::default()
                .with_tension(tension)
                .with_distance_mode(mode)
                .with_flip(flip)
                .with_rotate(rotate)
                .with_space_evenly(space_evenly);
            cmd_vertex_curve(&input, &output, &verts, &options, mix.mix)?;
        }
    }

    Ok(())
}

fn load(input: &Path) -> Result<HalfEdgeMesh, Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    Ok(mesh)
}

fn print_report(report: &FitReport) {
    if report.is_clean() {
        return;
    }
    println!("Skipped {} elements:", report.skipped);
    for message in &report.messages {
        println!("  {}", message);
    }
}

fn cmd_info(
    input: &Path,
    edges: Option<&[(usize, usize)]>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Edges: {}", mesh.num_edges());
    println!("Faces: {}", mesh.num_faces());

    // Bounding box
    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    // Face types
    let quads = mesh.face_ids().filter(|&f| mesh.face_degree(f) == 4).count();
    let triangles = mesh.face_ids().filter(|&f| mesh.face_degree(f) == 3).count();
    let ngons = mesh.num_faces() - quads - triangles;
    println!("Face types: {} quads, {} triangles, {} n-gons", quads, triangles, ngons);

    // Poles are the vertices where edge flow changes direction
    let poles = mesh
        .vertex_ids()
        .filter(|&v| !mesh.is_boundary_vertex(v) && mesh.valence(v) != 4)
        .count();
    println!("Poles (interior valence != 4): {}", poles);

    let boundary_verts = mesh.vertex_ids().filter(|&v| mesh.is_boundary_vertex(v)).count();
    if boundary_verts == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary_verts);
    }

    if let Some(pairs) = edges {
        let selection = Selection::from_vertex_pairs(&mesh, pairs)?;
        let loops = build_loops(&mesh, selection.edges())?;

        println!("\nLoops: {}", loops.len());
        for (i, edge_loop) in loops.loops().iter().enumerate() {
            println!(
                "  #{}: {} edges, {}, max valence {}, average edge length {:.6}",
                i,
                edge_loop.len(),
                if edge_loop.is_cyclic() { "cyclic" } else { "open" },
                edge_loop.max_valence(),
                edge_loop.average_edge_length(&mesh)
            );
        }
        println!("Rings: {}", loops.rings().len());
    }

    Ok(())
}

fn cmd_edges(
    files: &EdgeFiles,
    operation: EdgeOperation,
    mix: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(&files.input)?;

    let selection = Selection::from_vertex_pairs(&mesh, &files.edges)?;
    let mut session = EdgeSession::begin(&mesh, &selection)?;
    println!("Selection: {} edges in {} loops", selection.edges().len(), session.loops().len());

    let start = Instant::now();
    let report = session.apply(&mut mesh, &operation, mix)?;
    let elapsed = start.elapsed();
    print_report(&report);

    io::save(&mesh, &files.output)?;
    println!("Saved: {} ({:.2?})", files.output.display(), elapsed);

    Ok(())
}

fn cmd_vertex_curve(
    input: &Path,
    output: &Path,
    verts: &[usize],
    options: &VertexCurveOptions,
    mix: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(input)?;

    let selection = Selection::from_picks(verts.iter().map(|&v| VertexId::new(v)));
    let mut session = VertexCurveSession::begin(&mesh, &selection, options)?;
    println!(
        "Fitting curve through {} picks over {} vertices (tension={})...",
        verts.len(),
        session.chain().vertices().len(),
        options.tension
    );

    let start = Instant::now();
    let report = session.apply(&mut mesh, options, mix)?;
    let elapsed = start.elapsed();
    print_report(&report);

    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

use std::{fs::{self, File}, io::{BufWriter, Write}};

use clap::Parser;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{info, level_filters::LevelFilter};
use webgraph_codes::Properties;

#[derive(Parser, Debug)]
#[command(about = "Generates a uniform random graph as <dest>.graph.txt, without self loops")]
struct Args {
    /// The basename of the graph to be written
    #[arg(short, long)]
    dest: String,
    /// Number of vertices
    #[arg(short, long)]
    vertices: usize,
    /// Expected number of edges
    #[arg(short, long)]
    edges: usize,
    /// Seed of the generator, random if missing
    #[arg(short, long)]
    seed: Option<u64>,
    /// Also write <dest>.properties with the default codes
    #[arg(long)]
    properties: bool,
    /// The maximum level of the log messages
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Writes a graph where each vertex gets a uniform number of distinct successors in
/// `[0, 2 * edges / vertices)`, returning the number of arcs.
fn generate_uniform_random_graph(vertices: usize, edges: usize, rng: &mut StdRng, dest: &mut impl Write) -> std::io::Result<usize> {
    let expected = edges / vertices.max(1);
    let mut total_edges = 0;
    let mut succs = Vec::new();

    for i in 0..vertices {
        let outdegree = if expected == 0 { 0 } else { rng.gen_range(0..2 * expected) }.min(vertices - 1);

        succs.clear();
        while succs.len() < outdegree {
            // Draw among the other vertices only
            let mut next = rng.gen_range(0..vertices - 1);
            if next >= i {
                next += 1;
            }

            if !succs.contains(&next) {
                succs.push(next);
            }
        }
        succs.sort_unstable();
        total_edges += succs.len();

        write!(dest, "{}", i)?;
        for s in succs.iter() {
            write!(dest, "\t{}", s)?;
        }
        writeln!(dest)?;
    }

    Ok(total_edges)
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut dest = BufWriter::new(File::create(format!("{}.graph.txt", args.dest))?);
    let total_edges = generate_uniform_random_graph(args.vertices, args.edges, &mut rng, &mut dest)?;
    dest.flush()?;

    if args.properties {
        let props = Properties { nodes: args.vertices, arcs: total_edges, ..Properties::default() };
        fs::write(format!("{}.properties", args.dest), String::from(props))?;
    }

    info!(dest = %args.dest, vertices = args.vertices, edges = total_edges, "generated random graph");

    Ok(())
}

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, level_filters::LevelFilter};
use webgraph_codes::{load_graph, coded_graph::CodedGraph, GraphError, ImmutableGraph};

#[derive(Parser, Debug)]
#[command(about = "Prints the successor lists of a graph (<basename>.graph.txt, <basename>.properties)")]
struct Args {
    /// The basename of the graph
    basename: String,
    /// Print one JSON object per node instead of plain text
    #[arg(long)]
    json: bool,
    /// The maximum level of the log messages
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Serialize)]
struct NodeRecord<'a> {
    node: usize,
    outdegree: usize,
    successors: &'a [usize],
}

fn print_graph(graph: &CodedGraph, json: bool) -> Result<(), GraphError> {
    let mut out = BufWriter::new(io::stdout().lock());

    if json {
        writeln!(out, "{}", serde_json::json!({ "nodes": graph.num_nodes(), "arcs": graph.num_arcs() }))?;
    } else {
        writeln!(out, "num vertices: {}", graph.num_nodes())?;
    }

    let mut iter = graph.iter();
    while let Some(node) = iter.next() {
        let node = node?;
        let successors = iter.successor_array();

        if json {
            let record = NodeRecord { node, outdegree: iter.outdegree(), successors };
            serde_json::to_writer(&mut out, &record).map_err(io::Error::from)?;
            writeln!(out)?;
        } else {
            writeln!(out, "outdegree : {}", iter.outdegree())?;
            writeln!(out, "********************   {}", node)?;
            writeln!(out, "{}", successors.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(" "))?;
        }
    }

    out.flush()?;

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = load_graph(&args.basename).and_then(|graph| print_graph(&graph, args.json));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(basename = %args.basename, "{}", e);
            ExitCode::FAILURE
        }
    }
}

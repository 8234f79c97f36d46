use clap::{Arg, ArgMatches, Command};
use neuronet::{
    GraphStore, NodeId, SparseGraph,
    graphbuilder::{GraphBuilder, default_dataset},
};
use std::error::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn node_arg() -> Arg {
    Arg::new("node")
        .long("node")
        .short('n')
        .required(true)
        .value_parser(clap::value_parser!(NodeId))
        .help("Dense node id")
}

fn depth_arg() -> Arg {
    Arg::new("depth")
        .long("depth")
        .short('d')
        .default_value("2")
        .value_parser(clap::value_parser!(u32))
        .help("Maximum number of hops from the start node")
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neuronet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = Command::new("NeuroNet CLI")
        .about("Query a sparse directed graph loaded from an edge list")
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .help("Edge list file or dataset name under DATA_DIR [default: $NEURONET_GRAPH]"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("stats").about("Node count, edge count and memory estimate"))
        .subcommand(
            Command::new("degree")
                .about("Out-degree and in-degree of a node")
                .arg(node_arg()),
        )
        .subcommand(
            Command::new("neighbors")
                .about("Sorted destinations of a node's outgoing edges")
                .arg(node_arg()),
        )
        .subcommand(Command::new("max-degree").about("Node with the highest out-degree"))
        .subcommand(
            Command::new("bfs")
                .about("Bounded breadth-first search")
                .arg(node_arg())
                .arg(depth_arg()),
        )
        .subcommand(
            Command::new("dfs")
                .about("Depth-first search over everything reachable")
                .arg(node_arg()),
        )
        .subcommand(
            Command::new("subgraph")
                .about("Edges of the subgraph discovered by a bounded BFS")
                .arg(node_arg())
                .arg(depth_arg()),
        )
        .subcommand(Command::new("debug").about("Dump the first CSR entries"))
        .get_matches();

    let file = matches
        .get_one::<String>("file")
        .cloned()
        .unwrap_or_else(default_dataset);
    let graph = match GraphBuilder::new(&file).build() {
        Ok(graph) => graph,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    };

    match matches.subcommand() {
        Some(("stats", _)) => println!("{}", graph.stats()),
        Some(("degree", sub_m)) => handle_degree(&graph, sub_m),
        Some(("neighbors", sub_m)) => handle_neighbors(&graph, sub_m),
        Some(("max-degree", _)) => handle_max_degree(&graph),
        Some(("bfs", sub_m)) => handle_bfs(&graph, sub_m),
        Some(("dfs", sub_m)) => handle_dfs(&graph, sub_m),
        Some(("subgraph", sub_m)) => handle_subgraph(&graph, sub_m),
        Some(("debug", _)) => handle_debug(&graph),
        _ => println!("No valid subcommand provided. Use --help for usage."),
    }

    Ok(())
}

fn handle_degree(graph: &SparseGraph, matches: &ArgMatches) {
    let node: &NodeId = matches.get_one::<NodeId>("node").unwrap();

    match (graph.out_degree(*node), graph.in_degree(*node)) {
        (Some(out), Some(inc)) => {
            println!("Node {}: out-degree {}, in-degree {}", node, out, inc)
        }
        _ => {
            eprintln!(
                "Error: node {} is not in the graph (0..{})",
                node,
                graph.node_count()
            );
            std::process::exit(1);
        }
    }
}

fn handle_neighbors(graph: &SparseGraph, matches: &ArgMatches) {
    let node: &NodeId = matches.get_one::<NodeId>("node").unwrap();
    let neighbors = graph.neighbors(*node);

    println!("Found {} neighbors for node {}.", neighbors.len(), node);
    for id in neighbors {
        println!(" - {}", id);
    }
}

fn handle_max_degree(graph: &SparseGraph) {
    match graph.node_of_max_out_degree() {
        Some((node, degree)) => println!("Node {} has the highest out-degree: {}", node, degree),
        None => println!("No node has outgoing edges."),
    }
}

fn handle_bfs(graph: &SparseGraph, matches: &ArgMatches) {
    let node: &NodeId = matches.get_one::<NodeId>("node").unwrap();
    let depth: &u32 = matches.get_one::<u32>("depth").unwrap();

    let visited = graph.bfs(*node, *depth);
    println!(
        "Found {} nodes within {} hops of node {}.",
        visited.len(),
        depth,
        node
    );
    for (id, distance) in visited {
        println!(" - {} (distance {})", id, distance);
    }
}

fn handle_dfs(graph: &SparseGraph, matches: &ArgMatches) {
    let node: &NodeId = matches.get_one::<NodeId>("node").unwrap();

    let order = graph.dfs(*node);
    println!("Visited {} nodes from node {}.", order.len(), node);
    for id in order {
        println!(" - {}", id);
    }
}

fn handle_subgraph(graph: &SparseGraph, matches: &ArgMatches) {
    let node: &NodeId = matches.get_one::<NodeId>("node").unwrap();
    let depth: &u32 = matches.get_one::<u32>("depth").unwrap();

    let edges = graph.subgraph_edges(*node, *depth);
    println!(
        "Found {} edges in the subgraph of node {} (depth {}).",
        edges.len(),
        node,
        depth
    );
    for (src, dst) in edges {
        println!(" - {} -> {}", src, dst);
    }
}

fn handle_debug(graph: &SparseGraph) {
    let csr = graph.adjacency();
    println!("{}", graph.stats());
    println!(
        "offsets (first 10): {:?}",
        &csr.offsets()[..csr.offsets().len().min(10)]
    );
    println!(
        "targets (first 20): {:?}",
        &csr.targets()[..csr.targets().len().min(20)]
    );
}

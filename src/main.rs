use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use streetgraph::pipeline::{self, Options, Paths};
use streetgraph::source::FileFormat;
use streetgraph::{table, Graph};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] streetgraph::Error);

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a map document into node and edge tables
    Extract {
        /// The path to the map document (Overpass JSON or OSM XML)
        input: PathBuf,

        /// Format of the map document
        #[arg(long, value_enum, default_value_t = Format::Auto)]
        format: Format,

        /// Where to write the node table
        #[arg(long, default_value = "nodes.csv")]
        nodes: PathBuf,

        /// Where to write the edge table
        #[arg(long, default_value = "edges.csv")]
        edges: PathBuf,
    },

    /// Filter and weigh previously extracted tables
    Process {
        /// The extracted node table
        #[arg(long, default_value = "nodes.csv")]
        nodes: PathBuf,

        /// The extracted edge table
        #[arg(long, default_value = "edges.csv")]
        edges: PathBuf,

        /// Where to write the processed node table
        #[arg(long, default_value = "processed_nodes.csv")]
        out_nodes: PathBuf,

        /// Where to write the processed edge table
        #[arg(long, default_value = "processed_edges.csv")]
        out_edges: PathBuf,
    },

    /// Convert a map document straight into processed tables
    Run {
        /// The path to the map document (Overpass JSON or OSM XML)
        input: PathBuf,

        /// Format of the map document
        #[arg(long, value_enum, default_value_t = Format::Auto)]
        format: Format,

        /// Directory for all tables
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Also write the unfiltered nodes.csv and edges.csv
        #[arg(long)]
        keep_intermediate: bool,
    },

    /// Print statistics of processed tables
    Inspect {
        /// The processed node table
        #[arg(long, default_value = "processed_nodes.csv")]
        nodes: PathBuf,

        /// The processed edge table
        #[arg(long, default_value = "processed_edges.csv")]
        edges: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Auto,
    Json,
    JsonGz,
    JsonBz2,
    Xml,
    XmlGz,
    XmlBz2,
}

impl From<Format> for FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => FileFormat::Unknown,
            Format::Json => FileFormat::Json,
            Format::JsonGz => FileFormat::JsonGz,
            Format::JsonBz2 => FileFormat::JsonBz2,
            Format::Xml => FileFormat::Xml,
            Format::XmlGz => FileFormat::XmlGz,
            Format::XmlBz2 => FileFormat::XmlBz2,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut log = colog::default_builder();
    log.filter_level(if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
    log.init();

    match cli.command {
        Command::Extract {
            input,
            format,
            nodes,
            edges,
        } => {
            let paths = Paths {
                nodes,
                edges,
                ..Paths::in_dir(&input, ".")
            };
            let options = Options {
                file_format: format.into(),
                write_intermediate: true,
            };
            let tables = pipeline::extract_file(&paths, &options)
                .map_err(|e| GraphLoadError(input, e))?;
            println!("nodes: {}", tables.nodes.len());
            println!("edges: {}", tables.edges.len());
        }

        Command::Process {
            nodes,
            edges,
            out_nodes,
            out_edges,
        } => {
            let paths = Paths {
                input: PathBuf::new(),
                nodes,
                edges,
                processed_nodes: out_nodes,
                processed_edges: out_edges,
            };
            let summary = pipeline::process_files(&paths)?;
            println!("nodes: {} -> {}", summary.extracted_nodes, summary.processed_nodes);
            println!("edges: {} -> {}", summary.extracted_edges, summary.processed_edges);
        }

        Command::Run {
            input,
            format,
            out_dir,
            keep_intermediate,
        } => {
            let paths = Paths::in_dir(&input, &out_dir);
            let options = Options {
                file_format: format.into(),
                write_intermediate: keep_intermediate,
            };
            let summary =
                pipeline::run(&paths, &options).map_err(|e| GraphLoadError(input, e))?;
            println!("nodes: {} -> {}", summary.extracted_nodes, summary.processed_nodes);
            println!("edges: {} -> {}", summary.extracted_edges, summary.processed_edges);
        }

        Command::Inspect { nodes, edges } => {
            let g = load_graph(&nodes, &edges)?;
            println!("nodes: {}", g.len());
            println!("edges: {}", g.edge_count());
            println!(
                "zero-weight edges: {}",
                g.edges().filter(|&(_, _, weight)| weight == 0.0).count()
            );
        }
    }

    Ok(())
}

fn load_graph<P: AsRef<Path>>(nodes: P, edges: P) -> Result<Graph, GraphLoadError> {
    let nodes_path = nodes.as_ref();
    let edges_path = edges.as_ref();

    let nodes = table::read_nodes_from_file(nodes_path)
        .map_err(|e| GraphLoadError(PathBuf::from(nodes_path), e))?;
    let edges = table::read_weighted_edges_from_file(edges_path)
        .map_err(|e| GraphLoadError(PathBuf::from(edges_path), e))?;

    Graph::from_tables(&nodes, &edges).map_err(|e| GraphLoadError(PathBuf::from(edges_path), e))
}

// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Running the extract → filter → weight stages over files.
//!
//! Every function here either produces all of its output files, or none of them:
//! tables are first written to `*.tmp` siblings of their destination, and only
//! renamed into place once every table of the step has been written.
//! Files replaced by the renames are kept as `*.bak` siblings until all renames
//! succeed; if any rename fails, the earlier ones are reverted.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::source::{self, FileFormat};
use crate::weight::NodeIndex;
use crate::{extract, filter, table, weight, Dataset, Result, Tables};

/// Locations of every file read or written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// The raw map document.
    pub input: PathBuf,

    /// Node table, as extracted.
    pub nodes: PathBuf,

    /// Edge table, as extracted.
    pub edges: PathBuf,

    /// Node table after the integrity filter.
    pub processed_nodes: PathBuf,

    /// Weighted edge table after the integrity filter.
    pub processed_edges: PathBuf,
}

impl Paths {
    /// Places all tables in `dir` under their conventional names:
    /// `nodes.csv`, `edges.csv`, `processed_nodes.csv` and `processed_edges.csv`.
    pub fn in_dir<P: AsRef<Path>, D: AsRef<Path>>(input: P, dir: D) -> Self {
        let dir = dir.as_ref();
        Self {
            input: input.as_ref().to_path_buf(),
            nodes: dir.join("nodes.csv"),
            edges: dir.join("edges.csv"),
            processed_nodes: dir.join("processed_nodes.csv"),
            processed_edges: dir.join("processed_edges.csv"),
        }
    }
}

/// Additional controls for running the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Format of the raw map document.
    pub file_format: FileFormat,

    /// Whether [run] should also write the extracted, unfiltered tables
    /// to [Paths::nodes] and [Paths::edges].
    pub write_intermediate: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            file_format: FileFormat::Unknown,
            write_intermediate: true,
        }
    }
}

/// Row counts before and after processing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub extracted_nodes: usize,
    pub extracted_edges: usize,
    pub processed_nodes: usize,
    pub processed_edges: usize,
}

impl Summary {
    fn new((extracted_nodes, extracted_edges): (usize, usize), processed: &Dataset) -> Self {
        Self {
            extracted_nodes,
            extracted_edges,
            processed_nodes: processed.nodes.len(),
            processed_edges: processed.edges.len(),
        }
    }
}

/// Runs the [filter] and [weight] stages over extracted tables.
pub fn process(tables: Tables) -> Result<Dataset> {
    let Tables { nodes, edges } = filter::filter(tables);
    let edges = {
        let index = NodeIndex::new(&nodes);
        weight::weigh(&index, edges)?
    };
    Ok(Dataset { nodes, edges })
}

/// Reads the raw map document and writes the extracted node and edge tables.
pub fn extract_file(paths: &Paths, options: &Options) -> Result<Tables> {
    let elements = source::read_elements_from_file(options.file_format, &paths.input)?;
    let tables = extract::extract(elements);

    let staged = [
        Staged::new(&paths.nodes, |f| table::write_nodes(f, &tables.nodes))?,
        Staged::new(&paths.edges, |f| table::write_edges(f, &tables.edges))?,
    ];
    commit(staged)?;
    Ok(tables)
}

/// Reads previously extracted node and edge tables, processes them,
/// and writes the processed tables.
pub fn process_files(paths: &Paths) -> Result<Summary> {
    let tables = Tables {
        nodes: table::read_nodes_from_file(&paths.nodes)?,
        edges: table::read_edges_from_file(&paths.edges)?,
    };
    let extracted = (tables.nodes.len(), tables.edges.len());

    let dataset = process(tables)?;
    write_dataset(paths, &dataset)?;
    Ok(Summary::new(extracted, &dataset))
}

/// Writes the processed node and edge tables.
pub fn write_dataset(paths: &Paths, dataset: &Dataset) -> Result<()> {
    let staged = [
        Staged::new(&paths.processed_nodes, |f| {
            table::write_nodes(f, &dataset.nodes)
        })?,
        Staged::new(&paths.processed_edges, |f| {
            table::write_weighted_edges(f, &dataset.edges)
        })?,
    ];
    commit(staged)
}

/// Runs the whole pipeline: from the raw map document to the processed tables.
pub fn run(paths: &Paths, options: &Options) -> Result<Summary> {
    let elements = source::read_elements_from_file(options.file_format, &paths.input)?;
    let tables = extract::extract(elements);

    let mut staged = Vec::with_capacity(4);
    if options.write_intermediate {
        staged.push(Staged::new(&paths.nodes, |f| {
            table::write_nodes(f, &tables.nodes)
        })?);
        staged.push(Staged::new(&paths.edges, |f| {
            table::write_edges(f, &tables.edges)
        })?);
    }

    let extracted = (tables.nodes.len(), tables.edges.len());
    let dataset = process(tables)?;

    staged.push(Staged::new(&paths.processed_nodes, |f| {
        table::write_nodes(f, &dataset.nodes)
    })?);
    staged.push(Staged::new(&paths.processed_edges, |f| {
        table::write_weighted_edges(f, &dataset.edges)
    })?);
    commit(staged)?;

    log::info!(
        "wrote {} and {}",
        paths.processed_nodes.display(),
        paths.processed_edges.display()
    );
    Ok(Summary::new(extracted, &dataset))
}

/// A fully written table waiting to be moved to its destination.
///
/// The temporary file is removed if the table is never committed.
struct Staged {
    tmp: PathBuf,
    dst: PathBuf,
    committed: bool,
}

impl Staged {
    fn new<F: FnOnce(File) -> Result<()>>(dst: &Path, write: F) -> Result<Self> {
        if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let staged = Self {
            tmp: staging_path(dst),
            dst: dst.to_path_buf(),
            committed: false,
        };
        write(File::create(&staged.tmp)?)?;
        Ok(staged)
    }

    fn commit(mut self) -> Result<Committed> {
        let backup = if self.dst.is_file() {
            let backup = sibling_path(&self.dst, ".bak");
            fs::rename(&self.dst, &backup)?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(&self.tmp, &self.dst) {
            if let Some(backup) = &backup {
                _ = fs::rename(backup, &self.dst);
            }
            return Err(e.into());
        }

        self.committed = true;
        Ok(Committed {
            dst: self.dst.clone(),
            backup,
        })
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if !self.committed {
            _ = fs::remove_file(&self.tmp);
        }
    }
}

/// A table moved to its destination, together with the file it replaced.
struct Committed {
    dst: PathBuf,
    backup: Option<PathBuf>,
}

impl Committed {
    fn revert(self) {
        match self.backup {
            Some(backup) => {
                _ = fs::rename(backup, &self.dst);
            }
            None => {
                _ = fs::remove_file(&self.dst);
            }
        }
    }

    fn finish(self) {
        if let Some(backup) = self.backup {
            _ = fs::remove_file(backup);
        }
    }
}

fn sibling_path(dst: &Path, suffix: &str) -> PathBuf {
    let mut name = dst.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    dst.with_file_name(name)
}

fn staging_path(dst: &Path) -> PathBuf {
    sibling_path(dst, ".tmp")
}

fn commit<I: IntoIterator<Item = Staged>>(staged: I) -> Result<()> {
    let mut done = Vec::new();
    for s in staged {
        match s.commit() {
            Ok(c) => done.push(c),
            Err(e) => {
                log::error!("failed to move tables into place, reverting: {e}");
                done.into_iter().rev().for_each(Committed::revert);
                return Err(e);
            }
        }
    }
    done.into_iter().for_each(Committed::finish);
    Ok(())
}

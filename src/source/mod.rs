// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Reading raw map documents into [Elements](Element).

use std::fs::File;
use std::io;
use std::path::Path;

use crate::{Error, Result};

mod json;
mod model;
mod xml;

pub use model::{Element, NodeElement, WayElement};

/// Format of the input map document
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the file extension,
    /// falling back to [FileFormat::Json].
    #[default]
    Unknown,

    /// Force uncompressed [Overpass JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON)
    Json,

    /// Force [Overpass JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    JsonGz,

    /// Force [Overpass JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    JsonBz2,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format of a file based on its name,
    /// e.g. `map.osm.gz` is [FileFormat::XmlGz].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let name = path
            .as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let (stem, compression) = if let Some(stem) = name.strip_suffix(".gz") {
            (stem, ".gz")
        } else if let Some(stem) = name.strip_suffix(".bz2") {
            (stem, ".bz2")
        } else {
            (name.as_str(), "")
        };

        let is_xml = stem.ends_with(".osm") || stem.ends_with(".xml");
        match (is_xml, compression) {
            (false, "") => Self::Json,
            (false, ".gz") => Self::JsonGz,
            (false, _) => Self::JsonBz2,
            (true, "") => Self::Xml,
            (true, ".gz") => Self::XmlGz,
            (true, _) => Self::XmlBz2,
        }
    }
}

/// Parse map elements from a reader in the provided [FileFormat].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
/// [FileFormat::Unknown] is read as [FileFormat::Json], as there's no file name to guess from.
pub fn read_elements_from_io<R: io::Read>(format: FileFormat, reader: R) -> Result<Vec<Element>> {
    match format {
        FileFormat::Unknown | FileFormat::Json => json::elements_from_io(io::BufReader::new(reader)),

        FileFormat::JsonGz => {
            let d = flate2::read::MultiGzDecoder::new(reader);
            json::elements_from_io(io::BufReader::new(d))
        }

        FileFormat::JsonBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(reader);
            json::elements_from_io(io::BufReader::new(d))
        }

        FileFormat::Xml => xml::elements_from_io(io::BufReader::new(reader)),

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(reader);
            xml::elements_from_io(io::BufReader::new(d))
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(reader);
            xml::elements_from_io(io::BufReader::new(d))
        }
    }
}

/// Parse map elements from a file at the provided path.
///
/// A file which can't be opened results in [Error::SourceUnavailable].
pub fn read_elements_from_file<P: AsRef<Path>>(
    format: FileFormat,
    path: P,
) -> Result<Vec<Element>> {
    let path = path.as_ref();
    let format = match format {
        FileFormat::Unknown => FileFormat::from_path(path),
        other => other,
    };

    let f = File::open(path).map_err(|e| Error::SourceUnavailable(path.to_path_buf(), e))?;
    log::debug!("reading {} as {:?}", path.display(), format);
    read_elements_from_io(format, f)
}

/// Parse map elements from a static buffer in the provided [FileFormat].
pub fn read_elements_from_buffer(format: FileFormat, data: &[u8]) -> Result<Vec<Element>> {
    match format {
        // Fast paths are available for uncompressed in-memory data
        FileFormat::Unknown | FileFormat::Json => json::elements_from_buffer(data),
        FileFormat::Xml => xml::elements_from_buffer(data),
        _ => read_elements_from_io(format, io::Cursor::new(data)),
    }
}

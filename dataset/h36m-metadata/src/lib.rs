#![deny(rust_2018_idioms)]
//! Sequence metadata for the Human3.6M motion capture dataset.
//!
//! The dataset ships a `metadata.xml` which maps every (subject, action,
//! subaction) triple to the file name prefix of the recorded sequence, lists
//! human readable action names and lists the camera ids. [SequenceMetadataIndex]
//! reads these three sections once and answers lookups afterwards.
//!
//! ```no_run
//! let index = h36m_metadata::SequenceMetadataIndex::from_path("metadata.xml")?;
//! let fname = index.base_filename("S1", "2", "1", "54138969")?;
//! # Ok::<(), h36m_metadata::Error>(())
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub mod xml_tree;

use crate::xml_tree::Element;

/// Number of data rows of the `mapping` table used by the published dataset
/// revision: 15 actions with 2 subactions each plus 2 extra rows.
pub const H36M_MAPPING_ROWS: usize = 32;

/// Number of leading cells in each `mapping` row which are not per-subject.
const MAPPING_LABEL_CELLS: usize = 2;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("xml error: {0}")]
    Xml(#[from] xml::reader::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed metadata document: {msg}")]
    MalformedDocument { msg: String },
    #[error("lookup failed: {what}")]
    Lookup { what: String },
}

impl Error {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedDocument { msg: msg.into() }
    }
    fn lookup<S: Into<String>>(what: S) -> Self {
        Error::Lookup { what: what.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Dataset-revision dependent shape of the metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataLayout {
    /// Number of `mapping` rows after the header row which are read. Later
    /// rows are ignored.
    #[serde(default = "default_mapping_rows")]
    pub mapping_rows: usize,
}

fn default_mapping_rows() -> usize {
    H36M_MAPPING_ROWS
}

impl Default for MetadataLayout {
    fn default() -> Self {
        Self {
            mapping_rows: default_mapping_rows(),
        }
    }
}

/// An (action, subaction) pair. Only unique together with a subject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionKey {
    pub action: String,
    pub subaction: String,
}

impl ActionKey {
    pub fn new<A: Into<String>, S: Into<String>>(action: A, subaction: S) -> Self {
        Self {
            action: action.into(),
            subaction: subaction.into(),
        }
    }
}

impl std::fmt::Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.action, self.subaction)
    }
}

/// Lookup tables read from the Human3.6M `metadata.xml`.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceMetadataIndex {
    subjects: Vec<String>,
    sequence_mappings: BTreeMap<String, BTreeMap<ActionKey, String>>,
    /// `(action_id, name)` in document order.
    action_names: Vec<(String, String)>,
    camera_ids: Vec<String>,
}

impl SequenceMetadataIndex {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path_with_layout(path, &MetadataLayout::default())
    }

    pub fn from_path_with_layout<P: AsRef<Path>>(path: P, layout: &MetadataLayout) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("reading sequence metadata from \"{}\"", path.display());
        let rdr = std::io::BufReader::new(std::fs::File::open(path)?);
        Self::from_xml_with_layout(rdr, layout)
    }

    pub fn from_xml<R: std::io::Read>(rdr: R) -> Result<Self> {
        Self::from_xml_with_layout(rdr, &MetadataLayout::default())
    }

    pub fn from_xml_with_layout<R: std::io::Read>(rdr: R, layout: &MetadataLayout) -> Result<Self> {
        let root = Element::parse(rdr)?;
        Self::from_element_with_layout(&root, layout)
    }

    pub fn from_element(root: &Element) -> Result<Self> {
        Self::from_element_with_layout(root, &MetadataLayout::default())
    }

    pub fn from_element_with_layout(root: &Element, layout: &MetadataLayout) -> Result<Self> {
        let mapping = section(root, "mapping")?;
        let (subjects, sequence_mappings) = read_mapping(mapping, layout)?;

        let action_names = section(root, "actionnames")?
            .children()
            .iter()
            .enumerate()
            .map(|(i, elem)| {
                let action_id = (i + 1).to_string();
                (action_id, elem.text().unwrap_or_default().to_string())
            })
            .collect::<Vec<_>>();

        let camera_ids = section(root, "dbcameras/index2id")?
            .children()
            .iter()
            .enumerate()
            .map(|(i, elem)| {
                elem.text()
                    .map(String::from)
                    .ok_or_else(|| Error::malformed(format!("camera id {i} has no text")))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "read metadata: {} subjects, {} action names, {} cameras",
            subjects.len(),
            action_names.len(),
            camera_ids.len()
        );

        Ok(Self {
            subjects,
            sequence_mappings,
            action_names,
            camera_ids,
        })
    }

    /// Subject ids in header-row order.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn sequence_mappings(&self) -> &BTreeMap<String, BTreeMap<ActionKey, String>> {
        &self.sequence_mappings
    }

    /// All `(ActionKey, prefix)` pairs recorded for `subject`.
    pub fn sequences(&self, subject: &str) -> Result<impl Iterator<Item = (&ActionKey, &str)>> {
        let mappings = self.sequences_of(subject)?;
        Ok(mappings.iter().map(|(k, v)| (k, v.as_str())))
    }

    /// File name prefix of one sequence, without the camera suffix.
    pub fn prefix(&self, subject: &str, action: &str, subaction: &str) -> Result<&str> {
        let key = ActionKey::new(action, subaction);
        self.sequences_of(subject)?
            .get(&key)
            .map(String::as_str)
            .ok_or_else(|| Error::lookup(format!("no sequence {key} for subject \"{subject}\"")))
    }

    /// Return `"{prefix}.{camera}"` for the given sequence.
    ///
    /// `camera` is appended verbatim and is not checked against
    /// [Self::camera_ids].
    pub fn base_filename(
        &self,
        subject: &str,
        action: &str,
        subaction: &str,
        camera: &str,
    ) -> Result<String> {
        let prefix = self.prefix(subject, action, subaction)?;
        Ok(format!("{prefix}.{camera}"))
    }

    /// Alias of [Self::base_filename].
    pub fn resolve_base_filename(
        &self,
        subject: &str,
        action: &str,
        subaction: &str,
        camera: &str,
    ) -> Result<String> {
        self.base_filename(subject, action, subaction, camera)
    }

    /// `(action_id, name)` pairs in document order. Ids are `"1"`, `"2"`, ...
    pub fn action_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.action_names
            .iter()
            .map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn action_name(&self, action_id: &str) -> Result<&str> {
        self.action_names
            .iter()
            .find(|(id, _)| id == action_id)
            .map(|(_, name)| name.as_str())
            .ok_or_else(|| Error::lookup(format!("unknown action id \"{action_id}\"")))
    }

    pub fn camera_ids(&self) -> &[String] {
        &self.camera_ids
    }

    /// 1-based position of `camera_id` in [Self::camera_ids].
    pub fn camera_number(&self, camera_id: &str) -> Option<usize> {
        self.camera_ids
            .iter()
            .position(|c| c == camera_id)
            .map(|i| i + 1)
    }

    fn sequences_of(&self, subject: &str) -> Result<&BTreeMap<ActionKey, String>> {
        self.sequence_mappings
            .get(subject)
            .ok_or_else(|| Error::lookup(format!("unknown subject \"{subject}\"")))
    }
}

fn section<'a>(root: &'a Element, path: &str) -> Result<&'a Element> {
    root.find(path)
        .ok_or_else(|| Error::malformed(format!("missing section \"{path}\"")))
}

type SequenceMappings = BTreeMap<String, BTreeMap<ActionKey, String>>;

fn read_mapping(mapping: &Element, layout: &MetadataLayout) -> Result<(Vec<String>, SequenceMappings)> {
    let mut rows = mapping.children().iter();

    let header = rows
        .next()
        .ok_or_else(|| Error::malformed("mapping table has no header row"))?;
    let subjects = header
        .children()
        .iter()
        .skip(MAPPING_LABEL_CELLS)
        .enumerate()
        .map(|(i, td)| {
            td.text().map(String::from).ok_or_else(|| {
                Error::malformed(format!("mapping header subject column {i} is empty"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sequence_mappings: SequenceMappings = subjects
        .iter()
        .map(|subject| (subject.clone(), BTreeMap::new()))
        .collect();

    let n_data_rows = mapping.children().len() - 1;
    if n_data_rows < layout.mapping_rows {
        return Err(Error::malformed(format!(
            "mapping table has {n_data_rows} data rows, expected at least {}",
            layout.mapping_rows
        )));
    }
    if n_data_rows > layout.mapping_rows {
        tracing::debug!(
            "ignoring {} mapping rows after row {}",
            n_data_rows - layout.mapping_rows,
            layout.mapping_rows
        );
    }

    for (row_num, tr) in rows.take(layout.mapping_rows).enumerate() {
        let row_num = row_num + 1;
        let cells = tr.children();
        if cells.len() < MAPPING_LABEL_CELLS {
            return Err(Error::malformed(format!(
                "mapping row {row_num} has {} cells",
                cells.len()
            )));
        }
        let label = |i: usize| {
            cells[i].text().ok_or_else(|| {
                Error::malformed(format!("mapping row {row_num} has empty cell {i}"))
            })
        };
        let key = ActionKey::new(label(0)?, label(1)?);

        let prefixes = cells[MAPPING_LABEL_CELLS..].iter().map(Element::text);
        for (subject, prefix) in subjects.iter().zip(prefixes) {
            let Some(prefix) = prefix else {
                tracing::debug!("no prefix for subject {subject} sequence {key}");
                continue;
            };
            if let Some(per_subject) = sequence_mappings.get_mut(subject) {
                per_subject.insert(key.clone(), prefix.to_string());
            }
        }
    }

    Ok((subjects, sequence_mappings))
}

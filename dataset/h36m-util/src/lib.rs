//! Shared parts of the `h36m-util` command line tools.

use std::path::Path;

use serde::{Deserialize, Serialize};

use h36m_camcal::CalibrationLayout;
use h36m_metadata::{MetadataLayout, SequenceMetadataIndex};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("TOML deserialization error: {source}")]
    TomlDe {
        #[from]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Dataset layout overrides, read from a TOML file.
///
/// ```toml
/// [metadata]
/// mapping_rows = 32
///
/// [calibration]
/// n_subjects = 11
/// camera_labels = ["54138969", "55011271", "58860488", "60457274"]
/// ```
///
/// Anything not given keeps the Human3.6M default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ToolConfig {
    pub metadata: MetadataLayout,
    pub calibration: CalibrationLayout,
}

impl ToolConfig {
    pub fn from_toml_str(buf: &str) -> Result<Self> {
        Ok(toml::from_str(buf)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buf = std::fs::read_to_string(path)?;
        Self::from_toml_str(&buf)
    }

    /// Read `path` if given, otherwise use the defaults.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => {
                let path = path.as_ref();
                tracing::debug!("reading layout config from \"{}\"", path.display());
                Self::from_path(path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SequenceRow<'a> {
    pub subject: &'a str,
    pub action: &'a str,
    pub subaction: &'a str,
    pub prefix: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ActionNameRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

/// One resolved base filename.
#[derive(Debug, Serialize)]
pub struct BaseFilenameRow<'a> {
    pub subject: &'a str,
    pub action: &'a str,
    pub subaction: &'a str,
    pub camera: &'a str,
    pub base_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_name: Option<&'a str>,
}

impl<'a> BaseFilenameRow<'a> {
    pub fn resolve(
        index: &'a SequenceMetadataIndex,
        subject: &'a str,
        action: &'a str,
        subaction: &'a str,
        camera: &'a str,
    ) -> h36m_metadata::Result<Self> {
        let base_filename = index.base_filename(subject, action, subaction, camera)?;
        Ok(Self {
            subject,
            action,
            subaction,
            camera,
            base_filename,
            action_name: index.action_name(action).ok(),
        })
    }
}

/// Flattened, serializable view of a [SequenceMetadataIndex].
#[derive(Debug, Serialize)]
pub struct MetadataSummary<'a> {
    pub subjects: &'a [String],
    pub sequences: Vec<SequenceRow<'a>>,
    pub action_names: Vec<ActionNameRow<'a>>,
    pub camera_ids: &'a [String],
}

impl<'a> MetadataSummary<'a> {
    pub fn new(index: &'a SequenceMetadataIndex) -> Self {
        let mut sequences = Vec::new();
        for subject in index.subjects() {
            if let Some(mappings) = index.sequence_mappings().get(subject) {
                sequences.extend(mappings.iter().map(|(key, prefix)| SequenceRow {
                    subject: subject.as_str(),
                    action: key.action.as_str(),
                    subaction: key.subaction.as_str(),
                    prefix: prefix.as_str(),
                }));
            }
        }
        let action_names = index
            .action_names()
            .map(|(id, name)| ActionNameRow { id, name })
            .collect();
        Self {
            subjects: index.subjects(),
            sequences,
            action_names,
            camera_ids: index.camera_ids(),
        }
    }
}

impl std::fmt::Display for MetadataSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "subjects: {}", self.subjects.join(" "))?;
        writeln!(f, "sequences:")?;
        for row in self.sequences.iter() {
            writeln!(
                f,
                "  {} ({}, {}): {}",
                row.subject, row.action, row.subaction, row.prefix
            )?;
        }
        writeln!(f, "action names:")?;
        for row in self.action_names.iter() {
            writeln!(f, "  {}: {}", row.id, row.name)?;
        }
        writeln!(f, "camera ids: {}", self.camera_ids.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = ToolConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ToolConfig::default());
        assert_eq!(cfg.metadata.mapping_rows, 32);
        assert_eq!(cfg.calibration.n_subjects, 11);
    }

    #[test]
    fn test_config_override() {
        let buf = r#"
            [metadata]
            mapping_rows = 30

            [calibration]
            n_cameras = 2
            camera_labels = ["a", "b"]
        "#;
        let cfg = ToolConfig::from_toml_str(buf).unwrap();
        assert_eq!(cfg.metadata.mapping_rows, 30);
        assert_eq!(cfg.calibration.n_cameras, 2);
        assert_eq!(cfg.calibration.n_subjects, 11);
        assert_eq!(cfg.calibration.camera_index("b").unwrap(), 2);
    }

    #[test]
    fn test_config_unknown_field() {
        let result = ToolConfig::from_toml_str("[metadata]\nrows = 3\n");
        assert!(matches!(result, Err(Error::TomlDe { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        std::fs::write(&path, "[metadata]\nmapping_rows = 4\n").unwrap();
        let cfg = ToolConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.metadata.mapping_rows, 4);
        assert_eq!(ToolConfig::load::<&Path>(None).unwrap(), ToolConfig::default());
        assert!(ToolConfig::load(Some(dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_summary() {
        let buf = r#"<metadata>
            <mapping>
                <tr><td/><td/><td>S1</td><td>S5</td></tr>
                <tr><td>2</td><td>1</td><td>Directions 1</td><td>Directions</td></tr>
            </mapping>
            <actionnames><item>Directions</item></actionnames>
            <dbcameras><index2id><item>54138969</item></index2id></dbcameras>
        </metadata>"#;
        let layout = MetadataLayout { mapping_rows: 1 };
        let index = SequenceMetadataIndex::from_xml_with_layout(buf.as_bytes(), &layout).unwrap();
        let summary = MetadataSummary::new(&index);
        assert_eq!(summary.sequences.len(), 2);
        assert_eq!(summary.sequences[1].subject, "S5");
        let text = summary.to_string();
        assert!(text.contains("  S1 (2, 1): Directions 1\n"));
        assert!(text.contains("  1: Directions\n"));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["camera_ids"][0], "54138969");
        assert_eq!(json["sequences"][0]["prefix"], "Directions 1");
    }

    #[test]
    fn test_base_filename_row() {
        let buf = r#"<metadata>
            <mapping>
                <tr><td/><td/><td>S1</td></tr>
                <tr><td>1</td><td>1</td><td>Directions 1</td></tr>
                <tr><td>3</td><td>1</td><td>Eating 1</td></tr>
            </mapping>
            <actionnames><item>Directions</item></actionnames>
            <dbcameras><index2id><item>54138969</item></index2id></dbcameras>
        </metadata>"#;
        let layout = MetadataLayout { mapping_rows: 2 };
        let index = SequenceMetadataIndex::from_xml_with_layout(buf.as_bytes(), &layout).unwrap();

        let row = BaseFilenameRow::resolve(&index, "S1", "1", "1", "54138969").unwrap();
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["base_filename"], "Directions 1.54138969");
        assert_eq!(json["action_name"], "Directions");

        // no action name for id 3
        let row = BaseFilenameRow::resolve(&index, "S1", "3", "1", "54138969").unwrap();
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["base_filename"], "Eating 1.54138969");
        assert!(json.get("action_name").is_none());

        assert!(BaseFilenameRow::resolve(&index, "S5", "1", "1", "54138969").is_err());
    }
}

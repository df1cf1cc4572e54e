use serde::Deserialize;

use crate::{Error, Result};

/// The part of the Human3.6M `metadata.xml` holding the camera calibration.
///
/// All other children of the root element (the sequence mapping, action
/// names, ...) are skipped.
#[derive(Debug, Deserialize)]
pub(crate) struct CalibrationDocument {
    /// Every calibration value of every camera as one bracketed,
    /// space-separated array, e.g. `[0.1 -0.2 ... 0.003]`.
    #[serde(default)]
    pub(crate) w0: Option<String>,
}

impl CalibrationDocument {
    pub(crate) fn from_reader<R: std::io::Read>(rdr: R) -> Result<Self> {
        match serde_xml_rs::from_reader(rdr) {
            Ok(doc) => Ok(doc),
            // raised by the derived visitor when `w0` appears twice
            Err(serde_xml_rs::Error::Custom(msg)) if msg.starts_with("duplicate field") => {
                Err(Error::malformed(format!("calibration document: {msg}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn blob(&self) -> Result<&str> {
        match self.w0.as_deref().map(str::trim) {
            Some(blob) if !blob.is_empty() => Ok(blob),
            _ => Err(Error::malformed("no calibration values in \"w0\"")),
        }
    }
}

/// Parse a bracketed flat array such as `[1 2.5 -3e-2]`.
///
/// The opening bracket is stripped from the first token and the closing
/// bracket from the last. Any other token which is not a number aborts the
/// whole parse.
pub(crate) fn parse_bracketed_values(blob: &str) -> Result<Vec<f64>> {
    let tokens: Vec<&str> = blob.split_whitespace().collect();
    let last = tokens.len().saturating_sub(1);
    let mut values = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.into_iter().enumerate() {
        let mut token = token;
        if index == 0 {
            token = token.strip_prefix('[').unwrap_or(token);
        }
        if index == last {
            token = token.strip_suffix(']').unwrap_or(token);
        }
        if token.is_empty() && (index == 0 || index == last) {
            // a bracket separated from the numbers by whitespace
            continue;
        }
        let value: f64 = token.parse().map_err(|_| Error::Parse {
            what: format!("calibration value {index}"),
            token: token.to_string(),
        })?;
        values.push(value);
    }
    Ok(values)
}

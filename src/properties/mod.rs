use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::{EncodingType, GraphError};
use crate::bitstreams::DEFAULT_MAX_UNARY_LENGTH;

/// Configuration of a coded graph, read from a `<basename>.properties` file.
///
/// Recognized keys: `nodes`, `arcs`, `zetak`, `maxunarylength` and
/// `compressionflags`, the latter a `|`-separated list such as
/// `OUTDEGREES_DELTA | RESIDUALS_GAMMA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    pub nodes: usize,
    pub arcs: usize,
    pub zeta_k: Option<u64>,
    pub max_unary_length: u64,
    pub outdegree_coding: EncodingType,
    pub residual_coding: EncodingType,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            nodes: 0,
            arcs: 0,
            zeta_k: Some(3),
            max_unary_length: DEFAULT_MAX_UNARY_LENGTH,
            outdegree_coding: EncodingType::GAMMA,
            residual_coding: EncodingType::ZETA,
        }
    }
}

fn parse_value<T: std::str::FromStr>(value: &HashMap<String, String>, key: &str) -> Result<Option<T>, GraphError> {
    match value.get(key) {
        Some(v) => v.trim()
            .parse()
            .map(Some)
            .map_err(|_| GraphError::Properties(format!("cannot parse {}={}", key, v))),
        None => Ok(None),
    }
}

impl TryFrom<HashMap<String, String>> for Properties {
    type Error = GraphError;

    fn try_from(value: HashMap<String, String>) -> Result<Self, Self::Error> {
        let mut props = Properties::default();

        if let Some(nodes) = parse_value(&value, "nodes")? {
            props.nodes = nodes;
        }
        if let Some(arcs) = parse_value(&value, "arcs")? {
            props.arcs = arcs;
        }
        if let Some(zeta_k) = parse_value::<u64>(&value, "zetak")? {
            if !(1..=64).contains(&zeta_k) {
                return Err(GraphError::Properties(format!("zetak must be in [1, 64], got {}", zeta_k)));
            }
            props.zeta_k = Some(zeta_k);
        }
        if let Some(max_unary_length) = parse_value(&value, "maxunarylength")? {
            props.max_unary_length = max_unary_length;
        }

        if let Some(comp_flags) = value.get("compressionflags") {
            for flag in comp_flags.split('|').map(str::trim).filter(|f| !f.is_empty()) {
                let (target, coding) = flag.split_once('_')
                    .ok_or_else(|| GraphError::Properties(format!("malformed compression flag {}", flag)))?;
                let coding: EncodingType = coding.parse().map_err(GraphError::Properties)?;

                match target.trim().to_uppercase().as_str() {
                    "OUTDEGREES" => props.outdegree_coding = coding,
                    "RESIDUALS" => props.residual_coding = coding,
                    other => return Err(GraphError::Properties(format!("unknown compression flag {}", other))),
                };
            }
        }

        Ok(props)
    }
}

impl Properties {
    /// Reads the properties file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let f = File::open(path.as_ref())?;
        let map = java_properties::read(BufReader::new(f))
            .map_err(|e| GraphError::Properties(e.to_string()))?;

        debug!(path = %path.as_ref().display(), keys = map.len(), "loaded properties");

        Properties::try_from(map)
    }

    /// Reads `<basename>.properties`, falling back to the defaults if it does not exist.
    pub fn load_or_default(basename: &str) -> Result<Self, GraphError> {
        let path = format!("{}.properties", basename);
        if Path::new(&path).exists() {
            Self::from_file(path)
        } else {
            debug!(basename, "no properties file, using defaults");
            Ok(Self::default())
        }
    }
}

impl From<Properties> for String {
    fn from(val: Properties) -> Self {
        let mut s = String::new();

        s.push_str("#Coded graph properties\n");
        s.push_str(&format!("nodes={}\n", val.nodes));
        s.push_str(&format!("arcs={}\n", val.arcs));
        s.push_str(&format!("zetak={}\n", val.zeta_k.unwrap_or(3)));
        s.push_str(&format!("maxunarylength={}\n", val.max_unary_length));
        s.push_str(&format!(
            "compressionflags=OUTDEGREES_{} | RESIDUALS_{}\n",
            val.outdegree_coding, val.residual_coding
        ));

        s
    }
}

#[cfg(test)]
mod tests;

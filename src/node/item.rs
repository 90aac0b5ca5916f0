//! Workflow items: the unit of data flowing into and out of the node.

use crate::output::{BinaryData, ConversionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// One workflow item: JSON fields, named binary attachments, and the index
/// of the input item it was produced from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub json: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BTreeMap<String, BinaryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<usize>,
}

impl Item {
    /// Item carrying an API response. Non-object responses land under `data`.
    pub fn from_json(value: Value) -> Self {
        let json = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".into(), other);
                map
            }
        };
        Self {
            json,
            ..Self::default()
        }
    }

    /// Input item with a single file attached under `property`.
    pub fn with_binary(property: impl Into<String>, data: BinaryData) -> Self {
        let mut item = Self::default();
        item.binary.insert(property.into(), data);
        item
    }

    /// Output item recording a failure when continuing on error.
    pub fn error(message: impl Into<String>, item_index: usize) -> Self {
        Self {
            json: match json!({ "error": message.into() }) {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            binary: BTreeMap::new(),
            paired_item: Some(item_index),
        }
    }

    pub fn paired_with(mut self, item_index: usize) -> Self {
        self.paired_item = Some(item_index);
        self
    }
}

impl From<ConversionResult> for Item {
    fn from(result: ConversionResult) -> Self {
        let mut binary = BTreeMap::new();
        if let Some(file) = result.file {
            binary.insert(result.binary_property, file);
        }
        Self {
            json: result.json,
            binary,
            paired_item: None,
        }
    }
}

//! Catalog of block templates offered by the drawer.
//!
//! The catalog is static configuration: each entry names a block type and
//! its ordered input/output port lists. Port keys are template-local; they
//! become graph-unique only once namespaced by an instance block id.
//!
//! # Usage
//!
//! ```rust
//! use blockwire::catalog::Catalog;
//!
//! let catalog = Catalog::builtin();
//! let camera = catalog.get("Camera Input").unwrap();
//! assert_eq!(camera.outputs.len(), 1);
//! ```

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::model::{Block, BlockId, Port, PortId, PortRole};

/// A port definition inside a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortTemplate {
    /// Template-local key, unique within the template.
    pub key: String,
    pub label: String,
}

/// Definition of one block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTemplate {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub inputs: Vec<PortTemplate>,
    #[serde(default)]
    pub outputs: Vec<PortTemplate>,
}

impl BlockTemplate {
    /// First port key that appears twice across inputs and outputs.
    fn duplicate_key(&self) -> Option<&str> {
        let keys: Vec<&str> = self
            .inputs
            .iter()
            .chain(&self.outputs)
            .map(|p| p.key.as_str())
            .collect();
        keys.iter()
            .enumerate()
            .find(|&(i, k)| keys[..i].contains(k))
            .map(|(_, k)| *k)
    }

    /// The drawer representative of this type.
    pub fn drawer_block(&self) -> Block {
        let ports = |list: &[PortTemplate], role: PortRole| -> Vec<Port> {
            list.iter()
                .map(|p| Port {
                    id: PortId::template(&self.type_name, &p.key),
                    role,
                    label: p.label.clone(),
                    owner: None,
                })
                .collect()
        };
        Block {
            id: None,
            type_name: self.type_name.clone(),
            position: None,
            inputs: ports(&self.inputs, PortRole::Input),
            outputs: ports(&self.outputs, PortRole::Output),
            is_template: true,
        }
    }

    /// A placed instance with port ids namespaced by `id`.
    pub fn instantiate(&self, id: BlockId, position: Point) -> Block {
        let ports = |list: &[PortTemplate], role: PortRole| -> Vec<Port> {
            list.iter()
                .map(|p| Port {
                    id: PortId::instance(&id, &p.key),
                    role,
                    label: p.label.clone(),
                    owner: Some(id.clone()),
                })
                .collect()
        };
        let inputs = ports(&self.inputs, PortRole::Input);
        let outputs = ports(&self.outputs, PortRole::Output);
        Block {
            id: Some(id),
            type_name: self.type_name.clone(),
            position: Some(position),
            inputs,
            outputs,
            is_template: false,
        }
    }
}

/// Ordered set of block templates, one per type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    templates: Vec<BlockTemplate>,
}

impl Catalog {
    /// Build a catalog, keeping the first template of any duplicated type.
    /// Templates that reuse a port key are dropped: instance port ids are
    /// derived from the key and would collide.
    pub fn new(templates: Vec<BlockTemplate>) -> Self {
        let mut unique: Vec<BlockTemplate> = Vec::with_capacity(templates.len());
        for t in templates {
            if unique.iter().any(|u| u.type_name == t.type_name) {
                log::warn!("duplicate template type {:?} ignored", t.type_name);
                continue;
            }
            if let Some(key) = t.duplicate_key() {
                log::warn!(
                    "template {:?} ignored: port key {:?} used more than once",
                    t.type_name,
                    key
                );
                continue;
            }
            unique.push(t);
        }
        Self { templates: unique }
    }

    /// The builtin video-processing catalog.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let templates: Vec<BlockTemplate> =
            serde_json::from_str(json).context("Failed to parse block catalog")?;
        Ok(Self::new(templates))
    }

    pub fn from_json_file(path: &camino::Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
        Self::from_json_str(&text).with_context(|| format!("Failed to load catalog {}", path))
    }

    pub fn get(&self, type_name: &str) -> Option<&BlockTemplate> {
        self.templates.iter().find(|t| t.type_name == type_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Helper to create a template concisely. Port keys are `in{i}` / `out{i}`.
fn template(type_name: &str, inputs: &[&str], outputs: &[&str]) -> BlockTemplate {
    let ports = |labels: &[&str], prefix: &str| -> Vec<PortTemplate> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| PortTemplate {
                key: format!("{}{}", prefix, i),
                label: l.to_string(),
            })
            .collect()
    };
    BlockTemplate {
        type_name: type_name.to_string(),
        inputs: ports(inputs, "in"),
        outputs: ports(outputs, "out"),
    }
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    Catalog::new(vec![
        template("Camera Input", &[], &["Frame"]),
        template("Chroma Key", &["Color", "Radius", "Frame"], &["Mask"]),
        template("Hough Transf", &["Mask"], &["Angle", "Distance"]),
        template("RANSAC", &["Mask"], &["Angle", "Distance"]),
        template("Display Frame", &["Frame"], &[]),
        template("Draw Line", &["Frame", "Angle", "Distance"], &["Frame"]),
        template("RGB to YUV", &["Frame"], &["Frame"]),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let c = Catalog::builtin();
        assert_eq!(c.len(), 7);
        let chroma = c.get("Chroma Key").unwrap();
        let labels: Vec<&str> = chroma.inputs.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Color", "Radius", "Frame"]);
        assert_eq!(chroma.outputs[0].key, "out0");
        assert!(c.get("Nope").is_none());
    }

    #[test]
    fn test_instantiate_namespaces_ports() {
        let c = Catalog::builtin();
        let t = c.get("Draw Line").unwrap();
        let b = t.instantiate(BlockId::new("x"), Point::new(1.0, 2.0));
        assert!(!b.is_template);
        assert_eq!(b.inputs[2].id.as_str(), "x:in2");
        assert_eq!(b.outputs[0].owner, Some(BlockId::new("x")));
        assert_eq!(b.position, Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_template_with_repeated_port_key_is_dropped() {
        let json = r#"[
            {"type": "Splitter", "outputs": [
                {"key": "o", "label": "A"}, {"key": "o", "label": "B"}]},
            {"type": "Loop", "inputs": [{"key": "p", "label": "In"}],
             "outputs": [{"key": "p", "label": "Out"}]},
            {"type": "Tee", "inputs": [{"key": "i", "label": "In"}],
             "outputs": [{"key": "a", "label": "A"}, {"key": "b", "label": "B"}]}
        ]"#;
        let c = Catalog::from_json_str(json).unwrap();
        assert_eq!(c.len(), 1);
        assert!(c.get("Splitter").is_none());
        assert!(c.get("Loop").is_none());
        assert_eq!(c.get("Tee").unwrap().outputs.len(), 2);
    }

    #[test]
    fn test_from_json_dedups_types() {
        let json = r#"[
            {"type": "Src", "outputs": [{"key": "o", "label": "Out"}]},
            {"type": "Src", "inputs": [{"key": "i", "label": "In"}]}
        ]"#;
        let c = Catalog::from_json_str(json).unwrap();
        assert_eq!(c.len(), 1);
        assert!(c.get("Src").unwrap().inputs.is_empty());
    }
}

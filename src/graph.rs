//! The authoritative graph store.
//!
//! [`GraphStore`] owns the drawer templates, the placed block instances and
//! the links. Every mutation goes through its methods; other components only
//! read it.
//!
//! # Design
//!
//! Blocks and links live in [`IndexMap`]s: iteration order is the display
//! order, and lookups by block id or by link source port are O(1). Keying
//! links by their source port enforces "at most one link per output port"
//! structurally. A port → owner index answers "which block owns this port"
//! without scanning, which is what dangling-link detection needs.

use indexmap::IndexMap;

use crate::catalog::Catalog;
use crate::config::DanglingLinkPolicy;
use crate::error::{EditorError, EditorResult};
use crate::geometry::Point;
use crate::ids::IdSource;
use crate::model::{Block, BlockId, Link, LinkGeometry, LinkTarget, Port, PortId};

#[derive(Debug)]
pub struct GraphStore {
    catalog: Catalog,
    drawer: Vec<Block>,
    blocks: IndexMap<BlockId, Block>,
    links: IndexMap<PortId, Link>,
    port_owners: IndexMap<PortId, BlockId>,
    ids: Box<dyn IdSource>,
    dangling_policy: DanglingLinkPolicy,
}

impl GraphStore {
    /// Create an empty graph whose drawer holds one template per catalog type.
    pub fn new(catalog: Catalog, ids: Box<dyn IdSource>) -> Self {
        let drawer = catalog.iter().map(|t| t.drawer_block()).collect();
        Self {
            catalog,
            drawer,
            blocks: IndexMap::new(),
            links: IndexMap::new(),
            port_owners: IndexMap::new(),
            ids,
            dangling_policy: DanglingLinkPolicy::default(),
        }
    }

    pub fn with_dangling_policy(mut self, policy: DanglingLinkPolicy) -> Self {
        self.dangling_policy = policy;
        self
    }

    // ── read access ────────────────────────────────────────────────────────

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Drawer templates, one per known type, in catalog order.
    pub fn drawer(&self) -> &[Block] {
        &self.drawer
    }

    /// Placed instances in placement order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Links, most recently started first.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link(&self, source: &PortId) -> Option<&Link> {
        self.links.get(source)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Block owning an instance port, if that block still exists.
    pub fn port_owner(&self, port: &PortId) -> Option<&BlockId> {
        self.port_owners.get(port)
    }

    /// Look up an instance port together with its block.
    pub fn find_port(&self, port: &PortId) -> Option<(&Block, &Port)> {
        let block = self.blocks.get(self.port_owners.get(port)?)?;
        Some((block, block.port(port)?))
    }

    /// Links with at least one endpoint on a port whose block no longer exists.
    /// Pending targets do not count.
    pub fn dangling_links(&self) -> impl Iterator<Item = &Link> {
        self.links.values().filter(|l| {
            !self.port_owners.contains_key(&l.source)
                || l.target.port().is_some_and(|p| !self.port_owners.contains_key(p))
        })
    }

    // ── mutations ──────────────────────────────────────────────────────────

    /// Instantiate `type_name` at `position` and return the new block's id.
    ///
    /// A fresh block id is drawn and every port id is derived from it and the
    /// template-local port key. Unknown types are rejected without mutation.
    pub fn place_instance(&mut self, type_name: &str, position: Point) -> EditorResult<BlockId> {
        let Some(template) = self.catalog.get(type_name) else {
            log::warn!("cannot place unknown block type {:?}", type_name);
            return Err(EditorError::UnknownType {
                type_name: type_name.to_string(),
            });
        };
        let id = BlockId::new(self.ids.next_id());
        let block = template.instantiate(id.clone(), position);
        for port in block.ports() {
            self.port_owners.insert(port.id.clone(), id.clone());
        }
        log::debug!(
            "placed {:?} as {} at ({}, {})",
            type_name,
            id,
            position.x,
            position.y
        );
        self.blocks.insert(id.clone(), block);
        Ok(id)
    }

    /// Set a block's position. Returns false (and changes nothing) when the
    /// block does not exist, e.g. a move that arrives after a delete.
    pub fn move_block(&mut self, id: &BlockId, position: Point) -> bool {
        match self.blocks.get_mut(id) {
            Some(block) => {
                block.position = Some(position);
                true
            }
            None => {
                log::trace!("ignoring move of missing block {}", id);
                false
            }
        }
    }

    /// Remove a block and its ports.
    ///
    /// Links touching the block are kept as dangling links under
    /// [`DanglingLinkPolicy::Retain`] and removed under
    /// [`DanglingLinkPolicy::Prune`].
    pub fn delete_block(&mut self, id: &BlockId) -> Option<Block> {
        let block = self.blocks.shift_remove(id)?;
        for port in block.ports() {
            self.port_owners.shift_remove(&port.id);
        }
        if self.dangling_policy == DanglingLinkPolicy::Prune {
            let before = self.links.len();
            let ports: Vec<&PortId> = block.ports().map(|p| &p.id).collect();
            self.links.retain(|_, l| !l.touches(ports.iter().copied()));
            log::debug!(
                "deleted block {} and pruned {} link(s)",
                id,
                before - self.links.len()
            );
        } else {
            log::debug!("deleted block {}", id);
        }
        Some(block)
    }

    /// Insert `link`, replacing any link with the same source port. The link
    /// is ordered first.
    pub fn upsert_link(&mut self, link: Link) {
        let replaced = self.links.shift_remove(&link.source).is_some();
        log::debug!(
            "{} link from {}",
            if replaced { "replaced" } else { "inserted" },
            link.source
        );
        self.links.shift_insert(0, link.source.clone(), link);
    }

    /// Move the free end of a link.
    pub fn set_link_end(&mut self, source: &PortId, end: Point) -> bool {
        match self.links.get_mut(source) {
            Some(link) => {
                link.geometry.end = end;
                true
            }
            None => false,
        }
    }

    /// Attach the link from `source` to `target`.
    pub fn complete_link(&mut self, source: &PortId, target: PortId) -> bool {
        match self.links.get_mut(source) {
            Some(link) => {
                log::debug!("completed link {} -> {}", source, target);
                link.target = LinkTarget::Port(target);
                true
            }
            None => false,
        }
    }

    pub fn remove_link(&mut self, source: &PortId) -> Option<Link> {
        self.links.shift_remove(source)
    }

    /// Store freshly resolved geometry for a link.
    pub fn set_link_geometry(&mut self, source: &PortId, geometry: LinkGeometry) -> bool {
        match self.links.get_mut(source) {
            Some(link) => {
                link.geometry = geometry;
                true
            }
            None => false,
        }
    }

    /// Remove every dangling link, returning how many were removed.
    pub fn prune_dangling_links(&mut self) -> usize {
        let owners = &self.port_owners;
        let before = self.links.len();
        self.links.retain(|source, l| {
            owners.contains_key(source) && l.target.port().is_none_or(|p| owners.contains_key(p))
        });
        before - self.links.len()
    }
}

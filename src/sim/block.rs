//! Blocks and the block registry
//!
//! The registry is the single owner of block records. Physics poses are copied
//! in once per tick; the evaluator and tower metrics only ever read them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::BodyState;

/// Opaque block identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Static container metadata assigned at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    /// Crate name printed on the container
    pub label: String,
    /// Version string printed under the name
    pub variant: String,
    /// Container colour (0xRRGGBB)
    pub color: u32,
}

/// A block entity
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    /// Width and height
    pub size: Vec2,
    /// Center position (screen space, y down)
    pub pos: Vec2,
    pub rotation: f32,
    /// Instantaneous speed from the last sync
    pub speed: f32,
    pub sleeping: bool,
    pub is_static: bool,
    /// Held by the pointer
    pub dragged: bool,
    pub meta: BlockMeta,
}

impl Block {
    pub fn new(id: BlockId, pos: Vec2, size: Vec2, meta: BlockMeta) -> Self {
        Self {
            id,
            size,
            pos,
            rotation: 0.0,
            speed: 0.0,
            sleeping: false,
            is_static: false,
            dragged: false,
            meta,
        }
    }

    /// Top edge y (smaller is higher)
    #[inline]
    pub fn top_edge(&self) -> f32 {
        self.pos.y - self.size.y / 2.0
    }

    /// Still inside the playfield (has not fallen past the cutoff)
    #[inline]
    pub fn is_visible(&self, cutoff_y: f32) -> bool {
        self.pos.y < cutoff_y
    }

    /// Copy pose and motion from the physics body
    pub fn sync(&mut self, body: &BodyState) {
        self.pos = body.pos;
        self.rotation = body.rotation;
        self.speed = body.vel.length();
        self.sleeping = body.sleeping;
        self.is_static = body.is_static;
    }
}

/// Authoritative list of active blocks, sorted by id
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: Vec<Block>,
    next_id: u32,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new block ID
    pub fn next_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a block, replacing any record with the same id
    pub fn insert(&mut self, block: Block) {
        match self.blocks.binary_search_by_key(&block.id, |b| b.id) {
            Ok(i) => self.blocks[i] = block,
            Err(i) => self.blocks.insert(i, block),
        }
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.blocks[i])
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        match self.blocks.binary_search_by_key(&id, |b| b.id) {
            Ok(i) => Some(&mut self.blocks[i]),
            Err(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    /// Blocks that count for stability, height and score
    pub fn visible(&self, cutoff_y: f32) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.is_visible(cutoff_y))
    }

    pub fn visible_count(&self, cutoff_y: f32) -> usize {
        self.visible(cutoff_y).count()
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop every block and restart id allocation
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.next_id = 1;
    }
}

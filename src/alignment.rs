/// A contiguous mapped segment. `junction_to_next` is the intronic gap
/// size between this block and the following one, when there is one.
#[derive(Clone, Copy, Debug)]
pub struct Block {
    pub start: u32,
    pub end: u32,
    pub junction_to_next: Option<u32>,
}

/// One candidate mapping: a reference and its ordered, colinear blocks.
#[derive(Clone, Debug)]
pub struct Map {
    pub reference: String,
    pub blocks: Vec<Block>,
}

impl Map {
    pub fn num_blocks(&self) -> u32 {
        self.blocks.len() as u32
    }
}

/// A read's alignment(s): either single-end candidate maps, or paired
/// candidate mate-pair combinations. Multiple entries model a
/// multi-mapped read/template; classification and counting both gate on
/// there being exactly one.
pub enum Template {
    SingleEnd(Vec<Map>),
    Paired(Vec<(Map, Map)>),
}

impl Template {
    pub fn is_unique(&self) -> bool {
        match self {
            Template::SingleEnd(maps) => maps.len() == 1,
            Template::Paired(pairs) => pairs.len() == 1,
        }
    }
}

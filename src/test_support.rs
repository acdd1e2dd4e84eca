//! Fixtures shared by unit tests.

use crate::traits::{Entity, Key, TypeTag};

pub(crate) const RECORD: TypeTag = TypeTag::new("Record");
pub(crate) const RECORD_GENERATED: TypeTag = TypeTag::derived("RecordEntity", RECORD);
pub(crate) const FOREIGN: TypeTag = TypeTag::new("Foreign");

/// Entity keyed by a segment path such as `[1, 2]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    key: Vec<u32>,
    pub(crate) payload: u32,
    tag: TypeTag,
}

impl Record {
    pub(crate) fn new(key: &[u32], payload: u32) -> Self {
        Self {
            key: key.to_vec(),
            payload,
            tag: RECORD,
        }
    }

    pub(crate) fn with_tag(mut self, tag: TypeTag) -> Self {
        self.tag = tag;
        self
    }
}

impl Entity for Record {
    type Key = Vec<u32>;

    const TYPE_TAG: TypeTag = RECORD;

    fn key(&self) -> Vec<u32> {
        self.key.clone()
    }

    fn type_tag(&self) -> TypeTag {
        self.tag
    }
}

/// Key whose first segment decides cacheability: a leading `0` opts out.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct GatedKey(pub(crate) Vec<u32>);

impl Key for GatedKey {
    fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    fn group_code(&self) -> Option<u32> {
        match self.0.first() {
            Some(0) => None,
            Some(code) => Some(*code),
            None => Some(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Gated {
    pub(crate) key: GatedKey,
}

impl Entity for Gated {
    type Key = GatedKey;

    const TYPE_TAG: TypeTag = TypeTag::new("Gated");

    fn key(&self) -> GatedKey {
        self.key.clone()
    }
}

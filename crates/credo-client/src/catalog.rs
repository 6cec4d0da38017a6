//! Card metadata lookup, used for display only.

use std::collections::BTreeMap;

use credo_proto::{CardId, CardPrototype};

/// Card prototypes keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardCatalog {
    prototypes: BTreeMap<CardId, CardPrototype>,
}

impl CardCatalog {
    /// Metadata of `card_id`.
    pub fn resolve(&self, card_id: CardId) -> Option<&CardPrototype> {
        self.prototypes.get(&card_id)
    }

    /// Display name of `card_id`, or its number when unknown.
    pub fn display_name(&self, card_id: CardId) -> String {
        self.resolve(card_id).map_or_else(|| format!("card #{card_id}"), |p| p.name.clone())
    }

    /// Number of known prototypes.
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Whether no prototypes are known.
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

impl From<BTreeMap<CardId, CardPrototype>> for CardCatalog {
    fn from(prototypes: BTreeMap<CardId, CardPrototype>) -> Self {
        Self { prototypes }
    }
}

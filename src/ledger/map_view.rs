//! A plain in-memory `View` implementation, used as the base ledger in
//! tests and benchmarks. Production deployments back `View` with whatever
//! persistent store they already have; this crate ships only the fixture.

use hashbrown::HashMap;

use super::keys::LedgerKey;
use super::objects::LedgerEntry;
use super::view::View;

#[derive(Debug, Clone, Default)]
pub struct MapLedger {
    entries: HashMap<LedgerKey, LedgerEntry>,
}

impl MapLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: LedgerKey, entry: LedgerEntry) -> &mut Self {
        self.entries.insert(key, entry);
        self
    }
}

impl View for MapLedger {
    fn read(&self, key: &LedgerKey) -> Option<LedgerEntry> {
        self.entries.get(key).cloned()
    }

    fn for_each(&self, visitor: &mut dyn FnMut(&LedgerKey, &LedgerEntry)) {
        for (key, entry) in self.entries.iter() {
            visitor(key, entry);
        }
    }
}

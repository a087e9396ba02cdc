use std::collections::BTreeMap;

use crate::TabId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabState {
    pub sidebar_open: bool,
}

/// Sidebar visibility per tab. Unknown tabs read as closed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabRegistry {
    tabs: BTreeMap<TabId, TabState>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the tab's sidebar flag, creating the entry on first use, and
    /// returns the new value.
    pub fn toggle(&mut self, tab_id: TabId) -> bool {
        let tab = self.tabs.entry(tab_id).or_default();
        tab.sidebar_open = !tab.sidebar_open;
        tab.sidebar_open
    }

    pub fn is_open(&self, tab_id: TabId) -> bool {
        self.tabs
            .get(&tab_id)
            .map(|tab| tab.sidebar_open)
            .unwrap_or(false)
    }

    pub fn forget(&mut self, tab_id: TabId) -> bool {
        self.tabs.remove(&tab_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

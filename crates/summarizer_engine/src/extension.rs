use std::collections::HashMap;
use std::sync::Arc;

use extension_logging::{ext_debug, BACKGROUND};
use summarizer_core::TabId;

use crate::background::{BackgroundController, BackgroundHandle};
use crate::bus::{Endpoint, MessageBus};
use crate::clipboard::Clipboard;
use crate::config::{ConfigError, ExtensionConfig};
use crate::content::{ContentRelay, ContentRelayHandle};
use crate::detect::PageDocument;
use crate::job_engine::JobEngine;
use crate::panel::{PanelController, PanelHandle};
use crate::summarizer::Summarizer;

/// One extension session: the background controller plus whatever pages and
/// panel are currently open. Must be created inside a tokio runtime.
pub struct Extension {
    bus: MessageBus,
    config: ExtensionConfig,
    background: BackgroundHandle,
    relays: HashMap<TabId, ContentRelayHandle>,
}

impl Extension {
    pub fn launch(config: ExtensionConfig) -> Result<Self, ConfigError> {
        let summarizer = config.build_summarizer();
        Self::launch_with(config, summarizer)
    }

    pub fn launch_with(
        config: ExtensionConfig,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let bus = MessageBus::new();
        let engine = JobEngine::new(summarizer);
        let background = BackgroundController::new(bus.clone(), engine, config.clone()).spawn();
        Ok(Self {
            bus,
            config,
            background,
            relays: HashMap::new(),
        })
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    /// Loads `page` into `tab_id`, replacing any page already there.
    pub fn open_tab(&mut self, tab_id: TabId, page: PageDocument) -> &ContentRelayHandle {
        let relay = ContentRelay::new(tab_id, page, self.bus.clone(), self.config.request_timeout());
        self.relays.insert(tab_id, relay.spawn());
        &self.relays[&tab_id]
    }

    pub fn relay(&self, tab_id: TabId) -> Option<&ContentRelayHandle> {
        self.relays.get(&tab_id)
    }

    pub fn activate_tab(&self, tab_id: TabId) {
        self.bus.set_active_tab(Some(tab_id));
    }

    /// Simulates the toolbar action on `tab_id` while it shows `url`.
    pub fn click_action(&self, tab_id: TabId, url: &str) {
        self.background.action_clicked(tab_id, url);
    }

    pub fn close_tab(&mut self, tab_id: TabId) {
        self.bus.unregister(Endpoint::Content(tab_id));
        self.relays.remove(&tab_id);
        if self.bus.active_tab() == Some(tab_id) {
            self.bus.set_active_tab(None);
        }
        self.background.tab_closed(tab_id);
        ext_debug!(BACKGROUND, "{} closed", tab_id);
    }

    pub fn open_panel(&self, clipboard: Box<dyn Clipboard>) -> PanelHandle {
        PanelController::spawn(self.bus.clone(), clipboard, &self.config)
    }

    pub async fn shutdown(self) {
        for tab_id in self.relays.keys() {
            self.bus.unregister(Endpoint::Content(*tab_id));
        }
        self.background.shutdown().await;
    }
}

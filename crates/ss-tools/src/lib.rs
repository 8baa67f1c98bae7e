//! ss-tools: search tools for search-services
//!
//! Wikipedia search, Tavily web search and Yahoo Finance quotes, built on a
//! shared HTTP helper. Each tool has a total async operation returning text
//! and also implements [`ss_core::Tool`].

use std::sync::Arc;

use ss_core::{Result, SearchConfig, ToolManager};

pub mod finance;
pub mod http;
pub mod internet;
pub mod params;
pub mod wiki;

pub use finance::{Period, YahooFinanceTool};
pub use http::{ApiRequest, ApiResponse, HttpHelper};
pub use internet::InternetSearchTool;
pub use params::{FinanceParams, InternetSearchParams, WikiSearchParams};
pub use wiki::WikiSearchTool;

/// The three search tools, cheap to clone
#[derive(Debug, Clone)]
pub struct SearchTools {
    pub wiki: Arc<WikiSearchTool>,
    pub internet: Arc<InternetSearchTool>,
    pub finance: Arc<YahooFinanceTool>,
}

impl SearchTools {
    /// Build every tool from configuration; fails without a Tavily key
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            wiki: Arc::new(WikiSearchTool::from_config(config)),
            internet: Arc::new(InternetSearchTool::from_config(config)?),
            finance: Arc::new(YahooFinanceTool::from_config(config)),
        })
    }

    /// Register all three tools with the tool manager
    pub fn register(&self, manager: &mut ToolManager) {
        manager.register(self.wiki.clone());
        manager.register(self.internet.clone());
        manager.register(self.finance.clone());
    }
}

/// Register all default search tools with the tool manager
pub fn register_default_tools(manager: &mut ToolManager, config: &SearchConfig) -> Result<()> {
    SearchTools::from_config(config)?.register(manager);
    Ok(())
}

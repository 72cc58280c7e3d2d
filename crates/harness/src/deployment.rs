use sitedeck_core::Plan;
use sitedeck_engine::{Engine, EngineConfig, EngineError};
use tempfile::TempDir;

use crate::TestSite;

const SHARED_SECRET: [u8; 32] = [7; 32];

/// Several sites sharing one on-disk database and token secret.
pub struct TestDeployment {
    _dir: TempDir,
    config: EngineConfig,
    sites: Vec<TestSite>,
}

impl TestDeployment {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let config = EngineConfig {
            database_path: Some(dir.path().join("sitedeck.db")),
            token_secret_hex: Some(hex::encode(SHARED_SECRET)),
            ..EngineConfig::default()
        };
        Ok(Self {
            _dir: dir,
            config,
            sites: Vec::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a site on its own connection. The newest site becomes the selected one.
    pub fn add_site(&mut self, plan: Plan) -> Result<usize, Box<dyn std::error::Error>> {
        let index = self.sites.len();
        let email = format!("owner{index}@example.com");
        self.sites
            .push(TestSite::with_config(self.config.clone(), plan, &email)?);
        Ok(index)
    }

    pub fn site(&self, index: usize) -> &TestSite {
        &self.sites[index]
    }

    pub fn site_mut(&mut self, index: usize) -> &mut TestSite {
        &mut self.sites[index]
    }

    /// Fresh engine bound to whichever site was selected last.
    pub fn reopen(&self) -> Result<Engine, EngineError> {
        Engine::open(self.config.clone())
    }
}

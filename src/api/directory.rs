//! Session accounts from configuration

use async_trait::async_trait;

use super::AccountDirectory;
use crate::config::AccountConfig;
use crate::data::{Account, Server};
use crate::error::Result;

/// Account directory backed by the `accounts` configuration section
pub struct ConfigAccountDirectory {
    accounts: Vec<AccountConfig>,
}

impl ConfigAccountDirectory {
    pub fn new(accounts: Vec<AccountConfig>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl AccountDirectory for ConfigAccountDirectory {
    async fn list_accounts(&self) -> Result<Vec<(Account, Server)>> {
        Ok(self.accounts.iter().map(AccountConfig::to_session).collect())
    }
}

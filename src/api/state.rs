use std::sync::Arc;

use anyhow::Result;

use crate::catalogue::{HttpTestCatalogue, TestCatalogue};
use crate::config::{MailConfig, RamConfig};
use crate::dictionary::DictionaryService;
use crate::files::FileStore;
use crate::mail::{DisabledMailSender, HttpMailSender, MailSender};
use crate::service::{DefectService, ExecutionService, SettingsService};
use crate::storage::Pool;

#[derive(Clone)]
pub struct AppState {
    pub executions: ExecutionService,
    pub dictionary: DictionaryService,
    pub defects: DefectService,
    pub settings: SettingsService,
    pub files: FileStore,
    pub catalogue: Arc<dyn TestCatalogue>,
    pub mail: Arc<dyn MailSender>,
    pub mail_config: MailConfig,
}

impl AppState {
    pub fn new(
        pool: Pool,
        files: FileStore,
        catalogue: Arc<dyn TestCatalogue>,
        mail: Arc<dyn MailSender>,
        mail_config: MailConfig,
    ) -> Self {
        Self {
            executions: ExecutionService::new(pool.clone()),
            dictionary: DictionaryService::new(pool.clone()),
            defects: DefectService::new(pool.clone()),
            settings: SettingsService::new(pool),
            files,
            catalogue,
            mail,
            mail_config,
        }
    }

    /// Wire the HTTP clients described by the configuration.
    pub fn from_config(pool: Pool, config: &RamConfig) -> Result<Self> {
        let catalogue: Arc<dyn TestCatalogue> = Arc::new(HttpTestCatalogue::new(&config.catalogue)?);
        let mail: Arc<dyn MailSender> = if config.mail.enabled {
            Arc::new(HttpMailSender::new(&config.mail)?)
        } else {
            Arc::new(DisabledMailSender)
        };
        Ok(Self::new(
            pool,
            FileStore::new(&config.storage.attachments_dir),
            catalogue,
            mail,
            config.mail.clone(),
        ))
    }
}

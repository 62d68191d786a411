//! Outbound mail: recipient sets, mail requests and delivery to the mail
//! sender service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::MailConfig;
use crate::error::{RamError, RamResult};
use crate::lists::merge_lists;

/// Ordered, duplicate-free recipient set.
///
/// On the wire it is a single comma-joined string, as expected in mail
/// headers: `{"1", "2", "3"}` becomes `"1,2,3"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipient; returns false if it was already present.
    pub fn insert(&mut self, address: impl Into<String>) -> bool {
        let address = address.into();
        let address = address.trim();
        if address.is_empty() || self.0.iter().any(|a| a == address) {
            return false;
        }
        self.0.push(address.to_string());
        true
    }

    /// Union keeping this set's order first.
    pub fn merged(&self, other: &Recipients) -> Recipients {
        Recipients(merge_lists(&self.0, &other.0))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_header(&self) -> String {
        self.0.join(",")
    }

    pub fn parse(header: &str) -> Self {
        header.split(',').collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Recipients {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut recipients = Recipients::new();
        for address in iter {
            recipients.insert(address);
        }
        recipients
    }
}

impl Serialize for Recipients {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_header())
    }
}

impl<'de> Deserialize<'de> for Recipients {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let header = String::deserialize(deserializer)?;
        Ok(Recipients::parse(&header))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailRequest {
    pub from: String,
    pub to: Recipients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<Recipients>,
    pub subject: String,
    /// HTML body.
    pub content: String,
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, mail: &MailRequest) -> RamResult<()>;
}

/// Posts mail requests as JSON to the mail sender service.
pub struct HttpMailSender {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMailSender {
    pub fn new(config: &MailConfig) -> RamResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RamError::Internal(format!("cannot build mail client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send(&self, mail: &MailRequest) -> RamResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(mail)
            .send()
            .await
            .map_err(|e| RamError::MailDelivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RamError::MailDelivery(format!(
                "mail service answered {}",
                status
            )));
        }
        tracing::info!(to = %mail.to.to_header(), subject = %mail.subject, "mail sent");
        Ok(())
    }
}

/// Used when mail is disabled in configuration.
pub struct DisabledMailSender;

#[async_trait]
impl MailSender for DisabledMailSender {
    async fn send(&self, mail: &MailRequest) -> RamResult<()> {
        tracing::info!(
            to = %mail.to.to_header(),
            subject = %mail.subject,
            "mail disabled, dropping message"
        );
        Ok(())
    }
}

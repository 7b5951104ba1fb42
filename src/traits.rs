use crate::config::MailConfig;
use async_trait::async_trait;
use std::collections::HashSet;

/// The subset of an authenticated IMAP session the mail client relies on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailSession: Send {
    async fn select(&mut self, mailbox: &str) -> anyhow::Result<()>;

    /// Runs a SEARCH and returns the matching sequence numbers, unordered
    async fn search(&mut self, query: &str) -> anyhow::Result<HashSet<u32>>;

    /// Fetches the full RFC822 payload; `None` when the server sends no body
    async fn fetch_rfc822(&mut self, id: &str) -> anyhow::Result<Option<Vec<u8>>>;

    async fn logout(&mut self) -> anyhow::Result<()>;
}

// Factory trait so tests can hand out mocked sessions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn connect(
        &self,
        config: &MailConfig,
        token: &str,
    ) -> anyhow::Result<Box<dyn MailSession>>;
}

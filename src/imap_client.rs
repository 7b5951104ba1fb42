use crate::config::MailConfig;
use crate::errors::ClientError;
use crate::message::ParsedMessage;
use crate::traits::{MailSession, SessionFactory};
use async_imap::Session;
use async_native_tls::{TlsConnector, TlsStream};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{StreamExt, pin_mut};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

type ImapSession = Session<TlsStream<Compat<TcpStream>>>;

/// IMAP SEARCH date format, e.g. `05-Mar-2024`
const SEARCH_DATE_FORMAT: &str = "%d-%b-%Y";

#[cfg(test)]
#[path = "./imap_client_tests.rs"]
mod imap_client_tests;

pub struct RealMailSession {
    session: ImapSession,
}

#[async_trait]
impl MailSession for RealMailSession {
    async fn select(&mut self, mailbox: &str) -> anyhow::Result<()> {
        self.session
            .select(mailbox)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to select mailbox {}: {}", mailbox, e))?;
        Ok(())
    }

    async fn search(&mut self, query: &str) -> anyhow::Result<HashSet<u32>> {
        self.session
            .search(query)
            .await
            .map_err(|e| anyhow::anyhow!("Search failed for {}: {}", query, e))
    }

    async fn fetch_rfc822(&mut self, id: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let fetch_stream = self
            .session
            .fetch(id, "RFC822")
            .await
            .map_err(|e| anyhow::anyhow!("Fetch failed for message {}: {}", id, e))?;
        pin_mut!(fetch_stream);

        // Drain the whole response so the session stays in sync
        let mut body = None;
        while let Some(fetch_result) = fetch_stream.next().await {
            let message = fetch_result
                .map_err(|e| anyhow::anyhow!("Error reading fetch result: {}", e))?;
            if body.is_none() {
                body = message.body().map(|b| b.to_vec());
            }
        }

        Ok(body)
    }

    async fn logout(&mut self) -> anyhow::Result<()> {
        self.session
            .logout()
            .await
            .map_err(|e| anyhow::anyhow!("Logout failed: {}", e))
    }
}

pub struct RealSessionFactory;

#[async_trait]
impl SessionFactory for RealSessionFactory {
    async fn connect(
        &self,
        config: &MailConfig,
        token: &str,
    ) -> anyhow::Result<Box<dyn MailSession>> {
        let addr = format!("{}:{}", config.host, config.port);
        let tcp_stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", addr, e))?;

        let tls = TlsConnector::new();
        let tls_stream = tls
            .connect(&config.host, tcp_stream.compat())
            .await
            .map_err(|e| anyhow::anyhow!("TLS connection failed: {}", e))?;

        let client = async_imap::Client::new(tls_stream);

        match client.login(&config.email, token).await {
            Ok(session) => Ok(Box::new(RealMailSession { session })),
            Err((e, _)) => {
                error!("Error connecting to IMAP server {}: {}", addr, e);
                Err(ClientError::Authentication {
                    account: config.email.clone(),
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }
}

/// Builds the SEARCH criteria for messages from `email_from`, optionally
/// restricted to those received on or after `since`.
///
/// CR and LF cannot be quoted in IMAP and would end the command line.
pub fn build_search_query(
    email_from: &str,
    since: Option<NaiveDate>,
) -> anyhow::Result<String> {
    if email_from.contains(['\r', '\n']) {
        anyhow::bail!("Invalid sender {:?}: line breaks are not allowed", email_from);
    }

    let sender = email_from.replace('\\', "\\\\").replace('"', "\\\"");

    let query = match since {
        Some(date) => format!(
            "(FROM \"{}\") (SINCE \"{}\")",
            sender,
            date.format(SEARCH_DATE_FORMAT)
        ),
        None => format!("(FROM \"{}\")", sender),
    };
    Ok(query)
}

/// Reads messages from a single mailbox over one lazily opened IMAP session.
pub struct MailClient {
    config: MailConfig,
    factory: Arc<dyn SessionFactory>,
    session: Option<Box<dyn MailSession>>,
}

impl MailClient {
    pub fn new(config: MailConfig) -> Self {
        Self::new_with_factory(config, Arc::new(RealSessionFactory))
    }

    pub fn new_with_factory(config: MailConfig, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            config,
            factory,
            session: None,
        }
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn connect(&mut self, token: &str) -> anyhow::Result<()> {
        info!(
            "Connecting to {}:{} as {}",
            self.config.host, self.config.port, self.config.email
        );

        // On failure the handle stays empty and the next call logs in again
        let session = self.factory.connect(&self.config, token).await?;
        self.session = Some(session);

        info!("Logged in as {}", self.config.email);
        Ok(())
    }

    /// Returns the open session, logging in with the configured token first if needed.
    pub async fn ensure_connected(&mut self) -> anyhow::Result<&mut Box<dyn MailSession>> {
        if self.session.is_none() {
            let token = self.config.token.clone();
            self.connect(&token).await?;
        }

        self.session
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("IMAP session not connected"))
    }

    /// Ids of the messages from `email_from`, oldest first unless
    /// `most_recent_first` is set.
    pub async fn obtain_email_ids(
        &mut self,
        email_from: &str,
        most_recent_first: bool,
        since: Option<NaiveDate>,
    ) -> anyhow::Result<Vec<String>> {
        let mailbox = self.config.mailbox.clone();
        let query = build_search_query(email_from, since)?;

        let session = self.ensure_connected().await?;
        session.select(&mailbox).await?;

        debug!("Searching {} with {}", mailbox, query);
        let mut seq_nums: Vec<u32> = session.search(&query).await?.into_iter().collect();
        seq_nums.sort_unstable();

        let mut ids: Vec<String> = seq_nums.iter().map(|n| n.to_string()).collect();
        if most_recent_first {
            ids.reverse();
        }

        Ok(ids)
    }

    /// Fetches and parses up to `limit` messages from `email_from`.
    ///
    /// Any failure aborts the call; messages fetched before it are discarded.
    pub async fn obtain_emails(
        &mut self,
        email_from: &str,
        most_recent_first: bool,
        limit: Option<usize>,
        since: Option<NaiveDate>,
    ) -> anyhow::Result<Vec<ParsedMessage>> {
        let ids = self
            .obtain_email_ids(email_from, most_recent_first, since)
            .await?;
        let count = limit.unwrap_or(ids.len()).min(ids.len());

        info!(
            "Found {} messages from {}, fetching {}",
            ids.len(),
            email_from,
            count
        );

        let session = self.ensure_connected().await?;
        let mut messages = Vec::with_capacity(count);

        for id in &ids[..count] {
            match session.fetch_rfc822(id).await? {
                Some(raw) => messages.push(ParsedMessage::parse(id.clone(), raw)?),
                None => warn!("Message {} returned no body, skipping", id),
            }
        }

        Ok(messages)
    }

    pub async fn logout(&mut self) -> anyhow::Result<()> {
        if let Some(mut session) = self.session.take() {
            session.logout().await?;
            info!("Logged out of {}", self.config.host);
        }
        Ok(())
    }
}

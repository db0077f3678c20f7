use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use super::{resolver::Catalog, token::RequestTokens};
use crate::{config::Config, constants::SUGGESTION_LIMIT_MAX};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestions {
    pub token: u64,
    pub query: String,
    pub items: Vec<String>,
}

/// Debounced ingredient lookups for one input field.
///
/// Every keystroke restarts the quiet period. A lookup that already started is
/// never cancelled, its result is dropped if a newer lookup was issued.
pub struct SuggestionDebouncer<C: Catalog + 'static> {
    catalog: Arc<C>,
    delay: Duration,
    limit: i64,
    tokens: RequestTokens,
    pending: Option<JoinHandle<()>>,
    sender: UnboundedSender<Suggestions>,
}

impl<C: Catalog + 'static> SuggestionDebouncer<C> {
    pub fn new(
        catalog: Arc<C>,
        delay: Duration,
        limit: i64,
    ) -> (Self, UnboundedReceiver<Suggestions>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let debouncer = Self {
            catalog,
            delay,
            limit,
            tokens: RequestTokens::new(),
            pending: None,
            sender,
        };

        (debouncer, receiver)
    }

    pub fn from_config(catalog: Arc<C>, config: &Config) -> (Self, UnboundedReceiver<Suggestions>) {
        Self::new(
            catalog,
            Duration::from_millis(config.suggestion_debounce_ms),
            config.suggestion_limit.clamp(1, SUGGESTION_LIMIT_MAX),
        )
    }

    pub fn input(&mut self, text: &str) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let query = text.trim().to_string();

        if query.is_empty() {
            let token = self.tokens.issue();
            if self
                .sender
                .send(Suggestions {
                    token,
                    query,
                    items: vec![],
                })
                .is_err()
            {
                log::trace!("> Suggestion receiver dropped");
            }
            return;
        }

        let catalog = self.catalog.clone();
        let tokens = self.tokens.clone();
        let sender = self.sender.clone();
        let delay = self.delay;
        let limit = self.limit;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let token = tokens.issue();
            log::trace!("> Looking up suggestions for {query:?} ({token})");

            // Detached, so a later keystroke cannot abort it
            tokio::spawn(async move {
                match catalog.search_ingredients(&query, limit).await {
                    Ok(items) if tokens.is_latest(token) => {
                        if sender
                            .send(Suggestions {
                                token,
                                query,
                                items,
                            })
                            .is_err()
                        {
                            log::trace!("> Suggestion receiver dropped");
                        }
                    }
                    Ok(_) => log::trace!("> Discarding stale suggestions {token}"),
                    Err(e) => log::warn!("> Suggestion lookup failed: {e}"),
                }
            });
        }));
    }
}

impl<C: Catalog + 'static> Drop for SuggestionDebouncer<C> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

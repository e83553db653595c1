// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Insight dispatch
//!
//! The lint pass is synchronous and produces a list of insights. Side effects on those
//! insights (logging, forwarding to an editor, telemetry) happen afterwards, in an
//! explicitly asynchronous dispatch stage.

use std::fmt::Debug;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{LintError, LintResult};
use crate::insight::Insight;

/// Receives the insights of a lint pass
#[async_trait]
pub trait InsightDispatcher<S>: Send + Sync {
    async fn dispatch(&self, insights: &[Insight<S>]) -> LintResult<()>;
}

/// Logs one structured event per insight
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

#[async_trait]
impl<S: Debug + Send + Sync> InsightDispatcher<S> for TracingDispatcher {
    async fn dispatch(&self, insights: &[Insight<S>]) -> LintResult<()> {
        for insight in insights {
            tracing::info!(
                code = insight.kind.as_str(),
                category = ?insight.kind.category(),
                source = ?insight.source,
                "{}",
                insight.message()
            );
        }
        Ok(())
    }
}

/// Forwards insights to a tokio channel
///
/// # Examples
///
/// ```rust,ignore
/// let (dispatcher, mut receiver) = ChannelDispatcher::channel(64);
/// dispatcher.dispatch(&insights).await?;
/// while let Some(insight) = receiver.recv().await {
///     println!("{}", insight.message());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChannelDispatcher<S> {
    sender: mpsc::Sender<Insight<S>>,
}

impl<S> ChannelDispatcher<S> {
    pub fn new(sender: mpsc::Sender<Insight<S>>) -> Self {
        Self { sender }
    }

    /// A dispatcher and the receiving end of its bounded channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Insight<S>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl<S: Clone + Send + Sync> InsightDispatcher<S> for ChannelDispatcher<S> {
    async fn dispatch(&self, insights: &[Insight<S>]) -> LintResult<()> {
        for (delivered, insight) in insights.iter().enumerate() {
            if self.sender.send(insight.clone()).await.is_err() {
                return Err(LintError::ChannelClosed {
                    delivered,
                    total: insights.len(),
                });
            }
        }
        Ok(())
    }
}

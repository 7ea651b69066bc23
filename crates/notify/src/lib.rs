//! Best-effort order confirmation dispatch.
//!
//! Invoked only after the placement transaction has committed. A failed
//! delivery must never make a committed order look failed to the caller,
//! and must never attempt to compensate or cancel the order, so
//! [`Dispatcher::dispatch`] absorbs every sender error instead of
//! propagating it.

pub mod format;

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors a confirmation sender can report.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The underlying transport refused or dropped the message.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// One line of a confirmation, carrying the snapshot price.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Everything needed to render a confirmation without further queries.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub notes: Option<String>,
    pub total_amount: Decimal,
    pub lines: Vec<ConfirmationLine>,
}

/// Trait for delivering a rendered confirmation message.
#[async_trait]
pub trait ConfirmationSender: Send + Sync {
    /// Delivers one message to the given address.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Sender that hands the rendered message to the log.
///
/// Actual outbound delivery is owned by an external collaborator; this
/// keeps the confirmation observable in environments without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSender;

impl TracingSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConfirmationSender for TracingSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!(to, subject, body, "order confirmation");
        Ok(())
    }
}

/// A message captured by [`RecordingSender`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<SentMessage>,
    fail_on_send: bool,
}

/// In-memory sender for testing.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingSender {
    /// Creates a new recording sender.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sender to fail every subsequent send.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of messages delivered so far.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns a copy of every delivered message.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl ConfirmationSender for RecordingSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(NotifyError::Delivery("transport unavailable".to_string()));
        }

        state.sent.push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });

        Ok(())
    }
}

/// Fire-and-forget dispatcher for committed orders.
#[derive(Debug, Clone)]
pub struct Dispatcher<S> {
    sender: S,
}

impl<S: ConfirmationSender> Dispatcher<S> {
    /// Creates a dispatcher over the given sender.
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    /// Renders and sends a confirmation for an already-committed order.
    ///
    /// Infallible by contract: delivery errors are logged and counted,
    /// never propagated.
    #[tracing::instrument(skip(self, confirmation), fields(order_id = %confirmation.order_id))]
    pub async fn dispatch(&self, confirmation: &OrderConfirmation) {
        let subject = format::subject(confirmation.order_id);
        let body = format::body(confirmation);

        if let Err(err) = self
            .sender
            .send(&confirmation.customer_email, &subject, &body)
            .await
        {
            metrics::counter!("order_confirmations_failed_total").increment(1);
            tracing::warn!(error = %err, "failed to send order confirmation");
        }
    }
}

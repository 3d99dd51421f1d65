//! Settings-form controller: the trigger layer between the form's buttons and
//! the remote connector operations.
//!
//! The form owns no state and coordinates nothing. Each action issues exactly
//! one remote call and renders exactly one outcome; actions fired
//! concurrently stay independent and complete in arbitrary order. The single
//! exception is [`validate`], which deliberately blocks its caller (bounded by
//! [`VALIDATE_TIMEOUT`]) so a save can never proceed past an unchecked
//! connection.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shared::protocol::OrderSummary;

/// Upper bound on the blocking connection check in [`validate`].
pub const VALIDATE_TIMEOUT: Duration = Duration::from_secs(15);

/// The remote operations the form can trigger, one method per server-side
/// operation. Implementations build their transport from the settings record
/// they were constructed with.
#[async_trait]
pub trait RemoteOps: Send + Sync {
    async fn check_connection(&self) -> Result<bool>;
    async fn test(&self) -> Result<Value>;
    async fn get_orders(&self) -> Result<Vec<OrderSummary>>;
    async fn push_customers(&self) -> Result<usize>;
    async fn push_items(&self) -> Result<usize>;
    async fn queue_sync(&self) -> Result<()>;
}

/// Rendering sink for handler outcomes. `transient` is a decaying alert;
/// `blocking` is a dialog the user must dismiss.
pub trait Notifier: Send + Sync {
    fn transient(&self, message: &str);
    fn blocking(&self, title: &str, body: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEmphasis {
    Default,
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormAction {
    Test,
    GetOrders,
    PushCustomers,
    PushItems,
    Sync,
}

impl FormAction {
    pub const ALL: [FormAction; 5] = [
        FormAction::Test,
        FormAction::GetOrders,
        FormAction::PushCustomers,
        FormAction::PushItems,
        FormAction::Sync,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormAction::Test => "Test",
            FormAction::GetOrders => "Get orders",
            FormAction::PushCustomers => "Push customers",
            FormAction::PushItems => "Push items",
            FormAction::Sync => "Sync",
        }
    }

    pub fn emphasis(self) -> ButtonEmphasis {
        match self {
            FormAction::GetOrders | FormAction::Sync => ButtonEmphasis::Primary,
            _ => ButtonEmphasis::Default,
        }
    }
}

/// The refresh hook: the full button set, in display order.
pub fn actions() -> &'static [FormAction] {
    &FormAction::ALL
}

/// Runs one action: one remote call, one rendering. Failures surface through
/// the notifier generically; nothing is retried, chained, or cached.
pub async fn run_action(action: FormAction, ops: &dyn RemoteOps, notifier: &dyn Notifier) {
    match action {
        FormAction::Test => match ops.test().await {
            Ok(value) => notifier.transient(&format!("Test done: {value}")),
            Err(err) => report_failure(action, err, notifier),
        },
        FormAction::GetOrders => match ops.get_orders().await {
            Ok(orders) => {
                let serialized =
                    serde_json::to_string(&orders).unwrap_or_else(|err| format!("<{err}>"));
                notifier.transient(&format!("Orders read: {serialized}"));
            }
            Err(err) => report_failure(action, err, notifier),
        },
        FormAction::PushCustomers => match ops.push_customers().await {
            Ok(_) => notifier.transient("Customers written"),
            Err(err) => report_failure(action, err, notifier),
        },
        FormAction::PushItems => match ops.push_items().await {
            Ok(_) => notifier.transient("Items written"),
            Err(err) => report_failure(action, err, notifier),
        },
        FormAction::Sync => {
            // The enqueue result is not inspected: outcomes of a queued sync
            // are only observable through the sync log.
            if let Err(err) = ops.queue_sync().await {
                tracing::error!("queue_sync failed: {err:#}");
            }
            notifier.blocking("Sync", "Queued for sync. Observe the sync log for details.");
        }
    }
}

fn report_failure(action: FormAction, err: anyhow::Error, notifier: &dyn Notifier) {
    tracing::error!("{} failed: {err:#}", action.label());
    notifier.transient(&format!("{} failed: {err:#}", action.label()));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid,
}

impl ValidationOutcome {
    pub fn is_valid(self) -> bool {
        self == ValidationOutcome::Valid
    }
}

/// The validate hook guarding save. Blocks the caller on one connection
/// check, bounded by [`VALIDATE_TIMEOUT`]. Anything but a clean `true` —
/// a `false` result, a transport error, or the timeout — fails validation
/// with one blocking message, and the caller must not persist the record.
pub async fn validate(ops: &dyn RemoteOps, notifier: &dyn Notifier) -> ValidationOutcome {
    match tokio::time::timeout(VALIDATE_TIMEOUT, ops.check_connection()).await {
        Ok(Ok(true)) => {
            notifier.transient("Connection valid");
            ValidationOutcome::Valid
        }
        Ok(Ok(false)) => {
            notifier.blocking(
                "Validation",
                "Connection validation failed. Please check the credentials and the error log.",
            );
            ValidationOutcome::Invalid
        }
        Ok(Err(err)) => {
            notifier.blocking(
                "Validation",
                &format!(
                    "Connection validation failed: {err:#}. Please check the credentials and the error log."
                ),
            );
            ValidationOutcome::Invalid
        }
        Err(_elapsed) => {
            notifier.blocking(
                "Validation",
                &format!(
                    "Connection validation timed out after {}s. Please check the host and network.",
                    VALIDATE_TIMEOUT.as_secs()
                ),
            );
            ValidationOutcome::Invalid
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

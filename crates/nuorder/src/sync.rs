//! The full sync pipeline and its fire-and-forget queue entry point.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use shared::domain::OrderStatus;
use shared::error::{ErrorCode, RemoteError};

use crate::{
    catalog::{company_payloads, CatalogSource},
    config::ConnectorSettings,
    synclog::{SyncLog, SyncOperation},
    NuOrderClient,
};

#[derive(Clone)]
pub struct SyncContext {
    pub settings: ConnectorSettings,
    pub catalog: Arc<dyn CatalogSource>,
    pub log: Arc<SyncLog>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub orders_read: usize,
    pub customers_written: usize,
    pub items_written: usize,
}

/// Enqueues a full sync on the current runtime and returns immediately.
/// Progress and outcomes are observable only through the sync log.
pub fn queue_sync(context: SyncContext) -> tokio::task::JoinHandle<()> {
    context
        .log
        .record_ok(SyncOperation::QueueSync, "full sync queued");
    tokio::spawn(async move {
        if let Err(err) = run_full_sync(&context).await {
            context.log.record_failed(
                SyncOperation::FullSync,
                "full sync aborted",
                RemoteError::new(ErrorCode::Internal, format!("{err:#}")),
            );
        }
    })
}

/// Runs the whole pipeline: connection check, order retrieval, customer push,
/// item push. Steps run in order and the first failure aborts the run; each
/// step's outcome lands in the sync log.
pub async fn run_full_sync(context: &SyncContext) -> Result<SyncReport> {
    let client =
        NuOrderClient::from_settings(&context.settings).context("failed to build client")?;
    let log = &context.log;

    if !client.check_connection().await {
        log.record_failed(
            SyncOperation::CheckConnection,
            "connection check failed",
            RemoteError::new(ErrorCode::Transport, "connection check returned false"),
        );
        bail!("connection check failed; sync not started");
    }
    log.record_ok(SyncOperation::CheckConnection, "connection valid");

    let orders = client
        .get_orders(OrderStatus::Pending)
        .await
        .context("order retrieval failed")?;
    log.record_ok(
        SyncOperation::GetOrders,
        format!("orders read: {}", orders.len()),
    );

    let companies = company_payloads(&context.catalog.companies()?);
    let customers_written = client
        .push_companies(&companies)
        .await
        .context("customer push failed")?;
    log.record_ok(
        SyncOperation::PushCustomers,
        format!("customers written: {customers_written}"),
    );

    let products: Vec<_> = context
        .catalog
        .items()?
        .iter()
        .map(|item| item.to_product())
        .collect();
    let items_written = client
        .push_products(&products)
        .await
        .context("item push failed")?;
    log.record_ok(
        SyncOperation::PushItems,
        format!("items written: {items_written}"),
    );

    let report = SyncReport {
        orders_read: orders.len(),
        customers_written,
        items_written,
    };
    log.record_ok(
        SyncOperation::FullSync,
        format!(
            "full sync finished: {} orders read, {} customers and {} items written",
            report.orders_read, report.customers_written, report.items_written
        ),
    );
    Ok(report)
}

//! Production [`RemoteOps`] implementation.
//!
//! Mirrors the server-side settings document: every call constructs a fresh
//! client from the current settings record, so credential edits take effect
//! immediately and no connection state is shared between triggers.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use settings_form::RemoteOps;
use shared::domain::OrderStatus;
use shared::error::{RemoteError, RemoteException};
use shared::protocol::OrderSummary;

use crate::{
    catalog::{company_payloads, CatalogSource},
    config::ConnectorSettings,
    sync::{self, SyncContext},
    synclog::{SyncLog, SyncOperation},
    NuOrderClient,
};

/// Endpoint the diagnostic `test` operation echoes.
const TEST_ENDPOINT: &str = "/api/schemas";

pub struct ConnectorOps {
    settings: ConnectorSettings,
    catalog: Arc<dyn CatalogSource>,
    log: Arc<SyncLog>,
}

impl ConnectorOps {
    pub fn new(
        settings: ConnectorSettings,
        catalog: Arc<dyn CatalogSource>,
        log: Arc<SyncLog>,
    ) -> Self {
        Self {
            settings,
            catalog,
            log,
        }
    }

    fn client(&self) -> Result<NuOrderClient> {
        NuOrderClient::from_settings(&self.settings).context("failed to build client")
    }

    pub fn log(&self) -> &Arc<SyncLog> {
        &self.log
    }

    fn log_failure(
        &self,
        operation: SyncOperation,
        detail: &str,
        err: RemoteException,
    ) -> anyhow::Error {
        let remote = RemoteError::from(err);
        self.log.record_failed(operation, detail, remote.clone());
        anyhow::anyhow!("{detail}: {}", remote.message)
    }
}

#[async_trait]
impl RemoteOps for ConnectorOps {
    async fn check_connection(&self) -> Result<bool> {
        Ok(self.client()?.check_connection().await)
    }

    async fn test(&self) -> Result<Value> {
        match self.client()?.get(TEST_ENDPOINT).await {
            Ok(value) => {
                self.log
                    .record_ok(SyncOperation::Test, "diagnostic echo succeeded");
                Ok(value)
            }
            Err(err) => Err(self.log_failure(SyncOperation::Test, "diagnostic echo failed", err)),
        }
    }

    async fn get_orders(&self) -> Result<Vec<OrderSummary>> {
        match self.client()?.get_orders(OrderStatus::Pending).await {
            Ok(orders) => {
                self.log.record_ok(
                    SyncOperation::GetOrders,
                    format!("orders read: {}", orders.len()),
                );
                Ok(orders)
            }
            Err(err) => {
                Err(self.log_failure(SyncOperation::GetOrders, "order retrieval failed", err))
            }
        }
    }

    async fn push_customers(&self) -> Result<usize> {
        let companies = company_payloads(&self.catalog.companies()?);
        match self.client()?.push_companies(&companies).await {
            Ok(count) => {
                self.log.record_ok(
                    SyncOperation::PushCustomers,
                    format!("customers written: {count}"),
                );
                Ok(count)
            }
            Err(err) => {
                Err(self.log_failure(SyncOperation::PushCustomers, "customer push failed", err))
            }
        }
    }

    async fn push_items(&self) -> Result<usize> {
        let products: Vec<_> = self
            .catalog
            .items()?
            .iter()
            .map(|item| item.to_product())
            .collect();
        match self.client()?.push_products(&products).await {
            Ok(count) => {
                self.log
                    .record_ok(SyncOperation::PushItems, format!("items written: {count}"));
                Ok(count)
            }
            Err(err) => Err(self.log_failure(SyncOperation::PushItems, "item push failed", err)),
        }
    }

    async fn queue_sync(&self) -> Result<()> {
        let context = SyncContext {
            settings: self.settings.clone(),
            catalog: Arc::clone(&self.catalog),
            log: Arc::clone(&self.log),
        };
        let _ = sync::queue_sync(context);
        Ok(())
    }
}

//! Per-run API context
//!
//! Owns one client per resource, all sharing a single connection pool.
//! Built once per run and handed to every scenario behind an `Arc`.

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use super::{ApiResult, CartClient, CategoriesClient, FailureKind, OrdersClient, ProductsClient, RestClient, UsersClient};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::registry::{EntityKind, Teardown};

#[derive(Debug, Clone)]
pub struct ApiContext {
    pub products: ProductsClient,
    pub users: UsersClient,
    pub orders: OrdersClient,
    pub categories: CategoriesClient,
    pub cart: CartClient,
}

impl ApiContext {
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        Ok(Self::from_rest(RestClient::new(config)?))
    }

    pub fn from_rest(rest: RestClient) -> Self {
        Self {
            products: ProductsClient::new(rest.clone()),
            users: UsersClient::new(rest.clone()),
            orders: OrdersClient::new(rest.clone()),
            categories: CategoriesClient::new(rest.clone()),
            cart: CartClient::new(rest),
        }
    }

    /// Poll the backend until it answers at all (any HTTP status counts).
    pub async fn wait_until_available(&self, timeout: Duration) -> HarnessResult<()> {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.categories.list_categories().await.failure_kind() {
                Some(FailureKind::Transport) => {
                    if attempts == 1 {
                        info!("Waiting for API to become available...");
                    }
                }
                _ => {
                    info!(attempts, "API is available");
                    return Ok(());
                }
            }

            if start.elapsed() >= timeout {
                warn!(attempts, "API did not become available");
                return Err(HarnessError::AssertionFailed(format!(
                    "API not reachable after {} attempts",
                    attempts
                )));
            }

            sleep(Duration::from_millis(250)).await;
        }
    }
}

#[async_trait::async_trait]
impl Teardown for ApiContext {
    async fn remove(&self, kind: EntityKind, id: &str) -> ApiResult<()> {
        match kind {
            EntityKind::Cart => self.cart.clear_cart(id).await,
            EntityKind::Order => self.orders.cancel_order(id).await,
            EntityKind::Product => self.products.delete_product(id).await,
            EntityKind::User => self.users.delete_user(id).await,
            EntityKind::Category => self.categories.delete_category(id).await,
        }
    }
}

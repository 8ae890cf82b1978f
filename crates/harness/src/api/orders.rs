//! Orders API client

use serde_json::Value;

use super::{ApiResult, RestClient};
use crate::types::{CreateOrder, Order, OrderStatus, UpdateOrder};

const ENDPOINT: &str = "orders";

/// Client for `/orders`
#[derive(Debug, Clone)]
pub struct OrdersClient {
    rest: RestClient,
}

impl OrdersClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn create_order(&self, order: &CreateOrder) -> ApiResult<Order> {
        self.rest.post(&[ENDPOINT], order).await
    }

    pub async fn create_order_raw(&self, body: &Value) -> ApiResult<Order> {
        self.rest.post(&[ENDPOINT], body).await
    }

    /// List orders, optionally filtered by `?userId=`
    pub async fn list_orders(&self, user_id: Option<&str>) -> ApiResult<Vec<Order>> {
        match user_id {
            Some(user_id) => self.rest.get(&[ENDPOINT], &[("userId", user_id)]).await,
            None => self.rest.get(&[ENDPOINT], &[]).await,
        }
    }

    pub async fn list_orders_by_user(&self, user_id: &str) -> ApiResult<Vec<Order>> {
        self.list_orders(Some(user_id)).await
    }

    pub async fn get_order(&self, id: &str) -> ApiResult<Order> {
        self.rest.get(&[ENDPOINT, id], &[]).await
    }

    pub async fn update_order(&self, id: &str, update: &UpdateOrder) -> ApiResult<Order> {
        self.rest.patch(&[ENDPOINT, id], update).await
    }

    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> ApiResult<Order> {
        self.update_order(id, &UpdateOrder { status: Some(status) }).await
    }

    /// Orders are cancelled through DELETE.
    pub async fn cancel_order(&self, id: &str) -> ApiResult<()> {
        self.rest.delete(&[ENDPOINT, id]).await
    }
}

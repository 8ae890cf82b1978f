//! Cart API client

use serde_json::Value;

use super::{ApiResult, RestClient};
use crate::types::{AddItem, Cart, CartItem, CartTotal, UpdateItem};

const ENDPOINT: &str = "cart";
const ITEMS: &str = "items";

/// Client for `/cart/{userId}`
#[derive(Debug, Clone)]
pub struct CartClient {
    rest: RestClient,
}

impl CartClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn get_cart(&self, user_id: &str) -> ApiResult<Cart> {
        self.rest.get(&[ENDPOINT, user_id], &[]).await
    }

    pub async fn clear_cart(&self, user_id: &str) -> ApiResult<()> {
        self.rest.delete(&[ENDPOINT, user_id]).await
    }

    pub async fn add_item(&self, user_id: &str, item: &AddItem) -> ApiResult<CartItem> {
        self.rest.post(&[ENDPOINT, user_id, ITEMS], item).await
    }

    pub async fn add_item_raw(&self, user_id: &str, body: &Value) -> ApiResult<CartItem> {
        self.rest.post(&[ENDPOINT, user_id, ITEMS], body).await
    }

    pub async fn update_item(&self, user_id: &str, product_id: &str, update: &UpdateItem) -> ApiResult<CartItem> {
        self.rest.patch(&[ENDPOINT, user_id, ITEMS, product_id], update).await
    }

    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> ApiResult<()> {
        self.rest.delete(&[ENDPOINT, user_id, ITEMS, product_id]).await
    }

    /// Totals computed from `get_cart`; a failed fetch is returned unchanged.
    pub async fn get_cart_total(&self, user_id: &str) -> ApiResult<CartTotal> {
        match self.get_cart(user_id).await {
            ApiResult::Success { status, data, .. } => ApiResult::ok(status, CartTotal::of(&data.items)),
            failure => failure.map(|cart| CartTotal::of(&cart.items)),
        }
    }
}

//! Products API client

use serde_json::Value;

use super::{ApiResult, RestClient};
use crate::types::{CreateProduct, Product, UpdateProduct};

const ENDPOINT: &str = "products";

/// Client for `/products`
#[derive(Debug, Clone)]
pub struct ProductsClient {
    rest: RestClient,
}

impl ProductsClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn create_product(&self, product: &CreateProduct) -> ApiResult<Product> {
        self.rest.post(&[ENDPOINT], product).await
    }

    /// Send an arbitrary body to the create endpoint, for negative cases
    /// the typed DTO cannot express (missing fields, wrong types).
    pub async fn create_product_raw(&self, body: &Value) -> ApiResult<Product> {
        self.rest.post(&[ENDPOINT], body).await
    }

    pub async fn list_products(&self) -> ApiResult<Vec<Product>> {
        self.rest.get(&[ENDPOINT], &[]).await
    }

    pub async fn get_product(&self, id: &str) -> ApiResult<Product> {
        self.rest.get(&[ENDPOINT, id], &[]).await
    }

    pub async fn update_product(&self, id: &str, update: &UpdateProduct) -> ApiResult<Product> {
        self.rest.patch(&[ENDPOINT, id], update).await
    }

    pub async fn delete_product(&self, id: &str) -> ApiResult<()> {
        self.rest.delete(&[ENDPOINT, id]).await
    }

    pub async fn list_products_by_category(&self, category_id: &str) -> ApiResult<Vec<Product>> {
        self.rest.get(&[ENDPOINT], &[("category", category_id)]).await
    }

    pub async fn search_products(&self, query: &str) -> ApiResult<Vec<Product>> {
        self.rest.get(&[ENDPOINT], &[("q", query)]).await
    }
}

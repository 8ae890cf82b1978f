//! Categories API client

use serde_json::Value;

use super::{ApiResult, RestClient};
use crate::types::{Category, CreateCategory, UpdateCategory};

const ENDPOINT: &str = "categories";

/// Client for `/categories`
#[derive(Debug, Clone)]
pub struct CategoriesClient {
    rest: RestClient,
}

impl CategoriesClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn create_category(&self, category: &CreateCategory) -> ApiResult<Category> {
        self.rest.post(&[ENDPOINT], category).await
    }

    pub async fn create_category_raw(&self, body: &Value) -> ApiResult<Category> {
        self.rest.post(&[ENDPOINT], body).await
    }

    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        self.rest.get(&[ENDPOINT], &[]).await
    }

    pub async fn get_category(&self, id: &str) -> ApiResult<Category> {
        self.rest.get(&[ENDPOINT, id], &[]).await
    }

    pub async fn update_category(&self, id: &str, update: &UpdateCategory) -> ApiResult<Category> {
        self.rest.patch(&[ENDPOINT, id], update).await
    }

    pub async fn delete_category(&self, id: &str) -> ApiResult<()> {
        self.rest.delete(&[ENDPOINT, id]).await
    }

    pub async fn list_child_categories(&self, parent_id: &str) -> ApiResult<Vec<Category>> {
        self.rest.get(&[ENDPOINT], &[("parentId", parent_id)]).await
    }

    /// Root categories are requested with the literal `parentId=null`.
    pub async fn list_root_categories(&self) -> ApiResult<Vec<Category>> {
        self.rest.get(&[ENDPOINT], &[("parentId", "null")]).await
    }
}

//! Users API client

use serde_json::Value;

use super::{ApiResult, RestClient};
use crate::types::{CreateUser, UpdateUser, User};

const ENDPOINT: &str = "users";

/// Client for `/users`
#[derive(Debug, Clone)]
pub struct UsersClient {
    rest: RestClient,
}

impl UsersClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn create_user(&self, user: &CreateUser) -> ApiResult<User> {
        self.rest.post(&[ENDPOINT], user).await
    }

    pub async fn create_user_raw(&self, body: &Value) -> ApiResult<User> {
        self.rest.post(&[ENDPOINT], body).await
    }

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.rest.get(&[ENDPOINT], &[]).await
    }

    pub async fn get_user(&self, id: &str) -> ApiResult<User> {
        self.rest.get(&[ENDPOINT, id], &[]).await
    }

    pub async fn update_user(&self, id: &str, update: &UpdateUser) -> ApiResult<User> {
        self.rest.patch(&[ENDPOINT, id], update).await
    }

    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.rest.delete(&[ENDPOINT, id]).await
    }

    /// Lookup by `?email=`; the backend answers with a single user.
    pub async fn find_user_by_email(&self, email: &str) -> ApiResult<User> {
        self.rest.get(&[ENDPOINT], &[("email", email)]).await
    }
}

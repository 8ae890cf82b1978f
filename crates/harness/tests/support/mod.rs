//! In-process storefront backend for integration tests
//!
//! Serves `/v1/api/...` on an ephemeral port with an in-memory store. The
//! envelopes differ per resource on purpose: products answer with
//! `{data: {data}}`, users, orders and cart with `{data}`, categories bare.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use shopcheck::schema::{catalog, Validator};
use shopcheck::{ApiContext, HarnessConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Users,
    Orders,
    Categories,
}

impl Resource {
    fn wrap(&self, value: Value) -> Value {
        match self {
            Resource::Products => json!({"data": {"data": value}, "success": true}),
            Resource::Users | Resource::Orders => json!({"data": value}),
            Resource::Categories => value,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Resource::Products => "Product",
            Resource::Users => "User",
            Resource::Orders => "Order",
            Resource::Categories => "Category",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Resource::Products => "prod",
            Resource::Users => "user",
            Resource::Orders => "ord",
            Resource::Categories => "cat",
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    seq: u64,
    entities: HashMap<Resource, IndexMap<String, Value>>,
    carts: HashMap<String, Value>,
    /// `(path kind, id)` of every DELETE received, in order
    pub deletes: Vec<(String, String)>,
    /// Ids whose DELETE answers 500
    pub failing_deletes: HashSet<String>,
    /// `Authorization` / `X-API-KEY` seen on the last product listing
    pub last_auth: Option<String>,
}

impl Store {
    fn next_id(&mut self, resource: Resource) -> String {
        self.seq += 1;
        format!("{}-{}", resource.prefix(), self.seq)
    }

    fn table(&mut self, resource: Resource) -> &mut IndexMap<String, Value> {
        self.entities.entry(resource).or_default()
    }

    pub fn count(&self, resource: Resource) -> usize {
        self.entities.get(&resource).map(IndexMap::len).unwrap_or(0)
    }

    pub fn get(&self, resource: Resource, id: &str) -> Option<&Value> {
        self.entities.get(&resource)?.get(id)
    }

    pub fn all(&self, resource: Resource) -> Vec<Value> {
        self.entities
            .get(&resource)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn insert_raw(&mut self, resource: Resource, id: &str, value: Value) {
        self.table(resource).insert(id.to_string(), value);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockState(Arc<Mutex<Store>>);

impl MockState {
    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: MockState,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self::start_with(Router::new()).await
    }

    /// Start with extra routes merged under `/v1/api`.
    pub async fn start_with(extra: Router) -> Self {
        let state = MockState::default();
        let app = Router::new().nest("/v1/api", router(state.clone()).merge(extra));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/v1/api", addr),
            state,
            handle,
        }
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
            startup_timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn api(&self) -> ApiContext {
        ApiContext::new(&self.config()).unwrap()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order).patch(update_order).delete(cancel_order))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).patch(update_category).delete(delete_category),
        )
        .route("/cart/:user_id", get(get_cart).delete(clear_cart))
        .route("/cart/:user_id/items", axum::routing::post(add_cart_item))
        .route(
            "/cart/:user_id/items/:product_id",
            patch(update_cart_item).delete(remove_cart_item),
        )
        .with_state(state)
}

// ============================================================================
// Helpers
// ============================================================================

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found(resource: Resource, id: &str) -> Response {
    reply(
        StatusCode::NOT_FOUND,
        json!({"message": format!("{} {} not found", resource.label(), id), "statusCode": 404}),
    )
}

fn invalid(status: StatusCode, validator: &Validator, body: &Value) -> Option<Response> {
    let errors = validator.errors(body);
    if errors.is_empty() {
        None
    } else {
        Some(reply(
            status,
            json!({"message": errors, "error": "Bad Request", "statusCode": status.as_u16()}),
        ))
    }
}

fn stamp(resource: Resource, mut body: Value, id: String) -> Value {
    if let Some(map) = body.as_object_mut() {
        let ts = now();
        map.insert("id".into(), Value::String(id));
        if resource != Resource::Orders {
            map.entry("isActive").or_insert(Value::Bool(true));
        }
        map.insert("createdAt".into(), Value::String(ts.clone()));
        map.insert("updatedAt".into(), Value::String(ts));
    }
    body
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
        target.insert("updatedAt".into(), Value::String(now()));
    }
}

fn create(state: &MockState, resource: Resource, validator: &Validator, status: StatusCode, body: Value) -> Response {
    match invalid(status, validator, &body) {
        Some(rejection) => rejection,
        None => insert(state, resource, body),
    }
}

fn insert(state: &MockState, resource: Resource, body: Value) -> Response {
    let mut store = state.store();
    let id = store.next_id(resource);
    let entity = stamp(resource, body, id.clone());
    store.table(resource).insert(id, entity.clone());
    reply(StatusCode::CREATED, resource.wrap(entity))
}

fn fetch(state: &MockState, resource: Resource, id: &str) -> Response {
    match state.store().get(resource, id) {
        Some(entity) => reply(StatusCode::OK, resource.wrap(entity.clone())),
        None => not_found(resource, id),
    }
}

fn update(state: &MockState, resource: Resource, validator: &Validator, id: &str, patch: Value) -> Response {
    if let Some(rejection) = invalid(StatusCode::BAD_REQUEST, validator, &patch) {
        return rejection;
    }
    let mut store = state.store();
    match store.table(resource).get_mut(id) {
        Some(entity) => {
            merge(entity, &patch);
            reply(StatusCode::OK, resource.wrap(entity.clone()))
        }
        None => not_found(resource, id),
    }
}

fn remove(state: &MockState, resource: Resource, id: &str, ok: StatusCode) -> Response {
    let mut store = state.store();
    store.deletes.push((resource.label().to_lowercase(), id.to_string()));
    if store.failing_deletes.contains(id) {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "delete failed"}));
    }
    match store.table(resource).shift_remove(id) {
        Some(_) if ok == StatusCode::NO_CONTENT => StatusCode::NO_CONTENT.into_response(),
        Some(_) => reply(ok, json!({"message": format!("{} deleted", resource.label())})),
        None => not_found(resource, id),
    }
}

fn list(state: &MockState, resource: Resource, keep: impl Fn(&Value) -> bool) -> Response {
    let items: Vec<Value> = state
        .store()
        .entities
        .get(&resource)
        .map(|t| t.values().filter(|v| keep(v)).cloned().collect())
        .unwrap_or_default();
    reply(StatusCode::OK, resource.wrap(Value::Array(items)))
}

// ============================================================================
// Products
// ============================================================================

async fn list_products(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let auth = headers
        .get("authorization")
        .or_else(|| headers.get("x-api-key"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.store().last_auth = auth;

    let category = query.get("category").cloned();
    let needle = query.get("q").map(|q| q.to_lowercase());
    list(&state, Resource::Products, |p| {
        let in_category = category.as_deref().map_or(true, |c| p["categoryId"] == c);
        let matches = needle.as_deref().map_or(true, |n| {
            p["name"].as_str().unwrap_or_default().to_lowercase().contains(n)
        });
        in_category && matches
    })
}

async fn create_product(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    create(&state, Resource::Products, &catalog::CREATE_PRODUCT, StatusCode::BAD_REQUEST, body)
}

async fn get_product(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    fetch(&state, Resource::Products, &id)
}

async fn update_product(State(state): State<MockState>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    update(&state, Resource::Products, &catalog::UPDATE_PRODUCT, &id, body)
}

async fn delete_product(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    remove(&state, Resource::Products, &id, StatusCode::NO_CONTENT)
}

// ============================================================================
// Users
// ============================================================================

async fn list_users(State(state): State<MockState>, Query(query): Query<HashMap<String, String>>) -> Response {
    match query.get("email") {
        Some(email) => {
            let store = state.store();
            let found = store
                .entities
                .get(&Resource::Users)
                .and_then(|t| t.values().find(|u| u["email"] == email.as_str()).cloned());
            match found {
                Some(user) => reply(StatusCode::OK, Resource::Users.wrap(user)),
                None => not_found(Resource::Users, email),
            }
        }
        None => list(&state, Resource::Users, |_| true),
    }
}

async fn create_user(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    create(&state, Resource::Users, &catalog::CREATE_USER, StatusCode::BAD_REQUEST, body)
}

async fn get_user(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    fetch(&state, Resource::Users, &id)
}

async fn update_user(State(state): State<MockState>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    update(&state, Resource::Users, &catalog::UPDATE_USER, &id, body)
}

async fn delete_user(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    remove(&state, Resource::Users, &id, StatusCode::NO_CONTENT)
}

// ============================================================================
// Orders
// ============================================================================

async fn list_orders(State(state): State<MockState>, Query(query): Query<HashMap<String, String>>) -> Response {
    let user_id = query.get("userId").cloned();
    list(&state, Resource::Orders, |o| {
        user_id.as_deref().map_or(true, |u| o["userId"] == u)
    })
}

async fn create_order(State(state): State<MockState>, Json(mut body): Json<Value>) -> Response {
    if let Some(rejection) = invalid(StatusCode::UNPROCESSABLE_ENTITY, &catalog::CREATE_ORDER, &body) {
        return rejection;
    }
    let total: f64 = body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|i| i["price"].as_f64().unwrap_or(0.0) * i["quantity"].as_f64().unwrap_or(0.0))
                .sum()
        })
        .unwrap_or(0.0);
    body["status"] = json!("pending");
    body["totalAmount"] = json!(total);
    insert(&state, Resource::Orders, body)
}

async fn get_order(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    fetch(&state, Resource::Orders, &id)
}

async fn update_order(State(state): State<MockState>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    update(&state, Resource::Orders, &catalog::UPDATE_ORDER, &id, body)
}

/// Orders are never deleted, only marked cancelled.
async fn cancel_order(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    let mut store = state.store();
    store.deletes.push(("order".into(), id.clone()));
    if store.failing_deletes.contains(&id) {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "cancel failed"}));
    }
    match store.table(Resource::Orders).get_mut(&id) {
        Some(order) => {
            merge(order, &json!({"status": "cancelled"}));
            reply(StatusCode::OK, Resource::Orders.wrap(order.clone()))
        }
        None => not_found(Resource::Orders, &id),
    }
}

// ============================================================================
// Categories
// ============================================================================

async fn list_categories(State(state): State<MockState>, Query(query): Query<HashMap<String, String>>) -> Response {
    match query.get("parentId").map(String::as_str) {
        Some("null") => list(&state, Resource::Categories, |c| c["parentId"].is_null()),
        Some(parent) => {
            let parent = parent.to_string();
            list(&state, Resource::Categories, move |c| c["parentId"] == parent.as_str())
        }
        None => list(&state, Resource::Categories, |_| true),
    }
}

async fn create_category(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    create(&state, Resource::Categories, &catalog::CREATE_CATEGORY, StatusCode::BAD_REQUEST, body)
}

async fn get_category(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    fetch(&state, Resource::Categories, &id)
}

async fn update_category(State(state): State<MockState>, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    update(&state, Resource::Categories, &catalog::UPDATE_CATEGORY, &id, body)
}

async fn delete_category(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    remove(&state, Resource::Categories, &id, StatusCode::OK)
}

// ============================================================================
// Cart
// ============================================================================

fn cart_for<'a>(store: &'a mut Store, user_id: &str) -> Option<&'a mut Value> {
    if store.get(Resource::Users, user_id).is_none() {
        return None;
    }
    let ts = now();
    let cart = store.carts.entry(user_id.to_string()).or_insert_with(|| {
        json!({
            "id": format!("cart-{}", user_id),
            "userId": user_id,
            "items": [],
            "totalAmount": 0,
            "itemCount": 0,
            "createdAt": ts,
            "updatedAt": ts,
        })
    });
    Some(cart)
}

fn recompute(cart: &mut Value) {
    let (total, count) = cart["items"]
        .as_array()
        .map(|items| {
            items.iter().fold((0.0, 0i64), |(t, c), i| {
                (
                    t + i["total"].as_f64().unwrap_or(0.0),
                    c + i["quantity"].as_i64().unwrap_or(0),
                )
            })
        })
        .unwrap_or((0.0, 0));
    cart["totalAmount"] = json!(total);
    cart["itemCount"] = json!(count);
    cart["updatedAt"] = json!(now());
}

fn cart_items(cart: &mut Value) -> &mut Vec<Value> {
    if !cart["items"].is_array() {
        cart["items"] = json!([]);
    }
    match cart["items"].as_array_mut() {
        Some(items) => items,
        None => unreachable!("items was just set to an array"),
    }
}

async fn get_cart(State(state): State<MockState>, Path(user_id): Path<String>) -> Response {
    let mut store = state.store();
    match cart_for(&mut store, &user_id) {
        Some(cart) => reply(StatusCode::OK, json!({"data": cart.clone()})),
        None => not_found(Resource::Users, &user_id),
    }
}

async fn clear_cart(State(state): State<MockState>, Path(user_id): Path<String>) -> Response {
    let mut store = state.store();
    store.deletes.push(("cart".into(), user_id.clone()));
    if store.failing_deletes.contains(&user_id) {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "clear failed"}));
    }
    match cart_for(&mut store, &user_id) {
        Some(cart) => {
            cart_items(cart).clear();
            recompute(cart);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(Resource::Users, &user_id),
    }
}

async fn add_cart_item(
    State(state): State<MockState>,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = invalid(StatusCode::BAD_REQUEST, &catalog::ADD_ITEM, &body) {
        return rejection;
    }
    let mut store = state.store();
    let Some(cart) = cart_for(&mut store, &user_id) else {
        return not_found(Resource::Users, &user_id);
    };

    let items = cart_items(cart);
    let line = match items.iter().position(|i| i["productId"] == body["productId"]) {
        Some(index) => {
            let existing = &mut items[index];
            let quantity = existing["quantity"].as_i64().unwrap_or(0) + body["quantity"].as_i64().unwrap_or(0);
            existing["quantity"] = json!(quantity);
            existing["total"] = json!(existing["price"].as_f64().unwrap_or(0.0) * quantity as f64);
            existing.clone()
        }
        None => {
            let mut line: Map<String, Value> = body.as_object().cloned().unwrap_or_default();
            let total = body["price"].as_f64().unwrap_or(0.0) * body["quantity"].as_f64().unwrap_or(0.0);
            line.insert("total".into(), json!(total));
            let line = Value::Object(line);
            items.push(line.clone());
            line
        }
    };
    recompute(cart);
    reply(StatusCode::CREATED, json!({"data": line}))
}

async fn update_cart_item(
    State(state): State<MockState>,
    Path((user_id, product_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = invalid(StatusCode::BAD_REQUEST, &catalog::UPDATE_ITEM, &body) {
        return rejection;
    }
    let mut store = state.store();
    let Some(cart) = cart_for(&mut store, &user_id) else {
        return not_found(Resource::Users, &user_id);
    };

    let quantity = body["quantity"].as_i64().unwrap_or(0);
    let updated = cart_items(cart)
        .iter_mut()
        .find(|i| i["productId"] == product_id.as_str())
        .map(|item| {
            item["quantity"] = json!(quantity);
            item["total"] = json!(item["price"].as_f64().unwrap_or(0.0) * quantity as f64);
            item.clone()
        });
    match updated {
        Some(item) => {
            recompute(cart);
            reply(StatusCode::OK, json!({"data": item}))
        }
        None => reply(StatusCode::NOT_FOUND, json!({"message": "Item not in cart"})),
    }
}

async fn remove_cart_item(
    State(state): State<MockState>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Response {
    let mut store = state.store();
    let Some(cart) = cart_for(&mut store, &user_id) else {
        return not_found(Resource::Users, &user_id);
    };

    let items = cart_items(cart);
    let before = items.len();
    items.retain(|i| i["productId"] != product_id.as_str());
    if items.len() == before {
        return reply(StatusCode::NOT_FOUND, json!({"message": "Item not in cart"}));
    }
    recompute(cart);
    reply(StatusCode::OK, json!({"data": cart.clone()}))
}

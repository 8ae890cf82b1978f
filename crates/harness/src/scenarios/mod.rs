//! Scenario catalogue
//!
//! Each scenario is a plain async function over a [`ScenarioContext`].
//! Entities a scenario creates go through `track`/`adopt` so teardown
//! happens no matter where the scenario stops.

mod cart;
mod categories;
mod orders;
mod products;
mod users;

use futures::future::BoxFuture;
use std::sync::Arc;

use crate::error::{HarnessError, HarnessResult};
use crate::registry::EntityKind;
use crate::scenario::ScenarioContext;
use crate::types::{Category, Order, Product, User};
use crate::{fixtures, types::OrderItem};

pub type ScenarioFn = for<'a> fn(&'a mut ScenarioContext) -> BoxFuture<'a, HarnessResult<()>>;

/// A named, tagged scenario
#[derive(Clone, Copy)]
pub struct ScenarioDef {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub run: ScenarioFn,
}

impl ScenarioDef {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

impl std::fmt::Debug for ScenarioDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioDef")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Every scenario, grouped by resource
pub fn catalogue() -> Vec<ScenarioDef> {
    let mut all = Vec::new();
    all.extend_from_slice(categories::SCENARIOS);
    all.extend_from_slice(products::SCENARIOS);
    all.extend_from_slice(users::SCENARIOS);
    all.extend_from_slice(orders::SCENARIOS);
    all.extend_from_slice(cart::SCENARIOS);
    all
}

pub fn find(name: &str) -> HarnessResult<ScenarioDef> {
    catalogue()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| HarnessError::ScenarioNotFound(name.to_string()))
}

pub fn tagged(tag: &str) -> Vec<ScenarioDef> {
    catalogue().into_iter().filter(|s| s.has_tag(tag)).collect()
}

// ============================================================================
// Setup helpers
// ============================================================================

fn ensure(condition: bool, message: impl FnOnce() -> String) -> HarnessResult<()> {
    if condition {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed(message()))
    }
}

async fn seed_category(ctx: &mut ScenarioContext) -> HarnessResult<Category> {
    let category = ctx
        .api
        .categories
        .create_category(&fixtures::category_dto())
        .await
        .into_result()?;
    ctx.adopt(EntityKind::Category, &category);
    Ok(category)
}

async fn seed_product(ctx: &mut ScenarioContext) -> HarnessResult<Product> {
    let category = seed_category(ctx).await?;
    seed_product_in(ctx, &category.id).await
}

async fn seed_product_in(ctx: &mut ScenarioContext, category_id: &str) -> HarnessResult<Product> {
    let product = ctx
        .api
        .products
        .create_product(&fixtures::product_dto(category_id))
        .await
        .into_result()?;
    ctx.adopt(EntityKind::Product, &product);
    Ok(product)
}

async fn seed_user(ctx: &mut ScenarioContext) -> HarnessResult<User> {
    let user = ctx.api.users.create_user(&fixtures::user_dto()).await.into_result()?;
    ctx.adopt(EntityKind::User, &user);
    Ok(user)
}

/// Create a user and a category concurrently. Whichever succeeded is
/// tracked before an error is returned.
async fn seed_user_and_category(ctx: &mut ScenarioContext) -> HarnessResult<(User, Category)> {
    let api = Arc::clone(&ctx.api);
    let user_dto = fixtures::user_dto();
    let category_dto = fixtures::category_dto();

    let (user, category) = futures::join!(
        api.users.create_user(&user_dto),
        api.categories.create_category(&category_dto)
    );

    if let Some(user) = user.data() {
        ctx.adopt(EntityKind::User, user);
    }
    if let Some(category) = category.data() {
        ctx.adopt(EntityKind::Category, category);
    }
    Ok((user.into_result()?, category.into_result()?))
}

/// A user and a product, then a pending order for two of that product.
async fn seed_order(ctx: &mut ScenarioContext) -> HarnessResult<(User, Order)> {
    let (user, category) = seed_user_and_category(ctx).await?;
    let product = seed_product_in(ctx, &category.id).await?;
    let items: Vec<OrderItem> = vec![fixtures::order_item(&product, 2)];
    let order = ctx
        .api
        .orders
        .create_order(&fixtures::order_dto(&user.id, items))
        .await
        .into_result()?;
    ctx.adopt(EntityKind::Order, &order);
    Ok((user, order))
}

/// Id that no backend will ever have handed out
fn unknown_id() -> String {
    format!("missing-{}", uuid::Uuid::new_v4())
}

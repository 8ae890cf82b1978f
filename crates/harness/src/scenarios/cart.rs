use futures::future::BoxFuture;
use serde_json::{json, Value};

use super::{ensure, seed_user, ScenarioDef};
use crate::error::HarnessResult;
use crate::fixtures;
use crate::registry::EntityKind;
use crate::scenario::ScenarioContext;
use crate::schema::catalog;
use crate::types::{Cart, CartItem, UpdateItem, User};

pub(super) const SCENARIOS: &[ScenarioDef] = &[
    ScenarioDef {
        name: "get a user cart",
        tags: &["cart", "smoke"],
        run: get_cart,
    },
    ScenarioDef {
        name: "add an item to the cart",
        tags: &["cart", "smoke"],
        run: add_item,
    },
    ScenarioDef {
        name: "cart total is computed from items",
        tags: &["cart", "smoke"],
        run: cart_total,
    },
    ScenarioDef {
        name: "update a cart item quantity",
        tags: &["cart", "regression"],
        run: update_item,
    },
    ScenarioDef {
        name: "remove an item from the cart",
        tags: &["cart", "regression"],
        run: remove_item,
    },
    ScenarioDef {
        name: "clear the cart",
        tags: &["cart", "regression"],
        run: clear_cart,
    },
    ScenarioDef {
        name: "reject a cart item without a product id",
        tags: &["cart", "regression"],
        run: reject_missing_product_id,
    },
];

/// A user whose cart is torn down (by user id) before the user is.
async fn cart_owner(ctx: &mut ScenarioContext) -> HarnessResult<User> {
    let user = seed_user(ctx).await?;
    ctx.registry.register(EntityKind::Cart, user.id.as_str(), Value::Null);
    Ok(user)
}

fn get_cart(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = cart_owner(ctx).await?;

        let result = ctx.api.cart.get_cart(&user.id).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::CART)?;
        let cart: Cart = ctx.world.response_as()?;
        ensure(cart.user_id == user.id, || format!("cart belongs to {}", cart.user_id))
    })
}

fn add_item(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = cart_owner(ctx).await?;
        let dto = fixtures::add_item_with(12.5, 2);
        catalog::ADD_ITEM.check_serialized(&dto)?;

        let result = ctx.api.cart.add_item(&user.id, &dto).await;
        ctx.record(&result);

        ctx.world.assert_status(201)?;
        ctx.world.assert_schema(&catalog::CART_ITEM)?;
        let item: CartItem = ctx.world.response_as()?;
        ensure(item.product_id == dto.product_id, || "added item has another product id".into())?;
        ensure(item.total == 25.0, || format!("line total is {}", item.total))
    })
}

fn cart_total(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = cart_owner(ctx).await?;
        ctx.api.cart.clear_cart(&user.id).await.into_result()?;

        for (price, quantity) in [(10.0, 2), (15.0, 1)] {
            let dto = fixtures::add_item_with(price, quantity);
            ctx.api.cart.add_item(&user.id, &dto).await.into_result()?;
        }

        let result = ctx.api.cart.get_cart_total(&user.id).await;
        ctx.record(&result);
        ctx.world.assert_status(200)?;
        let total = result.into_result()?;
        ensure(total.total == 35.0, || format!("total is {}", total.total))?;
        ensure(total.item_count == 3, || format!("item count is {}", total.item_count))
    })
}

fn update_item(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = cart_owner(ctx).await?;
        let dto = fixtures::add_item_with(4.0, 1);
        ctx.api.cart.add_item(&user.id, &dto).await.into_result()?;

        let update = UpdateItem { quantity: 5 };
        let result = ctx.api.cart.update_item(&user.id, &dto.product_id, &update).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        let item: CartItem = ctx.world.response_as()?;
        ensure(item.quantity == 5, || format!("quantity is {}", item.quantity))
    })
}

fn remove_item(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = cart_owner(ctx).await?;
        let dto = fixtures::add_item_with(4.0, 1);
        ctx.api.cart.add_item(&user.id, &dto).await.into_result()?;

        let result = ctx.api.cart.remove_item(&user.id, &dto.product_id).await;
        ctx.record(&result);
        ctx.world.assert_success()?;

        let cart = ctx.api.cart.get_cart(&user.id).await.into_result()?;
        ensure(cart.items.iter().all(|i| i.product_id != dto.product_id), || {
            "removed item is still in the cart".into()
        })
    })
}

fn clear_cart(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = cart_owner(ctx).await?;
        for _ in 0..2 {
            let dto = fixtures::add_item_with(3.0, 1);
            ctx.api.cart.add_item(&user.id, &dto).await.into_result()?;
        }

        let result = ctx.api.cart.clear_cart(&user.id).await;
        ctx.record(&result);
        ctx.world.assert_success()?;

        let total = ctx.api.cart.get_cart_total(&user.id).await.into_result()?;
        ensure(total.item_count == 0 && total.total == 0.0, || {
            format!("cart still holds {} items", total.item_count)
        })
    })
}

fn reject_missing_product_id(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = cart_owner(ctx).await?;
        let body = json!({"productName": "Nameless", "price": 1.0, "quantity": 1});
        ensure(!catalog::ADD_ITEM.is_valid(&body), || "payload unexpectedly valid".into())?;

        let result = ctx.api.cart.add_item_raw(&user.id, &body).await;
        ctx.record(&result);
        ctx.world.assert_validation_error()?;
        Ok(())
    })
}

use futures::future::BoxFuture;

use super::{ensure, seed_order, seed_product_in, seed_user, seed_user_and_category, unknown_id, ScenarioDef};
use crate::error::HarnessResult;
use crate::fixtures;
use crate::registry::EntityKind;
use crate::scenario::ScenarioContext;
use crate::schema::catalog;
use crate::types::{Order, OrderStatus};

pub(super) const SCENARIOS: &[ScenarioDef] = &[
    ScenarioDef {
        name: "create an order",
        tags: &["orders", "smoke"],
        run: create_order,
    },
    ScenarioDef {
        name: "confirm an order",
        tags: &["orders", "smoke"],
        run: confirm_order,
    },
    ScenarioDef {
        name: "get an order by id",
        tags: &["orders", "regression"],
        run: get_order,
    },
    ScenarioDef {
        name: "list orders of a user",
        tags: &["orders", "users", "regression"],
        run: list_by_user,
    },
    ScenarioDef {
        name: "cancel an order",
        tags: &["orders", "regression"],
        run: cancel_order,
    },
    ScenarioDef {
        name: "reject an order without items",
        tags: &["orders", "regression"],
        run: reject_empty_items,
    },
    ScenarioDef {
        name: "unknown order is not found",
        tags: &["orders", "regression"],
        run: unknown_order,
    },
];

fn create_order(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let (user, category) = seed_user_and_category(ctx).await?;
        let product = seed_product_in(ctx, &category.id).await?;
        let dto = fixtures::order_dto(&user.id, vec![fixtures::order_item(&product, 3)]);
        catalog::CREATE_ORDER.check_serialized(&dto)?;

        let result = ctx.api.orders.create_order(&dto).await;
        ctx.track(EntityKind::Order, &result);

        ctx.world.assert_status(201)?;
        ctx.world.assert_schema(&catalog::ORDER)?;
        let order: Order = ctx.world.response_as()?;
        ensure(order.status == OrderStatus::Pending, || {
            format!("new order has status {}", order.status)
        })?;
        ensure(order.user_id == user.id, || "order belongs to another user".into())
    })
}

fn confirm_order(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let (_, order) = seed_order(ctx).await?;

        let result = ctx.api.orders.update_order_status(&order.id, OrderStatus::Confirmed).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::ORDER)?;
        let updated: Order = ctx.world.response_as()?;
        ensure(updated.status == OrderStatus::Confirmed, || {
            format!("status is {} after confirming", updated.status)
        })
    })
}

fn get_order(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let (_, order) = seed_order(ctx).await?;

        let result = ctx.api.orders.get_order(&order.id).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::ORDER)?;
        let fetched: Order = ctx.world.response_as()?;
        ensure(fetched.items == order.items, || "items differ from the created order".into())
    })
}

fn list_by_user(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let (user, order) = seed_order(ctx).await?;

        let result = ctx.api.orders.list_orders_by_user(&user.id).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::ORDER_LIST)?;
        let orders: Vec<Order> = ctx.world.response_as()?;
        ensure(orders.iter().any(|o| o.id == order.id), || "order not listed".into())?;
        ensure(orders.iter().all(|o| o.user_id == user.id), || {
            "list contains orders of another user".into()
        })
    })
}

fn cancel_order(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let (_, order) = seed_order(ctx).await?;

        let result = ctx.api.orders.cancel_order(&order.id).await;
        ctx.record(&result);
        ctx.world.assert_success()?;
        ctx.registry.remove(EntityKind::Order, &order.id);
        Ok(())
    })
}

fn reject_empty_items(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = seed_user(ctx).await?;
        let body = serde_json::to_value(fixtures::order_dto(&user.id, Vec::new()))?;
        ensure(!catalog::CREATE_ORDER.is_valid(&body), || "payload unexpectedly valid".into())?;

        let result = ctx.api.orders.create_order_raw(&body).await;
        ctx.track(EntityKind::Order, &result);
        ctx.world.assert_validation_error()?;
        Ok(())
    })
}

fn unknown_order(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let result = ctx.api.orders.get_order(&unknown_id()).await;
        ctx.record(&result);
        ctx.world.assert_not_found()?;
        Ok(())
    })
}

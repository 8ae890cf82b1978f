use futures::future::BoxFuture;
use serde_json::json;

use super::{ensure, seed_category, seed_product, unknown_id, ScenarioDef};
use crate::error::HarnessResult;
use crate::fixtures;
use crate::registry::EntityKind;
use crate::scenario::ScenarioContext;
use crate::schema::catalog;
use crate::types::{Product, UpdateProduct};

pub(super) const SCENARIOS: &[ScenarioDef] = &[
    ScenarioDef {
        name: "create a product",
        tags: &["products", "smoke"],
        run: create_product,
    },
    ScenarioDef {
        name: "get a product by id",
        tags: &["products", "smoke"],
        run: get_product,
    },
    ScenarioDef {
        name: "list products",
        tags: &["products", "regression"],
        run: list_products,
    },
    ScenarioDef {
        name: "update a product price",
        tags: &["products", "regression"],
        run: update_product,
    },
    ScenarioDef {
        name: "delete a product",
        tags: &["products", "regression"],
        run: delete_product,
    },
    ScenarioDef {
        name: "reject a product without a name",
        tags: &["products", "regression"],
        run: reject_missing_name,
    },
    ScenarioDef {
        name: "reject a product with a negative price",
        tags: &["products", "regression"],
        run: reject_negative_price,
    },
    ScenarioDef {
        name: "unknown product is not found",
        tags: &["products", "regression"],
        run: unknown_product,
    },
    ScenarioDef {
        name: "list products by category",
        tags: &["products", "categories", "regression"],
        run: list_by_category,
    },
    ScenarioDef {
        name: "search products by name",
        tags: &["products", "regression"],
        run: search_products,
    },
];

fn create_product(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let category = seed_category(ctx).await?;
        let dto = fixtures::product_dto(&category.id);

        let result = ctx.api.products.create_product(&dto).await;
        ctx.track(EntityKind::Product, &result);

        ctx.world.assert_status(201)?;
        ctx.world.assert_schema(&catalog::PRODUCT)?;
        let product: Product = ctx.world.response_as()?;
        ensure(product.name == dto.name, || format!("name {} != {}", product.name, dto.name))
    })
}

fn get_product(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let product = seed_product(ctx).await?;

        let result = ctx.api.products.get_product(&product.id).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::PRODUCT)?;
        let fetched: Product = ctx.world.response_as()?;
        ensure(fetched.id == product.id, || format!("fetched {} instead of {}", fetched.id, product.id))
    })
}

fn list_products(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let product = seed_product(ctx).await?;

        let result = ctx.api.products.list_products().await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::PRODUCT_LIST)?;
        let listed: Vec<Product> = ctx.world.response_as()?;
        ensure(listed.iter().any(|p| p.id == product.id), || {
            format!("product {} missing from list", product.id)
        })
    })
}

fn update_product(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let product = seed_product(ctx).await?;
        let update = UpdateProduct {
            price: Some(25.5),
            stock: Some(7),
            ..Default::default()
        };
        catalog::UPDATE_PRODUCT.check_serialized(&update)?;

        let result = ctx.api.products.update_product(&product.id, &update).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::PRODUCT)?;
        let updated: Product = ctx.world.response_as()?;
        ensure(updated.price == 25.5 && updated.stock == 7, || {
            format!("update not applied: price {} stock {}", updated.price, updated.stock)
        })
    })
}

fn delete_product(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let product = seed_product(ctx).await?;

        let result = ctx.api.products.delete_product(&product.id).await;
        ctx.record(&result);
        ctx.world.assert_success()?;
        ctx.registry.remove(EntityKind::Product, &product.id);

        let result = ctx.api.products.get_product(&product.id).await;
        ctx.record(&result);
        ctx.world.assert_not_found()?;
        Ok(())
    })
}

fn reject_missing_name(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let category = seed_category(ctx).await?;
        let mut body = serde_json::to_value(fixtures::product_dto(&category.id))?;
        if let Some(map) = body.as_object_mut() {
            map.remove("name");
        }
        ensure(!catalog::CREATE_PRODUCT.is_valid(&body), || "payload unexpectedly valid".into())?;

        let result = ctx.api.products.create_product_raw(&body).await;
        ctx.track(EntityKind::Product, &result);
        ctx.world.assert_validation_error()?;
        Ok(())
    })
}

fn reject_negative_price(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let category = seed_category(ctx).await?;
        let mut body = serde_json::to_value(fixtures::product_dto(&category.id))?;
        body["price"] = json!(-1);

        let result = ctx.api.products.create_product_raw(&body).await;
        ctx.track(EntityKind::Product, &result);
        ctx.world.assert_validation_error()?;
        Ok(())
    })
}

fn unknown_product(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let result = ctx.api.products.get_product(&unknown_id()).await;
        ctx.record(&result);
        ctx.world.assert_status(404)?;
        ctx.world.assert_not_found()?;
        Ok(())
    })
}

fn list_by_category(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let product = seed_product(ctx).await?;

        let result = ctx.api.products.list_products_by_category(&product.category_id).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::PRODUCT_LIST)?;
        let listed: Vec<Product> = ctx.world.response_as()?;
        ensure(listed.iter().any(|p| p.id == product.id), || "seeded product not listed".into())?;
        ensure(listed.iter().all(|p| p.category_id == product.category_id), || {
            "list contains products of another category".into()
        })
    })
}

fn search_products(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let product = seed_product(ctx).await?;

        let result = ctx.api.products.search_products(&product.name).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        let found: Vec<Product> = ctx.world.response_as()?;
        ensure(found.iter().any(|p| p.id == product.id), || {
            format!("search for {:?} did not return the product", product.name)
        })
    })
}

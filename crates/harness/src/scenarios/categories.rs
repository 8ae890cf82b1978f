use futures::future::BoxFuture;
use serde_json::json;

use super::{ensure, seed_category, unknown_id, ScenarioDef};
use crate::error::HarnessResult;
use crate::fixtures;
use crate::registry::EntityKind;
use crate::scenario::ScenarioContext;
use crate::schema::catalog;
use crate::types::{Category, UpdateCategory};

pub(super) const SCENARIOS: &[ScenarioDef] = &[
    ScenarioDef {
        name: "create a category",
        tags: &["categories", "smoke"],
        run: create_category,
    },
    ScenarioDef {
        name: "unknown category is not found",
        tags: &["categories", "smoke"],
        run: unknown_category,
    },
    ScenarioDef {
        name: "list categories",
        tags: &["categories", "regression"],
        run: list_categories,
    },
    ScenarioDef {
        name: "update a category description",
        tags: &["categories", "regression"],
        run: update_category,
    },
    ScenarioDef {
        name: "delete a category",
        tags: &["categories", "regression"],
        run: delete_category,
    },
    ScenarioDef {
        name: "list child categories",
        tags: &["categories", "regression"],
        run: list_children,
    },
    ScenarioDef {
        name: "list root categories",
        tags: &["categories", "regression"],
        run: list_roots,
    },
    ScenarioDef {
        name: "reject a category with a short name",
        tags: &["categories", "regression"],
        run: reject_short_name,
    },
];

fn create_category(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let dto = fixtures::category_dto();

        let result = ctx.api.categories.create_category(&dto).await;
        ctx.track(EntityKind::Category, &result);

        ctx.world.assert_status(201)?;
        ctx.world.assert_schema(&catalog::CATEGORY)?;
        let category: Category = ctx.world.response_as()?;
        ensure(category.parent_id.is_none(), || "new root category has a parent".into())
    })
}

fn unknown_category(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let result = ctx.api.categories.get_category(&unknown_id()).await;
        ctx.record(&result);
        ctx.world.assert_status(404)?;
        ctx.world.assert_not_found()?;
        Ok(())
    })
}

fn list_categories(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        seed_category(ctx).await?;

        let result = ctx.api.categories.list_categories().await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::CATEGORY_LIST)?;
        Ok(())
    })
}

fn update_category(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let category = seed_category(ctx).await?;
        let update = UpdateCategory {
            description: Some("Updated by shopcheck".into()),
            ..Default::default()
        };

        let result = ctx.api.categories.update_category(&category.id, &update).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::CATEGORY)?;
        let updated: Category = ctx.world.response_as()?;
        ensure(updated.description == "Updated by shopcheck", || {
            format!("description is {:?}", updated.description)
        })?;
        ensure(updated.name == category.name, || "name changed on a description update".into())
    })
}

fn delete_category(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let category = seed_category(ctx).await?;

        let result = ctx.api.categories.delete_category(&category.id).await;
        ctx.record(&result);
        ctx.world.assert_success()?;
        ctx.registry.remove(EntityKind::Category, &category.id);

        let result = ctx.api.categories.get_category(&category.id).await;
        ctx.record(&result);
        ctx.world.assert_not_found()?;
        Ok(())
    })
}

fn list_children(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let parent = seed_category(ctx).await?;
        let result = ctx
            .api
            .categories
            .create_category(&fixtures::child_category_dto(&parent.id))
            .await;
        ctx.track(EntityKind::Category, &result);
        ctx.world.assert_status(201)?;
        let child: Category = ctx.world.response_as()?;

        let result = ctx.api.categories.list_child_categories(&parent.id).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::CATEGORY_LIST)?;
        let children: Vec<Category> = ctx.world.response_as()?;
        ensure(children.iter().any(|c| c.id == child.id), || "child not listed".into())?;
        ensure(
            children.iter().all(|c| c.parent_id.as_deref() == Some(parent.id.as_str())),
            || "list contains categories of another parent".into(),
        )
    })
}

fn list_roots(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let root = seed_category(ctx).await?;

        let result = ctx.api.categories.list_root_categories().await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        let roots: Vec<Category> = ctx.world.response_as()?;
        ensure(roots.iter().any(|c| c.id == root.id), || "root category not listed".into())?;
        ensure(roots.iter().all(|c| c.parent_id.is_none()), || {
            "list contains a category with a parent".into()
        })
    })
}

fn reject_short_name(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let mut body = serde_json::to_value(fixtures::category_dto())?;
        body["name"] = json!("A");

        let result = ctx.api.categories.create_category_raw(&body).await;
        ctx.track(EntityKind::Category, &result);
        ctx.world.assert_validation_error()?;
        Ok(())
    })
}

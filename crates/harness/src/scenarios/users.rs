use futures::future::BoxFuture;

use super::{ensure, seed_user, unknown_id, ScenarioDef};
use crate::error::HarnessResult;
use crate::fixtures;
use crate::registry::EntityKind;
use crate::scenario::ScenarioContext;
use crate::schema::catalog;
use crate::types::{UpdateUser, User};

pub(super) const SCENARIOS: &[ScenarioDef] = &[
    ScenarioDef {
        name: "create a user",
        tags: &["users", "smoke"],
        run: create_user,
    },
    ScenarioDef {
        name: "get a user by id",
        tags: &["users", "regression"],
        run: get_user,
    },
    ScenarioDef {
        name: "list users",
        tags: &["users", "regression"],
        run: list_users,
    },
    ScenarioDef {
        name: "update a user name",
        tags: &["users", "regression"],
        run: update_user,
    },
    ScenarioDef {
        name: "delete a user",
        tags: &["users", "regression"],
        run: delete_user,
    },
    ScenarioDef {
        name: "reject a user with an invalid email",
        tags: &["users", "regression"],
        run: reject_invalid_email,
    },
    ScenarioDef {
        name: "find a user by email",
        tags: &["users", "regression"],
        run: find_by_email,
    },
    ScenarioDef {
        name: "unknown user is not found",
        tags: &["users", "regression"],
        run: unknown_user,
    },
];

fn create_user(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let dto = fixtures::user_dto();
        catalog::CREATE_USER.check_serialized(&dto)?;

        let result = ctx.api.users.create_user(&dto).await;
        ctx.track(EntityKind::User, &result);

        ctx.world.assert_status(201)?;
        ctx.world.assert_schema(&catalog::USER)?;
        let user: User = ctx.world.response_as()?;
        ensure(user.email == dto.email, || format!("email {} != {}", user.email, dto.email))
    })
}

fn get_user(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = seed_user(ctx).await?;

        let result = ctx.api.users.get_user(&user.id).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::USER)?;
        Ok(())
    })
}

fn list_users(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = seed_user(ctx).await?;

        let result = ctx.api.users.list_users().await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::USER_LIST)?;
        let users: Vec<User> = ctx.world.response_as()?;
        ensure(users.iter().any(|u| u.id == user.id), || format!("user {} not listed", user.id))
    })
}

fn update_user(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = seed_user(ctx).await?;
        let update = UpdateUser {
            first_name: Some("Renamed".into()),
            ..Default::default()
        };

        let result = ctx.api.users.update_user(&user.id, &update).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        ctx.world.assert_schema(&catalog::USER)?;
        let updated: User = ctx.world.response_as()?;
        ensure(updated.first_name == "Renamed", || {
            format!("first name is still {}", updated.first_name)
        })?;
        ensure(updated.last_name == user.last_name, || "untouched field changed".into())
    })
}

fn delete_user(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = seed_user(ctx).await?;

        let result = ctx.api.users.delete_user(&user.id).await;
        ctx.record(&result);
        ctx.world.assert_success()?;
        ctx.registry.remove(EntityKind::User, &user.id);

        let result = ctx.api.users.get_user(&user.id).await;
        ctx.record(&result);
        ctx.world.assert_not_found()?;
        Ok(())
    })
}

fn reject_invalid_email(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let mut body = serde_json::to_value(fixtures::user_dto())?;
        body["email"] = "not-an-email".into();
        ensure(!catalog::CREATE_USER.is_valid(&body), || "payload unexpectedly valid".into())?;

        let result = ctx.api.users.create_user_raw(&body).await;
        ctx.track(EntityKind::User, &result);
        ctx.world.assert_validation_error()?;
        Ok(())
    })
}

fn find_by_email(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = seed_user(ctx).await?;

        let result = ctx.api.users.find_user_by_email(&user.email).await;
        ctx.record(&result);

        ctx.world.assert_status(200)?;
        let found: User = ctx.world.response_as()?;
        ensure(found.id == user.id, || format!("found {} instead of {}", found.id, user.id))
    })
}

fn unknown_user(ctx: &mut ScenarioContext) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let result = ctx.api.users.get_user(&unknown_id()).await;
        ctx.record(&result);
        ctx.world.assert_not_found()?;
        Ok(())
    })
}

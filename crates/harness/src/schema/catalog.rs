//! Schemas for every entity, DTO and list the API exchanges
//!
//! Built once on first use. Entity schemas describe what the backend must
//! return; DTO schemas describe what it must accept.

use once_cell::sync::Lazy;

use super::{Format, Schema, Validator};
use crate::registry::EntityKind;

fn id() -> Schema {
    Schema::string().min_length(1)
}

fn timestamp() -> Schema {
    Schema::string().format(Format::DateTime)
}

fn price() -> Schema {
    Schema::number().minimum(0.0)
}

fn quantity() -> Schema {
    Schema::number().minimum(1.0)
}

fn address() -> Schema {
    Schema::object()
        .required("street", Schema::string())
        .required("city", Schema::string())
        .required("state", Schema::string())
        .required("zipCode", Schema::string())
        .required("country", Schema::string())
}

fn with_timestamps(schema: Schema) -> Schema {
    schema
        .required("id", id())
        .required("createdAt", timestamp())
        .required("updatedAt", timestamp())
}

// ============================================================================
// Products
// ============================================================================

pub static CREATE_PRODUCT: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "CreateProduct",
        Schema::object()
            .required("name", Schema::string().min_length(2))
            .required("description", Schema::string())
            .required("price", price())
            .required("categoryId", id())
            .required("stock", Schema::number().minimum(0.0))
            .optional("imageUrl", Schema::string().nullable())
            .optional("isActive", Schema::boolean()),
    )
});

pub static UPDATE_PRODUCT: Lazy<Validator> =
    Lazy::new(|| Validator::new("UpdateProduct", CREATE_PRODUCT.schema().partial()));

pub static PRODUCT: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "Product",
        with_timestamps(CREATE_PRODUCT.schema().clone()).required("isActive", Schema::boolean()),
    )
});

pub static PRODUCT_LIST: Lazy<Validator> = Lazy::new(|| Validator::list_of("Product[]", &PRODUCT));

// ============================================================================
// Users
// ============================================================================

pub static CREATE_USER: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "CreateUser",
        Schema::object()
            .required("email", Schema::string().format(Format::Email))
            .required("firstName", Schema::string().min_length(1))
            .required("lastName", Schema::string().min_length(1))
            .optional("phone", Schema::string().nullable())
            .required("address", address()),
    )
});

pub static UPDATE_USER: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "UpdateUser",
        CREATE_USER.schema().partial().optional("isActive", Schema::boolean()),
    )
});

pub static USER: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "User",
        with_timestamps(CREATE_USER.schema().clone()).required("isActive", Schema::boolean()),
    )
});

pub static USER_LIST: Lazy<Validator> = Lazy::new(|| Validator::list_of("User[]", &USER));

// ============================================================================
// Orders
// ============================================================================

fn order_item() -> Schema {
    Schema::object()
        .required("productId", id())
        .required("productName", Schema::string())
        .required("quantity", quantity())
        .required("price", price())
}

fn order_status() -> Schema {
    Schema::one_of(&["pending", "confirmed", "processing", "shipped", "delivered", "cancelled"])
}

pub static CREATE_ORDER: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "CreateOrder",
        Schema::object()
            .required("userId", id())
            .required("items", Schema::array(order_item()).min_items(1))
            .required("shippingAddress", address()),
    )
});

pub static UPDATE_ORDER: Lazy<Validator> =
    Lazy::new(|| Validator::new("UpdateOrder", Schema::object().optional("status", order_status())));

pub static ORDER: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "Order",
        with_timestamps(CREATE_ORDER.schema().clone())
            .required("status", order_status())
            .required("totalAmount", price()),
    )
});

pub static ORDER_LIST: Lazy<Validator> = Lazy::new(|| Validator::list_of("Order[]", &ORDER));

// ============================================================================
// Categories
// ============================================================================

pub static CREATE_CATEGORY: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "CreateCategory",
        Schema::object()
            .required("name", Schema::string().min_length(2))
            .required("description", Schema::string())
            .optional("parentId", id().nullable())
            .optional("isActive", Schema::boolean()),
    )
});

pub static UPDATE_CATEGORY: Lazy<Validator> =
    Lazy::new(|| Validator::new("UpdateCategory", CREATE_CATEGORY.schema().partial()));

/// Category without `children`; children are one level deep
fn category_node() -> Schema {
    with_timestamps(CREATE_CATEGORY.schema().clone()).required("isActive", Schema::boolean())
}

pub static CATEGORY: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "Category",
        category_node().optional("children", Schema::array(category_node())),
    )
});

pub static CATEGORY_LIST: Lazy<Validator> = Lazy::new(|| Validator::list_of("Category[]", &CATEGORY));

// ============================================================================
// Cart
// ============================================================================

pub static CART_ITEM: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "CartItem",
        Schema::object()
            .required("productId", id())
            .required("productName", Schema::string())
            .required("price", price())
            .required("quantity", quantity())
            .required("total", price()),
    )
});

pub static CART: Lazy<Validator> = Lazy::new(|| {
    Validator::new(
        "Cart",
        with_timestamps(Schema::object())
            .required("userId", id())
            .required("items", Schema::array(CART_ITEM.schema().clone()))
            .required("totalAmount", price())
            .required("itemCount", Schema::number().minimum(0.0)),
    )
});

pub static ADD_ITEM: Lazy<Validator> = Lazy::new(|| {
    Validator::new("AddItem", CART_ITEM.schema().without(&["total"]))
});

pub static UPDATE_ITEM: Lazy<Validator> =
    Lazy::new(|| Validator::new("UpdateItem", Schema::object().required("quantity", quantity())));

/// Entity schema for a tracked resource type
pub fn entity(kind: EntityKind) -> &'static Validator {
    match kind {
        EntityKind::Cart => &CART,
        EntityKind::Order => &ORDER,
        EntityKind::Product => &PRODUCT,
        EntityKind::User => &USER,
        EntityKind::Category => &CATEGORY,
    }
}

/// Look a validator up by its name, e.g. `"Order"` or `"Product[]"`.
pub fn by_name(name: &str) -> Option<&'static Validator> {
    let all: [&'static Validator; 20] = [
        &PRODUCT,
        &PRODUCT_LIST,
        &CREATE_PRODUCT,
        &UPDATE_PRODUCT,
        &USER,
        &USER_LIST,
        &CREATE_USER,
        &UPDATE_USER,
        &ORDER,
        &ORDER_LIST,
        &CREATE_ORDER,
        &UPDATE_ORDER,
        &CATEGORY,
        &CATEGORY_LIST,
        &CREATE_CATEGORY,
        &UPDATE_CATEGORY,
        &CART,
        &CART_ITEM,
        &ADD_ITEM,
        &UPDATE_ITEM,
    ];
    all.into_iter().find(|v| v.name() == name)
}

//! Minimal, schema-conforming DTOs
//!
//! Names and emails carry a short random suffix so repeated runs against a
//! shared backend never collide. Nothing here tries to be realistic.

use uuid::Uuid;

use crate::types::{
    AddItem, Address, CreateCategory, CreateOrder, CreateProduct, CreateUser, OrderItem, Product,
};

fn suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub fn address() -> Address {
    Address {
        street: "221B Baker Street".into(),
        city: "London".into(),
        state: "Greater London".into(),
        zip_code: "NW1 6XE".into(),
        country: "UK".into(),
    }
}

pub fn category_dto() -> CreateCategory {
    CreateCategory {
        name: format!("Category {}", suffix()),
        description: "Created by shopcheck".into(),
        parent_id: None,
        is_active: Some(true),
    }
}

pub fn child_category_dto(parent_id: &str) -> CreateCategory {
    CreateCategory {
        parent_id: Some(parent_id.to_string()),
        ..category_dto()
    }
}

pub fn product_dto(category_id: &str) -> CreateProduct {
    CreateProduct {
        name: format!("Product {}", suffix()),
        description: "Created by shopcheck".into(),
        price: 19.99,
        category_id: category_id.to_string(),
        stock: 100,
        image_url: None,
        is_active: Some(true),
    }
}

pub fn user_dto() -> CreateUser {
    CreateUser {
        email: format!("shopcheck.{}@example.com", suffix()),
        first_name: "Test".into(),
        last_name: "User".into(),
        phone: Some("+44 20 7946 0000".into()),
        address: address(),
    }
}

pub fn order_item(product: &Product, quantity: i64) -> OrderItem {
    OrderItem {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity,
        price: product.price,
    }
}

pub fn order_dto(user_id: &str, items: Vec<OrderItem>) -> CreateOrder {
    CreateOrder {
        user_id: user_id.to_string(),
        items,
        shipping_address: address(),
    }
}

pub fn add_item_dto(product: &Product, quantity: i64) -> AddItem {
    AddItem {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        price: product.price,
        quantity,
    }
}

/// Cart line for a product that need not exist
pub fn add_item_with(price: f64, quantity: i64) -> AddItem {
    let id = suffix();
    AddItem {
        product_id: format!("product-{}", id),
        product_name: format!("Item {}", id),
        price,
        quantity,
    }
}

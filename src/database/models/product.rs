use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::database::grouping::JoinedRow;
use crate::filter::Join;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub product_id: i32,
    pub category_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct ProductImage {
    pub image_id: i32,
    pub product_id: i32,
    pub url: String,
    pub public_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductWithImages {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
}

/// `products LEFT JOIN product_images`; image columns are all NULL for a
/// product without images.
#[derive(Debug, FromRow)]
pub struct ProductImageRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub image_id: Option<i32>,
    pub image_url: Option<String>,
    pub image_public_id: Option<String>,
    pub image_created_at: Option<NaiveDateTime>,
}

pub const PRODUCT_IMAGES_JOIN: Join = Join {
    table: "product_images",
    alias: "i",
    foreign_key: "product_id",
    primary_key: "image_id",
    columns: &[
        ("image_id", "image_id"),
        ("url", "image_url"),
        ("public_id", "image_public_id"),
        ("created_at", "image_created_at"),
    ],
};

impl JoinedRow for ProductImageRow {
    type Parent = Product;
    type Child = ProductImage;

    fn parent_id(&self) -> i32 {
        self.product.product_id
    }

    fn into_parts(self) -> (Product, Option<ProductImage>) {
        let product_id = self.product.product_id;
        let image = match (self.image_id, self.image_url, self.image_public_id, self.image_created_at) {
            (Some(image_id), Some(url), Some(public_id), Some(created_at)) => Some(ProductImage {
                image_id,
                product_id,
                url,
                public_id,
                created_at,
            }),
            _ => None,
        };
        (self.product, image)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub name: Option<String>,
    pub category_id: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct NewProduct {
    #[validate(range(min = 1))]
    pub category_id: i32,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom = "super::non_negative")]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
}

/// Absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateProduct {
    #[validate(range(min = 1))]
    pub category_id: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom = "super::non_negative")]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn product() -> Product {
        Product {
            product_id: 7,
            category_id: 3,
            name: "Desk Lamp".into(),
            description: None,
            price: Decimal::new(2499, 2),
            stock_quantity: 12,
            is_active: true,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn null_image_columns_yield_no_child() {
        let row = ProductImageRow {
            product: product(),
            image_id: None,
            image_url: None,
            image_public_id: None,
            image_created_at: None,
        };
        let (parent, child) = row.into_parts();
        assert_eq!(parent.product_id, 7);
        assert!(child.is_none());
    }

    #[test]
    fn serializes_nulls_and_empty_image_list() {
        let body = serde_json::to_value(ProductWithImages { product: product(), images: vec![] }).unwrap();
        assert_eq!(body["ProductId"], json!(7));
        assert_eq!(body["Description"], json!(null));
        assert_eq!(body["Images"], json!([]));
        assert_eq!(body["Price"], json!("24.99"));
    }

    #[test]
    fn rejects_negative_price() {
        let input = NewProduct {
            category_id: 3,
            name: "Lamp".into(),
            description: None,
            price: Decimal::new(-100, 2),
            stock_quantity: 1,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }
}

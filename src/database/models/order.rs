use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use validator::Validate;

use crate::database::grouping::JoinedRow;
use crate::filter::Join;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Orders can only be cancelled before they leave the warehouse
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Processing" => Ok(OrderStatus::Processing),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    pub order_id: i32,
    pub customer_id: i32,
    pub employee_id: Option<i32>,
    pub order_date: NaiveDateTime,
    pub shipped_date: Option<NaiveDateTime>,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub total_amount: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItem {
    pub order_item_id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// `orders LEFT JOIN order_items`
#[derive(Debug, FromRow)]
pub struct OrderItemRow {
    #[sqlx(flatten)]
    pub order: Order,
    pub item_id: Option<i32>,
    pub item_product_id: Option<i32>,
    pub item_quantity: Option<i32>,
    pub item_unit_price: Option<Decimal>,
}

pub const ORDER_ITEMS_JOIN: Join = Join {
    table: "order_items",
    alias: "oi",
    foreign_key: "order_id",
    primary_key: "order_item_id",
    columns: &[
        ("order_item_id", "item_id"),
        ("product_id", "item_product_id"),
        ("quantity", "item_quantity"),
        ("unit_price", "item_unit_price"),
    ],
};

impl JoinedRow for OrderItemRow {
    type Parent = Order;
    type Child = OrderItem;

    fn parent_id(&self) -> i32 {
        self.order.order_id
    }

    fn into_parts(self) -> (Order, Option<OrderItem>) {
        let order_id = self.order.order_id;
        let item = match (self.item_id, self.item_product_id, self.item_quantity, self.item_unit_price) {
            (Some(order_item_id), Some(product_id), Some(quantity), Some(unit_price)) => Some(OrderItem {
                order_item_id,
                order_id,
                product_id,
                quantity,
                unit_price,
            }),
            _ => None,
        };
        (self.order, item)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub customer_id: Option<i32>,
    pub employee_id: Option<i32>,
    pub status: Option<OrderStatus>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "super::deserialize_opt_datetime")]
    pub order_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "super::deserialize_opt_datetime")]
    pub shipped_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct NewOrder {
    /// Ignored for customers, who always order for themselves
    #[validate(range(min = 1))]
    pub customer_id: Option<i32>,
    #[validate(range(min = 1))]
    pub employee_id: Option<i32>,
    #[validate(length(max = 500))]
    pub shipping_address: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct NewOrderItem {
    #[validate(range(min = 1))]
    pub product_id: i32,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
    /// Defaults to now when moving to `Shipped`
    #[serde(default, deserialize_with = "super::deserialize_opt_datetime")]
    pub shipped_date: Option<NaiveDateTime>,
    #[validate(range(min = 1))]
    pub employee_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn order() -> Order {
        Order {
            order_id: 11,
            customer_id: 4,
            employee_id: None,
            order_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap(),
            shipped_date: None,
            status: OrderStatus::Pending,
            shipping_address: None,
            total_amount: Decimal::new(5000, 2),
            is_active: true,
        }
    }

    #[test]
    fn item_columns_fold_into_an_item() {
        let row = OrderItemRow {
            order: order(),
            item_id: Some(3),
            item_product_id: Some(9),
            item_quantity: Some(2),
            item_unit_price: Some(Decimal::new(2500, 2)),
        };
        let (parent, item) = row.into_parts();
        let item = item.unwrap();
        assert_eq!(item.order_id, parent.order_id);
        assert_eq!(item.product_id, 9);
    }

    #[test]
    fn optional_columns_serialize_as_null() {
        let body = serde_json::to_value(OrderWithItems { order: order(), items: vec![] }).unwrap();
        assert_eq!(body["ShippingAddress"], json!(null));
        assert_eq!(body["EmployeeId"], json!(null));
        assert_eq!(body["Status"], json!("Pending"));
        assert_eq!(body["Items"], json!([]));
    }

    #[test]
    fn only_early_statuses_can_be_cancelled() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!("Refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn empty_orders_fail_validation() {
        let input = NewOrder { customer_id: None, employee_id: None, shipping_address: None, items: vec![] };
        assert!(input.validate().unwrap_err().field_errors().contains_key("items"));
    }

    #[test]
    fn oversized_orders_fail_validation() {
        let item = NewOrderItem { product_id: 1, quantity: 1 };
        let input = NewOrder { customer_id: None, employee_id: None, shipping_address: None, items: vec![item; 101] };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));

        let item = NewOrderItem { product_id: 3, quantity: 2 };
        let input = NewOrder { items: vec![item], ..input };
        assert!(input.validate().is_ok());
    }
}

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use super::not_found;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    NewOrder, NewOrderItem, Order, OrderFilter, OrderItemRow, OrderStatus, OrderWithItems, UpdateOrderStatus,
    ORDER_ITEMS_JOIN,
};
use crate::database::query_builder;
use crate::filter::{Filter, FilterError, Page, PageRequest};

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn filter(criteria: &OrderFilter) -> Result<Filter, FilterError> {
        let mut filter = Filter::new("orders", "o")?.primary_key("order_id")?;
        filter
            .eq("customer_id", criteria.customer_id)?
            .eq("employee_id", criteria.employee_id)?
            .eq("status", criteria.status.map(|s| s.as_str()))?
            .eq("is_active", criteria.is_active)?
            .on_date("order_date", criteria.order_date)?
            .on_date("shipped_date", criteria.shipped_date)?;
        Ok(filter)
    }

    pub async fn list(&self, criteria: &OrderFilter, page: &PageRequest) -> Result<Page<OrderWithItems>, DatabaseError> {
        let filter = Self::filter(criteria)?;
        let page =
            query_builder::fetch_page_grouped::<OrderItemRow>(&self.pool, &filter, page, &ORDER_ITEMS_JOIN).await?;
        Ok(page.map(|(order, items)| OrderWithItems { order, items }))
    }

    pub async fn find(&self, id: i32) -> Result<OrderWithItems, DatabaseError> {
        let mut filter = Filter::new("orders", "o")?.primary_key("order_id")?;
        filter.eq("order_id", Some(id))?;
        query_builder::fetch_grouped::<OrderItemRow>(&self.pool, &filter, &ORDER_ITEMS_JOIN)
            .await?
            .into_iter()
            .next()
            .map(|(order, items)| OrderWithItems { order, items })
            .ok_or_else(|| not_found("Order", id))
    }

    /// Places an order in one transaction.
    ///
    /// Every line is priced from the product row at the time of ordering and
    /// takes its quantity out of stock; the order total is the sum of its
    /// lines. An unknown or inactive product, or too little stock, rolls the
    /// whole order back.
    pub async fn create(&self, customer_id: i32, input: &NewOrder) -> Result<OrderWithItems, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i32 = sqlx::query_scalar(
            "INSERT INTO orders (customer_id, employee_id, shipping_address) VALUES ($1, $2, $3) RETURNING order_id",
        )
        .bind(customer_id)
        .bind(input.employee_id)
        .bind(&input.shipping_address)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            let unit_price = Self::reserve_stock(&mut tx, item).await?;
            sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
                .bind(order_id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(unit_price)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE orders SET total_amount = \
                (SELECT COALESCE(SUM(quantity * unit_price), 0) FROM order_items WHERE order_id = $1) \
             WHERE order_id = $1",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Created order {} for customer {}", order_id, customer_id);
        self.find(order_id).await
    }

    /// Decrements stock and returns the current unit price
    async fn reserve_stock(tx: &mut Transaction<'_, Postgres>, item: &NewOrderItem) -> Result<Decimal, DatabaseError> {
        let price: Option<Decimal> = sqlx::query_scalar(
            "UPDATE products SET stock_quantity = stock_quantity - $2 \
             WHERE product_id = $1 AND is_active AND stock_quantity >= $2 RETURNING price",
        )
        .bind(item.product_id)
        .bind(item.quantity)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(price) = price {
            return Ok(price);
        }

        let available: Option<bool> = sqlx::query_scalar("SELECT is_active FROM products WHERE product_id = $1")
            .bind(item.product_id)
            .fetch_optional(&mut **tx)
            .await?;
        match available {
            Some(true) => Err(DatabaseError::Conflict(format!(
                "Insufficient stock for product {}",
                item.product_id
            ))),
            _ => Err(DatabaseError::InvalidReference(format!(
                "Product {} is not available",
                item.product_id
            ))),
        }
    }

    /// Moves an order along its lifecycle. `Cancelled` goes through
    /// [`OrderRepository::cancel`] so stock is returned; a cancelled order
    /// cannot change status again.
    pub async fn update_status(&self, id: i32, input: &UpdateOrderStatus) -> Result<OrderWithItems, DatabaseError> {
        if input.status == OrderStatus::Cancelled {
            return self.cancel(id).await;
        }

        let updated = sqlx::query(
            "UPDATE orders SET \
                status = $2, \
                shipped_date = CASE WHEN $2 = 'Shipped' THEN COALESCE($3, shipped_date, LOCALTIMESTAMP) \
                                    ELSE COALESCE($3, shipped_date) END, \
                employee_id = COALESCE($4, employee_id) \
             WHERE order_id = $1 AND status <> 'Cancelled'",
        )
        .bind(id)
        .bind(input.status.as_str())
        .bind(input.shipped_date)
        .bind(input.employee_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            // Either missing or frozen
            self.find(id).await?;
            return Err(DatabaseError::Conflict(format!("Order {} is cancelled", id)));
        }
        self.find(id).await
    }

    /// Cancels a pending or processing order and puts its items back in stock
    pub async fn cancel(&self, id: i32) -> Result<OrderWithItems, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Order", id))?;

        if !order.status.is_cancellable() {
            return Err(DatabaseError::Conflict(format!(
                "Order {} is {} and can no longer be cancelled",
                id, order.status
            )));
        }

        sqlx::query(
            "UPDATE products p SET stock_quantity = p.stock_quantity + oi.quantity \
             FROM (SELECT product_id, SUM(quantity) AS quantity FROM order_items \
                   WHERE order_id = $1 GROUP BY product_id) oi \
             WHERE p.product_id = oi.product_id",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET status = 'Cancelled', is_active = FALSE WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Cancelled order {}", id);
        self.find(id).await
    }
}

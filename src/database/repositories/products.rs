use sqlx::PgPool;

use super::not_found;
use crate::database::manager::DatabaseError;
use crate::database::models::{
    NewProduct, Product, ProductFilter, ProductImage, ProductImageRow, ProductWithImages, UpdateProduct,
    PRODUCT_IMAGES_JOIN,
};
use crate::database::query_builder;
use crate::filter::{Filter, FilterError, Page, PageRequest};
use crate::images::UploadedImage;

pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn filter(criteria: &ProductFilter) -> Result<Filter, FilterError> {
        let mut filter = Filter::new("products", "p")?.primary_key("product_id")?;
        filter
            .ilike("name", criteria.name.as_deref())?
            .eq("category_id", criteria.category_id)?
            .eq("is_active", criteria.is_active)?;
        Ok(filter)
    }

    /// Products of the requested page, each with all of its images
    pub async fn list(
        &self,
        criteria: &ProductFilter,
        page: &PageRequest,
    ) -> Result<Page<ProductWithImages>, DatabaseError> {
        let filter = Self::filter(criteria)?;
        let page = query_builder::fetch_page_grouped::<ProductImageRow>(&self.pool, &filter, page, &PRODUCT_IMAGES_JOIN)
            .await?;
        Ok(page.map(|(product, images)| ProductWithImages { product, images }))
    }

    pub async fn find(&self, id: i32) -> Result<ProductWithImages, DatabaseError> {
        let mut filter = Filter::new("products", "p")?.primary_key("product_id")?;
        filter.eq("product_id", Some(id))?;
        query_builder::fetch_grouped::<ProductImageRow>(&self.pool, &filter, &PRODUCT_IMAGES_JOIN)
            .await?
            .into_iter()
            .next()
            .map(|(product, images)| ProductWithImages { product, images })
            .ok_or_else(|| not_found("Product", id))
    }

    pub async fn create(&self, input: &NewProduct) -> Result<ProductWithImages, DatabaseError> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (category_id, name, description, price, stock_quantity) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock_quantity)
        .fetch_one(&self.pool)
        .await?;
        Ok(ProductWithImages { product, images: Vec::new() })
    }

    pub async fn update(&self, id: i32, input: &UpdateProduct) -> Result<ProductWithImages, DatabaseError> {
        let updated = sqlx::query(
            "UPDATE products SET \
                category_id = COALESCE($2, category_id), \
                name = COALESCE($3, name), \
                description = COALESCE($4, description), \
                price = COALESCE($5, price), \
                stock_quantity = COALESCE($6, stock_quantity), \
                is_active = COALESCE($7, is_active) \
             WHERE product_id = $1",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(input.is_active)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(not_found("Product", id));
        }
        self.find(id).await
    }

    pub async fn deactivate(&self, id: i32) -> Result<(), DatabaseError> {
        super::deactivate(&self.pool, "products", "product_id", id, "Product").await
    }

    pub async fn exists(&self, id: i32) -> Result<bool, DatabaseError> {
        let found: Option<i32> = sqlx::query_scalar("SELECT product_id FROM products WHERE product_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn add_image(&self, product_id: i32, image: &UploadedImage) -> Result<ProductImage, DatabaseError> {
        let image = sqlx::query_as::<_, ProductImage>(
            "INSERT INTO product_images (product_id, url, public_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(product_id)
        .bind(&image.url)
        .bind(&image.public_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    /// Deletes the image row and returns it, so the caller can release the
    /// hosted asset by its public id.
    pub async fn remove_image(&self, product_id: i32, image_id: i32) -> Result<ProductImage, DatabaseError> {
        sqlx::query_as::<_, ProductImage>(
            "DELETE FROM product_images WHERE image_id = $1 AND product_id = $2 RETURNING *",
        )
        .bind(image_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Image {} not found on product {}", image_id, product_id)))
    }
}

use std::sync::Arc;

use sqlx::PgPool;

use super::{positive_id, ServiceError, ServiceResult};
use crate::database::models::ProductImage;
use crate::database::{DatabaseError, ProductRepository};
use crate::images::{check_content_type, ImageError, ImageHost};

/// Keeps product image rows and hosted assets in step.
///
/// Upload goes to the host first, then the row is written; if the row
/// insert fails the fresh asset is destroyed again. Removal deletes the row
/// first and then the asset, so a failed destroy leaves an orphaned asset
/// on the host but never a row pointing at nothing.
pub struct ImageService {
    products: ProductRepository,
    host: Option<Arc<dyn ImageHost>>,
}

impl ImageService {
    pub fn new(pool: PgPool, host: Option<Arc<dyn ImageHost>>) -> Self {
        Self { products: ProductRepository::new(pool), host }
    }

    fn host(&self) -> Result<&Arc<dyn ImageHost>, ImageError> {
        self.host.as_ref().ok_or(ImageError::NotConfigured)
    }

    pub async fn upload(
        &self,
        product_id: i32,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> ServiceResult<ProductImage> {
        let product_id = positive_id("id", product_id)?;
        let content_type = check_content_type(content_type)?;
        if bytes.is_empty() {
            return Err(ImageError::Empty.into());
        }
        let host = self.host()?;

        if !self.products.exists(product_id).await? {
            return Err(DatabaseError::NotFound(format!("Product {} not found", product_id)).into());
        }

        let uploaded = host.upload(bytes, file_name, content_type).await?;

        match self.products.add_image(product_id, &uploaded).await {
            Ok(image) => Ok(image),
            Err(err) => {
                tracing::warn!(
                    "Storing image {} for product {} failed, destroying upload",
                    uploaded.public_id,
                    product_id
                );
                if let Err(destroy_err) = host.destroy(&uploaded.public_id).await {
                    tracing::error!("Could not destroy orphaned image {}: {}", uploaded.public_id, destroy_err);
                }
                Err(ServiceError::Database(err))
            }
        }
    }

    pub async fn remove(&self, product_id: i32, image_id: i32) -> ServiceResult<ProductImage> {
        let product_id = positive_id("id", product_id)?;
        let image_id = positive_id("imageId", image_id)?;
        let host = self.host()?;

        let removed = self.products.remove_image(product_id, image_id).await?;
        if let Err(err) = host.destroy(&removed.public_id).await {
            tracing::error!("Image row {} removed but hosted asset {} was not: {}", image_id, removed.public_id, err);
        }
        Ok(removed)
    }
}

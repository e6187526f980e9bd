//! Product Repository

use shared::models::{Product, ProductCreate, ProductUpdate};
use sqlx::SqlitePool;

use super::{BaseRepository, RepoError, RepoResult};

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseRepository::new(pool),
        }
    }

    /// Find all available products (the public catalog)
    pub async fn find_available(&self) -> RepoResult<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE available = 1 ORDER BY id")
                .fetch_all(self.base.pool())
                .await?;
        Ok(products)
    }

    /// Find a provider's own listings, including unavailable ones
    pub async fn find_by_provider(&self, provider_id: i64) -> RepoResult<Vec<Product>> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE provider_id = ? ORDER BY id")
                .bind(provider_id)
                .fetch_all(self.base.pool())
                .await?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?;
        Ok(product)
    }

    /// Create a new listing owned by `provider_id`
    ///
    /// `provider_name` is the vendor display name shown in the catalog.
    pub async fn create(
        &self,
        provider_id: i64,
        provider_name: &str,
        data: ProductCreate,
    ) -> RepoResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, description, price, provider_id, provider, image, available) \
             VALUES (?, ?, ?, ?, ?, ?, 1) RETURNING *",
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.price)
        .bind(provider_id)
        .bind(provider_name)
        .bind(data.image)
        .fetch_one(self.base.pool())
        .await?;
        Ok(product)
    }

    /// Update a listing
    ///
    /// Builds the SET clause dynamically from the fields that are present.
    /// Ownership is checked by the caller before this is invoked.
    pub async fn update(&self, id: i64, data: ProductUpdate) -> RepoResult<Product> {
        if data.is_empty() {
            // No fields to update
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")));
        }

        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = ?");
        }
        if data.description.is_some() {
            set_parts.push("description = ?");
        }
        if data.price.is_some() {
            set_parts.push("price = ?");
        }
        if data.image.is_some() {
            set_parts.push("image = ?");
        }
        if data.available.is_some() {
            set_parts.push("available = ?");
        }

        let query_str = format!(
            "UPDATE products SET {} WHERE id = ? RETURNING *",
            set_parts.join(", ")
        );

        let mut query = sqlx::query_as::<_, Product>(&query_str);
        if let Some(v) = data.name {
            query = query.bind(v);
        }
        if let Some(v) = data.description {
            query = query.bind(v);
        }
        if let Some(v) = data.price {
            query = query.bind(v);
        }
        if let Some(v) = data.image {
            query = query.bind(v);
        }
        if let Some(v) = data.available {
            query = query.bind(v);
        }

        let updated = query
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;
        Ok(updated)
    }

    /// Hard delete a listing
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.base.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::AccountRepository;
    use shared::models::Role;

    async fn seeded_repo() -> (ProductRepository, i64, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("products.db");
        let db = DbService::new(path.to_str().unwrap()).await.expect("db init");

        let accounts = AccountRepository::new(db.pool.clone());
        let vendor = accounts
            .create(
                Some("Pizza Palace".into()),
                "palace@campus.edu",
                "hash",
                Role::Provider,
            )
            .await
            .unwrap();

        (ProductRepository::new(db.pool), vendor.id, dir)
    }

    fn margherita() -> ProductCreate {
        ProductCreate {
            name: "Pizza Margherita".into(),
            description: Some("Fresh tomato sauce, mozzarella, basil".into()),
            price: 5.99,
            image: None,
        }
    }

    #[tokio::test]
    async fn create_lists_in_catalog() {
        let (repo, vendor_id, _dir) = seeded_repo().await;
        let created = repo
            .create(vendor_id, "Pizza Palace", margherita())
            .await
            .unwrap();
        assert!(created.available);
        assert_eq!(created.provider, "Pizza Palace");

        let catalog = repo.find_available().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].id, created.id);
    }

    #[tokio::test]
    async fn partial_update_touches_only_given_fields() {
        let (repo, vendor_id, _dir) = seeded_repo().await;
        let created = repo
            .create(vendor_id, "Pizza Palace", margherita())
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                ProductUpdate {
                    price: Some(6.49),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 6.49);
        assert_eq!(updated.name, "Pizza Margherita");
        assert_eq!(updated.description, created.description);

        // Empty update is a no-op read-back
        let unchanged = repo.update(created.id, ProductUpdate::default()).await.unwrap();
        assert_eq!(unchanged.price, 6.49);
    }

    #[tokio::test]
    async fn unavailable_products_leave_the_catalog() {
        let (repo, vendor_id, _dir) = seeded_repo().await;
        let created = repo
            .create(vendor_id, "Pizza Palace", margherita())
            .await
            .unwrap();

        repo.update(
            created.id,
            ProductUpdate {
                available: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(repo.find_available().await.unwrap().is_empty());
        // Still visible to its owner
        assert_eq!(repo.find_by_provider(vendor_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_product_is_not_found() {
        let (repo, _vendor_id, _dir) = seeded_repo().await;
        let err = repo.delete(999).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}

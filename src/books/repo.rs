use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Listing, ListingFields, ListingSellerRow, ListingWithSeller};

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Unsold listings, newest first.
    async fn list_unsold(&self) -> anyhow::Result<Vec<ListingWithSeller>>;
    async fn get_with_seller(&self, id: Uuid) -> anyhow::Result<Option<ListingWithSeller>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Listing>>;
    async fn insert(&self, owner_id: Uuid, fields: &ListingFields) -> anyhow::Result<Listing>;
    /// Replaces the editable fields. `sold: None` keeps the stored flag.
    /// Returns `None` if the row is gone.
    async fn update(
        &self,
        id: Uuid,
        fields: &ListingFields,
        sold: Option<bool>,
    ) -> anyhow::Result<Option<Listing>>;
    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgBookStore {
    db: PgPool,
}

impl PgBookStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const LISTING_COLUMNS: &str =
    "id, owner_id, title, author, description, price, sold, created_at, updated_at";

#[async_trait]
impl BookStore for PgBookStore {
    async fn list_unsold(&self) -> anyhow::Result<Vec<ListingWithSeller>> {
        let rows = sqlx::query_as::<_, ListingSellerRow>(
            r#"
            SELECT b.id, b.owner_id, b.title, b.author, b.description, b.price, b.sold,
                   b.created_at, b.updated_at, u.email AS seller_email
              FROM books b
              JOIN users u ON u.id = b.owner_id
             WHERE b.sold = FALSE
             ORDER BY b.created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list unsold books")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_with_seller(&self, id: Uuid) -> anyhow::Result<Option<ListingWithSeller>> {
        let row = sqlx::query_as::<_, ListingSellerRow>(
            r#"
            SELECT b.id, b.owner_id, b.title, b.author, b.description, b.price, b.sold,
                   b.created_at, b.updated_at, u.email AS seller_email
              FROM books b
              JOIN users u ON u.id = b.owner_id
             WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get book with seller")?;
        Ok(row.map(Into::into))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Listing>> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM books WHERE id = $1");
        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find book")?;
        Ok(listing)
    }

    async fn insert(&self, owner_id: Uuid, fields: &ListingFields) -> anyhow::Result<Listing> {
        let sql = format!(
            r#"
            INSERT INTO books (owner_id, title, author, description, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LISTING_COLUMNS}
            "#
        );
        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(owner_id)
            .bind(&fields.title)
            .bind(&fields.author)
            .bind(&fields.description)
            .bind(fields.price)
            .fetch_one(&self.db)
            .await
            .context("insert book")?;
        Ok(listing)
    }

    async fn update(
        &self,
        id: Uuid,
        fields: &ListingFields,
        sold: Option<bool>,
    ) -> anyhow::Result<Option<Listing>> {
        let sql = format!(
            r#"
            UPDATE books
               SET title = $2, author = $3, description = $4, price = $5,
                   sold = COALESCE($6, sold), updated_at = now()
             WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );
        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .bind(&fields.title)
            .bind(&fields.author)
            .bind(&fields.description)
            .bind(fields.price)
            .bind(sold)
            .fetch_optional(&self.db)
            .await
            .context("update book")?;
        Ok(listing)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete book")?;
        Ok(res.rows_affected() > 0)
    }
}

//! In-process stores with the same semantics as the Postgres ones.
//! Used by tests and by [`AppState::in_memory`](crate::state::AppState::in_memory).

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{repo::UserStore, repo_types::User},
    books::{
        repo::BookStore,
        repo_types::{Listing, ListingFields, ListingWithSeller, Seller},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    // insertion order; listing reverses it to get newest first
    books: Vec<Listing>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))
    }
}

impl Tables {
    fn with_seller(&self, listing: &Listing) -> anyhow::Result<ListingWithSeller> {
        let seller = self
            .users
            .iter()
            .find(|u| u.id == listing.owner_id)
            .ok_or_else(|| anyhow::anyhow!("book {} has no owner row", listing.id))?;
        Ok(ListingWithSeller {
            listing: listing.clone(),
            seller: Seller {
                email: seller.email.clone(),
            },
        })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<Option<User>> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.push(user.clone());
        Ok(Some(user))
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list_unsold(&self) -> anyhow::Result<Vec<ListingWithSeller>> {
        let tables = self.lock()?;
        tables
            .books
            .iter()
            .rev()
            .filter(|b| !b.sold)
            .map(|b| tables.with_seller(b))
            .collect()
    }

    async fn get_with_seller(&self, id: Uuid) -> anyhow::Result<Option<ListingWithSeller>> {
        let tables = self.lock()?;
        tables
            .books
            .iter()
            .find(|b| b.id == id)
            .map(|b| tables.with_seller(b))
            .transpose()
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Listing>> {
        Ok(self.lock()?.books.iter().find(|b| b.id == id).cloned())
    }

    async fn insert(&self, owner_id: Uuid, fields: &ListingFields) -> anyhow::Result<Listing> {
        let mut tables = self.lock()?;
        anyhow::ensure!(
            tables.users.iter().any(|u| u.id == owner_id),
            "owner {owner_id} does not exist"
        );
        let now = OffsetDateTime::now_utc();
        let listing = Listing {
            id: Uuid::new_v4(),
            owner_id,
            title: fields.title.clone(),
            author: fields.author.clone(),
            description: fields.description.clone(),
            price: fields.price,
            sold: false,
            created_at: now,
            updated_at: now,
        };
        tables.books.push(listing.clone());
        Ok(listing)
    }

    async fn update(
        &self,
        id: Uuid,
        fields: &ListingFields,
        sold: Option<bool>,
    ) -> anyhow::Result<Option<Listing>> {
        let mut tables = self.lock()?;
        let Some(book) = tables.books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        book.title = fields.title.clone();
        book.author = fields.author.clone();
        book.description = fields.description.clone();
        book.price = fields.price;
        if let Some(sold) = sold {
            book.sold = sold;
        }
        book.updated_at = OffsetDateTime::now_utc();
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.lock()?;
        let before = tables.books.len();
        tables.books.retain(|b| b.id != id);
        Ok(tables.books.len() < before)
    }
}

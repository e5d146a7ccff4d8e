use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::ListingRequest,
    repo_types::{Listing, ListingWithSeller},
};
use crate::{auth::AuthUser, db::bounded, error::AppError, state::AppState};

fn not_found() -> AppError {
    AppError::NotFound("Book not found".into())
}

/// Path ids that do not parse cannot name a listing.
pub fn parse_listing_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

pub async fn list_listings(st: &AppState) -> Result<Vec<ListingWithSeller>, AppError> {
    bounded(st.config.db_timeout, st.books.list_unsold()).await
}

pub async fn get_listing(st: &AppState, id: Uuid) -> Result<ListingWithSeller, AppError> {
    bounded(st.config.db_timeout, st.books.get_with_seller(id))
        .await?
        .ok_or_else(not_found)
}

pub async fn create_listing(
    st: &AppState,
    caller: &AuthUser,
    req: ListingRequest,
) -> Result<Listing, AppError> {
    let (fields, _) = req.validate()?;
    let listing = bounded(st.config.db_timeout, st.books.insert(caller.id, &fields)).await?;
    info!(book_id = %listing.id, owner_id = %caller.id, "book listed");
    Ok(listing)
}

/// Loads the listing and checks that `caller` owns it.
async fn owned_listing(st: &AppState, caller: &AuthUser, id: Uuid) -> Result<Listing, AppError> {
    let listing = bounded(st.config.db_timeout, st.books.find(id))
        .await?
        .ok_or_else(not_found)?;
    if listing.owner_id != caller.id {
        warn!(book_id = %id, owner_id = %listing.owner_id, caller_id = %caller.id, "not the owner");
        return Err(AppError::Forbidden);
    }
    Ok(listing)
}

/// `req` arrives still undecoded: existence and ownership are settled before
/// the body is looked at, so a non-owner gets 403 whatever they sent.
pub async fn update_listing(
    st: &AppState,
    caller: &AuthUser,
    id: Uuid,
    req: Result<ListingRequest, AppError>,
) -> Result<Listing, AppError> {
    owned_listing(st, caller, id).await?;
    let (fields, sold) = req?.validate()?;
    let listing = bounded(st.config.db_timeout, st.books.update(id, &fields, sold))
        .await?
        .ok_or_else(not_found)?;
    info!(book_id = %id, sold = listing.sold, "book updated");
    Ok(listing)
}

pub async fn delete_listing(st: &AppState, caller: &AuthUser, id: Uuid) -> Result<(), AppError> {
    owned_listing(st, caller, id).await?;
    if !bounded(st.config.db_timeout, st.books.delete(id)).await? {
        return Err(not_found());
    }
    info!(book_id = %id, "book deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::repo_types::ListingFields;

    /// Listings join on users, so callers must exist in the store.
    async fn registered(st: &AppState) -> AuthUser {
        let email = format!("{}@x.com", Uuid::new_v4().simple());
        let user = st.users.create(&email, "hash").await.unwrap().unwrap();
        AuthUser {
            id: user.id,
            email: user.email,
        }
    }

    fn dune() -> ListingRequest {
        ListingRequest {
            title: Some("Dune".into()),
            author: Some("Herbert".into()),
            description: None,
            price: Some(9.99),
            sold: None,
        }
    }

    #[tokio::test]
    async fn create_sets_owner_to_caller() {
        let st = AppState::in_memory();
        let owner = registered(&st).await;
        let listing = create_listing(&st, &owner, dune()).await.unwrap();
        assert_eq!(listing.owner_id, owner.id);
        assert!(!listing.sold);
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let st = AppState::in_memory();
        let owner = registered(&st).await;
        let mut req = dune();
        req.price = Some(-3.0);
        let err = create_listing(&st, &owner, req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(list_listings(&st).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let st = AppState::in_memory();
        let owner = registered(&st).await;
        let other = registered(&st).await;
        let listing = create_listing(&st, &owner, dune()).await.unwrap();

        let err = update_listing(&st, &other, listing.id, Ok(dune())).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        let err = delete_listing(&st, &other, listing.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        assert_eq!(get_listing(&st, listing.id).await.unwrap().listing, listing);
    }

    #[tokio::test]
    async fn owner_update_replaces_fields() {
        let st = AppState::in_memory();
        let owner = registered(&st).await;
        let listing = create_listing(&st, &owner, dune()).await.unwrap();

        let req = ListingRequest {
            title: Some("Dune Messiah".into()),
            author: Some("Frank Herbert".into()),
            description: Some("Paperback".into()),
            price: Some(4.5),
            sold: None,
        };
        let updated = update_listing(&st, &owner, listing.id, Ok(req)).await.unwrap();
        assert_eq!(updated.id, listing.id);
        assert_eq!(updated.owner_id, owner.id);
        assert_eq!(
            ListingFields {
                title: updated.title.clone(),
                author: updated.author.clone(),
                description: updated.description.clone(),
                price: updated.price,
            },
            ListingFields {
                title: "Dune Messiah".into(),
                author: "Frank Herbert".into(),
                description: "Paperback".into(),
                price: 4.5,
            }
        );
    }

    #[tokio::test]
    async fn sold_listings_leave_the_browse_list() {
        let st = AppState::in_memory();
        let owner = registered(&st).await;
        let kept = create_listing(&st, &owner, dune()).await.unwrap();
        let sold = create_listing(&st, &owner, dune()).await.unwrap();

        let mut req = dune();
        req.sold = Some(true);
        update_listing(&st, &owner, sold.id, Ok(req)).await.unwrap();

        let listed = list_listings(&st).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].listing.id, kept.id);
        assert_eq!(listed[0].seller.email, owner.email);

        // An edit without `sold` keeps the stored flag.
        let again = update_listing(&st, &owner, sold.id, Ok(dune())).await.unwrap();
        assert!(again.sold);
    }

    #[tokio::test]
    async fn missing_listing_is_not_found() {
        let st = AppState::in_memory();
        let owner = registered(&st).await;
        let id = Uuid::new_v4();
        assert!(matches!(
            update_listing(&st, &owner, id, Ok(dune())).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            delete_listing(&st, &owner, id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(parse_listing_id("42").unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn owner_delete_is_hard() {
        let st = AppState::in_memory();
        let owner = registered(&st).await;
        let listing = create_listing(&st, &owner, dune()).await.unwrap();
        delete_listing(&st, &owner, listing.id).await.unwrap();
        assert!(matches!(
            get_listing(&st, listing.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            delete_listing(&st, &owner, listing.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn ownership_is_checked_before_the_body() {
        let st = AppState::in_memory();
        let owner = registered(&st).await;
        let other = registered(&st).await;
        let listing = create_listing(&st, &owner, dune()).await.unwrap();
        let bad_body = || Err(AppError::Validation("expected an object".into()));

        let err = update_listing(&st, &other, listing.id, bad_body()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        let err = update_listing(&st, &owner, Uuid::new_v4(), bad_body()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = update_listing(&st, &owner, listing.id, bad_body()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

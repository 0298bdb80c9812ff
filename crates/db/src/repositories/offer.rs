use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use haggle_core::disclosure::SharedContactDetails;
use haggle_core::domain::offer::{Offer, OfferId, OfferStatus, QuotedItem};
use haggle_core::domain::party::VendorId;
use haggle_core::domain::request::{RequestId, RequestItemId};

use super::{
    decode_decimal, decode_json, decode_timestamp, encode_decimal, encode_json,
    encode_timestamp, OfferRepository, RepositoryError,
};
use crate::DbPool;

const SELECT_OFFER: &str = "SELECT id, request_id, vendor_id, status, total_price, notes, \
     shared_contact_details, created_at FROM offer";

pub struct SqlOfferRepository {
    pool: DbPool,
}

impl SqlOfferRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: &SqliteRow) -> Result<Offer, RepositoryError> {
        let id: String = row.try_get("id")?;
        let status: OfferStatus =
            row.try_get::<String, _>("status")?.parse().map_err(RepositoryError::Decode)?;
        let total_price = decode_decimal(&row.try_get::<String, _>("total_price")?)?;
        let created_at = decode_timestamp(&row.try_get::<String, _>("created_at")?)?;
        let shared_contact_details: Option<SharedContactDetails> = row
            .try_get::<Option<String>, _>("shared_contact_details")?
            .map(|raw| decode_json(&raw))
            .transpose()?;

        let line_rows = sqlx::query(
            "SELECT request_item_id, price FROM quoted_item WHERE offer_id = ?1 \
             ORDER BY request_item_id",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let mut quoted_items = Vec::with_capacity(line_rows.len());
        for line_row in &line_rows {
            quoted_items.push(QuotedItem {
                request_item_id: RequestItemId(line_row.try_get("request_item_id")?),
                price: decode_decimal(&line_row.try_get::<String, _>("price")?)?,
            });
        }

        Ok(Offer {
            id: OfferId(id),
            request_id: RequestId(row.try_get("request_id")?),
            vendor_id: VendorId(row.try_get("vendor_id")?),
            quoted_items,
            total_price,
            notes: row.try_get("notes")?,
            status,
            created_at,
            shared_contact_details,
        })
    }

    async fn hydrate_all(&self, rows: Vec<SqliteRow>) -> Result<Vec<Offer>, RepositoryError> {
        let mut offers = Vec::with_capacity(rows.len());
        for row in &rows {
            offers.push(self.hydrate(row).await?);
        }
        Ok(offers)
    }
}

#[async_trait]
impl OfferRepository for SqlOfferRepository {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_OFFER} WHERE id = ?1"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_OFFER} WHERE request_id = ?1 ORDER BY created_at, id"
        ))
        .bind(&request_id.0)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn list_for_vendor(&self, vendor_id: &VendorId) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_OFFER} WHERE vendor_id = ?1 ORDER BY created_at, id"
        ))
        .bind(&vendor_id.0)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn save(&self, offer: Offer) -> Result<(), RepositoryError> {
        let shared_contact_details = offer
            .shared_contact_details
            .as_ref()
            .map(encode_json)
            .transpose()?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO offer (id, request_id, vendor_id, status, total_price, notes, \
             shared_contact_details, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT (id) DO UPDATE SET \
             request_id = excluded.request_id, vendor_id = excluded.vendor_id, \
             status = excluded.status, total_price = excluded.total_price, \
             notes = excluded.notes, \
             shared_contact_details = excluded.shared_contact_details, \
             created_at = excluded.created_at",
        )
        .bind(&offer.id.0)
        .bind(&offer.request_id.0)
        .bind(&offer.vendor_id.0)
        .bind(offer.status.as_str())
        .bind(encode_decimal(&offer.total_price))
        .bind(offer.notes.as_deref())
        .bind(shared_contact_details)
        .bind(encode_timestamp(&offer.created_at))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM quoted_item WHERE offer_id = ?1")
            .bind(&offer.id.0)
            .execute(&mut *tx)
            .await?;

        for line in &offer.quoted_items {
            sqlx::query(
                "INSERT INTO quoted_item (offer_id, request_item_id, price) \
                 VALUES (?1, ?2, ?3)",
            )
            .bind(&offer.id.0)
            .bind(&line.request_item_id.0)
            .bind(encode_decimal(&line.price))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

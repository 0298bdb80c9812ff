use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use haggle_core::domain::category::Category;
use haggle_core::domain::party::{UserId, VendorId};
use haggle_core::domain::product::ProductId;
use haggle_core::domain::request::{
    Request, RequestId, RequestItem, RequestItemId, RequestStatus,
};

use super::{
    decode_json, decode_timestamp, encode_json, encode_timestamp, RepositoryError,
    RequestRepository,
};
use crate::DbPool;

const SELECT_REQUEST: &str = "SELECT id, user_id, title, status, categories, \
     targeted_vendor_ids, source_product_id, created_at FROM request";

pub struct SqlRequestRepository {
    pool: DbPool,
}

impl SqlRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: &SqliteRow) -> Result<Request, RepositoryError> {
        let id: String = row.try_get("id")?;
        let status: RequestStatus =
            row.try_get::<String, _>("status")?.parse().map_err(RepositoryError::Decode)?;
        let categories: Vec<Category> = decode_json(&row.try_get::<String, _>("categories")?)?;
        let targeted_vendor_ids: Vec<VendorId> =
            decode_json(&row.try_get::<String, _>("targeted_vendor_ids")?)?;
        let created_at = decode_timestamp(&row.try_get::<String, _>("created_at")?)?;

        let item_rows = sqlx::query(
            "SELECT id, title, description, quantity, image_url FROM request_item \
             WHERE request_id = ?1 ORDER BY position",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(item_rows.len());
        for item_row in &item_rows {
            let quantity_raw: i64 = item_row.try_get("quantity")?;
            let quantity = u32::try_from(quantity_raw).map_err(|_| {
                RepositoryError::Decode(format!("negative item quantity `{quantity_raw}`"))
            })?;
            items.push(RequestItem {
                id: RequestItemId(item_row.try_get("id")?),
                title: item_row.try_get("title")?,
                description: item_row.try_get("description")?,
                quantity,
                image_url: item_row.try_get("image_url")?,
            });
        }

        Ok(Request {
            id: RequestId(id),
            user_id: UserId(row.try_get("user_id")?),
            title: row.try_get("title")?,
            items,
            categories,
            status,
            created_at,
            targeted_vendor_ids,
            source_product_id: row
                .try_get::<Option<String>, _>("source_product_id")?
                .map(ProductId),
        })
    }
}

#[async_trait]
impl RequestRepository for SqlRequestRepository {
    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_REQUEST} WHERE id = ?1"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Request>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_REQUEST} WHERE user_id = ?1 ORDER BY created_at, id"
        ))
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut requests = Vec::with_capacity(rows.len());
        for row in &rows {
            requests.push(self.hydrate(row).await?);
        }
        Ok(requests)
    }

    async fn list_all(&self) -> Result<Vec<Request>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_REQUEST} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await?;

        let mut requests = Vec::with_capacity(rows.len());
        for row in &rows {
            requests.push(self.hydrate(row).await?);
        }
        Ok(requests)
    }

    async fn save(&self, request: Request) -> Result<(), RepositoryError> {
        let categories = encode_json(&request.categories)?;
        let targeted = encode_json(&request.targeted_vendor_ids)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO request (id, user_id, title, status, categories, \
             targeted_vendor_ids, source_product_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT (id) DO UPDATE SET \
             user_id = excluded.user_id, title = excluded.title, \
             status = excluded.status, categories = excluded.categories, \
             targeted_vendor_ids = excluded.targeted_vendor_ids, \
             source_product_id = excluded.source_product_id, \
             created_at = excluded.created_at",
        )
        .bind(&request.id.0)
        .bind(&request.user_id.0)
        .bind(&request.title)
        .bind(request.status.as_str())
        .bind(&categories)
        .bind(&targeted)
        .bind(request.source_product_id.as_ref().map(|id| id.0.clone()))
        .bind(encode_timestamp(&request.created_at))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM request_item WHERE request_id = ?1")
            .bind(&request.id.0)
            .execute(&mut *tx)
            .await?;

        for (position, item) in request.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO request_item (id, request_id, position, title, description, \
                 quantity, image_url) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&item.id.0)
            .bind(&request.id.0)
            .bind(position as i64)
            .bind(&item.title)
            .bind(&item.description)
            .bind(i64::from(item.quantity))
            .bind(item.image_url.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

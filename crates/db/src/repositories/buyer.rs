use async_trait::async_trait;
use sqlx::Row;

use haggle_core::domain::party::{Buyer, UserId};

use super::{BuyerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBuyerRepository {
    pool: DbPool,
}

impl SqlBuyerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BuyerRepository for SqlBuyerRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Buyer>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, email FROM buyer WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Some(Buyer {
                id: UserId(row.try_get("id")?),
                name: row.try_get("name")?,
                email: row.try_get("email")?,
            }),
            None => None,
        })
    }

    async fn save(&self, buyer: Buyer) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO buyer (id, name, email) VALUES (?1, ?2, ?3) \
             ON CONFLICT (id) DO UPDATE SET name = excluded.name, email = excluded.email",
        )
        .bind(&buyer.id.0)
        .bind(&buyer.name)
        .bind(&buyer.email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

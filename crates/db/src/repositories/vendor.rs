use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use haggle_core::domain::category::Category;
use haggle_core::domain::party::{Vendor, VendorId};

use super::{decode_json, encode_json, RepositoryError, VendorRepository};
use crate::DbPool;

pub struct SqlVendorRepository {
    pool: DbPool,
}

impl SqlVendorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn hydrate(row: &SqliteRow) -> Result<Vendor, RepositoryError> {
    let specialties: Vec<Category> = decode_json(&row.try_get::<String, _>("specialties")?)?;
    Ok(Vendor {
        id: VendorId(row.try_get("id")?),
        business_name: row.try_get("business_name")?,
        specialties,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
    })
}

#[async_trait]
impl VendorRepository for SqlVendorRepository {
    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, business_name, email, phone, specialties FROM vendor WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(hydrate).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let rows =
            sqlx::query("SELECT id, business_name, email, phone, specialties FROM vendor ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(hydrate).collect()
    }

    async fn save(&self, vendor: Vendor) -> Result<(), RepositoryError> {
        let specialties = encode_json(&vendor.specialties)?;
        sqlx::query(
            "INSERT INTO vendor (id, business_name, email, phone, specialties) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (id) DO UPDATE SET \
             business_name = excluded.business_name, email = excluded.email, \
             phone = excluded.phone, specialties = excluded.specialties",
        )
        .bind(&vendor.id.0)
        .bind(&vendor.business_name)
        .bind(&vendor.email)
        .bind(vendor.phone.as_deref())
        .bind(&specialties)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

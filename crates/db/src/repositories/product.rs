use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use haggle_core::domain::category::Category;
use haggle_core::domain::party::VendorId;
use haggle_core::domain::product::{Product, ProductId, RentPeriod};

use super::{decode_decimal, encode_decimal, ProductRepository, RepositoryError};
use crate::DbPool;

const SELECT_PRODUCT: &str = "SELECT id, vendor_id, title, description, price, category, \
     image_url, for_rent, rent_price, rent_period FROM product";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn rent_period_to_str(period: RentPeriod) -> &'static str {
    match period {
        RentPeriod::PerHour => "per hour",
        RentPeriod::PerDay => "per day",
        RentPeriod::PerWeek => "per week",
        RentPeriod::PerMonth => "per month",
    }
}

fn rent_period_from_str(raw: &str) -> Result<RentPeriod, RepositoryError> {
    match raw {
        "per hour" => Ok(RentPeriod::PerHour),
        "per day" => Ok(RentPeriod::PerDay),
        "per week" => Ok(RentPeriod::PerWeek),
        "per month" => Ok(RentPeriod::PerMonth),
        other => Err(RepositoryError::Decode(format!("unknown rent period `{other}`"))),
    }
}

fn hydrate(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let category: Category = row
        .try_get::<String, _>("category")?
        .parse::<Category>()
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;
    let rent_price = row
        .try_get::<Option<String>, _>("rent_price")?
        .map(|raw| decode_decimal(&raw))
        .transpose()?;
    let rent_period = row
        .try_get::<Option<String>, _>("rent_period")?
        .map(|raw| rent_period_from_str(&raw))
        .transpose()?;

    Ok(Product {
        id: ProductId(row.try_get("id")?),
        vendor_id: VendorId(row.try_get("vendor_id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        price: decode_decimal(&row.try_get::<String, _>("price")?)?,
        category,
        image_url: row.try_get("image_url")?,
        for_rent: row.try_get::<i64, _>("for_rent")? != 0,
        rent_price,
        rent_period,
    })
}

#[async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(hydrate).transpose()
    }

    async fn list_for_vendor(
        &self,
        vendor_id: &VendorId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_PRODUCT} WHERE vendor_id = ?1 ORDER BY id"))
            .bind(&vendor_id.0)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(hydrate).collect()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, vendor_id, title, description, price, category, \
             image_url, for_rent, rent_price, rent_period) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             ON CONFLICT (id) DO UPDATE SET \
             vendor_id = excluded.vendor_id, title = excluded.title, \
             description = excluded.description, price = excluded.price, \
             category = excluded.category, image_url = excluded.image_url, \
             for_rent = excluded.for_rent, rent_price = excluded.rent_price, \
             rent_period = excluded.rent_period",
        )
        .bind(&product.id.0)
        .bind(&product.vendor_id.0)
        .bind(&product.title)
        .bind(&product.description)
        .bind(encode_decimal(&product.price))
        .bind(product.category.label())
        .bind(product.image_url.as_deref())
        .bind(i64::from(product.for_rent))
        .bind(product.rent_price.as_ref().map(encode_decimal))
        .bind(product.rent_period.map(rent_period_to_str))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use vouchery_core::domain::ids::{CategoryId, ProductId, StoreId, VoucherId};
use vouchery_core::domain::voucher::{DiscountMode, Voucher, VoucherKind, VoucherScope};

use super::{RepositoryError, VoucherRepository};
use crate::DbPool;

const VOUCHER_COLUMNS: &str = "id, code, kind, seller_store_id, discount_mode, discount_value, \
     min_order_amount, max_discount, starts_on, ends_on, usage_limit, per_user_limit, \
     is_active, is_auto, created_at, updated_at";

pub struct SqlVoucherRepository {
    pool: DbPool,
}

impl SqlVoucherRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_scope(&self, voucher_id: i64) -> Result<VoucherScope, RepositoryError> {
        let products: Vec<i64> = sqlx::query_scalar(
            "SELECT product_id FROM voucher_products WHERE voucher_id = ?1 ORDER BY product_id",
        )
        .bind(voucher_id)
        .fetch_all(&self.pool)
        .await?;

        let categories: Vec<i64> = sqlx::query_scalar(
            "SELECT category_id FROM voucher_categories WHERE voucher_id = ?1 ORDER BY category_id",
        )
        .bind(voucher_id)
        .fetch_all(&self.pool)
        .await?;

        let stores: Vec<i64> = sqlx::query_scalar(
            "SELECT store_id FROM voucher_stores WHERE voucher_id = ?1 ORDER BY store_id",
        )
        .bind(voucher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(VoucherScope {
            products: products.into_iter().map(ProductId).collect(),
            categories: categories.into_iter().map(CategoryId).collect(),
            stores: stores.into_iter().map(StoreId).collect(),
        })
    }

    async fn attach_scopes(&self, rows: Vec<SqliteRow>) -> Result<Vec<Voucher>, RepositoryError> {
        let mut vouchers = Vec::with_capacity(rows.len());
        for row in rows {
            let mut voucher = voucher_from_row(&row)?;
            voucher.scope = self.load_scope(voucher.id.0).await?;
            vouchers.push(voucher);
        }
        Ok(vouchers)
    }
}

#[async_trait::async_trait]
impl VoucherRepository for SqlVoucherRepository {
    async fn find_by_id(&self, id: VoucherId) -> Result<Option<Voucher>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = ?1"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => {
                let mut voucher = voucher_from_row(&row)?;
                voucher.scope = self.load_scope(voucher.id.0).await?;
                Ok(Some(voucher))
            }
            None => Ok(None),
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE code = ?1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => {
                let mut voucher = voucher_from_row(&row)?;
                voucher.scope = self.load_scope(voucher.id.0).await?;
                Ok(Some(voucher))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Voucher>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers
             WHERE ?1 IS NULL
                OR code LIKE '%' || ?1 || '%'
                OR kind LIKE '%' || ?1 || '%'
                OR discount_mode LIKE '%' || ?1 || '%'
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        self.attach_scopes(rows).await
    }

    async fn find_candidates(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        store_id: StoreId,
        as_of: NaiveDate,
    ) -> Result<Vec<Voucher>, RepositoryError> {
        // One round trip: active + window + scope-OR pushed down, DISTINCT
        // because a voucher may match on more than one axis. A voucher with
        // no links on any axis applies everywhere.
        let rows = sqlx::query(&format!(
            "SELECT DISTINCT v.{}
             FROM vouchers v
             LEFT JOIN voucher_products vp ON vp.voucher_id = v.id
             LEFT JOIN voucher_categories vc ON vc.voucher_id = v.id
             LEFT JOIN voucher_stores vs ON vs.voucher_id = v.id
             WHERE v.is_active = 1
               AND v.starts_on <= ?4
               AND v.ends_on >= ?4
               AND (vp.product_id = ?1
                    OR vc.category_id = ?2
                    OR vs.store_id = ?3
                    OR (vp.voucher_id IS NULL
                        AND vc.voucher_id IS NULL
                        AND vs.voucher_id IS NULL))
             ORDER BY v.id",
            VOUCHER_COLUMNS.replace(", ", ", v.")
        ))
        .bind(product_id.0)
        .bind(category_id.0)
        .bind(store_id.0)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        self.attach_scopes(rows).await
    }

    async fn create(&self, voucher: Voucher) -> Result<VoucherId, RepositoryError> {
        voucher.validate()?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO vouchers (code, kind, seller_store_id, discount_mode, discount_value,
                 min_order_amount, max_discount, starts_on, ends_on, usage_limit,
                 per_user_limit, is_active, is_auto, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&voucher.code)
        .bind(voucher.kind.as_str())
        .bind(voucher.seller_store.map(|store| store.0))
        .bind(voucher.mode.as_str())
        .bind(voucher.value.to_string())
        .bind(voucher.min_order_amount.to_string())
        .bind(voucher.max_discount.map(|cap| cap.to_string()))
        .bind(voucher.starts_on)
        .bind(voucher.ends_on)
        .bind(voucher.usage_limit.map(i64::from))
        .bind(i64::from(voucher.per_user_limit))
        .bind(voucher.is_active)
        .bind(voucher.is_auto)
        .bind(voucher.created_at)
        .bind(voucher.updated_at)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        insert_scope(&mut tx, id, &voucher.scope).await?;
        tx.commit().await?;

        Ok(VoucherId(id))
    }

    async fn update(&self, voucher: Voucher) -> Result<(), RepositoryError> {
        voucher.validate()?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE vouchers
             SET code = ?2, kind = ?3, seller_store_id = ?4, discount_mode = ?5,
                 discount_value = ?6, min_order_amount = ?7, max_discount = ?8,
                 starts_on = ?9, ends_on = ?10, usage_limit = ?11, per_user_limit = ?12,
                 is_active = ?13, is_auto = ?14, updated_at = ?15
             WHERE id = ?1",
        )
        .bind(voucher.id.0)
        .bind(&voucher.code)
        .bind(voucher.kind.as_str())
        .bind(voucher.seller_store.map(|store| store.0))
        .bind(voucher.mode.as_str())
        .bind(voucher.value.to_string())
        .bind(voucher.min_order_amount.to_string())
        .bind(voucher.max_discount.map(|cap| cap.to_string()))
        .bind(voucher.starts_on)
        .bind(voucher.ends_on)
        .bind(voucher.usage_limit.map(i64::from))
        .bind(i64::from(voucher.per_user_limit))
        .bind(voucher.is_active)
        .bind(voucher.is_auto)
        .bind(voucher.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(voucher.id.0));
        }

        for table in ["voucher_products", "voucher_categories", "voucher_stores"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE voucher_id = ?1"))
                .bind(voucher.id.0)
                .execute(&mut *tx)
                .await?;
        }
        insert_scope(&mut tx, voucher.id.0, &voucher.scope).await?;
        tx.commit().await?;

        Ok(())
    }
}

async fn insert_scope(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    voucher_id: i64,
    scope: &VoucherScope,
) -> Result<(), RepositoryError> {
    for product in &scope.products {
        sqlx::query("INSERT INTO voucher_products (voucher_id, product_id) VALUES (?1, ?2)")
            .bind(voucher_id)
            .bind(product.0)
            .execute(&mut **tx)
            .await?;
    }
    for category in &scope.categories {
        sqlx::query("INSERT INTO voucher_categories (voucher_id, category_id) VALUES (?1, ?2)")
            .bind(voucher_id)
            .bind(category.0)
            .execute(&mut **tx)
            .await?;
    }
    for store in &scope.stores {
        sqlx::query("INSERT INTO voucher_stores (voucher_id, store_id) VALUES (?1, ?2)")
            .bind(voucher_id)
            .bind(store.0)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

fn voucher_from_row(row: &SqliteRow) -> Result<Voucher, RepositoryError> {
    let kind: String = row.try_get("kind")?;
    let mode: String = row.try_get("discount_mode")?;
    let usage_limit: Option<i64> = row.try_get("usage_limit")?;
    let per_user_limit: i64 = row.try_get("per_user_limit")?;

    Ok(Voucher {
        id: VoucherId(row.try_get("id")?),
        code: row.try_get("code")?,
        kind: kind.parse::<VoucherKind>().map_err(decode_error)?,
        seller_store: row.try_get::<Option<i64>, _>("seller_store_id")?.map(StoreId),
        mode: mode.parse::<DiscountMode>().map_err(decode_error)?,
        value: decode_decimal(row, "discount_value")?,
        min_order_amount: decode_decimal(row, "min_order_amount")?,
        max_discount: decode_optional_decimal(row, "max_discount")?,
        starts_on: row.try_get("starts_on")?,
        ends_on: row.try_get("ends_on")?,
        usage_limit: usage_limit
            .map(|limit| u32::try_from(limit).map_err(decode_error))
            .transpose()?,
        per_user_limit: u32::try_from(per_user_limit).map_err(decode_error)?,
        is_active: row.try_get("is_active")?,
        is_auto: row.try_get("is_auto")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        scope: VoucherScope::default(),
    })
}

fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let raw: String = row.try_get(column)?;
    raw.parse::<Decimal>()
        .map_err(|error| RepositoryError::Decode(format!("column `{column}`: {error}")))
}

fn decode_optional_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| {
        value
            .parse::<Decimal>()
            .map_err(|error| RepositoryError::Decode(format!("column `{column}`: {error}")))
    })
    .transpose()
}

fn decode_error(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

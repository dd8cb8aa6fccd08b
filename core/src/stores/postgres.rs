//! `PostgreSQL` store implementations.
//!
//! Products and orders live in two tables; line items and shipping addresses
//! are stored as JSONB documents inside the order row. The constructor
//! bootstraps the schema so a fresh database works without a separate
//! migration step.
//!
//! `reserve` is a single conditional `UPDATE ... WHERE stock >= $n`: the
//! database serializes concurrent reservations, so no caller can observe a
//! window between the availability check and the decrement.

use crate::error::{CoreError, CoreResult};
use crate::store::{
    CatalogStore, OrderFilter, OrderStats, OrderStore, Page, Paginated, ProductFilter,
    ProductSort, StockOperation,
};
use crate::types::{
    Category, Gender, LineItem, Money, Order, OrderId, OrderStatus, PaymentMethod, Product,
    ProductId, ShippingAddress, UserId, Volume,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, brand, description, volume, price_cents, stock, \
     images, category, gender, active, sales, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, items, total_cents, status, payment_method, \
     payment_ref, shipping_address, customer_notes, created_at, updated_at";

/// `PostgreSQL`-backed product collection.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Connects to the database and bootstraps the `products` table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the connection or DDL fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> CoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wraps an existing pool (shared with the order store) and bootstraps
    /// the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the DDL fails.
    pub async fn with_pool(pool: PgPool) -> CoreResult<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_schema(&self) -> CoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS products (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                brand TEXT NOT NULL,
                description TEXT NOT NULL,
                volume TEXT NOT NULL,
                price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
                stock INTEGER NOT NULL CHECK (stock >= 0),
                images JSONB NOT NULL DEFAULT '[]',
                category TEXT NOT NULL,
                gender TEXT NOT NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                sales INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_active ON products (active)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_products_category_gender \
             ON products (category, gender)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn product_from_row(row: &PgRow) -> CoreResult<Product> {
    let images: serde_json::Value = row.try_get("images")?;
    let images: Vec<String> = serde_json::from_value(images)
        .map_err(|e| CoreError::storage(format!("bad images document: {e}")))?;

    let volume: String = row.try_get("volume")?;
    let category: String = row.try_get("category")?;
    let gender: String = row.try_get("gender")?;

    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        brand: row.try_get("brand")?,
        description: row.try_get("description")?,
        volume: Volume::parse(&volume)
            .ok_or_else(|| CoreError::storage(format!("unknown volume {volume}")))?,
        price: money_from_db(row.try_get("price_cents")?)?,
        stock: u32::try_from(row.try_get::<i32, _>("stock")?)
            .map_err(|_| CoreError::storage("negative stock in database"))?,
        images,
        category: Category::parse(&category)
            .ok_or_else(|| CoreError::storage(format!("unknown category {category}")))?,
        gender: Gender::parse(&gender)
            .ok_or_else(|| CoreError::storage(format!("unknown gender {gender}")))?,
        active: row.try_get("active")?,
        sales: u32::try_from(row.try_get::<i32, _>("sales")?).unwrap_or(0),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> CoreResult<Order> {
    let items: serde_json::Value = row.try_get("items")?;
    let items: Vec<LineItem> = serde_json::from_value(items)
        .map_err(|e| CoreError::storage(format!("bad items document: {e}")))?;

    let shipping: serde_json::Value = row.try_get("shipping_address")?;
    let shipping_address: ShippingAddress = serde_json::from_value(shipping)
        .map_err(|e| CoreError::storage(format!("bad shipping document: {e}")))?;

    let status: String = row.try_get("status")?;
    let payment_method: String = row.try_get("payment_method")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        items,
        total: money_from_db(row.try_get("total_cents")?)?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| CoreError::storage(format!("unknown status {status}")))?,
        payment_method: PaymentMethod::parse(&payment_method)
            .ok_or_else(|| CoreError::storage(format!("unknown payment method {payment_method}")))?,
        payment_ref: row.try_get("payment_ref")?,
        shipping_address,
        customer_notes: row.try_get("customer_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn money_from_db(cents: i64) -> CoreResult<Money> {
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| CoreError::storage("negative money amount in database"))
}

fn money_to_db(amount: Money) -> CoreResult<i64> {
    i64::try_from(amount.cents()).map_err(|_| CoreError::storage("money amount exceeds bigint"))
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn insert(&self, product: Product) -> CoreResult<()> {
        let images = serde_json::to_value(&product.images)
            .map_err(|e| CoreError::storage(e.to_string()))?;
        sqlx::query(
            "INSERT INTO products (id, name, brand, description, volume, price_cents, stock, \
             images, category, gender, active, sales, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(product.volume.as_str())
        .bind(money_to_db(product.price)?)
        .bind(i32::try_from(product.stock).unwrap_or(i32::MAX))
        .bind(images)
        .bind(product.category.as_str())
        .bind(product.gender.as_str())
        .bind(product.active)
        .bind(i32::try_from(product.sales).unwrap_or(i32::MAX))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn update(&self, product: Product) -> CoreResult<()> {
        let images = serde_json::to_value(&product.images)
            .map_err(|e| CoreError::storage(e.to_string()))?;
        let result = sqlx::query(
            "UPDATE products SET name = $2, brand = $3, description = $4, volume = $5, \
             price_cents = $6, stock = $7, images = $8, category = $9, gender = $10, \
             active = $11, sales = $12, updated_at = $13
             WHERE id = $1",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(product.volume.as_str())
        .bind(money_to_db(product.price)?)
        .bind(i32::try_from(product.stock).unwrap_or(i32::MAX))
        .bind(images)
        .bind(product.category.as_str())
        .bind(product.gender.as_str())
        .bind(product.active)
        .bind(i32::try_from(product.sales).unwrap_or(i32::MAX))
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(product.id));
        }
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Page,
    ) -> CoreResult<Paginated<Product>> {
        let order_by = match sort {
            ProductSort::Newest => "created_at DESC",
            ProductSort::PriceAsc => "price_cents ASC",
            ProductSort::PriceDesc => "price_cents DESC",
            ProductSort::Name => "name ASC",
            ProductSort::BestSelling => "sales DESC",
        };

        let mut query = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_product_filter(&mut query, filter)?;
        query.push(format!(" ORDER BY {order_by}"));
        query.push(" LIMIT ").push_bind(i64::from(page.limit));
        query
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = query.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(product_from_row)
            .collect::<CoreResult<Vec<_>>>()?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_product_filter(&mut count, filter)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(Paginated::new(items, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn reserve(&self, id: ProductId, quantity: u32) -> CoreResult<Product> {
        let quantity_db = i32::try_from(quantity).unwrap_or(i32::MAX);
        // The availability check lives inside the UPDATE predicate, so the
        // database serializes concurrent reservations of the same row.
        let row = sqlx::query(&format!(
            "UPDATE products
             SET stock = stock - $2, sales = sales + $2, updated_at = now()
             WHERE id = $1 AND active AND stock >= $2
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(quantity_db)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = &row {
            return product_from_row(row);
        }

        // The conditional update matched nothing: distinguish a missing
        // product from one that is inactive or short.
        match self.get(id).await? {
            Some(product) => Err(CoreError::InsufficientStock {
                product_id: id,
                name: product.name,
                available: product.stock,
            }),
            None => Err(CoreError::ProductNotFound(id)),
        }
    }

    async fn restock(&self, id: ProductId, quantity: u32) -> CoreResult<bool> {
        let quantity_db = i32::try_from(quantity).unwrap_or(i32::MAX);
        let result = sqlx::query(
            "UPDATE products
             SET stock = stock + $2, sales = GREATEST(sales - $2, 0), updated_at = now()
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(quantity_db)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_stock(&self, id: ProductId, op: StockOperation) -> CoreResult<Product> {
        let row = match op {
            StockOperation::Add(quantity) => {
                sqlx::query(&format!(
                    "UPDATE products SET stock = stock + $2, updated_at = now()
                     WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
                ))
                .bind(id.as_uuid())
                .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
                .fetch_optional(&self.pool)
                .await?
            }
            StockOperation::Set(quantity) => {
                sqlx::query(&format!(
                    "UPDATE products SET stock = $2, updated_at = now()
                     WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
                ))
                .bind(id.as_uuid())
                .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.as_ref()
            .map(product_from_row)
            .transpose()?
            .ok_or(CoreError::ProductNotFound(id))
    }
}

fn push_product_filter(
    query: &mut QueryBuilder<'_, sqlx::Postgres>,
    filter: &ProductFilter,
) -> CoreResult<()> {
    query.push(" WHERE TRUE");
    if filter.active_only {
        query.push(" AND active");
    }
    if let Some(category) = filter.category {
        query.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(gender) = filter.gender {
        query.push(" AND gender = ").push_bind(gender.as_str());
    }
    if let Some(min) = filter.price_min {
        query.push(" AND price_cents >= ").push_bind(money_to_db(min)?);
    }
    if let Some(max) = filter.price_max {
        query.push(" AND price_cents <= ").push_bind(money_to_db(max)?);
    }
    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
        query
            .push(" AND (name || ' ' || brand || ' ' || description) ILIKE ")
            .push_bind(pattern);
    }
    Ok(())
}

/// `PostgreSQL`-backed order collection.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Wraps an existing pool and bootstraps the `orders` table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the DDL fails.
    pub async fn with_pool(pool: PgPool) -> CoreResult<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> CoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS orders (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL,
                items JSONB NOT NULL,
                total_cents BIGINT NOT NULL CHECK (total_cents >= 0),
                status TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                payment_ref TEXT,
                shipping_address JSONB NOT NULL,
                customer_notes TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_orders_user_created \
             ON orders (user_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: Order) -> CoreResult<()> {
        let items =
            serde_json::to_value(&order.items).map_err(|e| CoreError::storage(e.to_string()))?;
        let shipping = serde_json::to_value(&order.shipping_address)
            .map_err(|e| CoreError::storage(e.to_string()))?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, items, total_cents, status, payment_method, \
             payment_ref, shipping_address, customer_notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(items)
        .bind(money_to_db(order.total)?)
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(&order.payment_ref)
        .bind(shipping)
        .bind(&order.customer_notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> CoreResult<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn update(&self, order: Order) -> CoreResult<()> {
        let items =
            serde_json::to_value(&order.items).map_err(|e| CoreError::storage(e.to_string()))?;
        let shipping = serde_json::to_value(&order.shipping_address)
            .map_err(|e| CoreError::storage(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE orders SET items = $2, total_cents = $3, status = $4, \
             payment_method = $5, payment_ref = $6, shipping_address = $7, \
             customer_notes = $8, updated_at = $9
             WHERE id = $1",
        )
        .bind(order.id.as_uuid())
        .bind(items)
        .bind(money_to_db(order.total)?)
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(&order.payment_ref)
        .bind(shipping)
        .bind(&order.customer_notes)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::OrderNotFound(order.id));
        }
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: UserId, page: Page) -> CoreResult<Paginated<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.as_uuid())
        .bind(i64::from(page.limit))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(order_from_row)
            .collect::<CoreResult<Vec<_>>>()?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(Paginated::new(items, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn list(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> CoreResult<(Paginated<Order>, OrderStats)> {
        let mut query = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_order_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC");
        query.push(" LIMIT ").push_bind(i64::from(page.limit));
        query
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = query.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(order_from_row)
            .collect::<CoreResult<Vec<_>>>()?;

        let mut stats_query = QueryBuilder::new(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(total_cents), 0)::BIGINT AS revenue,
                    COUNT(*) FILTER (WHERE status = 'pendiente') AS pending,
                    COUNT(*) FILTER (WHERE status = 'pagado') AS paid,
                    COUNT(*) FILTER (WHERE status = 'enviado') AS shipped
             FROM orders",
        );
        push_order_filter(&mut stats_query, filter);
        let stats_row = stats_query.build().fetch_one(&self.pool).await?;

        let total: i64 = stats_row.try_get("total")?;
        let stats = OrderStats {
            total_revenue: money_from_db(stats_row.try_get("revenue")?)?,
            pending: u64::try_from(stats_row.try_get::<i64, _>("pending")?).unwrap_or(0),
            paid: u64::try_from(stats_row.try_get::<i64, _>("paid")?).unwrap_or(0),
            shipped: u64::try_from(stats_row.try_get::<i64, _>("shipped")?).unwrap_or(0),
        };

        Ok((
            Paginated::new(items, page, u64::try_from(total).unwrap_or(0)),
            stats,
        ))
    }

    async fn created_since(&self, cutoff: DateTime<Utc>) -> CoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE created_at >= $1"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(order_from_row).collect()
    }
}

fn push_order_filter(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &OrderFilter) {
    query.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.date_from {
        query.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        query.push(" AND created_at <= ").push_bind(to);
    }
}

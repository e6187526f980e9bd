//! Order Repository
//!
//! The order-placement workflow lives here: cart validation, server-side
//! pricing, pickup-code generation with collision retry, and the atomic
//! write of the order header plus its line items.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use rand::Rng;
use shared::models::{Order, OrderDetail, OrderItem, OrderStatus};
use shared::request::CartItemInput;
use shared::response::OrderConfirmation;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::{BaseRepository, RepoError, RepoResult};

/// Pickup codes: 6 chars drawn uniformly from A–Z0–9
pub const PICKUP_CODE_LEN: usize = 6;
const PICKUP_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Collision odds per attempt are ~1/36^6; the cap bounds worst-case latency
/// if the code column ever degenerates.
const MAX_PICKUP_CODE_ATTEMPTS: usize = 10;

/// Draw a fresh pickup code, independent of any previous one
pub fn generate_pickup_code() -> String {
    let mut rng = rand::thread_rng();
    (0..PICKUP_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..PICKUP_CODE_ALPHABET.len());
            PICKUP_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Round a computed total to whole cents
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A cart line joined against the catalog, ready to persist
#[derive(Debug, Clone)]
struct PricedLine {
    product_id: i64,
    product_name: String,
    unit_price: f64,
    provider: String,
    quantity: i64,
}

#[derive(sqlx::FromRow)]
struct CatalogRow {
    id: i64,
    name: String,
    price: f64,
    provider: String,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseRepository::new(pool),
        }
    }

    /// Place an order for `account_id`.
    ///
    /// The header and every line item are written in one transaction; either
    /// all of it lands or none of it does. `client_total` is advisory only:
    /// the stored total is recomputed from current catalog prices, and a
    /// mismatch is logged.
    pub async fn create_order(
        &self,
        account_id: i64,
        items: &[CartItemInput],
        client_total: Option<f64>,
    ) -> RepoResult<OrderConfirmation> {
        self.create_order_with_code_source(account_id, items, client_total, generate_pickup_code)
            .await
    }

    /// Same as [`create_order`], with the pickup-code source injected.
    /// Tests use this to force collisions.
    pub(crate) async fn create_order_with_code_source<F>(
        &self,
        account_id: i64,
        items: &[CartItemInput],
        client_total: Option<f64>,
        mut next_code: F,
    ) -> RepoResult<OrderConfirmation>
    where
        F: FnMut() -> String,
    {
        if items.is_empty() {
            return Err(RepoError::Validation("cart must not be empty".into()));
        }
        if let Some(bad) = items.iter().find(|line| line.quantity <= 0) {
            return Err(RepoError::Validation(format!(
                "quantity for product {} must be positive",
                bad.product_id
            )));
        }

        let lines = self.price_cart(items).await?;

        let total_price = round_cents(
            lines
                .iter()
                .map(|line| line.unit_price * line.quantity as f64)
                .sum(),
        );
        if let Some(claimed) = client_total {
            if (claimed - total_price).abs() > 0.005 {
                tracing::warn!(
                    account_id,
                    claimed,
                    computed = total_price,
                    "client-submitted total does not match catalog prices; storing computed total"
                );
            }
        }

        let order_date = Utc::now();
        let pickup_date = order_date + Duration::days(1);

        for _ in 0..MAX_PICKUP_CODE_ATTEMPTS {
            let pickup_code = next_code();
            let mut tx = self.base.pool().begin().await?;

            let header = match sqlx::query_as::<_, Order>(
                "INSERT INTO orders (account_id, total_price, pickup_code, status, order_date, pickup_date) \
                 VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
            )
            .bind(account_id)
            .bind(total_price)
            .bind(&pickup_code)
            .bind(OrderStatus::Ordered)
            .bind(order_date)
            .bind(pickup_date)
            .fetch_one(&mut *tx)
            .await
            {
                Ok(header) => header,
                // Another order holds this code; roll back and redraw
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => continue,
                Err(e) => return Err(e.into()),
            };

            Self::insert_line_items(&mut tx, header.id, &lines).await?;
            tx.commit().await?;

            tracing::info!(
                order_id = header.id,
                account_id,
                total_price,
                "order placed"
            );
            return Ok(OrderConfirmation {
                order_id: header.id,
                pickup_code,
                pickup_date,
            });
        }

        Err(RepoError::Database(format!(
            "could not allocate a unique pickup code after {MAX_PICKUP_CODE_ATTEMPTS} attempts"
        )))
    }

    /// Join the cart against the catalog in one batched lookup.
    ///
    /// Any product id without a catalog row fails the whole cart; dangling
    /// references never reach the insert.
    async fn price_cart(&self, items: &[CartItemInput]) -> RepoResult<Vec<PricedLine>> {
        let mut ids: Vec<i64> = items.iter().map(|line| line.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut qb =
            sqlx::QueryBuilder::<Sqlite>::new("SELECT id, name, price, provider FROM products WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        qb.push(")");

        let rows: Vec<CatalogRow> = qb.build_query_as().fetch_all(self.base.pool()).await?;
        let by_id: HashMap<i64, CatalogRow> = rows.into_iter().map(|row| (row.id, row)).collect();

        items
            .iter()
            .map(|line| {
                let product = by_id.get(&line.product_id).ok_or_else(|| {
                    RepoError::NotFound(format!("product {} does not exist", line.product_id))
                })?;
                Ok(PricedLine {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    unit_price: product.price,
                    provider: product.provider.clone(),
                    quantity: line.quantity,
                })
            })
            .collect()
    }

    async fn insert_line_items(
        tx: &mut Transaction<'_, Sqlite>,
        order_id: i64,
        lines: &[PricedLine],
    ) -> RepoResult<()> {
        for line in lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, product_name, unit_price, provider, quantity) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(&line.provider)
            .bind(line.quantity)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// All orders owned by `account_id`, newest first, with line items
    pub async fn find_by_account(&self, account_id: i64) -> RepoResult<Vec<OrderDetail>> {
        let headers = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE account_id = ? ORDER BY order_date DESC, id DESC",
        )
        .bind(account_id)
        .fetch_all(self.base.pool())
        .await?;

        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb =
            sqlx::QueryBuilder::<Sqlite>::new("SELECT * FROM order_items WHERE order_id IN (");
        let mut separated = qb.separated(", ");
        for header in &headers {
            separated.push_bind(header.id);
        }
        qb.push(") ORDER BY order_id, id");

        let items: Vec<OrderItem> = qb.build_query_as().fetch_all(self.base.pool()).await?;
        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let items = by_order.remove(&header.id).unwrap_or_default();
                OrderDetail::from_parts(header, items)
            })
            .collect())
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(self.base.pool())
            .await?;
        Ok(order)
    }

    /// Move an order one step along `ordered → ready → collected`.
    ///
    /// Backward moves and moves out of `collected` are rejected; no other
    /// business rules apply.
    pub async fn transition_status(&self, id: i64, next: OrderStatus) -> RepoResult<Order> {
        let mut tx = self.base.pool().begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;

        if !order.status.can_transition_to(next) {
            return Err(RepoError::Validation(format!(
                "order {id} cannot move from {} to {next}",
                order.status
            )));
        }

        let updated =
            sqlx::query_as::<_, Order>("UPDATE orders SET status = ? WHERE id = ? RETURNING *")
                .bind(next)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;

        tracing::info!(order_id = id, status = %next, "order status updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::db::DbService;
    use crate::db::repository::{AccountRepository, ProductRepository};
    use shared::models::{ProductCreate, Role};

    struct Fixture {
        orders: OrderRepository,
        products: ProductRepository,
        pool: SqlitePool,
        student_id: i64,
        pizza_id: i64,
        salad_id: i64,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("orders.db");
        let db = DbService::new(path.to_str().unwrap()).await.expect("db init");
        let pool = db.pool;

        let accounts = AccountRepository::new(pool.clone());
        let student = accounts
            .create(Some("Ada".into()), "ada@campus.edu", "hash", Role::Student)
            .await
            .unwrap();
        let vendor = accounts
            .create(
                Some("Pizza Palace".into()),
                "palace@campus.edu",
                "hash",
                Role::Provider,
            )
            .await
            .unwrap();

        let products = ProductRepository::new(pool.clone());
        let pizza = products
            .create(
                vendor.id,
                "Pizza Palace",
                ProductCreate {
                    name: "Pizza Margherita".into(),
                    description: None,
                    price: 5.99,
                    image: None,
                },
            )
            .await
            .unwrap();
        let salad = products
            .create(
                vendor.id,
                "Pizza Palace",
                ProductCreate {
                    name: "Caesar Salad".into(),
                    description: None,
                    price: 3.99,
                    image: None,
                },
            )
            .await
            .unwrap();

        Fixture {
            orders: OrderRepository::new(pool.clone()),
            products,
            pool,
            student_id: student.id,
            pizza_id: pizza.id,
            salad_id: salad.id,
            _dir: dir,
        }
    }

    fn cart(lines: &[(i64, i64)]) -> Vec<CartItemInput> {
        lines
            .iter()
            .map(|&(product_id, quantity)| CartItemInput {
                product_id,
                quantity,
            })
            .collect()
    }

    async fn order_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn item_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_items")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn pickup_code_shape_and_pickup_window() {
        let f = fixture().await;
        let confirmation = f
            .orders
            .create_order(f.student_id, &cart(&[(f.pizza_id, 2), (f.salad_id, 1)]), None)
            .await
            .unwrap();

        assert_eq!(confirmation.pickup_code.len(), PICKUP_CODE_LEN);
        assert!(
            confirmation
                .pickup_code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );

        let detail = &f.orders.find_by_account(f.student_id).await.unwrap()[0];
        assert_eq!(detail.pickup_date - detail.order_date, Duration::days(1));
        assert_eq!(detail.status, OrderStatus::Ordered);
        assert_eq!(detail.items.len(), 2);
        // 2 × 5.99 + 1 × 3.99
        assert!((detail.total_price - 15.97).abs() < 1e-9);
    }

    #[tokio::test]
    async fn pickup_codes_stay_unique() {
        let f = fixture().await;
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let confirmation = f
                .orders
                .create_order(f.student_id, &cart(&[(f.pizza_id, 1)]), None)
                .await
                .unwrap();
            assert!(seen.insert(confirmation.pickup_code));
        }
    }

    #[tokio::test]
    async fn colliding_code_is_redrawn() {
        let f = fixture().await;
        f.orders
            .create_order_with_code_source(f.student_id, &cart(&[(f.pizza_id, 1)]), None, || {
                "AAAAAA".to_string()
            })
            .await
            .unwrap();

        // Second order first draws the taken code, then a fresh one
        let mut draws = vec!["BBBBBB".to_string(), "AAAAAA".to_string()];
        let confirmation = f
            .orders
            .create_order_with_code_source(f.student_id, &cart(&[(f.pizza_id, 1)]), None, || {
                draws.pop().unwrap()
            })
            .await
            .unwrap();

        assert_eq!(confirmation.pickup_code, "BBBBBB");
        assert_eq!(order_count(&f.pool).await, 2);
        assert_eq!(item_count(&f.pool).await, 2);
    }

    #[tokio::test]
    async fn code_space_exhaustion_is_a_persistence_error() {
        let f = fixture().await;
        f.orders
            .create_order_with_code_source(f.student_id, &cart(&[(f.pizza_id, 1)]), None, || {
                "AAAAAA".to_string()
            })
            .await
            .unwrap();

        let err = f
            .orders
            .create_order_with_code_source(f.student_id, &cart(&[(f.pizza_id, 1)]), None, || {
                "AAAAAA".to_string()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::Database(_)));
        // The failed attempts left nothing behind
        assert_eq!(order_count(&f.pool).await, 1);
        assert_eq!(item_count(&f.pool).await, 1);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_without_writes() {
        let f = fixture().await;
        let err = f
            .orders
            .create_order(f.student_id, &[], Some(21.48))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert_eq!(order_count(&f.pool).await, 0);
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected() {
        let f = fixture().await;
        let err = f
            .orders
            .create_order(f.student_id, &cart(&[(f.pizza_id, 0)]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn dangling_product_reference_is_rejected_without_writes() {
        let f = fixture().await;
        let err = f
            .orders
            .create_order(f.student_id, &cart(&[(f.pizza_id, 1), (9999, 1)]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
        assert_eq!(order_count(&f.pool).await, 0);
        assert_eq!(item_count(&f.pool).await, 0);
    }

    #[tokio::test]
    async fn failed_line_item_insert_rolls_back_the_header() {
        let f = fixture().await;
        let mut tx = f.pool.begin().await.unwrap();

        let header = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (account_id, total_price, pickup_code, status, order_date, pickup_date) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(f.student_id)
        .bind(5.99)
        .bind("ZZZZZZ")
        .bind(OrderStatus::Ordered)
        .bind(Utc::now())
        .bind(Utc::now() + Duration::days(1))
        .fetch_one(&mut *tx)
        .await
        .unwrap();

        // quantity 0 violates the CHECK constraint mid-transaction
        let bad_line = PricedLine {
            product_id: f.pizza_id,
            product_name: "Pizza Margherita".into(),
            unit_price: 5.99,
            provider: "Pizza Palace".into(),
            quantity: 0,
        };
        let err = OrderRepository::insert_line_items(&mut tx, header.id, &[bad_line])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Database(_)));
        drop(tx);

        assert_eq!(order_count(&f.pool).await, 0);
        assert_eq!(item_count(&f.pool).await, 0);
    }

    #[tokio::test]
    async fn server_total_wins_over_client_total() {
        let f = fixture().await;
        f.orders
            .create_order(f.student_id, &cart(&[(f.pizza_id, 2)]), Some(0.02))
            .await
            .unwrap();

        let detail = &f.orders.find_by_account(f.student_id).await.unwrap()[0];
        assert!((detail.total_price - 11.98).abs() < 1e-9);
    }

    #[tokio::test]
    async fn history_snapshots_survive_catalog_edits() {
        let f = fixture().await;
        f.orders
            .create_order(f.student_id, &cart(&[(f.pizza_id, 1)]), None)
            .await
            .unwrap();

        // Reprice and rename after the fact
        f.products
            .update(
                f.pizza_id,
                shared::models::ProductUpdate {
                    name: Some("Pizza Nuova".into()),
                    price: Some(9.99),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let detail = &f.orders.find_by_account(f.student_id).await.unwrap()[0];
        assert_eq!(detail.items[0].product_name, "Pizza Margherita");
        assert!((detail.items[0].unit_price - 5.99).abs() < 1e-9);
        assert!((detail.total_price - 5.99).abs() < 1e-9);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_empty_for_fresh_accounts() {
        let f = fixture().await;
        assert!(f.orders.find_by_account(f.student_id).await.unwrap().is_empty());

        let first = f
            .orders
            .create_order(f.student_id, &cart(&[(f.pizza_id, 1)]), None)
            .await
            .unwrap();
        let second = f
            .orders
            .create_order(f.student_id, &cart(&[(f.salad_id, 1)]), None)
            .await
            .unwrap();

        let listing = f.orders.find_by_account(f.student_id).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].id, second.order_id);
        assert_eq!(listing[1].id, first.order_id);
    }

    #[tokio::test]
    async fn status_walks_forward_only() {
        let f = fixture().await;
        let confirmation = f
            .orders
            .create_order(f.student_id, &cart(&[(f.pizza_id, 1)]), None)
            .await
            .unwrap();
        let id = confirmation.order_id;

        let ready = f
            .orders
            .transition_status(id, OrderStatus::Ready)
            .await
            .unwrap();
        assert_eq!(ready.status, OrderStatus::Ready);

        let backward = f
            .orders
            .transition_status(id, OrderStatus::Ordered)
            .await
            .unwrap_err();
        assert!(matches!(backward, RepoError::Validation(_)));

        let collected = f
            .orders
            .transition_status(id, OrderStatus::Collected)
            .await
            .unwrap();
        assert_eq!(collected.status, OrderStatus::Collected);

        // Terminal state
        let after = f
            .orders
            .transition_status(id, OrderStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(after, RepoError::Validation(_)));

        let missing = f
            .orders
            .transition_status(9999, OrderStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(missing, RepoError::NotFound(_)));
    }
}

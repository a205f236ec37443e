//! In-memory catalog + order store.
//!
//! Intended for tests/dev. Implements the same contracts as the Postgres
//! adapters, including all-or-nothing order creation: writes go through
//! [`InMemoryTx`], which undoes every staged row when dropped uncommitted
//! (also while unwinding from a panic).

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dineout_auth::Role;
use dineout_catalog::{DinerProfile, MenuItem, Venue};
use dineout_core::{DomainError, DomainResult, MenuItemId, OrderId, OrderLineId, UserId, VenueId};
use dineout_ordering::{Order, OrderDetails, OrderLine, OrderStatus};

use crate::catalog::CatalogGateway;
use crate::error::RepositoryError;
use crate::orders::{OrderRepository, OrderStatusContext};

/// One-shot failure injected into the next `create_order_atomic` call.
///
/// Line indexes are zero-based: `FailBeforeLine(1)` writes the order row and
/// the first line, then fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    FailBeforeLine(usize),
    PanicBeforeLine(usize),
}

#[derive(Debug)]
struct UserRow {
    profile: DinerProfile,
    role: Role,
}

#[derive(Debug)]
struct SoftDeletable<T> {
    value: T,
    deleted: bool,
}

impl<T> SoftDeletable<T> {
    fn live(value: T) -> Self {
        Self {
            value,
            deleted: false,
        }
    }
}

#[derive(Debug)]
struct OrderRow {
    /// Header only; lines live in `order_lines`.
    order: Order,
    seq: u64,
    deleted: bool,
}

#[derive(Debug)]
struct LineRow {
    line: OrderLine,
    position: usize,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, UserRow>,
    venues: HashMap<VenueId, SoftDeletable<Venue>>,
    menu_items: HashMap<MenuItemId, SoftDeletable<MenuItem>>,
    orders: HashMap<OrderId, OrderRow>,
    order_lines: HashMap<OrderLineId, LineRow>,
    next_seq: u64,
}

impl Tables {
    fn lines_of(&self, order_id: OrderId) -> Vec<OrderLine> {
        let mut rows: Vec<&LineRow> = self
            .order_lines
            .values()
            .filter(|row| row.line.order_id == order_id)
            .collect();
        rows.sort_by_key(|row| row.position);
        rows.into_iter().map(|row| row.line.clone()).collect()
    }

    fn order_with_lines(&self, row: &OrderRow) -> Order {
        let mut order = row.order.clone();
        order.lines = self.lines_of(order.id);
        order
    }

    fn details(&self, row: &OrderRow) -> OrderDetails {
        let order = self.order_with_lines(row);
        let venue = self.venues.get(&order.venue_id).map(|v| v.value.clone());
        let diner = self.users.get(&order.diner_id).map(|u| u.profile.clone());
        OrderDetails::assemble(order, venue, diner, |id| {
            self.menu_items.get(id).map(|item| item.value.clone())
        })
    }

    /// Newest first: `created_at DESC`, then insertion order DESC.
    fn list<F>(&self, keep: F, status: Option<OrderStatus>) -> Vec<OrderDetails>
    where
        F: Fn(&Order) -> bool,
    {
        let mut rows: Vec<&OrderRow> = self
            .orders
            .values()
            .filter(|row| !row.deleted && keep(&row.order))
            .filter(|row| status.is_none_or(|s| row.order.status == s))
            .collect();
        rows.sort_by(|a, b| {
            b.order
                .created_at
                .cmp(&a.order.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        rows.into_iter().map(|row| self.details(row)).collect()
    }
}

/// Scoped write transaction over [`Tables`].
///
/// Holds the write lock for its whole lifetime. Rows staged through it are
/// removed again on drop unless [`InMemoryTx::commit`] was called.
struct InMemoryTx<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    staged_orders: Vec<OrderId>,
    staged_lines: Vec<OrderLineId>,
    committed: bool,
}

impl<'a> InMemoryTx<'a> {
    fn begin(tables: RwLockWriteGuard<'a, Tables>) -> Self {
        Self {
            tables,
            staged_orders: Vec::new(),
            staged_lines: Vec::new(),
            committed: false,
        }
    }

    fn insert_order(&mut self, order: &Order) -> Result<(), RepositoryError> {
        if self.tables.orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict(format!("order {} already exists", order.id)));
        }
        let mut header = order.clone();
        header.lines = Vec::new();

        let seq = self.tables.next_seq;
        self.tables.next_seq += 1;
        self.tables.orders.insert(
            order.id,
            OrderRow {
                order: header,
                seq,
                deleted: false,
            },
        );
        self.staged_orders.push(order.id);
        Ok(())
    }

    fn insert_line(&mut self, line: &OrderLine, position: usize) -> Result<(), RepositoryError> {
        if line.quantity <= 0 || line.price_in_cents_at_order < 0 {
            return Err(RepositoryError::Constraint(format!(
                "order line {} violates quantity/price checks",
                line.id
            )));
        }
        if !self.tables.menu_items.contains_key(&line.menu_item_id) {
            return Err(RepositoryError::Constraint(format!(
                "order line {} references unknown menu item {}",
                line.id, line.menu_item_id
            )));
        }
        if self.tables.order_lines.contains_key(&line.id) {
            return Err(RepositoryError::Conflict(format!("order line {} already exists", line.id)));
        }

        self.tables.order_lines.insert(
            line.id,
            LineRow {
                line: line.clone(),
                position,
            },
        );
        self.staged_lines.push(line.id);
        Ok(())
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for InMemoryTx<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for id in self.staged_lines.drain(..) {
            self.tables.order_lines.remove(&id);
        }
        for id in self.staged_orders.drain(..) {
            self.tables.orders.remove(&id);
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    fault: Mutex<Option<Fault>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic inside a transaction poisons the lock, but the guard has
    // already rolled the tables back by then.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm a fault for the next order creation.
    pub fn inject_fault(&self, fault: Fault) {
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(fault);
    }

    fn take_fault(&self) -> Option<Fault> {
        self.fault.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    pub fn insert_user(&self, email: impl Into<String>, role: Role) -> UserId {
        let profile = DinerProfile {
            id: UserId::new(),
            email: email.into(),
        };
        let id = profile.id;
        self.write().users.insert(id, UserRow { profile, role });
        id
    }

    pub fn insert_diner(&self, email: impl Into<String>) -> UserId {
        self.insert_user(email, Role::Diner)
    }

    pub fn insert_merchant(&self, email: impl Into<String>) -> UserId {
        self.insert_user(email, Role::Merchant)
    }

    /// Fails unless `owner_merchant_id` is a registered merchant.
    pub fn insert_venue(
        &self,
        owner_merchant_id: UserId,
        name: impl Into<String>,
    ) -> DomainResult<Venue> {
        let mut tables = self.write();
        match tables.users.get(&owner_merchant_id).map(|u| u.role) {
            Some(Role::Merchant) => {}
            Some(_) => return Err(DomainError::validation("venue owner must be a merchant")),
            None => return Err(DomainError::validation("venue owner does not exist")),
        }

        let venue = Venue::new(owner_merchant_id, name);
        tables
            .venues
            .insert(venue.id, SoftDeletable::live(venue.clone()));
        Ok(venue)
    }

    pub fn insert_menu_item(
        &self,
        venue_id: VenueId,
        name: impl Into<String>,
        price_in_cents: i64,
    ) -> DomainResult<MenuItem> {
        let item = MenuItem::new(venue_id, name, price_in_cents)?;
        self.write()
            .menu_items
            .insert(item.id, SoftDeletable::live(item.clone()));
        Ok(item)
    }

    /// Returns `Ok(false)` when the item does not exist.
    pub fn set_menu_item_price(&self, id: MenuItemId, price_in_cents: i64) -> DomainResult<bool> {
        if price_in_cents < 0 {
            return Err(DomainError::validation("price_in_cents must not be negative"));
        }
        match self.write().menu_items.get_mut(&id) {
            Some(item) => {
                item.value.price_in_cents = price_in_cents;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn soft_delete_menu_item(&self, id: MenuItemId) -> bool {
        self.write()
            .menu_items
            .get_mut(&id)
            .map(|item| item.deleted = true)
            .is_some()
    }

    pub fn soft_delete_venue(&self, id: VenueId) -> bool {
        self.write()
            .venues
            .get_mut(&id)
            .map(|venue| venue.deleted = true)
            .is_some()
    }

    pub fn soft_delete_order(&self, id: OrderId) -> bool {
        self.write()
            .orders
            .get_mut(&id)
            .map(|row| row.deleted = true)
            .is_some()
    }

    pub fn order_row_count(&self) -> usize {
        self.read().orders.len()
    }

    pub fn order_line_row_count(&self) -> usize {
        self.read().order_lines.len()
    }

    fn write_order_graph(&self, order: &Order, fault: Option<Fault>) -> Result<Order, RepositoryError> {
        let mut tx = InMemoryTx::begin(self.write());
        tx.insert_order(order)?;

        for (position, line) in order.lines.iter().enumerate() {
            match fault {
                Some(Fault::FailBeforeLine(n)) if n == position => {
                    return Err(RepositoryError::storage(format!(
                        "injected failure before order line {position}"
                    )));
                }
                Some(Fault::PanicBeforeLine(n)) if n == position => {
                    panic!("injected panic before order line {position}");
                }
                _ => {}
            }
            tx.insert_line(line, position)?;
        }

        tx.commit();
        Ok(order.clone())
    }
}

#[async_trait]
impl CatalogGateway for InMemoryStore {
    async fn find_venue(&self, venue_id: VenueId) -> Result<Option<Venue>, RepositoryError> {
        Ok(self
            .read()
            .venues
            .get(&venue_id)
            .filter(|v| !v.deleted)
            .map(|v| v.value.clone()))
    }

    async fn menu_items_for_venue(
        &self,
        venue_id: VenueId,
        ids: &[MenuItemId],
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let tables = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.menu_items.get(id))
            .filter(|item| !item.deleted && item.value.belongs_to(venue_id))
            .map(|item| item.value.clone())
            .collect())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_order_atomic(&self, order: &Order) -> Result<Order, RepositoryError> {
        let fault = self.take_fault();
        self.write_order_graph(order, fault)
    }

    async fn get_by_id(&self, order_id: OrderId) -> Result<Option<OrderDetails>, RepositoryError> {
        let tables = self.read();
        Ok(tables
            .orders
            .get(&order_id)
            .filter(|row| !row.deleted)
            .map(|row| tables.details(row)))
    }

    async fn list_by_venue(
        &self,
        venue_id: VenueId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        Ok(self.read().list(|o| o.venue_id == venue_id, status))
    }

    async fn list_by_diner(
        &self,
        diner_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        Ok(self.read().list(|o| o.diner_id == diner_id, status))
    }

    async fn find_status_context(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderStatusContext>, RepositoryError> {
        let tables = self.read();
        let Some(row) = tables.orders.get(&order_id).filter(|row| !row.deleted) else {
            return Ok(None);
        };
        let Some(venue) = tables.venues.get(&row.order.venue_id) else {
            return Ok(None);
        };

        Ok(Some(OrderStatusContext {
            order: tables.order_with_lines(row),
            venue_owner_id: venue.value.owner_merchant_id,
        }))
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.write();
        match tables.orders.get_mut(&order_id) {
            Some(row) if !row.deleted && row.order.status == expected => {
                row.order.status = next;
                row.order.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dineout_ordering::{OrderLineRequest, price_against};

    use super::*;

    struct Fixture {
        store: Arc<InMemoryStore>,
        diner: UserId,
        venue: Venue,
        soup: MenuItem,
        bread: MenuItem,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let diner = store.insert_diner("diner@example.com");
        let merchant = store.insert_merchant("owner@example.com");
        let venue = store.insert_venue(merchant, "Corner Bistro").unwrap();
        let soup = store.insert_menu_item(venue.id, "Soup", 500).unwrap();
        let bread = store.insert_menu_item(venue.id, "Bread", 150).unwrap();
        Fixture {
            store,
            diner,
            venue,
            soup,
            bread,
        }
    }

    fn two_line_order(f: &Fixture, now: DateTime<Utc>) -> Order {
        let lines = [
            OrderLineRequest::new(f.soup.id, 2),
            OrderLineRequest::new(f.bread.id, 1),
        ];
        let priced = price_against(f.venue.id, &lines, &[f.soup.clone(), f.bread.clone()]).unwrap();
        Order::place(f.diner, priced, now)
    }

    #[tokio::test]
    async fn committed_order_reads_back_with_joins() {
        let f = fixture();
        let order = two_line_order(&f, Utc::now());
        f.store.create_order_atomic(&order).await.unwrap();

        let details = f.store.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(details.total_amount_in_cents, 1150);
        assert_eq!(details.venue.as_ref().map(|v| v.id), Some(f.venue.id));
        assert_eq!(details.diner.as_ref().map(|d| d.email.as_str()), Some("diner@example.com"));
        let names: Vec<_> = details
            .order_items
            .iter()
            .map(|l| l.menu_item.as_ref().unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["Soup", "Bread"]);
    }

    #[tokio::test]
    async fn injected_failure_leaves_no_rows() {
        let f = fixture();
        f.store.inject_fault(Fault::FailBeforeLine(1));

        let err = f
            .store
            .create_order_atomic(&two_line_order(&f, Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Storage(_)));
        assert_eq!(f.store.order_row_count(), 0);
        assert_eq!(f.store.order_line_row_count(), 0);
    }

    #[tokio::test]
    async fn panic_mid_transaction_rolls_back_and_store_stays_usable() {
        let f = fixture();
        f.store.inject_fault(Fault::PanicBeforeLine(1));

        let store = f.store.clone();
        let order = two_line_order(&f, Utc::now());
        let joined = tokio::spawn(async move { store.create_order_atomic(&order).await }).await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(f.store.order_row_count(), 0);
        assert_eq!(f.store.order_line_row_count(), 0);

        // Fault was one-shot; the next write goes through.
        f.store
            .create_order_atomic(&two_line_order(&f, Utc::now()))
            .await
            .unwrap();
        assert_eq!(f.store.order_row_count(), 1);
        assert_eq!(f.store.order_line_row_count(), 2);
    }

    #[tokio::test]
    async fn status_update_is_compare_and_set() {
        let f = fixture();
        let order = two_line_order(&f, Utc::now());
        f.store.create_order_atomic(&order).await.unwrap();

        let now = Utc::now();
        assert!(f
            .store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Accepted, now)
            .await
            .unwrap());
        // Expected status no longer matches.
        assert!(!f
            .store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Rejected, now)
            .await
            .unwrap());
        assert!(!f
            .store
            .update_status(OrderId::new(), OrderStatus::Pending, OrderStatus::Accepted, now)
            .await
            .unwrap());

        let ctx = f.store.find_status_context(order.id).await.unwrap().unwrap();
        assert_eq!(ctx.order.status, OrderStatus::Accepted);
        assert_eq!(ctx.venue_owner_id, f.venue.owner_merchant_id);
        assert_eq!(ctx.order.lines.len(), 2);
    }

    #[tokio::test]
    async fn lists_are_newest_first_filtered_and_skip_deleted() {
        let f = fixture();
        let base = Utc::now();
        let older = two_line_order(&f, base);
        let newer = two_line_order(&f, base + chrono::Duration::seconds(5));
        let removed = two_line_order(&f, base + chrono::Duration::seconds(10));
        for order in [&older, &newer, &removed] {
            f.store.create_order_atomic(order).await.unwrap();
        }
        assert!(f.store.soft_delete_order(removed.id));
        f.store
            .update_status(older.id, OrderStatus::Pending, OrderStatus::Accepted, base)
            .await
            .unwrap();

        let all = f.store.list_by_venue(f.venue.id, None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let accepted = f
            .store
            .list_by_diner(f.diner, Some(OrderStatus::Accepted))
            .await
            .unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, older.id);

        assert!(f.store.get_by_id(removed.id).await.unwrap().is_none());
        assert!(f.store.list_by_diner(UserId::new(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn catalog_lookup_is_venue_scoped_and_skips_deleted() {
        let f = fixture();
        let other_venue = f.store.insert_venue(f.venue.owner_merchant_id, "Elsewhere").unwrap();
        let foreign = f.store.insert_menu_item(other_venue.id, "Pie", 400).unwrap();
        assert!(f.store.soft_delete_menu_item(f.bread.id));

        let found = f
            .store
            .menu_items_for_venue(f.venue.id, &[f.soup.id, f.bread.id, foreign.id])
            .await
            .unwrap();
        assert_eq!(found, vec![f.soup.clone()]);

        assert!(f.store.soft_delete_venue(other_venue.id));
        assert!(f.store.find_venue(other_venue.id).await.unwrap().is_none());
        assert!(f.store.find_venue(f.venue.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn negative_price_is_rejected_at_the_helper() {
        let f = fixture();

        assert!(f.store.set_menu_item_price(f.soup.id, -1).is_err());
        assert!(!f.store.set_menu_item_price(MenuItemId::new(), 100).unwrap());

        let found = f.store.menu_items_for_venue(f.venue.id, &[f.soup.id]).await.unwrap();
        assert_eq!(found[0].price_in_cents, 500);
    }

    #[test]
    fn venue_owner_must_be_a_registered_merchant() {
        let store = InMemoryStore::new();
        let diner = store.insert_diner("diner@example.com");

        assert!(store.insert_venue(diner, "Not Mine").is_err());
        assert!(store.insert_venue(UserId::new(), "Nobody's").is_err());

        let merchant = store.insert_merchant("owner@example.com");
        let venue = store.insert_venue(merchant, "Mine").unwrap();
        assert_eq!(venue.owner_merchant_id, merchant);
    }
}

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::models::{
    Bill, Budget, BudgetStatus, CachedMealPlan, CalendarEvent, Expense, ExpenseSummary,
    FamilyMember, InventoryItem, Meal, MealPlan, NewBill, NewCalendarEvent, NewExpense,
    NewFamilyMember, NewInventoryItem, NewMeal, NewSavingsGoal, NewVerifiedPrice, SavingsGoal,
    ShoppingItem, ShoppingSuggestion, UpdateInventoryItem, VerifiedPrice,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS inventory (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    name TEXT NOT NULL,
                    category TEXT,
                    qty REAL NOT NULL,
                    unit TEXT,
                    exp_date TEXT,
                    location TEXT,
                    purchase_price REAL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL,
                    date TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    name TEXT NOT NULL,
                    ingredients TEXT,
                    recipe TEXT,
                    nutrition TEXT,
                    auto_generated INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS shopping_list (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    item TEXT NOT NULL,
                    qty REAL,
                    unit TEXT,
                    priority TEXT NOT NULL DEFAULT 'needed',
                    reason TEXT,
                    checked INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS bills (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    due_date TEXT,
                    category TEXT,
                    paid INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS expenses (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    description TEXT NOT NULL,
                    amount REAL NOT NULL,
                    category TEXT,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_inventory_name ON inventory(name);
                CREATE INDEX IF NOT EXISTS idx_meals_date ON meals(date);
                CREATE INDEX IF NOT EXISTS idx_bills_due ON bills(due_date);
                CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS meal_plan_cache (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    inventory_hash TEXT NOT NULL,
                    meal_types TEXT NOT NULL,
                    dietary_restrictions TEXT NOT NULL DEFAULT '',
                    plan TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_plan_cache_key
                    ON meal_plan_cache(inventory_hash, meal_types, dietary_restrictions);

                CREATE TABLE IF NOT EXISTS verified_prices (
                    item TEXT NOT NULL,
                    location_zip TEXT NOT NULL,
                    price REAL NOT NULL,
                    source TEXT NOT NULL,
                    confidence REAL NOT NULL,
                    expires_at TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    PRIMARY KEY (item, location_zip)
                );

                PRAGMA user_version = 2;",
            )?;
        }

        if version < 3 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS budgets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category TEXT NOT NULL UNIQUE,
                    monthly_limit REAL NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS savings_goals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    target_amount REAL NOT NULL,
                    saved_amount REAL NOT NULL DEFAULT 0,
                    target_date TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS family_members (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    role TEXT,
                    dietary_restrictions TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS calendar_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    event_type TEXT,
                    description TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_calendar_date ON calendar_events(date);

                PRAGMA user_version = 3;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn inventory_from_row(row: &rusqlite::Row) -> rusqlite::Result<InventoryItem> {
        Ok(InventoryItem {
            id: row.get(0)?,
            uuid: row.get(1)?,
            name: row.get(2)?,
            category: row.get(3)?,
            qty: row.get(4)?,
            unit: row.get(5)?,
            exp_date: row.get(6)?,
            location: row.get(7)?,
            purchase_price: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Meal> {
        let ingredients: Option<String> = row.get(5)?;
        let nutrition: Option<String> = row.get(7)?;
        Ok(Meal {
            id: row.get(0)?,
            uuid: row.get(1)?,
            date: row.get(2)?,
            meal_type: row.get(3)?,
            name: row.get(4)?,
            ingredients: parse_ingredients(ingredients.as_deref()),
            recipe: row.get(6)?,
            nutrition: nutrition.and_then(|n| serde_json::from_str(&n).ok()),
            auto_generated: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn shopping_from_row(row: &rusqlite::Row) -> rusqlite::Result<ShoppingItem> {
        Ok(ShoppingItem {
            id: row.get(0)?,
            item: row.get(1)?,
            qty: row.get(2)?,
            unit: row.get(3)?,
            priority: row.get(4)?,
            reason: row.get(5)?,
            checked: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn bill_from_row(row: &rusqlite::Row) -> rusqlite::Result<Bill> {
        Ok(Bill {
            id: row.get(0)?,
            name: row.get(1)?,
            amount: row.get(2)?,
            due_date: row.get(3)?,
            category: row.get(4)?,
            paid: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn expense_from_row(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        Ok(Expense {
            id: row.get(0)?,
            description: row.get(1)?,
            amount: row.get(2)?,
            category: row.get(3)?,
            date: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn budget_from_row(row: &rusqlite::Row) -> rusqlite::Result<Budget> {
        Ok(Budget {
            id: row.get(0)?,
            category: row.get(1)?,
            monthly_limit: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn goal_from_row(row: &rusqlite::Row) -> rusqlite::Result<SavingsGoal> {
        Ok(SavingsGoal {
            id: row.get(0)?,
            name: row.get(1)?,
            target_amount: row.get(2)?,
            saved_amount: row.get(3)?,
            target_date: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn member_from_row(row: &rusqlite::Row) -> rusqlite::Result<FamilyMember> {
        let restrictions: Option<String> = row.get(3)?;
        Ok(FamilyMember {
            id: row.get(0)?,
            name: row.get(1)?,
            role: row.get(2)?,
            dietary_restrictions: parse_ingredients(restrictions.as_deref()),
            created_at: row.get(4)?,
        })
    }

    fn event_from_row(row: &rusqlite::Row) -> rusqlite::Result<CalendarEvent> {
        Ok(CalendarEvent {
            id: row.get(0)?,
            date: row.get(1)?,
            event_type: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn price_from_row(row: &rusqlite::Row) -> rusqlite::Result<VerifiedPrice> {
        Ok(VerifiedPrice {
            item: row.get(0)?,
            location_zip: row.get(1)?,
            price: row.get(2)?,
            source: row.get(3)?,
            confidence: row.get(4)?,
            expires_at: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    // --- Inventory ---

    pub fn insert_inventory_item(&self, item: &NewInventoryItem) -> Result<InventoryItem> {
        crate::models::validate_inventory_item(&item.name, item.qty)?;
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let exp_date = item.exp_date.map(|d| d.format("%Y-%m-%d").to_string());
        self.conn.execute(
            "INSERT INTO inventory (uuid, name, category, qty, unit, exp_date, location, purchase_price, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                uuid,
                item.name,
                item.category,
                item.qty,
                item.unit,
                exp_date,
                item.location,
                item.purchase_price,
                now,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_inventory_item(id)
    }

    pub fn get_inventory_item(&self, id: i64) -> Result<InventoryItem> {
        self.conn
            .query_row(
                "SELECT * FROM inventory WHERE id = ?1",
                params![id],
                Self::inventory_from_row,
            )
            .context("Inventory item not found")
    }

    pub fn list_inventory(&self, search: Option<&str>) -> Result<Vec<InventoryItem>> {
        if let Some(query) = search {
            let escaped = query
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            let pattern = format!("%{escaped}%");
            let mut stmt = self.conn.prepare(
                "SELECT * FROM inventory WHERE name LIKE ?1 ESCAPE '\\' OR category LIKE ?1 ESCAPE '\\' ORDER BY name",
            )?;
            let items = stmt
                .query_map(params![pattern], Self::inventory_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(items);
        }
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM inventory ORDER BY name")?;
        let items = stmt
            .query_map([], Self::inventory_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn update_inventory_item(
        &self,
        id: i64,
        update: &UpdateInventoryItem,
    ) -> Result<InventoryItem> {
        let current = self.get_inventory_item(id)?;
        let qty = update.qty.unwrap_or(current.qty);
        crate::models::validate_inventory_item(&current.name, qty)?;
        let unit = if update.clear_unit {
            None
        } else {
            update.unit.clone().or(current.unit)
        };
        let location = if update.clear_location {
            None
        } else {
            update.location.clone().or(current.location)
        };
        let exp_date = if update.clear_exp_date {
            None
        } else {
            update
                .exp_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .or(current.exp_date)
        };
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "UPDATE inventory SET qty = ?1, unit = ?2, location = ?3, exp_date = ?4, updated_at = ?5 WHERE id = ?6",
            params![qty, unit, location, exp_date, now, id],
        )?;
        self.get_inventory_item(id)
    }

    pub fn delete_inventory_item(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM inventory WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Names of all pantry items with stock on hand.
    pub fn inventory_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM inventory WHERE qty > 0 ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn expiring_soon(&self, within_days: i64) -> Result<Vec<InventoryItem>> {
        let today = Local::now().date_naive();
        let cutoff = (today + Duration::days(within_days))
            .format("%Y-%m-%d")
            .to_string();
        let today = today.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT * FROM inventory
             WHERE exp_date IS NOT NULL AND exp_date >= ?1 AND exp_date <= ?2
             ORDER BY exp_date",
        )?;
        let items = stmt
            .query_map(params![today, cutoff], Self::inventory_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    // --- Meals ---

    pub fn insert_meal(&self, meal: &NewMeal) -> Result<Meal> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let date = meal.date.format("%Y-%m-%d").to_string();
        let ingredients = serde_json::to_string(&meal.ingredients)?;
        let nutrition = meal
            .nutrition
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn.execute(
            "INSERT INTO meals (uuid, date, meal_type, name, ingredients, recipe, nutrition, auto_generated, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                uuid,
                date,
                meal.meal_type,
                meal.name,
                ingredients,
                meal.recipe,
                nutrition,
                meal.auto_generated,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT * FROM meals WHERE id = ?1",
                params![id],
                Self::meal_from_row,
            )
            .context("Meal not found after insert")
    }

    pub fn meals_for_date(&self, date: NaiveDate) -> Result<Vec<Meal>> {
        let date = date.format("%Y-%m-%d").to_string();
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM meals WHERE date = ?1 ORDER BY meal_type")?;
        let meals = stmt
            .query_map(params![date], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    /// Remove previously generated meals for a date so a regenerated plan
    /// replaces them. Hand-entered meals are left alone.
    pub fn delete_auto_meals(&self, date: NaiveDate) -> Result<usize> {
        let date = date.format("%Y-%m-%d").to_string();
        let n = self.conn.execute(
            "DELETE FROM meals WHERE date = ?1 AND auto_generated = 1",
            params![date],
        )?;
        Ok(n)
    }

    /// How often each ingredient appeared in meals over the last `days` days,
    /// keyed by normalized name.
    pub fn ingredient_usage_counts(&self, days: i64) -> Result<HashMap<String, i64>> {
        let cutoff = (Local::now().date_naive() - Duration::days(days))
            .format("%Y-%m-%d")
            .to_string();
        let mut stmt = self
            .conn
            .prepare("SELECT ingredients FROM meals WHERE date >= ?1")?;
        let rows = stmt
            .query_map(params![cutoff], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for raw in rows.into_iter().flatten() {
            for ing in parse_ingredients(Some(&raw)) {
                *counts
                    .entry(crate::models::normalize_item_name(&ing))
                    .or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    // --- Meal plan cache ---

    /// Look up a cached plan for the exact (hash, meal types, restrictions)
    /// key, ignoring rows older than `max_age_days`.
    pub fn get_cached_meal_plan(
        &self,
        inventory_hash: &str,
        meal_types: &str,
        dietary_restrictions: &str,
        max_age_days: i64,
    ) -> Result<Option<CachedMealPlan>> {
        let cutoff = (Utc::now() - Duration::days(max_age_days)).to_rfc3339();
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT plan, created_at FROM meal_plan_cache
                 WHERE inventory_hash = ?1 AND meal_types = ?2 AND dietary_restrictions = ?3
                   AND created_at >= ?4
                 ORDER BY created_at DESC LIMIT 1",
                params![inventory_hash, meal_types, dietary_restrictions, cutoff],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((plan_json, created_at)) => {
                let plan: MealPlan = serde_json::from_str(&plan_json)
                    .context("Corrupt plan JSON in meal_plan_cache")?;
                Ok(Some(CachedMealPlan {
                    inventory_hash: inventory_hash.to_string(),
                    meal_types: meal_types.to_string(),
                    dietary_restrictions: dietary_restrictions.to_string(),
                    plan,
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }

    pub fn store_meal_plan(
        &self,
        inventory_hash: &str,
        meal_types: &str,
        dietary_restrictions: &str,
        plan: &MealPlan,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let plan_json = serde_json::to_string(plan)?;
        // Replace any older entry for the same key
        self.conn.execute(
            "DELETE FROM meal_plan_cache
             WHERE inventory_hash = ?1 AND meal_types = ?2 AND dietary_restrictions = ?3",
            params![inventory_hash, meal_types, dietary_restrictions],
        )?;
        self.conn.execute(
            "INSERT INTO meal_plan_cache (inventory_hash, meal_types, dietary_restrictions, plan, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![inventory_hash, meal_types, dietary_restrictions, plan_json, now],
        )?;
        Ok(())
    }

    pub fn clear_meal_plan_cache(&self) -> Result<usize> {
        let n = self.conn.execute("DELETE FROM meal_plan_cache", [])?;
        Ok(n)
    }

    pub fn prune_meal_plan_cache(&self, max_age_days: i64) -> Result<usize> {
        let cutoff = (Utc::now() - Duration::days(max_age_days)).to_rfc3339();
        let n = self.conn.execute(
            "DELETE FROM meal_plan_cache WHERE created_at < ?1",
            params![cutoff],
        )?;
        Ok(n)
    }

    // --- Verified prices ---

    pub fn get_verified_price(
        &self,
        item: &str,
        location_zip: &str,
        min_confidence: f64,
    ) -> Result<Option<VerifiedPrice>> {
        let now = Utc::now().to_rfc3339();
        let item = crate::models::normalize_item_name(item);
        let row = self
            .conn
            .query_row(
                "SELECT item, location_zip, price, source, confidence, expires_at, created_at
                 FROM verified_prices
                 WHERE item = ?1 AND location_zip = ?2 AND confidence >= ?3 AND expires_at > ?4",
                params![item, location_zip, min_confidence, now],
                Self::price_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn store_verified_price(&self, price: &NewVerifiedPrice, ttl_days: i64) -> Result<()> {
        let now = Utc::now();
        let expires_at = (now + Duration::days(ttl_days)).to_rfc3339();
        let item = crate::models::normalize_item_name(&price.item);
        self.conn.execute(
            "INSERT INTO verified_prices (item, location_zip, price, source, confidence, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(item, location_zip) DO UPDATE SET
                 price = excluded.price,
                 source = excluded.source,
                 confidence = excluded.confidence,
                 expires_at = excluded.expires_at,
                 created_at = excluded.created_at",
            params![
                item,
                price.location_zip,
                price.price,
                price.source,
                price.confidence,
                expires_at,
                now.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn prune_expired_prices(&self) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let n = self.conn.execute(
            "DELETE FROM verified_prices WHERE expires_at <= ?1",
            params![now],
        )?;
        Ok(n)
    }

    // --- Shopping list ---

    pub fn insert_shopping_item(
        &self,
        item: &str,
        qty: Option<f64>,
        unit: Option<&str>,
        priority: &str,
        reason: Option<&str>,
    ) -> Result<ShoppingItem> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO shopping_list (item, qty, unit, priority, reason, checked, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![item, qty, unit, priority, reason, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT * FROM shopping_list WHERE id = ?1",
                params![id],
                Self::shopping_from_row,
            )
            .context("Shopping item not found after insert")
    }

    /// Replace all unchecked rows with a freshly generated suggestion set.
    /// Checked-off rows are kept as shopping history.
    pub fn replace_shopping_suggestions(
        &self,
        suggestions: &[ShoppingSuggestion],
    ) -> Result<usize> {
        self.conn
            .execute("DELETE FROM shopping_list WHERE checked = 0", [])?;
        for s in suggestions {
            self.insert_shopping_item(
                &s.item,
                s.qty,
                s.unit.as_deref(),
                s.priority.as_str(),
                Some(&s.reason),
            )?;
        }
        Ok(suggestions.len())
    }

    pub fn list_shopping(&self, include_checked: bool) -> Result<Vec<ShoppingItem>> {
        let sql = if include_checked {
            "SELECT * FROM shopping_list
             ORDER BY CASE priority WHEN 'needed' THEN 0 WHEN 'low-stock' THEN 1 ELSE 2 END, item"
        } else {
            "SELECT * FROM shopping_list WHERE checked = 0
             ORDER BY CASE priority WHEN 'needed' THEN 0 WHEN 'low-stock' THEN 1 ELSE 2 END, item"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let items = stmt
            .query_map([], Self::shopping_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn set_shopping_checked(&self, id: i64, checked: bool) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE shopping_list SET checked = ?1 WHERE id = ?2",
            params![checked, id],
        )?;
        Ok(n > 0)
    }

    pub fn clear_shopping(&self, checked_only: bool) -> Result<usize> {
        let n = if checked_only {
            self.conn
                .execute("DELETE FROM shopping_list WHERE checked = 1", [])?
        } else {
            self.conn.execute("DELETE FROM shopping_list", [])?
        };
        Ok(n)
    }

    // --- Bills ---

    pub fn insert_bill(&self, bill: &NewBill) -> Result<Bill> {
        crate::models::validate_amount(bill.amount)?;
        let now = Local::now().to_rfc3339();
        let due = bill.due_date.map(|d| d.format("%Y-%m-%d").to_string());
        self.conn.execute(
            "INSERT INTO bills (name, amount, due_date, category, paid, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![bill.name, bill.amount, due, bill.category, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_bill(id)
    }

    pub fn get_bill(&self, id: i64) -> Result<Bill> {
        self.conn
            .query_row(
                "SELECT * FROM bills WHERE id = ?1",
                params![id],
                Self::bill_from_row,
            )
            .context("Bill not found")
    }

    pub fn list_bills(&self, unpaid_only: bool) -> Result<Vec<Bill>> {
        let sql = if unpaid_only {
            "SELECT * FROM bills WHERE paid = 0 ORDER BY due_date IS NULL, due_date"
        } else {
            "SELECT * FROM bills ORDER BY due_date IS NULL, due_date"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let bills = stmt
            .query_map([], Self::bill_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bills)
    }

    pub fn bills_due_within(&self, days: i64) -> Result<Vec<Bill>> {
        let cutoff = (Local::now().date_naive() + Duration::days(days))
            .format("%Y-%m-%d")
            .to_string();
        let mut stmt = self.conn.prepare(
            "SELECT * FROM bills WHERE paid = 0 AND due_date IS NOT NULL AND due_date <= ?1
             ORDER BY due_date",
        )?;
        let bills = stmt
            .query_map(params![cutoff], Self::bill_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bills)
    }

    pub fn mark_bill_paid(&self, id: i64) -> Result<Bill> {
        let n = self
            .conn
            .execute("UPDATE bills SET paid = 1 WHERE id = ?1", params![id])?;
        if n == 0 {
            anyhow::bail!("Bill {id} not found");
        }
        self.get_bill(id)
    }

    // --- Expenses ---

    pub fn insert_expense(&self, expense: &NewExpense) -> Result<Expense> {
        crate::models::validate_amount(expense.amount)?;
        let now = Local::now().to_rfc3339();
        let date = expense.date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO expenses (description, amount, category, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![expense.description, expense.amount, expense.category, date, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT * FROM expenses WHERE id = ?1",
                params![id],
                Self::expense_from_row,
            )
            .context("Expense not found after insert")
    }

    /// List expenses, optionally limited to a month given as "YYYY-MM".
    pub fn list_expenses(&self, month: Option<&str>) -> Result<Vec<Expense>> {
        if let Some(month) = month {
            let pattern = format!("{month}-%");
            let mut stmt = self
                .conn
                .prepare("SELECT * FROM expenses WHERE date LIKE ?1 ORDER BY date DESC")?;
            let expenses = stmt
                .query_map(params![pattern], Self::expense_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(expenses);
        }
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM expenses ORDER BY date DESC")?;
        let expenses = stmt
            .query_map([], Self::expense_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    pub fn expense_summary(&self, month: Option<&str>) -> Result<Vec<ExpenseSummary>> {
        let (sql, pattern) = match month {
            Some(m) => (
                "SELECT COALESCE(category, 'uncategorized'), SUM(amount), COUNT(*)
                 FROM expenses WHERE date LIKE ?1 GROUP BY 1 ORDER BY 2 DESC",
                Some(format!("{m}-%")),
            ),
            None => (
                "SELECT COALESCE(category, 'uncategorized'), SUM(amount), COUNT(*)
                 FROM expenses GROUP BY 1 ORDER BY 2 DESC",
                None,
            ),
        };
        let mut stmt = self.conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<ExpenseSummary> {
            Ok(ExpenseSummary {
                category: row.get(0)?,
                total: row.get(1)?,
                count: row.get(2)?,
            })
        };
        let summaries = match pattern {
            Some(p) => stmt
                .query_map(params![p], map_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], map_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(summaries)
    }

    // --- Budgets ---

    /// Set the monthly limit for a category, replacing any existing budget.
    pub fn set_budget(&self, category: &str, monthly_limit: f64) -> Result<Budget> {
        crate::models::validate_amount(monthly_limit)?;
        let category = crate::models::normalize_item_name(category);
        if category.is_empty() {
            anyhow::bail!("Budget category must not be empty");
        }
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO budgets (category, monthly_limit, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(category) DO UPDATE SET monthly_limit = excluded.monthly_limit",
            params![category, monthly_limit, now],
        )?;
        self.conn
            .query_row(
                "SELECT * FROM budgets WHERE category = ?1",
                params![category],
                Self::budget_from_row,
            )
            .context("Budget not found after insert")
    }

    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare("SELECT * FROM budgets ORDER BY category")?;
        let budgets = stmt
            .query_map([], Self::budget_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    pub fn delete_budget(&self, category: &str) -> Result<bool> {
        let category = crate::models::normalize_item_name(category);
        let n = self
            .conn
            .execute("DELETE FROM budgets WHERE category = ?1", params![category])?;
        Ok(n > 0)
    }

    /// Each budget's limit against expenses recorded in `month` ("YYYY-MM").
    pub fn budget_status(&self, month: &str) -> Result<Vec<BudgetStatus>> {
        let pattern = format!("{month}-%");
        let mut stmt = self.conn.prepare(
            "SELECT b.category, b.monthly_limit,
                    COALESCE((SELECT SUM(e.amount) FROM expenses e
                              WHERE LOWER(e.category) = b.category AND e.date LIKE ?1), 0)
             FROM budgets b ORDER BY b.category",
        )?;
        let statuses = stmt
            .query_map(params![pattern], |row| {
                let monthly_limit: f64 = row.get(1)?;
                let spent: f64 = row.get(2)?;
                Ok(BudgetStatus {
                    category: row.get(0)?,
                    monthly_limit,
                    spent,
                    remaining: monthly_limit - spent,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(statuses)
    }

    // --- Savings goals ---

    pub fn insert_savings_goal(&self, goal: &NewSavingsGoal) -> Result<SavingsGoal> {
        crate::models::validate_amount(goal.target_amount)?;
        let now = Local::now().to_rfc3339();
        let target_date = goal.target_date.map(|d| d.format("%Y-%m-%d").to_string());
        self.conn.execute(
            "INSERT INTO savings_goals (name, target_amount, saved_amount, target_date, created_at)
             VALUES (?1, ?2, 0, ?3, ?4)",
            params![goal.name, goal.target_amount, target_date, now],
        )?;
        self.get_savings_goal(self.conn.last_insert_rowid())
    }

    pub fn get_savings_goal(&self, id: i64) -> Result<SavingsGoal> {
        self.conn
            .query_row(
                "SELECT * FROM savings_goals WHERE id = ?1",
                params![id],
                Self::goal_from_row,
            )
            .context("Savings goal not found")
    }

    pub fn list_savings_goals(&self) -> Result<Vec<SavingsGoal>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM savings_goals ORDER BY target_date IS NULL, target_date")?;
        let goals = stmt
            .query_map([], Self::goal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Add a contribution to a goal's saved amount.
    pub fn contribute_to_goal(&self, id: i64, amount: f64) -> Result<SavingsGoal> {
        crate::models::validate_amount(amount)?;
        let n = self.conn.execute(
            "UPDATE savings_goals SET saved_amount = saved_amount + ?1 WHERE id = ?2",
            params![amount, id],
        )?;
        if n == 0 {
            anyhow::bail!("Savings goal {id} not found");
        }
        self.get_savings_goal(id)
    }

    pub fn delete_savings_goal(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM savings_goals WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // --- Family members ---

    pub fn insert_family_member(&self, member: &NewFamilyMember) -> Result<FamilyMember> {
        if member.name.trim().is_empty() {
            anyhow::bail!("Member name must not be empty");
        }
        let now = Local::now().to_rfc3339();
        let restrictions = serde_json::to_string(&member.dietary_restrictions)?;
        self.conn.execute(
            "INSERT INTO family_members (name, role, dietary_restrictions, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![member.name, member.role, restrictions, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT * FROM family_members WHERE id = ?1",
                params![id],
                Self::member_from_row,
            )
            .context("Family member not found after insert")
    }

    pub fn list_family_members(&self) -> Result<Vec<FamilyMember>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM family_members ORDER BY name")?;
        let members = stmt
            .query_map([], Self::member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    pub fn delete_family_member(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM family_members WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Union of every member's dietary restrictions, normalized and deduped.
    /// Merged into meal-plan requests so generated meals suit the household.
    pub fn member_dietary_restrictions(&self) -> Result<Vec<String>> {
        let members = self.list_family_members()?;
        let mut out: Vec<String> = Vec::new();
        for member in &members {
            for r in &member.dietary_restrictions {
                let r = crate::models::normalize_item_name(r);
                if !r.is_empty() && !out.contains(&r) {
                    out.push(r);
                }
            }
        }
        out.sort();
        Ok(out)
    }

    // --- Calendar events ---

    pub fn insert_calendar_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent> {
        if event.description.trim().is_empty() {
            anyhow::bail!("Event description must not be empty");
        }
        let now = Local::now().to_rfc3339();
        let date = event.date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO calendar_events (date, event_type, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![date, event.event_type, event.description, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT * FROM calendar_events WHERE id = ?1",
                params![id],
                Self::event_from_row,
            )
            .context("Calendar event not found after insert")
    }

    /// Events from today through `within_days` days out, oldest first.
    pub fn upcoming_events(&self, within_days: i64) -> Result<Vec<CalendarEvent>> {
        let today = Local::now().date_naive();
        let cutoff = (today + Duration::days(within_days))
            .format("%Y-%m-%d")
            .to_string();
        let today = today.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT * FROM calendar_events WHERE date >= ?1 AND date <= ?2 ORDER BY date, id",
        )?;
        let events = stmt
            .query_map(params![today, cutoff], Self::event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    pub fn events_for_date(&self, date: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let date = date.format("%Y-%m-%d").to_string();
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM calendar_events WHERE date = ?1 ORDER BY id")?;
        let events = stmt
            .query_map(params![date], Self::event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    pub fn delete_calendar_event(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM calendar_events WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }
}

/// Parse the stored ingredients column: a JSON array of strings, or legacy
/// free text split on commas.
fn parse_ingredients(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list;
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

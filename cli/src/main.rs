mod commands;
mod config;
mod providers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_bill_add, cmd_bill_list, cmd_bill_pay, cmd_budget_list, cmd_budget_remove, cmd_budget_set,
    cmd_budget_status, cmd_cache_clear, cmd_calendar_add, cmd_calendar_list, cmd_calendar_remove,
    cmd_expense_add, cmd_expense_list, cmd_expense_summary, cmd_goal_add, cmd_goal_contribute,
    cmd_goal_list, cmd_goal_remove, cmd_inventory_add, cmd_inventory_list, cmd_inventory_remove,
    cmd_inventory_update, cmd_member_add, cmd_member_list, cmd_member_remove, cmd_plan_generate,
    cmd_plan_show, cmd_price_lookup, cmd_shopping_add, cmd_shopping_check, cmd_shopping_clear,
    cmd_shopping_generate, cmd_shopping_list,
};
use crate::config::Config;
use pantry_core::db::Database;

#[derive(Parser)]
#[command(
    name = "pantry",
    version,
    about = "A local-first household manager with AI meal planning"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the pantry inventory
    Inventory {
        #[command(subcommand)]
        command: InventoryCommands,
    },
    /// Generate and inspect meal plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage the shopping list
    Shopping {
        #[command(subcommand)]
        command: ShoppingCommands,
    },
    /// Estimate grocery prices
    Price {
        #[command(subcommand)]
        command: PriceCommands,
    },
    /// Track household bills
    Bill {
        #[command(subcommand)]
        command: BillCommands,
    },
    /// Track expenses
    Expense {
        #[command(subcommand)]
        command: ExpenseCommands,
    },
    /// Set monthly spending limits per category
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
    /// Track savings goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Manage household members
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },
    /// Track household calendar events
    Calendar {
        #[command(subcommand)]
        command: CalendarCommands,
    },
    /// Manage cached AI results
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// Add an item to the pantry
    Add {
        /// Item name
        name: String,
        /// Quantity on hand
        #[arg(short, long, default_value = "1")]
        qty: f64,
        /// Unit (e.g. kg, cans, loaves)
        #[arg(short, long)]
        unit: Option<String>,
        /// Category (e.g. produce, dairy)
        #[arg(short, long)]
        category: Option<String>,
        /// Storage location (e.g. fridge, pantry)
        #[arg(short, long)]
        location: Option<String>,
        /// Expiration date (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<String>,
        /// Purchase price
        #[arg(long)]
        price: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List pantry items
    List {
        /// Filter by name
        #[arg(short, long)]
        search: Option<String>,
        /// Only show items expiring within N days
        #[arg(long, value_name = "DAYS")]
        expiring: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an item's quantity, unit, location, or expiration
    Update {
        /// Item ID
        id: i64,
        /// New quantity
        #[arg(short, long)]
        qty: Option<f64>,
        /// New unit
        #[arg(short, long)]
        unit: Option<String>,
        /// New storage location
        #[arg(short, long)]
        location: Option<String>,
        /// New expiration date (YYYY-MM-DD)
        #[arg(long)]
        expires: Option<String>,
        /// Reset the unit to empty
        #[arg(long, conflicts_with = "unit")]
        clear_unit: bool,
        /// Reset the storage location to empty
        #[arg(long, conflicts_with = "location")]
        clear_location: bool,
        /// Remove the expiration date
        #[arg(long, conflicts_with = "expires")]
        clear_expires: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an item from the pantry
    Remove {
        /// Item ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Generate a meal plan from the current pantry
    Generate {
        /// Date to plan for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Meal types to plan (breakfast, lunch, dinner, snack)
        #[arg(short, long, default_values_t = ["breakfast".to_string(), "lunch".to_string(), "dinner".to_string()])]
        meals: Vec<String>,
        /// Ingredients or keywords to avoid
        #[arg(short, long)]
        restrict: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored meals for a date
    Show {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ShoppingCommands {
    /// Rebuild suggestions from the pantry and the day's plan
    Generate {
        /// Plan date to pull ingredients from (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the shopping list
    List {
        /// Include checked-off items
        #[arg(short, long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an item manually
    Add {
        /// Item name
        item: String,
        /// Quantity to buy
        #[arg(short, long)]
        qty: Option<f64>,
        /// Unit
        #[arg(short, long)]
        unit: Option<String>,
        /// Priority: needed, low-stock, bulk-buy
        #[arg(short, long, default_value = "needed")]
        priority: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check an item off the list
    Check {
        /// Item ID
        id: i64,
        /// Uncheck instead
        #[arg(long)]
        undo: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear the list
    Clear {
        /// Only remove checked-off items
        #[arg(long)]
        checked: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PriceCommands {
    /// Look up estimated prices (defaults to the unchecked shopping list)
    Lookup {
        /// Items to price
        items: Vec<String>,
        /// ZIP code (default: location_zip from config)
        #[arg(short, long)]
        zip: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BillCommands {
    /// Add a bill
    Add {
        /// Bill name
        name: String,
        /// Amount due
        amount: f64,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List bills (unpaid by default)
    List {
        /// Include paid bills
        #[arg(short, long)]
        all: bool,
        /// Only show unpaid bills due within N days
        #[arg(long, value_name = "DAYS")]
        due_within: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a bill as paid
    Pay {
        /// Bill ID
        id: i64,
        /// Also record a matching expense dated today
        #[arg(long)]
        expense: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ExpenseCommands {
    /// Record an expense
    Add {
        /// What the money went to
        description: String,
        /// Amount spent
        amount: f64,
        /// Category
        #[arg(short, long)]
        category: Option<String>,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List expenses
    List {
        /// Filter by month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Total spending by category
    Summary {
        /// Filter by month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BudgetCommands {
    /// Set (or replace) a category's monthly limit
    Set {
        /// Expense category
        category: String,
        /// Monthly limit
        limit: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List budgets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show spending against each budget for a month
    Status {
        /// Month to check (YYYY-MM, default: current month)
        #[arg(short, long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a category's budget
    Remove {
        /// Expense category
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Add a savings goal
    Add {
        /// Goal name
        name: String,
        /// Target amount
        target: f64,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        by: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List savings goals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add money toward a goal
    Contribute {
        /// Goal ID
        id: i64,
        /// Amount to add
        amount: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a goal
    Remove {
        /// Goal ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MemberCommands {
    /// Add a household member
    Add {
        /// Member name
        name: String,
        /// Role (e.g. admin, kid)
        #[arg(short, long)]
        role: Option<String>,
        /// Dietary restrictions applied to every meal plan
        #[arg(long = "restrict")]
        restrictions: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List household members
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a household member
    Remove {
        /// Member ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CalendarCommands {
    /// Add an event
    Add {
        /// What is happening
        description: String,
        /// Event date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Event type (e.g. appointment, birthday)
        #[arg(short, long)]
        kind: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List upcoming events
    List {
        /// Only show events on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// How many days ahead to look
        #[arg(long, value_name = "DAYS", default_value = "14")]
        within: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an event
    Remove {
        /// Event ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Drop all cached meal plans and prune expired prices
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Providers capture the runtime handle at construction and block on it
    // from sync code, so commands run outside the async context.
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            process::exit(1);
        }
    };
    let _guard = rt.enter();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;

    match cli.command {
        Commands::Inventory { command } => match command {
            InventoryCommands::Add {
                name,
                qty,
                unit,
                category,
                location,
                expires,
                price,
                json,
            } => cmd_inventory_add(
                &db, &name, qty, unit, category, location, expires, price, json,
            ),
            InventoryCommands::List {
                search,
                expiring,
                json,
            } => cmd_inventory_list(&db, search.as_deref(), expiring, json),
            InventoryCommands::Update {
                id,
                qty,
                unit,
                location,
                expires,
                clear_unit,
                clear_location,
                clear_expires,
                json,
            } => cmd_inventory_update(
                &db,
                id,
                qty,
                unit,
                location,
                expires,
                clear_unit,
                clear_location,
                clear_expires,
                json,
            ),
            InventoryCommands::Remove { id, json } => cmd_inventory_remove(&db, id, json),
        },
        Commands::Plan { command } => match command {
            PlanCommands::Generate {
                date,
                meals,
                restrict,
                json,
            } => cmd_plan_generate(&db, &config.settings, date, &meals, restrict, json),
            PlanCommands::Show { date, json } => cmd_plan_show(&db, date, json),
        },
        Commands::Shopping { command } => match command {
            ShoppingCommands::Generate { date, json } => cmd_shopping_generate(&db, date, json),
            ShoppingCommands::List { all, json } => cmd_shopping_list(&db, all, json),
            ShoppingCommands::Add {
                item,
                qty,
                unit,
                priority,
                json,
            } => cmd_shopping_add(&db, &item, qty, unit.as_deref(), &priority, json),
            ShoppingCommands::Check { id, undo, json } => cmd_shopping_check(&db, id, undo, json),
            ShoppingCommands::Clear { checked, json } => cmd_shopping_clear(&db, checked, json),
        },
        Commands::Price { command } => match command {
            PriceCommands::Lookup { items, zip, json } => {
                cmd_price_lookup(&db, &config.settings, items, zip, json)
            }
        },
        Commands::Bill { command } => match command {
            BillCommands::Add {
                name,
                amount,
                due,
                category,
                json,
            } => cmd_bill_add(&db, &name, amount, due, category, json),
            BillCommands::List {
                all,
                due_within,
                json,
            } => cmd_bill_list(&db, all, due_within, json),
            BillCommands::Pay { id, expense, json } => cmd_bill_pay(&db, id, expense, json),
        },
        Commands::Expense { command } => match command {
            ExpenseCommands::Add {
                description,
                amount,
                category,
                date,
                json,
            } => cmd_expense_add(&db, &description, amount, category, date, json),
            ExpenseCommands::List { month, json } => cmd_expense_list(&db, month, json),
            ExpenseCommands::Summary { month, json } => cmd_expense_summary(&db, month, json),
        },
        Commands::Budget { command } => match command {
            BudgetCommands::Set {
                category,
                limit,
                json,
            } => cmd_budget_set(&db, &category, limit, json),
            BudgetCommands::List { json } => cmd_budget_list(&db, json),
            BudgetCommands::Status { month, json } => cmd_budget_status(&db, month, json),
            BudgetCommands::Remove { category, json } => cmd_budget_remove(&db, &category, json),
        },
        Commands::Goal { command } => match command {
            GoalCommands::Add {
                name,
                target,
                by,
                json,
            } => cmd_goal_add(&db, &name, target, by, json),
            GoalCommands::List { json } => cmd_goal_list(&db, json),
            GoalCommands::Contribute { id, amount, json } => {
                cmd_goal_contribute(&db, id, amount, json)
            }
            GoalCommands::Remove { id, json } => cmd_goal_remove(&db, id, json),
        },
        Commands::Member { command } => match command {
            MemberCommands::Add {
                name,
                role,
                restrictions,
                json,
            } => cmd_member_add(&db, &name, role, restrictions, json),
            MemberCommands::List { json } => cmd_member_list(&db, json),
            MemberCommands::Remove { id, json } => cmd_member_remove(&db, id, json),
        },
        Commands::Calendar { command } => match command {
            CalendarCommands::Add {
                description,
                date,
                kind,
                json,
            } => cmd_calendar_add(&db, &description, date, kind, json),
            CalendarCommands::List { date, within, json } => {
                cmd_calendar_list(&db, date, within, json)
            }
            CalendarCommands::Remove { id, json } => cmd_calendar_remove(&db, id, json),
        },
        Commands::Cache { command } => match command {
            CacheCommands::Clear { json } => cmd_cache_clear(&db, json),
        },
    }
}

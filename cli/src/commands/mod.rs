mod bills;
mod budget;
mod calendar;
mod expenses;
mod goals;
mod helpers;
mod inventory;
mod members;
mod plan;
mod price;
mod shopping;

pub(crate) use bills::{cmd_bill_add, cmd_bill_list, cmd_bill_pay};
pub(crate) use budget::{cmd_budget_list, cmd_budget_remove, cmd_budget_set, cmd_budget_status};
pub(crate) use calendar::{cmd_calendar_add, cmd_calendar_list, cmd_calendar_remove};
pub(crate) use expenses::{cmd_expense_add, cmd_expense_list, cmd_expense_summary};
pub(crate) use goals::{cmd_goal_add, cmd_goal_contribute, cmd_goal_list, cmd_goal_remove};
pub(crate) use inventory::{
    cmd_inventory_add, cmd_inventory_list, cmd_inventory_remove, cmd_inventory_update,
};
pub(crate) use members::{cmd_member_add, cmd_member_list, cmd_member_remove};
pub(crate) use plan::{cmd_cache_clear, cmd_plan_generate, cmd_plan_show};
pub(crate) use price::cmd_price_lookup;
pub(crate) use shopping::{
    cmd_shopping_add, cmd_shopping_check, cmd_shopping_clear, cmd_shopping_generate,
    cmd_shopping_list,
};

//! Transaction display formatting

use crate::models::Transaction;

use super::money;

/// Format transactions as a register, with income shown positive and
/// expenses negative
pub fn format_transaction_list(transactions: &[Transaction], symbol: &str) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let category_width = transactions
        .iter()
        .map(|t| t.category_name.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let mut output = String::new();
    for txn in transactions {
        let signed = if txn.is_income() { txn.amount } else { -txn.amount };
        output.push_str(&format!(
            "  {:12}  {}  {:category_width$}  {:>12}  {}\n",
            txn.id.to_string(),
            txn.date,
            txn.category_name,
            money(signed, symbol),
            txn.description,
            category_width = category_width
        ));
    }
    output
}

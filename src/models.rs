//! Core data models used throughout GreenThumb.

/// A row of the `plants` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plant {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
}

impl Plant {
    /// Price formatted as dollars, e.g. `$12.99`.
    pub fn display_price(&self) -> String {
        format_price(self.price_cents)
    }
}

pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

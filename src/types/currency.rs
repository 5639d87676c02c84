use crate::db::models::Currency;

/// Currency preferred for display when a user tracks several currencies.
pub const PRIMARY_CURRENCY_CODE: &str = "RON";

/// Currencies whose symbol is written after the amount (`12.50 lei`).
const SUFFIX_SYMBOL_CODES: [&str; 1] = ["RON"];

fn symbol_after(currency: &Currency) -> bool {
    SUFFIX_SYMBOL_CODES.contains(&currency.code.as_str())
}

/// Format an amount with two decimals and the currency symbol.
pub fn format_currency(amount: f64, currency: &Currency) -> String {
    if symbol_after(currency) {
        format!("{:.2} {}", amount, currency.symbol)
    } else {
        format!("{}{:.2}", currency.symbol, amount)
    }
}

/// Compact form for cards: thousands collapse to `1.2K`.
pub fn format_currency_short(amount: f64, currency: &Currency) -> String {
    if amount < 1000.0 {
        return format_currency(amount, currency);
    }
    let short = amount / 1000.0;
    if symbol_after(currency) {
        format!("{:.1}K {}", short, currency.symbol)
    } else {
        format!("{}{:.1}K", currency.symbol, short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn currency(code: &str, symbol: &str) -> Currency {
        Currency {
            id: format!("cur-{}", code.to_lowercase()),
            code: code.to_string(),
            name: code.to_string(),
            symbol: symbol.to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ron_puts_symbol_after_amount() {
        assert_eq!(format_currency(12.5, &currency("RON", "lei")), "12.50 lei");
    }

    #[test]
    fn other_currencies_prefix_symbol() {
        assert_eq!(format_currency(7.0, &currency("USD", "$")), "$7.00");
        assert_eq!(format_currency(0.333, &currency("EUR", "€")), "€0.33");
    }

    #[test]
    fn short_format_collapses_thousands() {
        assert_eq!(format_currency_short(1500.0, &currency("USD", "$")), "$1.5K");
        assert_eq!(format_currency_short(2340.0, &currency("RON", "lei")), "2.3K lei");
        assert_eq!(format_currency_short(999.0, &currency("USD", "$")), "$999.00");
    }
}

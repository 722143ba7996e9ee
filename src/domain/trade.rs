//! Completed trade records.

use chrono::NaiveDateTime;

/// One closed round trip, appended to the trade log at the moment the
/// position closes.
///
/// `pnl` is the trade's decimal return ((exit - entry) / entry), not a
/// currency amount; `capital_after` is the account balance after the exit
/// fee. Records are immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub capital_after: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn trade_fields() {
        let trade = Trade {
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap(),
            entry_price: 110.0,
            exit_price: 120.0,
            pnl: (120.0 - 110.0) / 110.0,
            capital_after: 1090.91,
        };
        assert!((trade.pnl - 0.090909).abs() < 1e-6);
        assert!((trade.capital_after - 1090.91).abs() < f64::EPSILON);
    }
}

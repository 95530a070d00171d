//! Derived business metrics: shipping lead time, profit margin and discount band.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::{
    clean::{DISCOUNT, ORDER_DATE, PROFIT, SALES, SHIP_DATE},
    data::Value,
    error::Result,
    table::{Cell, Table},
};

pub const SHIPPING_DAYS: &str = "shipping_days";
pub const PROFIT_MARGIN: &str = "profit_margin";
pub const DISCOUNT_BAND: &str = "discount_band";

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountBand {
    NoDiscount,
    Low,
    Medium,
    High,
}

impl DiscountBand {
    pub const ALL: [DiscountBand; 4] = [
        DiscountBand::NoDiscount,
        DiscountBand::Low,
        DiscountBand::Medium,
        DiscountBand::High,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DiscountBand::NoDiscount => "No Discount",
            DiscountBand::Low => "Low (≤20%)",
            DiscountBand::Medium => "Medium (20–40%)",
            DiscountBand::High => "High (>40%)",
        }
    }

    /// Buckets are left-open, right-closed: (-0.01, 0], (0, 0.2], (0.2, 0.4], (0.4, 1].
    pub fn classify(discount: Decimal) -> Option<Self> {
        let edges = [
            Decimal::new(-1, 2),
            Decimal::ZERO,
            Decimal::new(2, 1),
            Decimal::new(4, 1),
            Decimal::ONE,
        ];
        edges
            .windows(2)
            .zip(Self::ALL)
            .find(|(edge, _)| discount > edge[0] && discount <= edge[1])
            .map(|(_, band)| band)
    }
}

impl fmt::Display for DiscountBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsReport {
    pub rows: usize,
    pub unbanded: usize,
}

/// Whole days between two timestamps, rounded toward negative infinity.
pub fn shipping_days(order: NaiveDateTime, ship: NaiveDateTime) -> i64 {
    (ship - order).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// `profit / sales`, or exactly zero when there were no sales. `None` when the
/// quotient does not fit in a `Decimal`.
pub fn profit_margin(profit: Decimal, sales: Decimal) -> Option<Decimal> {
    if sales.is_zero() {
        return Some(Decimal::ZERO);
    }
    profit.checked_div(sales).map(|margin| margin.normalize())
}

/// Appends `shipping_days`, `profit_margin` and `discount_band`. No rows are dropped.
pub fn derive_metrics(mut table: Table) -> Result<(Table, MetricsReport)> {
    let order_idx = table.require_column(ORDER_DATE)?;
    let ship_idx = table.require_column(SHIP_DATE)?;
    let sales_idx = table.require_column(SALES)?;
    let profit_idx = table.require_column(PROFIT)?;
    let discount_idx = table.require_column(DISCOUNT)?;

    let mut days = Vec::with_capacity(table.row_count());
    let mut margins = Vec::with_capacity(table.row_count());
    let mut bands = Vec::with_capacity(table.row_count());
    for row in table.rows() {
        let lead_time = match (
            row[order_idx].as_ref().and_then(Value::as_datetime),
            row[ship_idx].as_ref().and_then(Value::as_datetime),
        ) {
            (Some(order), Some(ship)) => Some(Value::Integer(shipping_days(order, ship))),
            _ => None,
        };
        days.push(lead_time);

        let margin: Cell = match (
            row[profit_idx].as_ref().and_then(Value::as_decimal),
            row[sales_idx].as_ref().and_then(Value::as_decimal),
        ) {
            (Some(profit), Some(sales)) => profit_margin(profit, sales).map(Value::Decimal),
            _ => None,
        };
        margins.push(margin);

        let band = row[discount_idx]
            .as_ref()
            .and_then(Value::as_decimal)
            .and_then(DiscountBand::classify)
            .map(|band| Value::Text(band.to_string()));
        bands.push(band);
    }

    let unbanded = bands.iter().filter(|band| band.is_none()).count();
    table.upsert_column(SHIPPING_DAYS, days)?;
    table.upsert_column(PROFIT_MARGIN, margins)?;
    table.upsert_column(DISCOUNT_BAND, bands)?;
    let report = MetricsReport {
        rows: table.row_count(),
        unbanded,
    };
    Ok((table, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn band_edges_are_right_inclusive() {
        assert_eq!(DiscountBand::classify(dec("0")), Some(DiscountBand::NoDiscount));
        assert_eq!(DiscountBand::classify(dec("-0.005")), Some(DiscountBand::NoDiscount));
        assert_eq!(DiscountBand::classify(dec("0.0001")), Some(DiscountBand::Low));
        assert_eq!(DiscountBand::classify(dec("0.2")), Some(DiscountBand::Low));
        assert_eq!(DiscountBand::classify(dec("0.2001")), Some(DiscountBand::Medium));
        assert_eq!(DiscountBand::classify(dec("0.4")), Some(DiscountBand::Medium));
        assert_eq!(DiscountBand::classify(dec("0.45")), Some(DiscountBand::High));
        assert_eq!(DiscountBand::classify(dec("1")), Some(DiscountBand::High));
    }

    #[test]
    fn out_of_range_discounts_have_no_band() {
        assert_eq!(DiscountBand::classify(dec("-0.01")), None);
        assert_eq!(DiscountBand::classify(dec("-0.5")), None);
        assert_eq!(DiscountBand::classify(dec("1.0001")), None);
    }

    #[test]
    fn margin_short_circuits_on_zero_sales() {
        assert_eq!(profit_margin(dec("-40"), Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(profit_margin(dec("50"), dec("500")), Some(dec("0.1")));
        assert_eq!(profit_margin(dec("-25"), dec("100")), Some(dec("-0.25")));
    }

    #[test]
    fn overflowing_margin_is_missing_not_zero() {
        assert_eq!(profit_margin(Decimal::MAX, dec("0.1")), None);
        let row = vec![
            Some(Value::Date(NaiveDate::from_ymd_opt(2021, 1, 4).unwrap())),
            Some(Value::Date(NaiveDate::from_ymd_opt(2021, 1, 9).unwrap())),
            Some(Value::Decimal(dec("0.1"))),
            Some(Value::Decimal(Decimal::MAX)),
            Some(Value::Decimal(dec("0.2"))),
        ];
        let headers = [ORDER_DATE, SHIP_DATE, SALES, PROFIT, DISCOUNT]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let (derived, _) = derive_metrics(Table::new(headers, vec![row]).unwrap()).unwrap();
        assert_eq!(derived.cell(0, PROFIT_MARGIN), None);
        assert_eq!(derived.cell(0, SHIPPING_DAYS), Some(&Value::Integer(5)));
    }

    #[test]
    fn shipping_days_floor_partial_days_and_allow_negatives() {
        assert_eq!(shipping_days(at(2021, 1, 4, 0), at(2021, 1, 9, 0)), 5);
        assert_eq!(shipping_days(at(2021, 1, 9, 0), at(2021, 1, 4, 0)), -5);
        assert_eq!(shipping_days(at(2021, 1, 4, 12), at(2021, 1, 5, 6)), 0);
        assert_eq!(shipping_days(at(2021, 1, 5, 6), at(2021, 1, 4, 12)), -1);
    }

    #[test]
    fn derive_replaces_existing_metric_columns() {
        let row = vec![
            Some(Value::Date(NaiveDate::from_ymd_opt(2021, 1, 4).unwrap())),
            Some(Value::Date(NaiveDate::from_ymd_opt(2021, 1, 9).unwrap())),
            Some(Value::Decimal(dec("500"))),
            Some(Value::Decimal(dec("50"))),
            Some(Value::Decimal(dec("0.2"))),
        ];
        let headers = [ORDER_DATE, SHIP_DATE, SALES, PROFIT, DISCOUNT]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let table = Table::new(headers, vec![row]).unwrap();
        let (once, report) = derive_metrics(table).unwrap();
        assert_eq!(report, MetricsReport { rows: 1, unbanded: 0 });
        let (twice, _) = derive_metrics(once.clone()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.headers().len(), 8);
        assert_eq!(twice.cell(0, SHIPPING_DAYS), Some(&Value::Integer(5)));
        assert_eq!(
            twice.cell(0, DISCOUNT_BAND),
            Some(&Value::Text("Low (≤20%)".into()))
        );
    }
}

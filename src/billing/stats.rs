//! Read-side aggregates over bills.

use crate::model::{Bill, BillStatus, PaymentStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyTotal {
    pub bills: usize,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BillStats {
    /// Sum of final amounts over paid bills.
    pub total_revenue: Decimal,
    pub paid_bills: usize,
    pub open_bills: usize,
    pub refunded_bills: usize,
    /// Paid bills grouped by the day they were paid.
    pub daily: BTreeMap<NaiveDate, DailyTotal>,
}

pub fn summarize(bills: &[Bill]) -> BillStats {
    let mut stats = BillStats::default();
    for bill in bills {
        if bill.status == BillStatus::Open {
            stats.open_bills += 1;
        }
        match bill.payment_status {
            PaymentStatus::Paid => {
                stats.paid_bills += 1;
                stats.total_revenue += bill.final_amount;
                let day = bill.paid_at.unwrap_or(bill.created_at).date_naive();
                let daily = stats.daily.entry(day).or_default();
                daily.bills += 1;
                daily.revenue += bill.final_amount;
            }
            PaymentStatus::Refunded => stats.refunded_bills += 1,
            PaymentStatus::Pending => {}
        }
    }
    stats
}

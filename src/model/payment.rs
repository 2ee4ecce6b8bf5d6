//! Payments recorded against a bill.

use crate::model::{BillId, PaymentId, RecordViolation};
use chrono::{DateTime, Utc};
use record_store::Record;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// Status of a single payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl SettlementStatus {
    fn can_move_to(self, target: SettlementStatus) -> bool {
        matches!(
            (self, target),
            (SettlementStatus::Pending, SettlementStatus::Completed)
                | (SettlementStatus::Pending, SettlementStatus::Failed)
                | (SettlementStatus::Completed, SettlementStatus::Refunded)
        )
    }
}

impl Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SettlementStatus::Pending => "Pending",
            SettlementStatus::Completed => "Completed",
            SettlementStatus::Failed => "Failed",
            SettlementStatus::Refunded => "Refunded",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub bill_id: BillId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub bill_id: BillId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum PaymentFilter {
    Id(PaymentId),
    Bill(BillId),
    BillWithStatus(BillId, SettlementStatus),
}

#[derive(Debug, Clone)]
pub struct PaymentPatch {
    pub status: SettlementStatus,
    pub at: DateTime<Utc>,
}

impl Record for Payment {
    type Id = PaymentId;
    type New = NewPayment;
    type Filter = PaymentFilter;
    type Patch = PaymentPatch;
    type Error = RecordViolation;

    fn from_insert(id: PaymentId, new: NewPayment) -> Result<Self, RecordViolation> {
        if new.amount.is_sign_negative() && !new.amount.is_zero() {
            return Err(RecordViolation::NegativeAmount(new.amount));
        }
        Ok(Self {
            id,
            bill_id: new.bill_id,
            amount: new.amount,
            method: new.method,
            status: SettlementStatus::Pending,
            created_at: new.created_at,
            updated_at: new.created_at,
        })
    }

    fn matches(&self, filter: &PaymentFilter) -> bool {
        match filter {
            PaymentFilter::Id(id) => self.id == *id,
            PaymentFilter::Bill(bill_id) => self.bill_id == *bill_id,
            PaymentFilter::BillWithStatus(bill_id, status) => {
                self.bill_id == *bill_id && self.status == *status
            }
        }
    }

    fn apply_patch(&mut self, patch: &PaymentPatch) -> Result<(), RecordViolation> {
        if !self.status.can_move_to(patch.status) {
            return Err(RecordViolation::PaymentTransition(
                self.id,
                self.status,
                patch.status,
            ));
        }
        self.status = patch.status;
        self.updated_at = patch.at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_transitions() {
        let now = Utc::now();
        let mut payment = Payment::from_insert(
            PaymentId(1),
            NewPayment {
                bill_id: BillId(1),
                amount: Decimal::from(295),
                method: PaymentMethod::Card,
                created_at: now,
            },
        )
        .unwrap();

        let refund = PaymentPatch {
            status: SettlementStatus::Refunded,
            at: now,
        };
        assert_eq!(
            payment.apply_patch(&refund),
            Err(RecordViolation::PaymentTransition(
                PaymentId(1),
                SettlementStatus::Pending,
                SettlementStatus::Refunded
            ))
        );

        payment
            .apply_patch(&PaymentPatch {
                status: SettlementStatus::Completed,
                at: now,
            })
            .unwrap();
        payment.apply_patch(&refund).unwrap();
        assert_eq!(payment.status, SettlementStatus::Refunded);
    }
}

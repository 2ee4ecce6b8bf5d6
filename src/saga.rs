//! # Saga Step Policy
//!
//! The store has no cross-record transactions, so every multi-step workflow runs forward
//! only. Each named [`Step`] is classified once, in [`Step::criticality`]:
//!
//! - **Critical** steps abort the workflow. Their error is escalated (creating the order
//!   becomes `OrderCreationFailed`, settling the bill becomes `PaymentFailed`) and
//!   propagated to the caller.
//! - **Auxiliary** steps are logged at `warn`, recorded as a [`PartialFailure`], and the
//!   workflow continues.
//!
//! A finished workflow returns a [`SagaOutcome`]: the primary result plus the warnings,
//! so a caller can tell "done, but the kitchen may not have been told" from "not done".

use crate::error::Error;
use serde::Serialize;
use std::fmt::Display;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    Critical,
    Auxiliary,
}

/// Every step of every workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    // start_session
    OpenSession,
    OccupyTable,
    // place_order / link_to_session / cancel_order
    CreateOrder,
    ResolveSession,
    EnsureSessionBill,
    LinkOrder,
    RelinkOrder,
    CreateItems,
    RecalculateBill,
    NotifyNewOrder,
    CancelOrder,
    // advance_item
    WriteItemStatus,
    NotifyOrderReady,
    CompleteOrder,
    BillServedOrder,
    // pay_and_close / refund
    OpenPayment,
    SettleBill,
    FailPayment,
    ConfirmPayment,
    CloseSession,
    ReleaseTable,
    RefundBill,
    RefundPayment,
}

impl Step {
    pub fn criticality(self) -> Criticality {
        use Criticality::*;
        match self {
            Step::OpenSession => Critical,
            Step::OccupyTable => Critical,
            Step::CreateOrder => Critical,
            Step::ResolveSession => Auxiliary,
            Step::EnsureSessionBill => Auxiliary,
            Step::LinkOrder => Auxiliary,
            Step::RelinkOrder => Critical,
            Step::CreateItems => Auxiliary,
            Step::RecalculateBill => Auxiliary,
            Step::NotifyNewOrder => Auxiliary,
            Step::CancelOrder => Critical,
            Step::WriteItemStatus => Critical,
            Step::NotifyOrderReady => Auxiliary,
            Step::CompleteOrder => Auxiliary,
            Step::BillServedOrder => Auxiliary,
            Step::OpenPayment => Auxiliary,
            Step::SettleBill => Critical,
            Step::FailPayment => Auxiliary,
            Step::ConfirmPayment => Auxiliary,
            Step::CloseSession => Auxiliary,
            Step::ReleaseTable => Critical,
            Step::RefundBill => Critical,
            Step::RefundPayment => Auxiliary,
        }
    }

    /// Maps a critical step's failure to the error the caller sees.
    fn escalate(self, error: Error) -> Error {
        match self {
            Step::CreateOrder => Error::OrderCreationFailed(error.to_string()),
            Step::SettleBill => Error::PaymentFailed(error.to_string()),
            _ => error,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::OpenSession => "open_session",
            Step::OccupyTable => "occupy_table",
            Step::CreateOrder => "create_order",
            Step::ResolveSession => "resolve_session",
            Step::EnsureSessionBill => "ensure_session_bill",
            Step::LinkOrder => "link_order",
            Step::RelinkOrder => "relink_order",
            Step::CreateItems => "create_items",
            Step::RecalculateBill => "recalculate_bill",
            Step::NotifyNewOrder => "notify_new_order",
            Step::CancelOrder => "cancel_order",
            Step::WriteItemStatus => "write_item_status",
            Step::NotifyOrderReady => "notify_order_ready",
            Step::CompleteOrder => "complete_order",
            Step::BillServedOrder => "bill_served_order",
            Step::OpenPayment => "open_payment",
            Step::SettleBill => "settle_bill",
            Step::FailPayment => "fail_payment",
            Step::ConfirmPayment => "confirm_payment",
            Step::CloseSession => "close_session",
            Step::ReleaseTable => "release_table",
            Step::RefundBill => "refund_bill",
            Step::RefundPayment => "refund_payment",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An auxiliary step that did not happen while the workflow as a whole succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialFailure {
    pub saga: &'static str,
    pub step: Step,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SagaOutcome<T> {
    pub value: T,
    pub warnings: Vec<PartialFailure>,
}

impl<T> SagaOutcome<T> {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warned(&self, step: Step) -> bool {
        self.warnings.iter().any(|w| w.step == step)
    }
}

/// Collects the warnings of one workflow run and applies the step table to each result.
#[derive(Debug)]
pub struct SagaLog {
    saga: &'static str,
    warnings: Vec<PartialFailure>,
}

impl SagaLog {
    pub fn new(saga: &'static str) -> Self {
        Self {
            saga,
            warnings: Vec::new(),
        }
    }

    /// Applies the step's criticality: critical failures are escalated and returned,
    /// auxiliary failures are recorded and turn into `Ok(None)`.
    pub fn settle<T>(&mut self, step: Step, result: Result<T, Error>) -> Result<Option<T>, Error> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) => match step.criticality() {
                Criticality::Critical => Err(self.abort(step, e)),
                Criticality::Auxiliary => {
                    self.warn(step, e.to_string());
                    Ok(None)
                }
            },
        }
    }

    /// For a step whose value the rest of the workflow cannot do without.
    pub fn critical<T>(&mut self, step: Step, result: Result<T, Error>) -> Result<T, Error> {
        debug_assert_eq!(step.criticality(), Criticality::Critical, "{step}");
        result.map_err(|e| self.abort(step, e))
    }

    /// For a step the workflow can continue without.
    pub fn auxiliary<T>(&mut self, step: Step, result: Result<T, Error>) -> Option<T> {
        debug_assert_eq!(step.criticality(), Criticality::Auxiliary, "{step}");
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.warn(step, e.to_string());
                None
            }
        }
    }

    /// Records a soft notice that did not come from an error, e.g. "no session yet".
    pub fn warn(&mut self, step: Step, message: impl Into<String>) {
        let message = message.into();
        warn!(saga = self.saga, %step, error = %message, "Auxiliary step failed");
        self.warnings.push(PartialFailure {
            saga: self.saga,
            step,
            message,
        });
    }

    /// Logs and escalates a critical failure.
    pub fn abort(&self, step: Step, e: Error) -> Error {
        error!(saga = self.saga, %step, error = %e, "Critical step failed");
        step.escalate(e)
    }

    pub fn finish<T>(self, value: T) -> SagaOutcome<T> {
        SagaOutcome {
            value,
            warnings: self.warnings,
        }
    }
}

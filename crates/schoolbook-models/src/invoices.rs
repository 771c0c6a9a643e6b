//! Invoice (tuition and fee billing) models and DTOs.

use crate::ids::{InvoiceId, StudentId};
use crate::resource::{ResourceKind, impl_resource};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub student_id: StudentId,
    /// Amount in minor currency units (cents)
    pub amount: i64,
    pub currency: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Pending invoices past their due date.
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Pending && self.due_date < today
    }

    /// Amount formatted with two decimals, e.g. `125.50 USD`.
    pub fn display_amount(&self) -> String {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, self.currency)
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateInvoiceDto {
    pub student_id: StudentId,
    #[validate(range(min = 0))]
    pub amount: i64,
    #[validate(length(equal = 3))]
    pub currency: String,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdateInvoiceDto {
    #[validate(range(min = 0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[validate(length(equal = 3))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl_resource!(
    Invoice,
    InvoiceId,
    CreateInvoiceDto,
    UpdateInvoiceDto,
    ResourceKind::Invoice
);

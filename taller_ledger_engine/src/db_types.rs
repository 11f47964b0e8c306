use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use tlr_common::Money;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------      TenantId       ---------------------------------------------------------
/// A lightweight wrapper around a string identifying the workshop that owns a row.
///
/// Every query in the engine is scoped by tenant id. Rows belonging to one tenant are invisible
/// to every other tenant, including sequence counters and cash sessions.
#[derive(Clone, Debug, Type, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TenantId(pub String);

impl Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for TenantId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    DocumentType     ---------------------------------------------------------
/// The kind of document a sequence counter hands out numbers for.
///
/// Each kind runs its own independent series per tenant and emission point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum DocumentType {
    Invoice,
    CreditNote,
    Order,
    Sale,
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentType::Invoice => write!(f, "Invoice"),
            DocumentType::CreditNote => write!(f, "CreditNote"),
            DocumentType::Order => write!(f, "Order"),
            DocumentType::Sale => write!(f, "Sale"),
        }
    }
}

impl FromStr for DocumentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Invoice" => Ok(Self::Invoice),
            "CreditNote" => Ok(Self::CreditNote),
            "Order" => Ok(Self::Order),
            "Sale" => Ok(Self::Sale),
            s => Err(ConversionError(format!("Invalid document type: {s}"))),
        }
    }
}

//--------------------------------------    SequenceKey      ---------------------------------------------------------
/// Identifies one sequence counter. Two allocations with the same key always draw from the same
/// monotonically increasing series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceKey {
    pub tenant_id: TenantId,
    pub doc_type: DocumentType,
    /// Establishment code, e.g. "001" for a fiscal point of sale
    pub establishment: String,
    /// Emission point code within the establishment, e.g. "001"
    pub emission_point: String,
}

impl SequenceKey {
    pub fn new<T: Into<TenantId>>(
        tenant_id: T,
        doc_type: DocumentType,
        establishment: &str,
        emission_point: &str,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            doc_type,
            establishment: establishment.to_string(),
            emission_point: emission_point.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tenant_id.as_str().trim().is_empty() {
            return Err("tenant id must not be empty".to_string());
        }
        if self.establishment.trim().is_empty() {
            return Err("establishment code must not be empty".to_string());
        }
        if self.emission_point.trim().is_empty() {
            return Err("emission point code must not be empty".to_string());
        }
        Ok(())
    }
}

impl Display for SequenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}-{}", self.tenant_id, self.doc_type, self.establishment, self.emission_point)
    }
}

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
/// How far along an order is towards being fully paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No payments have been recorded against the order.
    Pending,
    /// At least one payment exists, but the running total is short of the final cost.
    Partial,
    /// The running total covers the final cost. Overpayment also lands here.
    Paid,
}

impl PaymentStatus {
    /// Derives the status an order should carry given the sum of its payments and its final cost.
    ///
    /// An order only counts as `Paid` when there was something to collect in the first place;
    /// a zero-cost order stays `Pending` regardless of what has been recorded against it.
    pub fn derive(total_paid: Money, final_cost: Money) -> Self {
        if total_paid >= final_cost && final_cost.is_positive() {
            PaymentStatus::Paid
        } else if total_paid.is_positive() && total_paid < final_cost {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Partial => write!(f, "Partial"),
            PaymentStatus::Paid => write!(f, "Paid"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Partial" => Ok(Self::Partial),
            "Paid" => Ok(Self::Paid),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentMethod     ---------------------------------------------------------
/// How a payment was tendered. Only `Cash` interacts with the cash register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Other,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Transfer => write!(f, "Transfer"),
            PaymentMethod::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(Self::Cash),
            "Transfer" => Ok(Self::Transfer),
            "Other" => Ok(Self::Other),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------   SessionStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SessionStatus {
    Open,
    Closed,
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Open => write!(f, "Open"),
            SessionStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Closed" => Ok(Self::Closed),
            s => Err(ConversionError(format!("Invalid session status: {s}"))),
        }
    }
}

//--------------------------------------   MovementKind      ---------------------------------------------------------
/// The direction of a cash drawer movement. Amounts are always positive; the kind carries
/// the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum MovementKind {
    Inflow,
    Outflow,
}

impl Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementKind::Inflow => write!(f, "Inflow"),
            MovementKind::Outflow => write!(f, "Outflow"),
        }
    }
}

impl FromStr for MovementKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Inflow" => Ok(Self::Inflow),
            "Outflow" => Ok(Self::Outflow),
            s => Err(ConversionError(format!("Invalid movement kind: {s}"))),
        }
    }
}

//--------------------------------------       Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub tenant_id: TenantId,
    /// The formatted display number, e.g. "001-001-000000042"
    pub order_number: String,
    pub final_cost: Money,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub tenant_id: TenantId,
    /// Establishment code for the order number series
    pub establishment: String,
    /// Emission point code for the order number series
    pub emission_point: String,
    /// The total price the customer owes for the order
    pub final_cost: Money,
}

impl NewOrder {
    pub fn new<T: Into<TenantId>>(tenant_id: T, establishment: &str, emission_point: &str, final_cost: Money) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            establishment: establishment.to_string(),
            emission_point: emission_point.to_string(),
            final_cost,
        }
    }
}

//--------------------------------------      Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub tenant_id: TenantId,
    /// Internal id of the order this payment settles (partially or fully)
    pub order_id: i64,
    pub amount: Money,
    pub method: PaymentMethod,
    /// Free-form external reference, e.g. a bank transfer number
    pub reference: Option<String>,
    /// The operator who keyed in the payment
    pub recorded_by: Option<String>,
    /// The cash movement this payment produced, if the drawer was open when it was recorded
    pub movement_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     NewPayment      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub tenant_id: TenantId,
    pub order_id: i64,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub recorded_by: Option<String>,
}

impl NewPayment {
    pub fn new<T: Into<TenantId>>(tenant_id: T, order_id: i64, amount: Money, method: PaymentMethod) -> Self {
        Self { tenant_id: tenant_id.into(), order_id, amount, method, reference: None, recorded_by: None }
    }

    pub fn with_reference(mut self, reference: String) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_recorded_by(mut self, operator_id: String) -> Self {
        self.recorded_by = Some(operator_id);
        self
    }
}

//--------------------------------------    CashSession      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CashSession {
    pub id: i64,
    pub tenant_id: TenantId,
    pub operator_id: String,
    pub status: SessionStatus,
    /// The float counted into the drawer when the session opened
    pub opening_balance: Money,
    /// The amount the operator counted when closing. Stored verbatim, whether or not it
    /// matches the expected balance.
    pub closing_balance: Option<Money>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashSession {
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

//--------------------------------------   NewCashSession    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewCashSession {
    pub tenant_id: TenantId,
    pub operator_id: String,
    pub opening_balance: Money,
}

impl NewCashSession {
    pub fn new<T: Into<TenantId>>(tenant_id: T, operator_id: &str, opening_balance: Money) -> Self {
        Self { tenant_id: tenant_id.into(), operator_id: operator_id.to_string(), opening_balance }
    }
}

//--------------------------------------    CashMovement     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CashMovement {
    pub id: i64,
    pub session_id: i64,
    pub kind: MovementKind,
    pub amount: Money,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    /// The signed effect of this movement on the drawer balance.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            MovementKind::Inflow => self.amount,
            MovementKind::Outflow => -self.amount,
        }
    }
}

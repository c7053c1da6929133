use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use hood_common::Paise;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

pub type Roles = Vec<Role>;

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------        User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn roles(&self) -> Roles {
        if self.is_admin {
            vec![Role::User, Role::Admin]
        } else {
            vec![Role::User]
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub is_admin: bool,
}

//--------------------------------------      Category        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Category {
    Men,
    Women,
    Footwear,
    Accessories,
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Men => write!(f, "Men"),
            Category::Women => write!(f, "Women"),
            Category::Footwear => write!(f, "Footwear"),
            Category::Accessories => write!(f, "Accessories"),
        }
    }
}

impl FromStr for Category {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Men" => Ok(Self::Men),
            "Women" => Ok(Self::Women),
            "Footwear" => Ok(Self::Footwear),
            "Accessories" => Ok(Self::Accessories),
            s => Err(ConversionError(format!("Invalid category: {s}"))),
        }
    }
}

//--------------------------------------       Product        ---------------------------------------------------------
pub const DEFAULT_SIZE: &str = "One Size";

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Paise,
    pub category: Category,
    pub images: Json<Vec<String>>,
    pub badge: Option<String>,
    pub description: Option<String>,
    pub stock: i64,
    pub sizes: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Paise,
    pub category: Category,
    #[serde(default)]
    pub images: Vec<String>,
    pub badge: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Paise, category: Category) -> Self {
        Self {
            name: name.into(),
            price,
            category,
            images: vec![],
            badge: None,
            description: None,
            stock: 0,
            sizes: vec![DEFAULT_SIZE.to_string()],
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_sizes<S: Into<String>>(mut self, sizes: impl IntoIterator<Item = S>) -> Self {
        self.sizes = sizes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_images<S: Into<String>>(mut self, images: impl IntoIterator<Item = S>) -> Self {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_badge<S: Into<String>>(mut self, badge: S) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the catalog invariants and fills in the default size set when none is given.
    pub fn validated(mut self) -> Result<Self, ConversionError> {
        if self.name.trim().is_empty() {
            return Err(ConversionError("Product name is required".into()));
        }
        if self.price.value() < 0 {
            return Err(ConversionError(format!("Product price cannot be negative: {}", self.price)));
        }
        if self.stock < 0 {
            return Err(ConversionError(format!("Product stock cannot be negative: {}", self.stock)));
        }
        if self.sizes.is_empty() {
            self.sizes = vec![DEFAULT_SIZE.to_string()];
        }
        Ok(self)
    }
}

//--------------------------------------       Cart           ---------------------------------------------------------
pub const DEFAULT_CART_SIZE: &str = "M";
/// Upper bound on the quantity of a single cart or order line.
pub const MAX_LINE_QUANTITY: i64 = 100;

/// The subset of product fields that is shown alongside each cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: i64,
    pub name: String,
    pub price: Paise,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
    pub size: String,
    /// `None` when the product has been removed from the catalog since it was added.
    pub product: Option<ProductSnapshot>,
}

impl CartLine {
    /// Price times quantity. `None` if the product is gone or the total does not fit.
    pub fn line_total(&self) -> Option<Paise> {
        self.product.as_ref().and_then(|p| p.price.checked_mul(self.quantity))
    }
}

//--------------------------------------    GatewayOrderId    ---------------------------------------------------------
/// The order id minted by the payment gateway. It is the correlation key for payment intents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct GatewayOrderId(pub String);

impl FromStr for GatewayOrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for GatewayOrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GatewayOrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for GatewayOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl GatewayOrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// A gateway order exists and the customer has not completed payment yet.
    Created,
    /// The payment was verified. Terminal.
    Success,
    /// Verification failed or the gateway reported a failure. Terminal.
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Created)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Created => write!(f, "created"),
            PaymentStatus::Success => write!(f, "success"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Created");
            PaymentStatus::Created
        })
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------      OrderItem       ---------------------------------------------------------
/// A denormalized line item. Captured from the catalog when checkout starts and never updated from it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Paise,
    pub quantity: i64,
    pub size: String,
}

impl OrderItem {
    /// Unit price times quantity, or `None` on overflow.
    pub fn line_total(&self) -> Option<Paise> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------   ShippingAddress    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Returns the names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

//--------------------------------------    PaymentIntent     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: i64,
    pub user_id: i64,
    pub gateway_order_id: GatewayOrderId,
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
    pub status: PaymentStatus,
    pub items: Json<Vec<OrderItem>>,
    pub shipping_address: Option<Json<ShippingAddress>>,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub user_id: i64,
    pub gateway_order_id: GatewayOrderId,
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<ShippingAddress>,
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderPaymentStatus {
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub items: Json<Vec<OrderItem>>,
    pub shipping_address: Option<Json<ShippingAddress>>,
    pub total_amount: Paise,
    pub payment_status: OrderPaymentStatus,
    pub payment_order_id: GatewayOrderId,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Refund        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: i64,
    pub refund_id: String,
    pub payment_id: String,
    pub amount: Paise,
    pub status: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRefund {
    pub refund_id: String,
    pub payment_id: String,
    pub amount: Paise,
    pub status: String,
    pub reason: Option<String>,
}

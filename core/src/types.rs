//! Domain types for the decant storefront.
//!
//! Value objects, entities, and enums shared by the catalog, order, and
//! payment components. Wire names (serde) keep the Spanish field values the
//! storefront API has always spoken; Rust identifiers are English.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of the optional customer notes on an order.
pub const MAX_CUSTOMER_NOTES_LEN: usize = 500;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Creates a new random `ProductId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ProductId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// The zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Catalog Enums
// ============================================================================

/// Decant bottle size
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volume {
    /// 2ml sample
    #[serde(rename = "2ml")]
    Ml2,
    /// 5ml decant
    #[serde(rename = "5ml")]
    Ml5,
    /// 10ml decant
    #[serde(rename = "10ml")]
    Ml10,
    /// 15ml decant
    #[serde(rename = "15ml")]
    Ml15,
    /// 20ml decant
    #[serde(rename = "20ml")]
    Ml20,
}

impl Volume {
    /// Parse a wire value (e.g. `"5ml"`)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "2ml" => Some(Self::Ml2),
            "5ml" => Some(Self::Ml5),
            "10ml" => Some(Self::Ml10),
            "15ml" => Some(Self::Ml15),
            "20ml" => Some(Self::Ml20),
            _ => None,
        }
    }

    /// Wire representation (e.g. `"5ml"`)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ml2 => "2ml",
            Self::Ml5 => "5ml",
            Self::Ml10 => "10ml",
            Self::Ml15 => "15ml",
            Self::Ml20 => "20ml",
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seasonal catalog category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Spring fragrances
    #[serde(rename = "primavera")]
    Primavera,
    /// Summer fragrances
    #[serde(rename = "verano")]
    Verano,
    /// Autumn fragrances
    #[serde(rename = "otoño")]
    Otono,
    /// Winter fragrances
    #[serde(rename = "invierno")]
    Invierno,
}

impl Category {
    /// Parse a wire value (lowercase Spanish)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "primavera" => Some(Self::Primavera),
            "verano" => Some(Self::Verano),
            "otoño" => Some(Self::Otono),
            "invierno" => Some(Self::Invierno),
            _ => None,
        }
    }

    /// Wire representation (lowercase Spanish)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primavera => "primavera",
            Self::Verano => "verano",
            Self::Otono => "otoño",
            Self::Invierno => "invierno",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target gender of a fragrance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    /// Marketed for men
    #[serde(rename = "masculino")]
    Masculino,
    /// Marketed for women
    #[serde(rename = "femenino")]
    Femenino,
    /// Unisex
    #[default]
    #[serde(rename = "unisex")]
    Unisex,
}

impl Gender {
    /// Parse a wire value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "masculino" => Some(Self::Masculino),
            "femenino" => Some(Self::Femenino),
            "unisex" => Some(Self::Unisex),
            _ => None,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Masculino => "masculino",
            Self::Femenino => "femenino",
            Self::Unisex => "unisex",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Order Enums
// ============================================================================

/// Order lifecycle status.
///
/// Wire values are the Spanish strings the storefront has always used.
/// `Cancelled` and `Delivered` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created, awaiting payment
    #[serde(rename = "pendiente")]
    Pending,
    /// Payment confirmed
    #[serde(rename = "pagado")]
    Paid,
    /// Being prepared
    #[serde(rename = "procesando")]
    Processing,
    /// Handed to the courier
    #[serde(rename = "enviado")]
    Shipped,
    /// Received by the customer
    #[serde(rename = "entregado")]
    Delivered,
    /// Cancelled; stock has been returned
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl OrderStatus {
    /// All recognized wire values, in lifecycle order.
    pub const WIRE_VALUES: [&'static str; 6] = [
        "pendiente",
        "pagado",
        "procesando",
        "enviado",
        "entregado",
        "cancelado",
    ];

    /// Parse a wire value. Returns `None` for anything outside the six
    /// recognized states.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pendiente" => Some(Self::Pending),
            "pagado" => Some(Self::Paid),
            "procesando" => Some(Self::Processing),
            "enviado" => Some(Self::Shipped),
            "entregado" => Some(Self::Delivered),
            "cancelado" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Paid => "pagado",
            Self::Processing => "procesando",
            Self::Shipped => "enviado",
            Self::Delivered => "entregado",
            Self::Cancelled => "cancelado",
        }
    }

    /// Whether no further transitions may leave this status
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment processor selected at checkout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// `MercadoPago` checkout
    #[default]
    #[serde(rename = "mercadopago")]
    Mercadopago,
    /// Flow checkout
    #[serde(rename = "flow")]
    Flow,
}

impl PaymentMethod {
    /// Parse a wire value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mercadopago" => Some(Self::Mercadopago),
            "flow" => Some(Self::Flow),
            _ => None,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mercadopago => "mercadopago",
            Self::Flow => "flow",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Domain Entities
// ============================================================================

/// Product entity in the catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Fragrance house
    pub brand: String,
    /// Marketing description
    pub description: String,
    /// Decant size
    pub volume: Volume,
    /// Unit price
    pub price: Money,
    /// Units on hand. Never negative; mutated only through the store's
    /// conditional `reserve`/`restock`/`adjust_stock` operations.
    pub stock: u32,
    /// Image URL paths
    pub images: Vec<String>,
    /// Seasonal category
    pub category: Category,
    /// Target gender
    pub gender: Gender,
    /// Whether the product is purchasable and publicly listed
    pub active: bool,
    /// Cumulative units sold; decremented when orders are cancelled
    pub sales: u32,
    /// When the product was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// A product is purchasable when it is active and has enough stock.
    #[must_use]
    pub const fn is_available(&self, quantity: u32) -> bool {
        self.active && self.stock >= quantity
    }
}

/// One product-quantity pair within an order.
///
/// Name, price, and volume are snapshots captured at placement time; they are
/// never re-derived from the live catalog, so history survives later price
/// changes or product deletion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product reference (historical; the product may no longer exist)
    pub product_id: ProductId,
    /// Product name at placement time
    pub name: String,
    /// Unit price at placement time
    pub price: Money,
    /// Decant size at placement time
    pub volume: Volume,
    /// Units ordered (at least 1)
    pub quantity: u32,
    /// `price × quantity`, computed at placement time
    pub subtotal: Money,
}

/// Shipping address with all fields required
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street and number
    pub street: String,
    /// City
    pub city: String,
    /// Region or state
    pub region: String,
    /// Postal code
    pub postal_code: String,
}

impl ShippingAddress {
    /// All four fields must be non-empty (ignoring surrounding whitespace).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.street.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.region.trim().is_empty()
            && !self.postal_code.trim().is_empty()
    }
}

/// Order entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier
    pub id: OrderId,
    /// Owning user (read-only relation)
    pub user_id: UserId,
    /// Line items, in the order the customer supplied them
    pub items: Vec<LineItem>,
    /// Sum of line subtotals, fixed at creation
    pub total: Money,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// Payment processor selected at checkout
    pub payment_method: PaymentMethod,
    /// Reference assigned by the payment gateway, once known
    pub payment_ref: Option<String>,
    /// Where to ship
    pub shipping_address: ShippingAddress,
    /// Optional customer notes (bounded length)
    pub customer_notes: Option<String>,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Recomputes the total from the line-item subtotals.
    ///
    /// Used by tests and consistency checks; the stored `total` is fixed at
    /// creation and must always equal this sum.
    #[must_use]
    pub fn computed_total(&self) -> Option<Money> {
        self.items
            .iter()
            .try_fold(Money::ZERO, |acc, item| acc.checked_add(item.subtotal))
    }
}

// ============================================================================
// Actors
// ============================================================================

/// Role attached to an authenticated caller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Regular customer
    #[serde(rename = "cliente")]
    Customer,
    /// Store administrator
    #[serde(rename = "admin")]
    Admin,
}

/// An authenticated caller, as seen by the domain services
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    /// The caller's user id
    pub user_id: UserId,
    /// The caller's role
    pub role: Role,
}

impl Actor {
    /// Creates a customer actor
    #[must_use]
    pub const fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    /// Creates an admin actor
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Whether this actor holds the admin role
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Owner-or-admin check used by order reads and cancellation
    #[must_use]
    pub fn may_access(&self, order: &Order) -> bool {
        self.is_admin() || self.user_id == order.user_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_checked_multiply_overflows_to_none() {
        let price = Money::from_cents(u64::MAX);
        assert_eq!(price.checked_multiply(2), None);
        assert_eq!(Money::from_cents(500).checked_multiply(3).unwrap().cents(), 1500);
    }

    #[test]
    fn money_display_renders_cents() {
        assert_eq!(Money::from_cents(123_450).to_string(), "$1234.50");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }

    #[test]
    fn order_status_parses_only_wire_values() {
        for value in OrderStatus::WIRE_VALUES {
            assert!(OrderStatus::parse(value).is_some());
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
        assert_eq!(OrderStatus::parse("PENDIENTE"), None);
        assert_eq!(OrderStatus::parse(""), None);
    }

    #[test]
    fn order_status_serde_uses_spanish_wire_values() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"enviado\"");
        let back: OrderStatus = serde_json::from_str("\"cancelado\"").unwrap();
        assert_eq!(back, OrderStatus::Cancelled);
    }

    #[test]
    fn shipping_address_requires_all_fields() {
        let complete = ShippingAddress {
            street: "Av. Providencia 1234".to_string(),
            city: "Santiago".to_string(),
            region: "RM".to_string(),
            postal_code: "7500000".to_string(),
        };
        assert!(complete.is_complete());

        let incomplete = ShippingAddress {
            postal_code: "  ".to_string(),
            ..complete
        };
        assert!(!incomplete.is_complete());
    }

    #[test]
    fn product_availability_gate() {
        let product = sample_product(3, true);
        assert!(product.is_available(3));
        assert!(!product.is_available(4));
        let inactive = sample_product(3, false);
        assert!(!inactive.is_available(1));
    }

    fn sample_product(stock: u32, active: bool) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: "Oud Wood".to_string(),
            brand: "Tom Ford".to_string(),
            description: "Smoky oud".to_string(),
            volume: Volume::Ml5,
            price: Money::from_cents(12_000),
            stock,
            images: vec![],
            category: Category::Invierno,
            gender: Gender::Unisex,
            active,
            sales: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

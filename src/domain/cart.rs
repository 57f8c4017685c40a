use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// The slice of a vehicle a cart needs to render and submit an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRef {
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<BigDecimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl VehicleRef {
    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingType {
    Reservation,
    TestDrive,
}

impl BookingType {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingType::Reservation => "RESERVATION",
            BookingType::TestDrive => "TEST_DRIVE",
        }
    }

    /// Only test drives need a date and a time slot.
    pub fn needs_schedule(self) -> bool {
        matches!(self, BookingType::TestDrive)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub vehicle: VehicleRef,
    #[serde(rename = "type")]
    pub kind: BookingType,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(vehicle: VehicleRef, kind: BookingType, added_at: DateTime<Utc>) -> Self {
        let id = format!(
            "{}-{}-{}",
            vehicle.id,
            kind.as_str(),
            added_at.timestamp_millis()
        );
        Self {
            id,
            vehicle,
            kind,
            added_at,
        }
    }
}

/// Scheduling details for one cart item, keyed by `CartItem::id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetail {
    pub date: Option<NaiveDate>,
    #[serde(default, with = "hhmm")]
    pub time: Option<NaiveTime>,
    pub notes: Option<String>,
}

impl BookingDetail {
    pub fn is_scheduled(&self) -> bool {
        self.date.is_some() && self.time.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferredContact {
    #[default]
    Email,
    Phone,
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub preferred_contact: PreferredContact,
    pub financing_needed: bool,
    pub interested_in_trade: bool,
    pub timeline: Option<String>,
    pub budget_range: Option<String>,
    pub comments: Option<String>,
}

impl CustomerInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    Add {
        vehicle: VehicleRef,
        kind: BookingType,
        at: DateTime<Utc>,
    },
    Remove {
        item_id: String,
    },
    Clear,
}

/// Selected vehicles and what the customer wants to do with each.
///
/// Duplicate `(vehicle, kind)` pairs are not rejected here; callers use
/// [`Cart::contains`] to disable the add control instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn reduce(mut self, action: CartAction) -> Self {
        match action {
            CartAction::Add { vehicle, kind, at } => {
                self.items.push(CartItem::new(vehicle, kind, at));
            }
            CartAction::Remove { item_id } => self.items.retain(|item| item.id != item_id),
            CartAction::Clear => self.items.clear(),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, vehicle_id: &str, kind: BookingType) -> bool {
        self.items
            .iter()
            .any(|item| item.vehicle.id == vehicle_id && item.kind == kind)
    }

    pub fn get(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn count_of(&self, kind: BookingType) -> usize {
        self.items.iter().filter(|item| item.kind == kind).count()
    }
}

/// `HH:MM` wire format for optional booking times.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.serialize_str(&t.format(FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveTime::parse_from_str(s, FORMAT)
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

//! Four-step checkout wizard over the cart.
//!
//! All transitions go through [`CheckoutState::reduce`]; the only network
//! side effect (submission) lives in `application::checkout_service`.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::cart::{
    hhmm, BookingDetail, BookingType, Cart, CartAction, CustomerInfo, VehicleRef,
};
use super::errors::ValidationError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s().-]{10,}$").expect("phone pattern is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckoutStep {
    #[default]
    Review = 1,
    Schedule = 2,
    Information = 3,
    Complete = 4,
}

impl CheckoutStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            CheckoutStep::Review => "Review Cart",
            CheckoutStep::Schedule => "Schedule",
            CheckoutStep::Information => "Your Information",
            CheckoutStep::Complete => "Complete",
        }
    }

    fn next(self) -> Self {
        match self {
            CheckoutStep::Review => CheckoutStep::Schedule,
            CheckoutStep::Schedule => CheckoutStep::Information,
            CheckoutStep::Information | CheckoutStep::Complete => CheckoutStep::Complete,
        }
    }

    fn previous(self) -> Self {
        match self {
            CheckoutStep::Review | CheckoutStep::Schedule => CheckoutStep::Review,
            CheckoutStep::Information => CheckoutStep::Schedule,
            CheckoutStep::Complete => CheckoutStep::Complete,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutAction {
    AddItem {
        vehicle: VehicleRef,
        kind: BookingType,
        at: DateTime<Utc>,
    },
    RemoveItem {
        item_id: String,
    },
    SetBookingDetail {
        item_id: String,
        detail: BookingDetail,
    },
    UpdateCustomer(CustomerInfo),
    Next,
    Back,
    SubmitStarted,
    SubmitSucceeded(CheckoutResult),
    SubmitFailed(Vec<String>),
    /// The submission was abandoned before a reply arrived.
    SubmitAborted,
    ClearCart,
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutState {
    pub step: CheckoutStep,
    pub cart: Cart,
    pub bookings: HashMap<String, BookingDetail>,
    pub customer: CustomerInfo,
    pub errors: Vec<String>,
    pub is_submitting: bool,
    pub result: Option<CheckoutResult>,
}

impl CheckoutState {
    pub fn reduce(mut self, action: CheckoutAction) -> Self {
        let complete = self.step == CheckoutStep::Complete;
        match action {
            CheckoutAction::AddItem { vehicle, kind, at } if !complete => {
                self.cart = self.cart.reduce(CartAction::Add { vehicle, kind, at });
            }
            CheckoutAction::RemoveItem { item_id } if !complete => {
                self.bookings.remove(&item_id);
                self.cart = self.cart.reduce(CartAction::Remove { item_id });
                if self.cart.is_empty() && self.step != CheckoutStep::Review {
                    log::debug!("cart emptied on {:?}, returning to review", self.step);
                    self.step = CheckoutStep::Review;
                    self.errors.clear();
                }
            }
            CheckoutAction::SetBookingDetail { item_id, detail } => {
                if self.step == CheckoutStep::Schedule && self.cart.get(&item_id).is_some() {
                    self.bookings.insert(item_id, detail);
                } else {
                    log::debug!("ignoring booking detail for {item_id} on {:?}", self.step);
                }
            }
            CheckoutAction::UpdateCustomer(info) if !complete => self.customer = info,
            CheckoutAction::Next => match self.step {
                CheckoutStep::Review | CheckoutStep::Schedule => {
                    match self.validate_step(self.step) {
                        Ok(()) => {
                            self.step = self.step.next();
                            self.errors.clear();
                        }
                        Err(errors) => {
                            self.errors = errors.iter().map(ToString::to_string).collect();
                        }
                    }
                }
                // Information only advances by submitting.
                CheckoutStep::Information | CheckoutStep::Complete => {}
            },
            CheckoutAction::Back if !complete && !self.is_submitting => {
                self.step = self.step.previous();
                self.errors.clear();
            }
            CheckoutAction::SubmitStarted => {
                if self.step == CheckoutStep::Information && !self.is_submitting {
                    self.is_submitting = true;
                    self.errors.clear();
                }
            }
            CheckoutAction::SubmitSucceeded(result) => {
                self.is_submitting = false;
                self.errors.clear();
                self.result = Some(result);
                self.step = CheckoutStep::Complete;
            }
            CheckoutAction::SubmitFailed(errors) => {
                self.is_submitting = false;
                self.errors = errors;
            }
            CheckoutAction::SubmitAborted => self.is_submitting = false,
            CheckoutAction::ClearCart => {
                self.cart = self.cart.reduce(CartAction::Clear);
                self.bookings.clear();
            }
            CheckoutAction::Reset => return Self::default(),
            other => log::debug!("ignoring {other:?} on {:?}", self.step),
        }
        self
    }

    /// Whether `step` may be left going forward.
    pub fn validate_step(&self, step: CheckoutStep) -> Result<(), Vec<ValidationError>> {
        let errors = match step {
            CheckoutStep::Review => {
                if self.cart.is_empty() {
                    vec![ValidationError::EmptyCart]
                } else {
                    vec![]
                }
            }
            CheckoutStep::Schedule => self.schedule_errors(),
            CheckoutStep::Information => self.customer_errors(),
            CheckoutStep::Complete => vec![],
        };
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn is_step_valid(&self, step: CheckoutStep) -> bool {
        self.validate_step(step).is_ok()
    }

    /// With nothing in the cart the wizard shows its empty state instead of
    /// the stepper.
    pub fn shows_empty_state(&self) -> bool {
        self.cart.is_empty() && self.step != CheckoutStep::Complete
    }

    /// Format hints for the information form. These never block a step.
    pub fn advisories(&self) -> Vec<String> {
        let mut hints = Vec::new();
        let email = self.customer.email.trim();
        if !email.is_empty() && !EMAIL_RE.is_match(email) {
            hints.push("Please enter a valid email address".to_string());
        }
        let phone = self.customer.phone.trim();
        if !phone.is_empty() && !PHONE_RE.is_match(phone) {
            hints.push("Please enter a valid phone number".to_string());
        }
        hints
    }

    /// Builds the single aggregated booking request for the current cart.
    pub fn to_request(&self) -> CartCheckoutRequest {
        let items = self
            .cart
            .items
            .iter()
            .map(|item| {
                let detail = self.bookings.get(&item.id).cloned().unwrap_or_default();
                let scheduled = item.kind.needs_schedule();
                CheckoutItemRequest {
                    vehicle_id: item.vehicle.id.clone(),
                    kind: item.kind,
                    scheduled_date: detail.date.filter(|_| scheduled),
                    scheduled_time: detail.time.filter(|_| scheduled),
                    notes: detail.notes.filter(|n| !n.trim().is_empty()),
                }
            })
            .collect();
        CartCheckoutRequest {
            customer_info: self.customer.clone(),
            items,
        }
    }

    fn schedule_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for item in self.cart.items.iter().filter(|i| i.kind.needs_schedule()) {
            let detail = self.bookings.get(&item.id);
            if detail.and_then(|d| d.date).is_none() {
                errors.push(ValidationError::MissingSchedule {
                    item_id: item.id.clone(),
                    field: "date",
                });
            }
            if detail.and_then(|d| d.time).is_none() {
                errors.push(ValidationError::MissingSchedule {
                    item_id: item.id.clone(),
                    field: "time",
                });
            }
        }
        errors
    }

    fn customer_errors(&self) -> Vec<ValidationError> {
        let c = &self.customer;
        [
            (&c.first_name, "First name"),
            (&c.last_name, "Last name"),
            (&c.email, "Email"),
            (&c.phone, "Phone"),
        ]
        .into_iter()
        .filter(|(value, _)| value.trim().is_empty())
        .map(|(_, field)| ValidationError::MissingCustomerField(field))
        .collect()
    }
}

/// Body of `POST /bookings/cart-checkout`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCheckoutRequest {
    pub customer_info: CustomerInfo,
    pub items: Vec<CheckoutItemRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemRequest {
    pub vehicle_id: String,
    #[serde(rename = "type")]
    pub kind: BookingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", with = "hhmm")]
    pub scheduled_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Confirmation bundle returned by a successful checkout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub booking_count: u32,
    pub confirmation_number: String,
    #[serde(default)]
    pub bookings: Vec<BookingRecord>,
    #[serde(default)]
    pub customer: CustomerEcho,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub vehicle_id: String,
    #[serde(rename = "type")]
    pub kind: BookingType,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerEcho {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub fn camry() -> VehicleRef {
        VehicleRef {
            id: "camry-2022".to_string(),
            make: "Toyota".to_string(),
            model: "Camry".to_string(),
            year: 2022,
            price: None,
            stock_number: None,
            image_url: None,
        }
    }

    fn civic() -> VehicleRef {
        VehicleRef {
            id: "civic-2021".to_string(),
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2021,
            price: None,
            stock_number: None,
            image_url: None,
        }
    }

    pub fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    pub fn jane() -> CustomerInfo {
        CustomerInfo {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-123-4567".to_string(),
            ..CustomerInfo::default()
        }
    }

    fn add(state: CheckoutState, vehicle: VehicleRef, kind: BookingType, secs: i64) -> CheckoutState {
        state.reduce(CheckoutAction::AddItem {
            vehicle,
            kind,
            at: at(secs),
        })
    }

    fn slot(date: bool, time: bool) -> BookingDetail {
        BookingDetail {
            date: date.then(|| NaiveDate::from_ymd_opt(2024, 6, 1).expect("date")),
            time: time.then(|| NaiveTime::from_hms_opt(10, 0, 0).expect("time")),
            notes: None,
        }
    }

    #[test]
    fn empty_cart_fails_review_and_shows_empty_state() {
        let state = CheckoutState::default();
        assert_eq!(
            state.validate_step(CheckoutStep::Review),
            Err(vec![ValidationError::EmptyCart])
        );
        assert!(state.shows_empty_state());

        let state = state.reduce(CheckoutAction::Next);
        assert_eq!(state.step, CheckoutStep::Review);
        assert_eq!(state.errors, vec!["Your cart is empty".to_string()]);
    }

    #[test]
    fn test_drive_needs_date_and_time() {
        let state = add(CheckoutState::default(), camry(), BookingType::Reservation, 1);
        let state = add(state, civic(), BookingType::TestDrive, 2);
        let drive_id = state.cart.items[1].id.clone();
        let state = state.reduce(CheckoutAction::Next);
        assert_eq!(state.step, CheckoutStep::Schedule);
        assert!(!state.is_step_valid(CheckoutStep::Schedule));

        let state = state.reduce(CheckoutAction::SetBookingDetail {
            item_id: drive_id.clone(),
            detail: slot(true, false),
        });
        assert!(!state.is_step_valid(CheckoutStep::Schedule));
        let blocked = state.clone().reduce(CheckoutAction::Next);
        assert_eq!(blocked.step, CheckoutStep::Schedule);
        assert_eq!(blocked.errors.len(), 1);

        let state = state.reduce(CheckoutAction::SetBookingDetail {
            item_id: drive_id,
            detail: slot(true, true),
        });
        assert!(state.is_step_valid(CheckoutStep::Schedule));
        let state = state.reduce(CheckoutAction::Next);
        assert_eq!(state.step, CheckoutStep::Information);
        assert!(state.errors.is_empty());
    }

    #[test]
    fn reservations_need_no_schedule() {
        let state = add(CheckoutState::default(), camry(), BookingType::Reservation, 1);
        assert!(state.is_step_valid(CheckoutStep::Schedule));
    }

    #[test]
    fn booking_details_only_change_on_schedule_step() {
        let state = add(CheckoutState::default(), civic(), BookingType::TestDrive, 1);
        let id = state.cart.items[0].id.clone();
        let state = state.reduce(CheckoutAction::SetBookingDetail {
            item_id: id,
            detail: slot(true, true),
        });
        assert!(state.bookings.is_empty());
    }

    #[test]
    fn information_requires_contact_fields_only() {
        let mut state = add(CheckoutState::default(), camry(), BookingType::Reservation, 1);
        let errors = state
            .validate_step(CheckoutStep::Information)
            .expect_err("blank customer");
        assert_eq!(errors.len(), 4);

        state = state.reduce(CheckoutAction::UpdateCustomer(CustomerInfo {
            email: "not-an-email".to_string(),
            ..jane()
        }));
        assert!(state.is_step_valid(CheckoutStep::Information));
        assert_eq!(
            state.advisories(),
            vec!["Please enter a valid email address".to_string()]
        );
    }

    #[test]
    fn next_on_information_does_not_complete() {
        let state = add(CheckoutState::default(), camry(), BookingType::Reservation, 1)
            .reduce(CheckoutAction::Next)
            .reduce(CheckoutAction::Next)
            .reduce(CheckoutAction::UpdateCustomer(jane()))
            .reduce(CheckoutAction::Next);
        assert_eq!(state.step, CheckoutStep::Information);
    }

    #[test]
    fn back_is_unrestricted_until_complete() {
        let state = add(CheckoutState::default(), camry(), BookingType::Reservation, 1)
            .reduce(CheckoutAction::Next)
            .reduce(CheckoutAction::Next)
            .reduce(CheckoutAction::Back)
            .reduce(CheckoutAction::Back)
            .reduce(CheckoutAction::Back);
        assert_eq!(state.step, CheckoutStep::Review);
    }

    #[test]
    fn emptying_cart_mid_wizard_returns_to_review() {
        let state = add(CheckoutState::default(), civic(), BookingType::TestDrive, 1);
        let id = state.cart.items[0].id.clone();
        let state = state.reduce(CheckoutAction::Next).reduce(CheckoutAction::SetBookingDetail {
            item_id: id.clone(),
            detail: slot(true, true),
        });
        let state = state.reduce(CheckoutAction::RemoveItem { item_id: id });
        assert_eq!(state.step, CheckoutStep::Review);
        assert!(state.bookings.is_empty());
        assert!(state.shows_empty_state());
    }

    #[test]
    fn request_omits_schedule_for_reservations() {
        let state = add(CheckoutState::default(), camry(), BookingType::Reservation, 1);
        let state = add(state, civic(), BookingType::TestDrive, 2);
        let drive_id = state.cart.items[1].id.clone();
        let state = state
            .reduce(CheckoutAction::Next)
            .reduce(CheckoutAction::SetBookingDetail {
                item_id: drive_id,
                detail: BookingDetail {
                    notes: Some("Bring the blue one".to_string()),
                    ..slot(true, true)
                },
            })
            .reduce(CheckoutAction::UpdateCustomer(jane()));

        let body = serde_json::to_value(state.to_request()).expect("serialize");
        assert_eq!(body["customerInfo"]["firstName"], "Jane");
        assert_eq!(
            body["items"][0],
            serde_json::json!({ "vehicleId": "camry-2022", "type": "RESERVATION" })
        );
        assert_eq!(
            body["items"][1],
            serde_json::json!({
                "vehicleId": "civic-2021",
                "type": "TEST_DRIVE",
                "scheduledDate": "2024-06-01",
                "scheduledTime": "10:00",
                "notes": "Bring the blue one"
            })
        );
    }

    #[test]
    fn submit_lifecycle() {
        let state = add(CheckoutState::default(), camry(), BookingType::Reservation, 1)
            .reduce(CheckoutAction::Next)
            .reduce(CheckoutAction::Next)
            .reduce(CheckoutAction::UpdateCustomer(jane()))
            .reduce(CheckoutAction::SubmitStarted);
        assert!(state.is_submitting);

        let aborted = state.clone().reduce(CheckoutAction::SubmitAborted);
        assert!(!aborted.is_submitting);
        assert_eq!(aborted.step, CheckoutStep::Information);
        assert_eq!(aborted.cart.len(), 1);
        assert_eq!(aborted.customer, jane());

        let failed = state
            .clone()
            .reduce(CheckoutAction::SubmitFailed(vec!["Vehicle unavailable".to_string()]));
        assert_eq!(failed.step, CheckoutStep::Information);
        assert!(!failed.is_submitting);
        assert_eq!(failed.errors, vec!["Vehicle unavailable".to_string()]);

        let result = CheckoutResult {
            lead_id: None,
            customer_id: None,
            booking_count: 1,
            confirmation_number: "CONF-1".to_string(),
            bookings: vec![],
            customer: CustomerEcho::default(),
            warnings: vec![],
        };
        let done = state.reduce(CheckoutAction::SubmitSucceeded(result));
        assert_eq!(done.step, CheckoutStep::Complete);
        assert_eq!(done.cart.len(), 1, "cart is cleared separately");

        let done = done
            .reduce(CheckoutAction::Back)
            .reduce(CheckoutAction::AddItem {
                vehicle: civic(),
                kind: BookingType::TestDrive,
                at: at(9),
            });
        assert_eq!(done.step, CheckoutStep::Complete);
        assert_eq!(done.cart.len(), 1);

        let cleared = done.reduce(CheckoutAction::ClearCart);
        assert!(cleared.cart.is_empty());
        assert!(!cleared.shows_empty_state());

        let fresh = cleared.reduce(CheckoutAction::Reset);
        assert_eq!(fresh, CheckoutState::default());
    }
}

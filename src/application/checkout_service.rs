use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use crate::domain::cart::{BookingDetail, BookingType, CustomerInfo, VehicleRef};
use crate::domain::checkout::{CheckoutAction, CheckoutResult, CheckoutState, CheckoutStep};
use crate::domain::ports::BookingApi;
use crate::errors::CheckoutError;

/// How long the confirmation keeps the submitted cart around before it is
/// cleared.
pub const CART_CLEAR_DELAY: Duration = Duration::from_millis(2000);

/// Clears the submitting flag if a submission is dropped mid-flight.
struct InFlight<'a> {
    state: &'a mut CheckoutState,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a mut CheckoutState) -> Self {
        Self { state, armed: true }
    }

    fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("checkout submission dropped before a reply arrived");
            *self.state = std::mem::take(self.state).reduce(CheckoutAction::SubmitAborted);
        }
    }
}

/// Drives the checkout wizard and owns its single network call.
pub struct CheckoutService<B> {
    api: B,
    state: CheckoutState,
    clear_at: Option<Instant>,
}

impl<B: BookingApi> CheckoutService<B> {
    pub fn new(api: B) -> Self {
        Self {
            api,
            state: CheckoutState::default(),
            clear_at: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn dispatch(&mut self, action: CheckoutAction) {
        if matches!(action, CheckoutAction::Reset | CheckoutAction::ClearCart) {
            self.clear_at = None;
        }
        self.state = std::mem::take(&mut self.state).reduce(action);
    }

    pub fn add_to_cart(&mut self, vehicle: VehicleRef, kind: BookingType) {
        self.dispatch(CheckoutAction::AddItem {
            vehicle,
            kind,
            at: Utc::now(),
        });
    }

    pub fn remove_from_cart(&mut self, item_id: &str) {
        self.dispatch(CheckoutAction::RemoveItem {
            item_id: item_id.to_string(),
        });
    }

    pub fn set_booking_detail(&mut self, item_id: &str, detail: BookingDetail) {
        self.dispatch(CheckoutAction::SetBookingDetail {
            item_id: item_id.to_string(),
            detail,
        });
    }

    pub fn update_customer(&mut self, info: CustomerInfo) {
        self.dispatch(CheckoutAction::UpdateCustomer(info));
    }

    /// Advances one step if the current one validates. Returns the step the
    /// wizard is on afterwards.
    pub fn next(&mut self) -> CheckoutStep {
        self.dispatch(CheckoutAction::Next);
        self.state.step
    }

    pub fn back(&mut self) -> CheckoutStep {
        self.dispatch(CheckoutAction::Back);
        self.state.step
    }

    /// Starts a new session: empty cart, first step.
    pub fn reset(&mut self) {
        self.dispatch(CheckoutAction::Reset);
    }

    /// Submits the whole cart as one booking request.
    ///
    /// On success the wizard moves to `Complete` and the cart is scheduled to
    /// clear after [`CART_CLEAR_DELAY`]. On any failure the messages land in
    /// the state's error list and the wizard stays on the information step.
    /// Nothing is retried. If the returned future is dropped before the
    /// reply arrives the wizard is left on the information step, ready to
    /// submit again.
    pub async fn submit(&mut self) -> Result<CheckoutResult, CheckoutError> {
        if self.state.is_submitting {
            return Err(CheckoutError::AlreadySubmitting);
        }
        if self.state.step != CheckoutStep::Information {
            return Err(CheckoutError::WrongStep(self.state.step));
        }

        let invalid: Vec<_> = [
            CheckoutStep::Review,
            CheckoutStep::Schedule,
            CheckoutStep::Information,
        ]
        .into_iter()
        .filter_map(|step| self.state.validate_step(step).err())
        .flatten()
        .collect();
        if !invalid.is_empty() {
            let err = CheckoutError::Invalid(invalid);
            self.dispatch(CheckoutAction::SubmitFailed(err.messages()));
            return Err(err);
        }

        self.dispatch(CheckoutAction::SubmitStarted);
        let request = self.state.to_request();
        log::debug!("submitting checkout with {} item(s)", request.items.len());

        let in_flight = InFlight::start(&mut self.state);
        let outcome = self.api.cart_checkout(&request).await;
        in_flight.finish();

        match outcome {
            Ok(result) => {
                log::info!(
                    "checkout confirmed: {} ({} booking(s))",
                    result.confirmation_number,
                    result.booking_count
                );
                for warning in &result.warnings {
                    log::warn!("checkout warning: {warning}");
                }
                self.dispatch(CheckoutAction::SubmitSucceeded(result.clone()));
                self.clear_at = Some(Instant::now() + CART_CLEAR_DELAY);
                Ok(result)
            }
            Err(e) => {
                log::warn!("checkout failed: {e}");
                let err = CheckoutError::from(e);
                self.dispatch(CheckoutAction::SubmitFailed(err.messages()));
                Err(err)
            }
        }
    }

    /// When the scheduled cart clear is due.
    pub fn clear_deadline(&self) -> Option<Instant> {
        self.clear_at
    }

    /// Clears the cart if its scheduled clear time has passed. Returns
    /// whether it did.
    pub fn clear_if_due(&mut self, now: Instant) -> bool {
        match self.clear_at {
            Some(at) if now >= at => {
                self.dispatch(CheckoutAction::ClearCart);
                true
            }
            _ => false,
        }
    }

    /// Waits out the confirmation delay, then clears the cart.
    pub async fn settle(&mut self) {
        if let Some(at) = self.clear_at {
            tokio::time::sleep_until(at).await;
            self.clear_if_due(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::domain::checkout::tests::{camry, jane};
    use crate::domain::checkout::{CartCheckoutRequest, CustomerEcho};
    use crate::domain::ports::MockBookingApi;
    use crate::errors::ApiError;

    /// A booking endpoint that never replies.
    struct Unresponsive;

    #[async_trait::async_trait]
    impl BookingApi for Unresponsive {
        async fn cart_checkout(
            &self,
            _request: &CartCheckoutRequest,
        ) -> Result<CheckoutResult, ApiError> {
            std::future::pending().await
        }
    }

    fn confirmation() -> CheckoutResult {
        CheckoutResult {
            lead_id: Some("lead-1".to_string()),
            customer_id: Some("cust-1".to_string()),
            booking_count: 1,
            confirmation_number: "CONF-123".to_string(),
            bookings: vec![],
            customer: CustomerEcho {
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone: None,
            },
            warnings: vec![],
        }
    }

    fn ready_for_submit<B: BookingApi>(api: B) -> CheckoutService<B> {
        let mut service = CheckoutService::new(api);
        service.add_to_cart(camry(), BookingType::Reservation);
        assert_eq!(service.next(), CheckoutStep::Schedule);
        assert_eq!(service.next(), CheckoutStep::Information);
        service.update_customer(jane());
        service
    }

    #[tokio::test(start_paused = true)]
    async fn reservation_checkout_completes_and_clears_later() {
        let mut api = MockBookingApi::new();
        api.expect_cart_checkout()
            .withf(|req| {
                req.items.len() == 1
                    && req.items[0].vehicle_id == "camry-2022"
                    && req.items[0].kind == BookingType::Reservation
                    && req.customer_info.email == "jane@example.com"
            })
            .times(1)
            .returning(|_| Ok(confirmation()));
        let mut service = ready_for_submit(api);

        let result = service.submit().await.expect("checkout succeeds");

        assert_eq!(result.confirmation_number, "CONF-123");
        assert_eq!(service.state().step, CheckoutStep::Complete);
        assert_eq!(
            service
                .state()
                .result
                .as_ref()
                .map(|r| r.confirmation_number.as_str()),
            Some("CONF-123")
        );
        assert_eq!(service.state().cart.len(), 1);

        tokio::time::advance(CART_CLEAR_DELAY - Duration::from_millis(1)).await;
        assert!(!service.clear_if_due(Instant::now()));
        assert_eq!(service.state().cart.len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(service.clear_if_due(Instant::now()));
        assert!(service.state().cart.is_empty());
        assert_eq!(service.state().step, CheckoutStep::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_waits_for_the_delay() {
        let mut api = MockBookingApi::new();
        api.expect_cart_checkout()
            .returning(|_| Ok(confirmation()));
        let mut service = ready_for_submit(api);
        service.submit().await.expect("checkout succeeds");

        let started = Instant::now();
        service.settle().await;

        assert!(Instant::now() - started >= CART_CLEAR_DELAY);
        assert!(service.state().cart.is_empty());
        assert!(service.clear_deadline().is_none());

        service.reset();
        assert_eq!(service.state(), &CheckoutState::default());
        assert!(service.clear_deadline().is_none());
    }

    #[tokio::test]
    async fn server_rejection_stays_on_information() {
        let mut api = MockBookingApi::new();
        api.expect_cart_checkout()
            .times(1)
            .returning(|_| Err(ApiError::domain("Vehicle is no longer available")));
        let mut service = ready_for_submit(api);

        let err = service.submit().await.expect_err("checkout fails");

        assert!(matches!(err, CheckoutError::Api(ApiError::Domain(_))));
        let state = service.state();
        assert_eq!(state.step, CheckoutStep::Information);
        assert!(!state.is_submitting);
        assert_eq!(state.errors, vec!["Vehicle is no longer available".to_string()]);
        assert_eq!(state.cart.len(), 1);
        assert!(service.clear_deadline().is_none());
    }

    #[tokio::test]
    async fn every_server_message_lands_in_the_error_list() {
        let mut api = MockBookingApi::new();
        api.expect_cart_checkout().times(1).returning(|_| {
            Err(ApiError::Domain(vec![
                "Vehicle camry is sold".to_string(),
                "Slot 10:00 is taken".to_string(),
            ]))
        });
        let mut service = ready_for_submit(api);

        let err = service.submit().await.expect_err("checkout fails");

        assert_eq!(err.messages().len(), 2);
        assert_eq!(
            service.state().errors,
            vec![
                "Vehicle camry is sold".to_string(),
                "Slot 10:00 is taken".to_string()
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_can_go_back_and_retry() {
        let mut service = ready_for_submit(Unresponsive);

        let waited = tokio::time::timeout(Duration::from_secs(5), service.submit()).await;
        assert!(waited.is_err(), "reply never arrives");

        assert!(!service.state().is_submitting);
        assert_eq!(service.state().step, CheckoutStep::Information);
        assert_eq!(service.state().cart.len(), 1);

        assert_eq!(service.back(), CheckoutStep::Schedule);
        assert_eq!(service.next(), CheckoutStep::Information);

        let retried = tokio::time::timeout(Duration::from_secs(5), service.submit()).await;
        assert!(retried.is_err(), "second attempt reaches the network again");
        assert!(!service.state().is_submitting);
    }

    #[tokio::test]
    async fn incomplete_customer_never_reaches_the_network() {
        let mut api = MockBookingApi::new();
        api.expect_cart_checkout().never();
        let mut service = ready_for_submit(api);
        service.update_customer(CustomerInfo {
            phone: String::new(),
            ..jane()
        });

        let err = service.submit().await.expect_err("validation fails");

        assert!(matches!(err, CheckoutError::Invalid(_)));
        assert_eq!(service.state().errors, vec!["Phone is required".to_string()]);
        assert_eq!(service.state().step, CheckoutStep::Information);
    }

    #[tokio::test]
    async fn submit_outside_information_step_is_rejected() {
        let mut api = MockBookingApi::new();
        api.expect_cart_checkout().never();
        let mut service = CheckoutService::new(api);
        service.add_to_cart(camry(), BookingType::Reservation);

        let err = service.submit().await.expect_err("wrong step");

        assert!(matches!(err, CheckoutError::WrongStep(CheckoutStep::Review)));
    }

    #[tokio::test]
    async fn test_drive_slot_is_sent() {
        let mut api = MockBookingApi::new();
        api.expect_cart_checkout()
            .withf(|req| {
                req.items[0].kind == BookingType::TestDrive
                    && req.items[0].scheduled_date == NaiveDate::from_ymd_opt(2024, 6, 1)
                    && req.items[0].scheduled_time == NaiveTime::from_hms_opt(9, 30, 0)
            })
            .times(1)
            .returning(|_| Ok(confirmation()));
        let mut service = CheckoutService::new(api);
        service.add_to_cart(camry(), BookingType::TestDrive);
        assert_eq!(service.next(), CheckoutStep::Schedule);
        assert_eq!(service.next(), CheckoutStep::Schedule, "slot missing");

        let item_id = service.state().cart.items[0].id.clone();
        service.set_booking_detail(
            &item_id,
            BookingDetail {
                date: NaiveDate::from_ymd_opt(2024, 6, 1),
                time: NaiveTime::from_hms_opt(9, 30, 0),
                notes: None,
            },
        );
        assert_eq!(service.next(), CheckoutStep::Information);
        service.update_customer(jane());

        service.submit().await.expect("checkout succeeds");
        assert_eq!(service.state().step, CheckoutStep::Complete);
    }
}

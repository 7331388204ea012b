//! Seats and their QR codes.

use std::sync::Arc;

use tableside_client::{ApiClient, ClientConfig, GatewayError};
use tableside_core::{Seat, SeatId, SeatInput, StoreId};
use tracing::{info, instrument, warn};

use super::upsert_by_id;
use crate::error::{FormError, optional, required};

pub const MAX_SEAT_NUMBER_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatForm {
    pub editing: Option<SeatId>,
    pub seat_number: String,
    pub capacity: String,
    pub is_active: bool,
}

impl Default for SeatForm {
    fn default() -> Self {
        Self {
            editing: None,
            seat_number: String::new(),
            capacity: String::new(),
            is_active: true,
        }
    }
}

impl SeatForm {
    /// # Errors
    ///
    /// Returns the first field that blocks submission. Seat numbers are
    /// unique within a store.
    pub fn validate(&self, existing: &[Seat]) -> Result<SeatInput, FormError> {
        let seat_number = required("seat number", &self.seat_number)?;
        if seat_number.chars().count() > MAX_SEAT_NUMBER_CHARS {
            return Err(FormError::TooLong {
                field: "seat number",
                max: MAX_SEAT_NUMBER_CHARS,
            });
        }
        if existing
            .iter()
            .any(|s| Some(s.id) != self.editing && s.seat_number == seat_number)
        {
            return Err(FormError::Duplicate("seat number"));
        }
        let capacity = optional(&self.capacity)
            .map(|raw| raw.parse::<u32>().map_err(|_| FormError::NotANumber("capacity")))
            .transpose()?;
        Ok(SeatInput {
            seat_number,
            capacity,
            is_active: self.is_active,
        })
    }
}

/// A seat row with the URL its QR code should encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatRowView {
    pub id: SeatId,
    pub seat_number: String,
    pub capacity: Option<u32>,
    pub active: bool,
    pub qr_url: String,
}

#[derive(Debug)]
pub struct SeatsPage {
    api: ApiClient,
    config: Arc<ClientConfig>,
    store_id: StoreId,
    pub seats: Vec<Seat>,
    pub form: SeatForm,
    pub loading: bool,
    pub error: Option<String>,
}

impl SeatsPage {
    #[must_use]
    pub fn new(api: ApiClient, config: Arc<ClientConfig>, store_id: StoreId) -> Self {
        Self {
            api,
            config,
            store_id,
            seats: Vec::new(),
            form: SeatForm::default(),
            loading: false,
            error: None,
        }
    }

    #[instrument(skip(self), fields(store_id = %self.store_id))]
    pub async fn load(&mut self) {
        self.loading = true;
        match self.api.seats(self.store_id).await {
            Ok(mut seats) => {
                seats.sort_by(|a, b| natural_key(&a.seat_number).cmp(&natural_key(&b.seat_number)));
                self.seats = seats;
                self.error = None;
            }
            Err(e) => self.fail(&e),
        }
        self.loading = false;
    }

    /// The customer menu URL for a seat's QR code.
    #[must_use]
    pub fn qr_url(&self, seat: &Seat) -> String {
        self.config.seat_url(&seat.qr_code)
    }

    #[must_use]
    pub fn rows(&self) -> Vec<SeatRowView> {
        self.seats
            .iter()
            .map(|seat| SeatRowView {
                id: seat.id,
                seat_number: seat.seat_number.clone(),
                capacity: seat.capacity,
                active: seat.is_active,
                qr_url: self.qr_url(seat),
            })
            .collect()
    }

    pub fn edit(&mut self, id: SeatId) {
        match self.seats.iter().find(|s| s.id == id) {
            Some(seat) => {
                self.form = SeatForm {
                    editing: Some(id),
                    seat_number: seat.seat_number.clone(),
                    capacity: seat.capacity.map(|c| c.to_string()).unwrap_or_default(),
                    is_active: seat.is_active,
                };
            }
            None => self.error = Some("That seat no longer exists.".to_string()),
        }
    }

    #[instrument(skip(self), fields(store_id = %self.store_id, editing = ?self.form.editing))]
    pub async fn save(&mut self) -> bool {
        let input = match self.form.validate(&self.seats) {
            Ok(input) => input,
            Err(e) => {
                self.error = Some(e.user_message());
                return false;
            }
        };
        let result = match self.form.editing {
            Some(id) => self.api.update_seat(id, &input).await,
            None => self.api.create_seat(self.store_id, &input).await,
        };
        match result {
            Ok(seat) => {
                info!(seat_id = %seat.id, qr_code = %seat.qr_code, "Seat saved");
                upsert_by_id(&mut self.seats, seat, |s| s.id);
                self.form = SeatForm::default();
                self.error = None;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: SeatId) -> bool {
        match self.api.delete_seat(id).await {
            Ok(()) => {
                info!(seat_id = %id, "Seat deleted");
                self.seats.retain(|s| s.id != id);
                self.error = None;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn fail(&mut self, e: &GatewayError) {
        warn!(error = %e, "Seat update failed");
        self.error = Some(e.user_message());
    }
}

/// Sort key that orders `A2` before `A10`.
fn natural_key(seat_number: &str) -> (String, u64, String) {
    let digits_at = seat_number.find(|c: char| c.is_ascii_digit());
    let Some(start) = digits_at else {
        return (seat_number.to_string(), 0, String::new());
    };
    let rest = &seat_number[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    (
        seat_number[..start].to_string(),
        rest[..end].parse().unwrap_or(u64::MAX),
        rest[end..].to_string(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tableside_client::{MemoryStore, SessionStore};
    use url::Url;

    use super::*;

    fn seat(id: i64, number: &str) -> Seat {
        Seat {
            id: SeatId::new(id),
            store_id: StoreId::new(1),
            seat_number: number.to_string(),
            qr_code: format!("qr-{id}"),
            capacity: None,
            is_active: true,
        }
    }

    #[test]
    fn test_seat_numbers_are_unique() {
        let existing = vec![seat(1, "A1"), seat(2, "A2")];
        let mut form = SeatForm {
            seat_number: "A2".to_string(),
            ..SeatForm::default()
        };
        assert_eq!(form.validate(&existing), Err(FormError::Duplicate("seat number")));

        form.editing = Some(SeatId::new(2));
        form.capacity = "4".to_string();
        let input = form.validate(&existing).unwrap();
        assert_eq!(input.capacity, Some(4));

        form.capacity = "four".to_string();
        assert_eq!(form.validate(&existing), Err(FormError::NotANumber("capacity")));
    }

    #[test]
    fn test_rows_carry_qr_urls() {
        let mut config = ClientConfig::new(Url::parse("http://127.0.0.1:1").unwrap());
        config.storefront_url = Url::parse("https://order.cafe.com").unwrap();
        let api = ApiClient::new(&config, SessionStore::new(Arc::new(MemoryStore::new()))).unwrap();
        let mut page = SeatsPage::new(api, Arc::new(config), StoreId::new(1));
        page.seats = vec![seat(7, "B3")];
        let rows = page.rows();
        assert_eq!(rows[0].qr_url, "https://order.cafe.com/menu/qr-7");
    }

    #[test]
    fn test_natural_ordering() {
        let mut numbers = vec!["A10", "A2", "B1", "A1", "Bar"];
        numbers.sort_by_key(|n| natural_key(n));
        assert_eq!(numbers, vec!["A1", "A2", "A10", "B1", "Bar"]);
    }
}

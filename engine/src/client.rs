//! Client-identity matching between income records and bookings.
//!
//! Income records and bookings are independent lists with no foreign keys.
//! To let a user jump from one to the other, two loosely entered "name +
//! phone" pairs are compared with a permissive heuristic:
//!
//! - names compare trimmed and lower-cased, phones compare digits only
//! - both sides must carry at least one non-empty field
//! - a field that is empty on either side never contradicts
//!
//! Two different customers sharing a phone number, where one record lacks a
//! name, will be linked. The heuristic favours showing a link over hiding one.

use crate::booking::Booking;
use crate::income::{ClientInfo, IncomeRecord};
use serde::Serialize;

/// A normalized client identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDescriptor {
    name: String,
    phone: String,
}

impl ClientDescriptor {
    pub fn new(name: &str, phone: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            phone: phone.chars().filter(|c| c.is_ascii_digit()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Whether the name or the phone is non-empty after normalization.
    pub fn has_any(&self) -> bool {
        !self.name.is_empty() || !self.phone.is_empty()
    }
}

impl From<&ClientInfo> for ClientDescriptor {
    fn from(client: &ClientInfo) -> Self {
        Self::new(&client.name, &client.phone)
    }
}

impl From<&IncomeRecord> for ClientDescriptor {
    fn from(record: &IncomeRecord) -> Self {
        Self::from(&record.client)
    }
}

impl From<&Booking> for ClientDescriptor {
    fn from(booking: &Booking) -> Self {
        Self::new(&booking.client_name, &booking.client_phone)
    }
}

fn field_agrees(a: &str, b: &str) -> bool {
    a.is_empty() || b.is_empty() || a == b
}

/// Decide whether two descriptors denote the same client.
pub fn is_same_client(a: &ClientDescriptor, b: &ClientDescriptor) -> bool {
    if !a.has_any() || !b.has_any() {
        return false;
    }
    field_agrees(&a.name, &b.name) && field_agrees(&a.phone, &b.phone)
}

/// Bookings that match the client of an income record, in list order.
pub fn find_matching_bookings<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    client: &ClientInfo,
) -> Vec<&'a Booking> {
    let source = ClientDescriptor::from(client);
    bookings
        .into_iter()
        .filter(|b| is_same_client(&source, &ClientDescriptor::from(*b)))
        .collect()
}

/// Income records that match a booking's client, in list order.
pub fn find_matching_records<'a>(
    records: impl IntoIterator<Item = &'a IncomeRecord>,
    client_name: &str,
    client_phone: &str,
) -> Vec<&'a IncomeRecord> {
    let source = ClientDescriptor::new(client_name, client_phone);
    records
        .into_iter()
        .filter(|r| is_same_client(&source, &ClientDescriptor::from(*r)))
        .collect()
}

/// Navigation summary over a match list: the default target and how many
/// candidates there were.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Matches<T> {
    pub first: Option<T>,
    pub count: usize,
    pub items: Vec<T>,
}

impl<T: Clone> Matches<T> {
    pub fn from_refs(items: Vec<&T>) -> Self {
        let items: Vec<T> = items.into_iter().cloned().collect();
        Self {
            first: items.first().cloned(),
            count: items.len(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(name: &str, phone: &str) -> ClientDescriptor {
        ClientDescriptor::new(name, phone)
    }

    #[test]
    fn normalization() {
        let c = d("  Ivan Petrov ", "+7 (999) 123-45-67");
        assert_eq!(c.name(), "ivan petrov");
        assert_eq!(c.phone(), "79991234567");
    }

    #[test]
    fn missing_name_does_not_contradict() {
        assert!(is_same_client(
            &d("", "79991234567"),
            &d("Ivan", "79991234567")
        ));
    }

    #[test]
    fn different_names_never_match() {
        assert!(!is_same_client(&d("Ivan", ""), &d("Petr", "")));
        assert!(!is_same_client(
            &d("Ivan", "79991234567"),
            &d("Petr", "79991234567")
        ));
    }

    #[test]
    fn empty_side_never_matches() {
        assert!(!is_same_client(&d("", ""), &d("Ivan", "1")));
        assert!(!is_same_client(&d("  ", "-- "), &d("", "")));
    }

    #[test]
    fn phone_formatting_is_ignored() {
        assert!(is_same_client(
            &d("IVAN", "8 029 111-22-33"),
            &d("ivan ", "80291112233")
        ));
        assert!(!is_same_client(&d("ivan", "111"), &d("ivan", "222")));
    }

    #[test]
    fn matches_summary() {
        let items = vec![1, 2, 3];
        let m = Matches::from_refs(items.iter().collect());
        assert_eq!(m.first, Some(1));
        assert_eq!(m.count, 3);

        let none: Matches<i32> = Matches::from_refs(Vec::new());
        assert_eq!(none.first, None);
        assert_eq!(none.count, 0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_descriptor() -> impl Strategy<Value = ClientDescriptor> {
            ("[ A-Za-z]{0,6}", "[0-9 +()-]{0,8}")
                .prop_map(|(name, phone)| ClientDescriptor::new(&name, &phone))
        }

        proptest! {
            #[test]
            fn prop_symmetric(a in arb_descriptor(), b in arb_descriptor()) {
                prop_assert_eq!(is_same_client(&a, &b), is_same_client(&b, &a));
            }

            #[test]
            fn prop_empty_never_matches(a in arb_descriptor()) {
                prop_assert!(!is_same_client(&ClientDescriptor::default(), &a));
            }

            #[test]
            fn prop_reflexive_when_non_empty(a in arb_descriptor()) {
                prop_assert_eq!(is_same_client(&a, &a), a.has_any());
            }
        }
    }
}

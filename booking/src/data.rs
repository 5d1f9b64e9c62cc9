//! Seed data: the registered users and the flight catalog.

use crate::types::{Flight, GeoLocation, User, UserId};
use std::sync::Arc;
use uuid::Uuid;

/// An id that is not in the seed directory
pub const UNKNOWN_USER: UserId = UserId::from_uuid(Uuid::from_u128(0x39339c17_78c5_4fa4_a88b_0077527a9190));

const USERS: [(u128, &str, &str); 5] = [
    (0x9c1ae1d2_e0fb_4234_9248_21ca4949cb0c, "Bob", "Jones"),
    (0xe49b6eef_fab0_4391_8238_6cfb2873d60c, "Sally", "Jones"),
    (0xc1647d83_ddf2_4cf0_a5ca_ac7bb477e69c, "Jane", "Doe"),
    (0xf08df86c_b2ac_4616_806b_d0d8ea7ee43c, "Alice", "Smith"),
    (0x39339c17_78c5_4fa4_a88b_0077527a9195, "Dave", "Walker"),
];

const FLIGHTS: [(&str, &str, GeoLocation, GeoLocation); 24] = {
    use GeoLocation::{London, NewYork, Paris, Sydney};
    [
        ("BA111", "British Airways", London, NewYork),
        ("BA199", "British Airways", NewYork, London),
        ("BA222", "British Airways", London, Paris),
        ("BA299", "British Airways", Paris, London),
        ("BA333", "British Airways", London, Sydney),
        ("BA399", "British Airways", Sydney, London),
        ("FR987", "Air France", Paris, London),
        ("FR789", "Air France", London, Paris),
        ("FR654", "Air France", Paris, NewYork),
        ("FR456", "Air France", NewYork, Paris),
        ("FR321", "Air France", Paris, Sydney),
        ("FR123", "Air France", Sydney, Paris),
        ("UA999", "United Airlines", NewYork, London),
        ("UA666", "United Airlines", London, NewYork),
        ("UA888", "United Airlines", NewYork, Paris),
        ("UA555", "United Airlines", Paris, NewYork),
        ("UA777", "United Airlines", NewYork, Sydney),
        ("UA444", "United Airlines", Sydney, NewYork),
        ("QA147", "Qantas", Sydney, London),
        ("QA741", "Qantas", London, Sydney),
        ("QA258", "Qantas", Sydney, NewYork),
        ("QA852", "Qantas", NewYork, Sydney),
        ("QA369", "Qantas", Sydney, Paris),
        ("QA963", "Qantas", Paris, Sydney),
    ]
};

/// The five registered users
#[must_use]
pub fn users() -> Arc<[User]> {
    USERS
        .iter()
        .map(|&(id, first, last)| User::new(UserId::from_uuid(Uuid::from_u128(id)), first, last))
        .collect()
}

/// Ids of the registered users, in seed order
#[must_use]
pub fn user_ids() -> Vec<UserId> {
    USERS
        .iter()
        .map(|&(id, ..)| UserId::from_uuid(Uuid::from_u128(id)))
        .collect()
}

/// The flight catalog
#[must_use]
pub fn flights() -> Arc<[Flight]> {
    FLIGHTS
        .iter()
        .map(|&(id, airline, depart, arrive)| Flight::new(id, airline, depart, arrive))
        .collect()
}

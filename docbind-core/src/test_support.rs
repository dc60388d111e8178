//! Shared schema fixtures for unit tests.

use std::rc::Rc;

use crate::{
    model::{Model, Schema},
    validation::PresenceOf,
};

/// A schema exercising every association kind: people with an embedded name,
/// addresses, phone numbers (with a nested country code), and a pet-owner
/// chain three levels deep.
pub(crate) fn people_schema() -> Rc<Schema> {
    Schema::builder()
        .model(
            Model::builder("person")
                .collection("people")
                .key("title")
                .validates(PresenceOf::new("title"))
                .has_one("name", "name")
                .has_many("addresses", "address")
                .has_many("phone_numbers", "phone")
                .has_one("pet", "animal")
                .build(),
        )
        .model(
            Model::builder("name")
                .key("first_name")
                .key("last_name")
                .belongs_to("person")
                .build(),
        )
        .model(
            Model::builder("address")
                .collection("addresses")
                .key("street")
                .belongs_to("addressable")
                .build(),
        )
        .model(
            Model::builder("phone")
                .key("number")
                .has_one("country_code", "country_code")
                .build(),
        )
        .model(
            Model::builder("country_code")
                .key("code")
                .belongs_to("phone_number")
                .build(),
        )
        .model(Model::builder("animal").key("name").build())
        .model(
            Model::builder("pet_owner")
                .key("title")
                .has_one("pet", "pet")
                .build(),
        )
        .model(
            Model::builder("pet")
                .key("name")
                .has_many("vet_visits", "vet_visit")
                .belongs_to("owner")
                .build(),
        )
        .model(
            Model::builder("vet_visit")
                .key("reason")
                .belongs_to("pet")
                .build(),
        )
        .build()
        .expect("schema fixture is well-formed")
}

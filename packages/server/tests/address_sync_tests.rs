//! End-to-end tests for postcode-driven address geocoding.

use std::sync::Arc;

use server_core::domains::locations::models::{Address, Coordinates};
use server_core::domains::locations::{AddressSyncCoordinator, GeocodeResolver};
use server_core::kernel::test_dependencies::MockGeocoder;

fn address(postcode: &str, coordinates: Option<Coordinates>) -> Address {
    Address {
        address_line_1: Some("12 Station Road".to_string()),
        address_line_2: None,
        city: Some("Manchester".to_string()),
        postcode: Some(postcode.to_string()),
        coordinates,
    }
}

#[tokio::test]
async fn postcode_change_refreshes_coordinates_from_the_service() {
    let geocoder = Arc::new(MockGeocoder::new().with_postcode("M2 2BB", -2.23, 53.48));
    let coordinator = AddressSyncCoordinator::new(GeocodeResolver::new(geocoder.clone()));

    let stale = address(
        "M2 2BB",
        Some(Coordinates {
            longitude: -2.24,
            latitude: 53.47,
        }),
    );
    let synced = coordinator.sync(Some("M1 1AA"), stale).await;

    assert_eq!(
        synced.address.coordinates,
        Some(Coordinates {
            longitude: -2.23,
            latitude: 53.48
        })
    );
    assert!(synced.warning.is_none());
    assert_eq!(geocoder.lookup_count(), 1);
    // The lookup went out in normalized form.
    assert_eq!(geocoder.lookups(), vec!["M22BB".to_string()]);
}

#[tokio::test]
async fn untouched_address_costs_no_lookup_and_is_returned_verbatim() {
    let geocoder = Arc::new(MockGeocoder::new());
    let coordinator = AddressSyncCoordinator::new(GeocodeResolver::new(geocoder.clone()));

    let input = address(
        "M1 1AA",
        Some(Coordinates {
            longitude: -2.24,
            latitude: 53.48,
        }),
    );
    let synced = coordinator.sync(Some("M1 1AA"), input.clone()).await;

    assert_eq!(synced.address, input);
    assert!(synced.warning.is_none());
    assert_eq!(geocoder.lookup_count(), 0);
}

#[tokio::test]
async fn unknown_new_postcode_never_nulls_existing_coordinates() {
    let geocoder = Arc::new(MockGeocoder::new().with_unknown("X1 1XX"));
    let coordinator = AddressSyncCoordinator::new(GeocodeResolver::new(geocoder));

    let prior = Coordinates {
        longitude: -2.24,
        latitude: 53.48,
    };
    let synced = coordinator
        .sync(Some("M1 1AA"), address("X1 1XX", Some(prior)))
        .await;

    assert_eq!(synced.address.coordinates, Some(prior));
    assert!(synced.warning.is_some());
}

#[tokio::test]
async fn batch_of_service_locations_shares_lookups_per_postcode() {
    let geocoder = Arc::new(
        MockGeocoder::new()
            .with_postcode("M2 2BB", -2.23, 53.48)
            .with_postcode("LS1 4AP", -1.55, 53.80),
    );
    let coordinator = AddressSyncCoordinator::new(GeocodeResolver::new(geocoder.clone()));

    let batch = vec![
        (Some("M1 1AA".to_string()), address("M2 2BB", None)),
        (None, address("m22bb", None)),
        (None, address("LS1 4AP", None)),
        (None, address("ls14ap", None)),
    ];
    let synced = coordinator.sync_batch(batch).await;

    assert_eq!(synced.len(), 4);
    assert!(synced.iter().all(|s| s.address.coordinates.is_some()));
    assert!(synced.iter().all(|s| s.warning.is_none()));
    // Two distinct postcodes, two lookups, regardless of batch size.
    assert_eq!(geocoder.lookup_count(), 2);
}

#[tokio::test]
async fn outage_during_batch_warns_per_address_and_keeps_going() {
    let geocoder = Arc::new(MockGeocoder::new().with_outage());
    let coordinator = AddressSyncCoordinator::new(GeocodeResolver::new(geocoder));

    let batch = vec![
        (None, address("M2 2BB", None)),
        (None, address("LS1 4AP", None)),
    ];
    let synced = coordinator.sync_batch(batch).await;

    assert_eq!(synced.len(), 2);
    assert!(synced.iter().all(|s| s.warning.is_some()));
    assert!(synced.iter().all(|s| s.address.coordinates.is_none()));
}

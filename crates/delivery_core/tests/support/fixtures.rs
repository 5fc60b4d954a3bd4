use delivery_core::geo::GeoPoint;
use delivery_core::orders::{ActiveDelivery, OrderId};
use delivery_core::ranking::Store;

pub use delivery_core::test_helpers::{TEST_CUSTOMER, TEST_STORE};

pub fn store(id: &str, location: Option<GeoPoint>) -> Store {
    Store {
        id: id.to_string(),
        name: format!("Store {id}"),
        location,
        declared_eta_minutes: None,
    }
}

pub fn store_with_eta(id: &str, location: Option<GeoPoint>, eta: u32) -> Store {
    Store {
        declared_eta_minutes: Some(eta),
        ..store(id, location)
    }
}

pub fn ids<'a>(stores: impl IntoIterator<Item = &'a Store>) -> Vec<&'a str> {
    stores.into_iter().map(|s| s.id.as_str()).collect()
}

pub fn delivery(id: u64, courier_position: Option<GeoPoint>) -> ActiveDelivery {
    ActiveDelivery {
        order_id: OrderId(id),
        store_location: Some(TEST_STORE),
        delivery_location: Some(TEST_CUSTOMER),
        courier_position,
    }
}

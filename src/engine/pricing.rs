/// Fare for a trip of `distance_km` on a vehicle charging `price_per_km`.
/// `None` when the product does not fit in a finite `f64`.
pub fn trip_price(distance_km: f64, price_per_km: f64) -> Option<f64> {
    Some(distance_km * price_per_km).filter(|price| price.is_finite())
}

/// Price stored at creation. An explicit non-zero price is trusted verbatim;
/// otherwise the trip is priced from the preselected vehicle's rate, or left
/// at zero until confirmation.
pub fn creation_price(
    explicit: Option<f64>,
    distance_km: f64,
    price_per_km: Option<f64>,
) -> Option<f64> {
    match (explicit, price_per_km) {
        (Some(price), _) if price != 0.0 => Some(price),
        (_, Some(rate)) => trip_price(distance_km, rate),
        _ => Some(0.0),
    }
}

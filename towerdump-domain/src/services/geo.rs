// Geospatial engine
// Great-circle distance and derived speed; pure functions, no state

/// Haversine great-circle distance in kilometers. The square-root
/// argument is clamped to [0, 1] so floating-point overshoot near
/// antipodal points never leaves the atan2 domain.
pub fn distance_km(earth_radius_km: f64, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    earth_radius_km * c
}

/// Implied speed in km/h. Zero for non-positive elapsed time; movement
/// with no measurable elapsed time is never reported as infinite or
/// negative speed.
pub fn speed_kmh(distance_km: f64, time_seconds: f64) -> f64 {
    if time_seconds <= 0.0 {
        return 0.0;
    }
    distance_km / (time_seconds / 3600.0)
}

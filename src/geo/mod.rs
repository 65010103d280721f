use crate::models::{GeoPoint, Property};

/// Mean Earth radius used for great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Slack applied at the radius boundary so a property sitting exactly on the circle is kept
pub const DISTANCE_TOLERANCE_KM: f64 = 1e-9;

/// Great-circle distance in kilometres between two points (haversine formula)
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push `a` just past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Properties whose distance from `center` is at most `radius_km`, in catalog order.
///
/// Pure: no validation of the catalog entries and no hidden state, so repeated calls
/// with the same input give the same output.
pub fn within_radius<'a>(
    catalog: &'a [Property],
    center: GeoPoint,
    radius_km: f64,
) -> Vec<&'a Property> {
    catalog
        .iter()
        .filter(|property| {
            haversine_km(center, property.coordinates()) <= radius_km + DISTANCE_TOLERANCE_KM
        })
        .collect()
}

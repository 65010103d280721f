pub mod nominatim;
pub mod resolver;
pub mod traits;
pub mod types;

pub use nominatim::NominatimGeocoder;
pub use resolver::PlaceResolver;
pub use traits::Geocoder;
pub use types::{PlaceCandidate, PlaceLookup};

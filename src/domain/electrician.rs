use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances (km)
const EARTH_RADIUS_KM: f64 = 6371.0;

/// WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine distance to another point (km)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Premises an electrician is dispatched to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
}

/// Emergency electrician available for dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Electrician {
    pub id: String,
    pub name: String,
    pub profile_photo: String,
    pub rating: f64,
    /// Estimated time of arrival (minutes)
    pub eta_minutes: u32,
    pub phone: String,
    pub email: String,
    pub specializations: Vec<String>,
    pub is_available: bool,
    pub location: GeoPoint,
}

impl Electrician {
    pub fn distance_km(&self, to: &GeoPoint) -> f64 {
        self.location.distance_km(to)
    }
}

/// Available electricians ordered by ETA, quickest first
pub fn available_by_eta(roster: &[Electrician]) -> Vec<Electrician> {
    let mut available: Vec<Electrician> =
        roster.iter().filter(|e| e.is_available).cloned().collect();
    available.sort_by_key(|e| e.eta_minutes);
    available
}

/// Demo emergency location
pub fn emergency_site() -> Site {
    Site {
        name: "Clonakilty Post Office".to_string(),
        address: "Bridge St, Tawnies Upper, Clonakilty, Co. Cork, Ireland".to_string(),
        location: GeoPoint::new(51.62271186746584, -8.8911),
    }
}

/// Demo roster positioned around the emergency site
pub fn mock_electricians() -> Vec<Electrician> {
    fn entry(
        id: &str,
        rating: f64,
        eta_minutes: u32,
        phone: &str,
        email: &str,
        specializations: [&str; 3],
        location: GeoPoint,
    ) -> Electrician {
        Electrician {
            id: id.to_string(),
            name: "021 Electrician".to_string(),
            profile_photo: "/api/placeholder/64/64".to_string(),
            rating,
            eta_minutes,
            phone: phone.to_string(),
            email: email.to_string(),
            specializations: specializations.iter().map(|s| s.to_string()).collect(),
            is_available: true,
            location,
        }
    }

    vec![
        entry(
            "1",
            4.8,
            8,
            "+353 87 123 4567",
            "john.murphy@wattphase.ie",
            ["Industrial", "3-Phase Systems", "Emergency Response"],
            GeoPoint::new(51.6195, -8.8845),
        ),
        entry(
            "2",
            4.9,
            12,
            "+353 87 234 5678",
            "sarah.oconnor@wattphase.ie",
            ["Commercial", "Power Distribution", "Fault Diagnosis"],
            GeoPoint::new(51.6251, -8.8975),
        ),
        entry(
            "3",
            4.7,
            18,
            "+353 87 345 6789",
            "michael.kelly@wattphase.ie",
            ["Residential", "Maintenance", "Safety Inspections"],
            GeoPoint::new(51.6185, -8.8795),
        ),
        entry(
            "4",
            4.9,
            15,
            "+353 87 456 7890",
            "emma.walsh@wattphase.ie",
            ["Industrial Automation", "PLC Systems", "Emergency Repairs"],
            GeoPoint::new(51.6275, -8.8925),
        ),
        entry(
            "5",
            4.6,
            25,
            "+353 87 567 8901",
            "david.ryan@wattphase.ie",
            ["High Voltage", "Transformer Maintenance", "Grid Systems"],
            GeoPoint::new(51.6155, -8.8735),
        ),
    ]
}

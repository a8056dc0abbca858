use crate::city::model::{CityState, Hotspot, HotspotStatus, Metrics, Weather};
use chrono::Utc;
use serde::Serialize;

/// City loaded when none (or an unknown one) is requested
pub const DEFAULT_CITY_ID: &str = "nyc";

/// A named city preset
#[derive(Clone, Debug, Serialize)]
pub struct CityFixture {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(skip)]
    pub state: CityState,
}

/// Ids of every available preset, default first
pub fn fixture_ids() -> &'static [&'static str] {
    &["nyc", "veridia", "aether"]
}

/// Look up a preset by id
pub fn find_fixture(city_id: &str) -> Option<CityFixture> {
    match city_id {
        "nyc" => Some(new_york()),
        "veridia" => Some(veridia()),
        "aether" => Some(aether()),
        _ => None,
    }
}

/// Look up a preset, falling back to the default city for unknown ids
pub fn fixture_or_default(city_id: &str) -> CityFixture {
    find_fixture(city_id).unwrap_or_else(new_york)
}

fn hotspot(
    id: &str,
    name: &str,
    location: [f64; 2],
    status: HotspotStatus,
    reason: &str,
    camera_asset_id: Option<&str>,
) -> Hotspot {
    Hotspot {
        id: id.to_string(),
        name: name.to_string(),
        location,
        status,
        reason: reason.to_string(),
        camera_asset_id: camera_asset_id.map(str::to_string),
    }
}

fn new_york() -> CityFixture {
    use HotspotStatus::{Normal, Warning};

    CityFixture {
        id: "nyc",
        name: "New York City",
        state: CityState {
            timestamp: Utc::now(),
            weather: Weather {
                condition: "Partly Cloudy".to_string(),
                temperature: 18.0,
                precipitation: 0.15,
            },
            metrics: Metrics {
                congestion_index: 58.0,
                ems_load: 42.0,
                transit_on_time: 87.0,
                safety_incidents: 4,
                power_grid_load: 65.0,
            },
            hotspots: vec![
                hotspot("ts1", "Times Square", [40.7580, -73.9855], Normal,
                    "High pedestrian traffic - standard monitoring", Some("CAM_TS_01")),
                hotspot("gc1", "Grand Central Terminal", [40.7527, -73.9772], Normal,
                    "Transit hub operating normally", Some("CAM_GCT_02")),
                hotspot("bb1", "Brooklyn Bridge", [40.7061, -73.9969], Warning,
                    "Moderate congestion detected", Some("CAM_BB_03")),
                hotspot("jfk1", "JFK Airport - Terminal 4", [40.6413, -73.7781], Normal,
                    "Passenger flow within normal parameters", Some("CAM_JFK_04")),
                hotspot("cp1", "Central Park - Great Lawn", [40.7812, -73.9665], Normal,
                    "Park safety monitoring active", Some("CAM_CP_05")),
                hotspot("ws1", "Wall Street - NYSE", [40.7069, -74.0089], Normal,
                    "Financial district infrastructure stable", Some("CAM_WS_06")),
                hotspot("hh1", "Hudson Yards", [40.7536, -74.0012], Normal,
                    "Power grid load nominal", Some("CAM_HY_07")),
                hotspot("lga1", "LaGuardia Airport", [40.7769, -73.8740], Warning,
                    "Flight delays affecting ground transport", Some("CAM_LGA_08")),
            ],
        },
    }
}

fn veridia() -> CityFixture {
    use HotspotStatus::{Critical, Normal};

    CityFixture {
        id: "veridia",
        name: "Veridia",
        state: CityState {
            timestamp: Utc::now(),
            weather: Weather {
                condition: "Light Drizzle".to_string(),
                temperature: 14.0,
                precipitation: 0.45,
            },
            metrics: Metrics {
                congestion_index: 41.0,
                ems_load: 35.0,
                transit_on_time: 92.0,
                safety_incidents: 2,
                power_grid_load: 58.0,
            },
            hotspots: vec![
                hotspot("vh1", "Harbor Gate", [51.5074, -0.1278], Normal,
                    "Freight throughput nominal", Some("CAM_VH_01")),
                hotspot("vc2", "Civic Plaza", [51.5113, -0.1196], Normal,
                    "Pedestrian flow steady", Some("CAM_VC_02")),
                hotspot("vs3", "Substation 7", [51.4989, -0.1357], Critical,
                    "Transformer temperature above threshold", None),
            ],
        },
    }
}

fn aether() -> CityFixture {
    use HotspotStatus::{Normal, Warning};

    CityFixture {
        id: "aether",
        name: "Aether",
        state: CityState {
            timestamp: Utc::now(),
            weather: Weather {
                condition: "Clear".to_string(),
                temperature: 26.0,
                precipitation: 0.0,
            },
            metrics: Metrics {
                congestion_index: 67.0,
                ems_load: 51.0,
                transit_on_time: 78.0,
                safety_incidents: 6,
                power_grid_load: 72.0,
            },
            hotspots: vec![
                hotspot("ah1", "Skyport Terminal", [35.6762, 139.6503], Warning,
                    "Arrival surge queuing at ground transit", Some("CAM_AH_01")),
                hotspot("am2", "Maglev Central", [35.6812, 139.7671], Normal,
                    "Line headways within target", Some("CAM_AM_02")),
                hotspot("ad3", "Data District", [35.6586, 139.7454], Normal,
                    "Cooling load elevated but stable", Some("CAM_AD_03")),
                hotspot("ap4", "Riverside Promenade", [35.7101, 139.8107], Normal,
                    "Evening crowd monitoring", None),
            ],
        },
    }
}

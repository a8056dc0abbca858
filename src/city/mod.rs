// World model: city state, presets and the tick simulation

mod fixtures;
mod model;
mod simulation;

pub use fixtures::{find_fixture, fixture_ids, fixture_or_default, CityFixture, DEFAULT_CITY_ID};
pub use model::{
    CityState, EventKind, EventTrigger, Hotspot, HotspotStatus, Metrics, Scenario,
    SimulationEvent, TickReport, Weather,
};
pub use simulation::{camera_feed_url_at, CitySimulation};

use loracore::math::display::{fade, in_display_range, polar_to_scope, ScopePoint};
use loracore::telemetry::MetricsSnapshot;
use loracore::{PipelineConfig, RadarSnapshot};
use serde::Serialize;

/// Scope size the display client draws on, in scope units.
pub const SCOPE_SIZE: f64 = 400.0;
const SCOPE_MARGIN: f64 = 20.0;

#[derive(Debug, Clone, Serialize)]
pub struct TracePoint {
    pub angle: f64,
    pub distance: f64,
    pub position: ScopePoint,
    pub opacity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetMarker {
    pub id: String,
    pub angle: f64,
    pub distance: f64,
    pub age_ms: u64,
    pub position: ScopePoint,
    pub opacity: f64,
}

/// Everything the display client renders for one refresh.
#[derive(Debug, Clone, Serialize, Default)]
pub struct VisualizationModel {
    pub transport_connected: bool,
    pub link_connected: bool,
    pub status: Option<String>,
    pub angle: f64,
    pub distance: f64,
    pub sweep_angle: f64,
    pub trace: Vec<TracePoint>,
    pub targets: Vec<TargetMarker>,
    pub sample_count: usize,
    pub metrics: Option<MetricsSnapshot>,
}

impl VisualizationModel {
    pub fn from_snapshot(snapshot: &RadarSnapshot, sweep_angle: f64, config: &PipelineConfig) -> Self {
        let display = &config.display;
        let now = snapshot.taken_at;
        let project = |angle: f64, distance: f64| {
            polar_to_scope(angle, distance, SCOPE_SIZE, SCOPE_MARGIN, display.max_distance)
        };

        let trace = snapshot
            .history
            .iter()
            .filter(|sample| in_display_range(sample.distance, display))
            .map(|sample| TracePoint {
                angle: sample.angle,
                distance: sample.distance,
                position: project(sample.angle, sample.distance),
                opacity: fade(
                    sample.age_ms(now),
                    config.fade_horizon_ms,
                    display.point_min_opacity,
                ),
            })
            .collect();

        let targets = snapshot
            .targets
            .iter()
            .filter(|target| in_display_range(target.distance, display))
            .map(|target| TargetMarker {
                id: target.id.to_string(),
                angle: target.angle,
                distance: target.distance,
                age_ms: target.age_ms(now),
                position: project(target.angle, target.distance),
                opacity: fade(
                    target.age_ms(now),
                    display.target_fade_ms,
                    display.target_min_opacity,
                ),
            })
            .collect();

        Self {
            transport_connected: snapshot.telemetry.transport_connected,
            link_connected: snapshot.telemetry.link_connected,
            status: snapshot.telemetry.status.clone(),
            angle: snapshot.telemetry.angle,
            distance: snapshot.telemetry.distance,
            sweep_angle,
            trace,
            targets,
            sample_count: snapshot.history.len(),
            metrics: Some(snapshot.metrics),
        }
    }
}

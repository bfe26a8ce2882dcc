use crate::gui_bridge::model::VisualizationModel;
use anyhow::Context;
use loracore::transport::MemoryTransport;
use loracore::{Command, PipelineConfig, RadarSession, RawChunk};
use serde::Deserialize;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
};
use warp::{http::StatusCode, Filter};

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    command: String,
}

/// Bridge that exposes the live session to a display client over HTTP.
#[derive(Clone)]
pub struct GuiBridge {
    session: Arc<Mutex<RadarSession>>,
    transport: MemoryTransport,
    config: PipelineConfig,
}

impl GuiBridge {
    pub fn new(session: Arc<Mutex<RadarSession>>, transport: MemoryTransport, config: PipelineConfig) -> Self {
        Self {
            session,
            transport,
            config,
        }
    }

    pub fn model(&self) -> VisualizationModel {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        VisualizationModel::from_snapshot(&session.snapshot(), session.displayed_angle(), &self.config)
    }

    fn with_session<T>(&self, f: impl FnOnce(&RadarSession) -> T) -> T {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let bridge = self.clone();
        let bridge_filter = warp::any().map(move || bridge.clone());

        let snapshot_route = warp::path("snapshot")
            .and(warp::get())
            .and(bridge_filter.clone())
            .map(|bridge: GuiBridge| warp::reply::json(&bridge.model()));

        let ingest_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge_filter.clone())
            .map(|chunk: RawChunk, bridge: GuiBridge| {
                let listeners = bridge.transport.deliver(chunk);
                warp::reply::json(&json!({ "status": "ok", "listeners": listeners }))
            });

        let command_route = warp::path("command")
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge_filter.clone())
            .map(|request: CommandRequest, bridge: GuiBridge| {
                let command = Command::from(request.command.as_str());
                match bridge.with_session(|session| session.send_command(&command)) {
                    Ok(()) => warp::reply::with_status(
                        warp::reply::json(&json!({ "status": "ok", "sent": command.to_string() })),
                        StatusCode::OK,
                    ),
                    Err(err) => {
                        log::warn!("command error: {}", err);
                        warp::reply::with_status(
                            warp::reply::json(&json!({ "status": "error", "error": err.to_string() })),
                            StatusCode::BAD_GATEWAY,
                        )
                    }
                }
            });

        let clear_targets_route = warp::path("clear-targets")
            .and(warp::post())
            .and(bridge_filter.clone())
            .map(|bridge: GuiBridge| {
                bridge.with_session(RadarSession::clear_targets);
                warp::reply::json(&json!({ "status": "ok" }))
            });

        let clear_history_route = warp::path("clear-history")
            .and(warp::post())
            .and(bridge_filter)
            .map(|bridge: GuiBridge| {
                bridge.with_session(RadarSession::clear_history);
                warp::reply::json(&json!({ "status": "ok" }))
            });

        snapshot_route
            .or(ingest_route)
            .or(command_route)
            .or(clear_targets_route)
            .or(clear_history_route)
    }

    /// Serves the routes until `shutdown` resolves.
    pub async fn serve(
        self,
        address: SocketAddr,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(address, shutdown)
            .with_context(|| format!("binding display bridge on {}", address))?;
        self.publish_status(&format!("listening on http://{}", bound));
        server.await;
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        log::info!("[bridge] {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loracore::RadarPipeline;

    fn connected_bridge() -> (GuiBridge, MemoryTransport) {
        let transport = MemoryTransport::new();
        let mut session = RadarSession::new(RadarPipeline::default());
        session.connect(Arc::new(transport.clone()));
        let bridge = GuiBridge::new(
            Arc::new(Mutex::new(session)),
            transport.clone(),
            PipelineConfig::default(),
        );
        (bridge, transport)
    }

    #[tokio::test]
    async fn ingest_then_snapshot_reports_samples() {
        let (bridge, _transport) = connected_bridge();
        let routes = bridge.routes();

        let response = warp::test::request()
            .method("POST")
            .path("/ingest")
            .json(&"7B22616E676C65223A31302C2264697374616E6365223A3130307D0A")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut samples = 0;
        for _ in 0..100 {
            samples = bridge.model().sample_count;
            if samples == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(samples, 1);

        let response = warp::test::request()
            .method("GET")
            .path("/snapshot")
            .reply(&routes)
            .await;
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["angle"], 10.0);
        assert_eq!(body["transport_connected"], true);
    }

    #[tokio::test]
    async fn command_route_sends_terminated_frame() {
        let (bridge, transport) = connected_bridge();
        let routes = bridge.routes();

        let response = warp::test::request()
            .method("POST")
            .path("/command")
            .json(&json!({ "command": "STATUS" }))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.sent_frames(), vec!["STATUS\n".to_string()]);

        transport.set_fail_sends(true);
        let response = warp::test::request()
            .method("POST")
            .path("/command")
            .json(&json!({ "command": "STATUS" }))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn clear_routes_reset_targets() {
        let (bridge, _transport) = connected_bridge();
        bridge.with_session(|session| {
            let pipeline = session.pipeline();
            let mut pipeline = pipeline.write().unwrap();
            pipeline.ingest(&RawChunk::from(
                "{\"angle\":10,\"distance\":100}\n{\"angle\":10,\"distance\":300}\n",
            ));
        });
        assert_eq!(bridge.model().targets.len(), 1);

        let response = warp::test::request()
            .method("POST")
            .path("/clear-history")
            .reply(&bridge.routes())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let model = bridge.model();
        assert!(model.targets.is_empty());
        assert_eq!(model.sample_count, 0);
    }
}

use std::future::Future;

use podrace_core::config::ServerConfig;
use podrace_core::types::{
    CreatedRace, Race, RaceId, RaceSnapshot, Racer, RacerId, Track, TrackId,
};
use podrace_core::ServiceError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

// ─── RaceService ──────────────────────────────────────────────────────────

/// The remote race API.
///
/// Implementations never retry; a failed call is reported once and the
/// orchestrator decides what it means for the race.
pub trait RaceService: Send + Sync + 'static {
    fn create_race(
        &self,
        player_id: RacerId,
        track_id: TrackId,
    ) -> impl Future<Output = ServiceResult<CreatedRace>> + Send;

    fn race_status(&self, race_id: RaceId) -> impl Future<Output = ServiceResult<Race>> + Send;

    /// Any non-error response counts as started; the payload is ignored.
    fn start_race(&self, race_id: RaceId) -> impl Future<Output = ServiceResult<()>> + Send;

    fn accelerate(&self, race_id: RaceId) -> impl Future<Output = ServiceResult<()>> + Send;

    fn list_tracks(&self) -> impl Future<Output = ServiceResult<Vec<Track>>> + Send;

    fn list_racers(&self) -> impl Future<Output = ServiceResult<Vec<Racer>>> + Send;
}

// ─── HttpRaceService ──────────────────────────────────────────────────────

/// [`RaceService`] over HTTP/JSON.
///
/// ```text
/// POST /api/races                  {player_id, track_id} → {ID, …}
/// GET  /api/races/{id}             → {status, positions}
/// POST /api/races/{id}/start
/// POST /api/races/{id}/accelerate
/// GET  /api/tracks, /api/cars
/// ```
///
/// `{id}` is the race id shifted by `race_path_offset`; creation is never
/// shifted.
#[derive(Debug, Clone)]
pub struct HttpRaceService {
    client: reqwest::Client,
    base_url: String,
    race_path_offset: i64,
}

impl HttpRaceService {
    pub fn new(config: &ServerConfig) -> ServiceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(ServiceError::transport)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            race_path_offset: config.race_path_offset,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Status/start/accelerate URL. The offset id must stay a non-negative i64.
    fn race_url(&self, race_id: RaceId, suffix: &str) -> ServiceResult<String> {
        let offset = self.race_path_offset;
        let path_id = i64::try_from(race_id)
            .ok()
            .and_then(|id| id.checked_add(offset))
            .filter(|id| *id >= 0)
            .ok_or(ServiceError::InvalidRaceId { race_id, offset })?;
        Ok(self.url(&format!("/api/races/{path_id}{suffix}")))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> ServiceResult<reqwest::Response> {
        let resp = req.send().await.map_err(ServiceError::transport)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: DeserializeOwned>(resp: reqwest::Response) -> ServiceResult<T> {
        let bytes = resp.bytes().await.map_err(ServiceError::transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

impl RaceService for HttpRaceService {
    async fn create_race(
        &self,
        player_id: RacerId,
        track_id: TrackId,
    ) -> ServiceResult<CreatedRace> {
        let body = serde_json::json!({ "player_id": player_id, "track_id": track_id });
        let resp = self
            .send(self.client.post(self.url("/api/races")).json(&body))
            .await?;
        let created: CreatedRace = Self::json(resp).await?;
        tracing::debug!(race_id = created.id, player_id, track_id, "race created");
        Ok(created)
    }

    async fn race_status(&self, race_id: RaceId) -> ServiceResult<Race> {
        let resp = self.send(self.client.get(self.race_url(race_id, "")?)).await?;
        let snapshot: RaceSnapshot = Self::json(resp).await?;
        Ok(snapshot.into_race(race_id))
    }

    async fn start_race(&self, race_id: RaceId) -> ServiceResult<()> {
        self.send(self.client.post(self.race_url(race_id, "/start")?))
            .await?;
        Ok(())
    }

    async fn accelerate(&self, race_id: RaceId) -> ServiceResult<()> {
        self.send(self.client.post(self.race_url(race_id, "/accelerate")?))
            .await?;
        Ok(())
    }

    async fn list_tracks(&self) -> ServiceResult<Vec<Track>> {
        let resp = self.send(self.client.get(self.url("/api/tracks"))).await?;
        Self::json(resp).await
    }

    async fn list_racers(&self) -> ServiceResult<Vec<Racer>> {
        let resp = self.send(self.client.get(self.url("/api/cars"))).await?;
        Self::json(resp).await
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

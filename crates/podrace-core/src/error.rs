use thiserror::Error;

/// Failure reported by the remote race service or the transport beneath it.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("race service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode race service response: {0}")]
    Decode(String),

    #[error("race id {race_id} with path offset {offset} is not a valid path id")]
    InvalidRaceId { race_id: u64, offset: i64 },
}

impl ServiceError {
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum RaceError {
    #[error("invalid selection: pick both a track and a racer before starting a race")]
    InvalidSelection,

    #[error("failed to create race: {0}")]
    CreateRace(#[source] ServiceError),

    #[error("failed to start race: {0}")]
    StartRace(#[source] ServiceError),

    #[error("failed to fetch race progress: {0}")]
    PollFetch(#[source] ServiceError),

    #[error("a race is already in progress")]
    RaceAlreadyInProgress,

    #[error("race was cancelled")]
    Cancelled,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("{0} stopped without reporting a result")]
    TimerStopped(&'static str),

    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RaceError>;

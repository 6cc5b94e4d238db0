use thiserror::Error;

/// Failure while retrieving telemetry from the weather provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to send request to weather provider: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Weather provider request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse weather provider JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure from the text-generation service.
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("Failed to send request to narration service: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Narration service returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse narration response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Narration service returned no content")]
    EmptyResponse,
}

/// Failure from the speech-synthesis service or while writing its output.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Failed to send request to synthesis service: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Synthesis service returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to write audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Nothing to synthesize: text is empty")]
    EmptyText,
}

/// Failure of a single forecast build. Whatever stage failed first aborts the rest.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Narration(#[from] NarrationError),

    #[error("Failed to encode narration payload: {0}")]
    Payload(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid cadence expression '{expr}': {reason}")]
    Cron { expr: String, reason: String },
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

//! Submission driver.
//!
//! Consumes generated combinations in order — sizes ascending, each
//! size's (already shuffled) queue front to back — and submits them one
//! at a time. Every attempt's outcome is observed before the next is
//! issued: a success is persisted to the submission log (write-through)
//! and followed by a randomized pacing delay; any failure, transport or
//! application level, aborts the whole run. There is no retry — a
//! partially acknowledged entry on the remote side is too risky to
//! resubmit blindly.

pub mod drafters;

pub use drafters::DraftersClient;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::UserIdentity;
use crate::storage::SubmissionLog;
use crate::types::{Combination, ProplineError, SubmissionResult};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// JSON body of one entry submission.
#[derive(Debug, Clone, Serialize)]
pub struct EntryPayload {
    pub lg_name: String,
    /// The contest service wants the fee as a string.
    pub entry_fee: String,
    /// prop_id → "over" | "under".
    pub selections: BTreeMap<String, String>,
    #[serde(rename = "PublicIP")]
    pub public_ip: String,
    pub country_name: String,
    pub state_name: String,
    pub user_dob: String,
    pub display_name: String,
    pub ticket_id: u32,
    pub safety: bool,
}

/// Entry endpoint response. We only deserialize the fields that decide
/// the outcome.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "marketError")]
    pub market_error: bool,
}

impl EntryResponse {
    /// Whether the service actually accepted the entry.
    pub fn is_accepted(&self) -> bool {
        self.status && !self.market_error
    }

    /// The rejection message to surface to the operator.
    pub fn rejection_message(&self) -> String {
        match (&self.message, self.market_error) {
            (Some(msg), _) => msg.clone(),
            (None, true) => "market error".to_string(),
            (None, false) => "submission refused without message".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Submitter seam
// ---------------------------------------------------------------------------

/// The entry endpoint, abstracted so the driver can be tested against a
/// scripted implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntrySubmitter: Send + Sync {
    /// Send one entry. A transport-level failure (network error, non-2xx,
    /// unparseable body) is `ProplineError::Transport`; an application
    /// rejection comes back as a normal `EntryResponse`.
    async fn submit_entry(&self, payload: &EntryPayload) -> Result<EntryResponse, ProplineError>;
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Everything the driver needs besides the queue itself.
#[derive(Debug, Clone)]
pub struct DriveSettings {
    pub entry_fee: Decimal,
    pub identity: UserIdentity,
    /// Pacing window (seconds) slept after each successful submission.
    pub pace_min_secs: f64,
    pub pace_max_secs: f64,
}

impl DriveSettings {
    /// Build the wire payload for one combination.
    pub fn payload_for(&self, combo: &Combination) -> EntryPayload {
        let selections = combo
            .legs
            .iter()
            .map(|leg| (leg.prop_id.clone(), leg.direction.as_selection().to_string()))
            .collect();

        EntryPayload {
            lg_name: "props-entry".to_string(),
            entry_fee: self.entry_fee.to_string(),
            selections,
            public_ip: self.identity.public_ip.clone(),
            country_name: self.identity.country_name.clone(),
            state_name: self.identity.state_name.clone(),
            user_dob: self.identity.user_dob.clone(),
            display_name: self.identity.display_name.clone(),
            ticket_id: 0,
            safety: false,
        }
    }
}

/// Drive the full submission queue.
///
/// Returns the results of all successful submissions, or the first fatal
/// error. On error, every already-confirmed submission is guaranteed to
/// be in the log: the append lands (flushed) before the next attempt is
/// issued, and before the error is raised.
pub async fn drive<S, L, R>(
    combos_by_size: &BTreeMap<usize, Vec<Combination>>,
    submitter: &S,
    log: &mut L,
    settings: &DriveSettings,
    rng: &mut R,
) -> Result<Vec<SubmissionResult>, ProplineError>
where
    S: EntrySubmitter + ?Sized,
    L: SubmissionLog + ?Sized,
    R: Rng + ?Sized,
{
    let mut results = Vec::new();

    for (&size, combos) in combos_by_size {
        if combos.is_empty() {
            info!(size, "No valid combinations for this size, skipping");
            continue;
        }
        info!(size, queued = combos.len(), "Submitting combinations");

        for combo in combos {
            let key = combo.key();
            let payload = settings.payload_for(combo);

            let response = submitter.submit_entry(&payload).await?;

            if !response.is_accepted() {
                let message = response.rejection_message();
                warn!(size, key = %key, message = %message, "Entry rejected, aborting run");
                return Err(ProplineError::Rejected(message));
            }

            log.append(&key)
                .map_err(|e| ProplineError::Storage(format!("{e:#}")))?;

            info!(size, key = %key, "Entry submitted");
            results.push(SubmissionResult {
                size,
                key,
                message: response.message,
                submitted_at: Utc::now(),
            });

            let delay = rng.gen_range(settings.pace_min_secs..=settings.pace_max_secs);
            if delay > 0.0 {
                tokio::time::sleep(std::time::Duration::from_secs_f64(delay)).await;
            }
        }
    }

    info!(submitted = results.len(), "Submission run complete");
    Ok(results)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

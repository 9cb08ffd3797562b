//! Form State Store: the two profiles, the mode flag and the ephemeral
//! slots (result, error, upload, loading) of one session.
//!
//! Asynchronous work (extraction, analysis) is split into `begin_*`, which
//! hands out a [`Ticket`], and `finish_*`, which applies the outcome only if
//! the ticket still matches the store. Mode switches, resets and file removal
//! invalidate outstanding tickets, so late results are dropped instead of
//! landing in the wrong profile.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::analysis::NO_INPUT_MESSAGE;
use crate::models::analysis::AnalysisResult;
use crate::models::profile::{FieldError, Mode, Profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationKind {
    Extraction,
    Analysis,
}

/// Stamp captured when an asynchronous operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: OperationKind,
    pub mode: Mode,
    generation: u64,
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Discarded,
}

/// Why an analysis could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// An extraction or analysis is already in flight.
    Busy,
    /// The active profile has no content to analyze.
    NoInput,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UploadState {
    pub file_name: Option<String>,
    pub parsing: bool,
}

#[derive(Debug)]
pub struct FormStore {
    mode: Mode,
    individual: Profile,
    business: Profile,
    result: Option<AnalysisResult>,
    error: Option<String>,
    upload: UploadState,
    loading: bool,
    /// Bumped by anything that abandons in-flight work.
    generation: u64,
    upload_seq: u64,
    analysis_seq: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Serializable view of the whole form.
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub mode: Mode,
    pub individual: Profile,
    pub business: Profile,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub upload: UploadState,
    pub loading: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FormStore {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            mode: Mode::Individual,
            individual: Profile::empty(Mode::Individual),
            business: Profile::empty(Mode::Business),
            result: None,
            error: None,
            upload: UploadState::default(),
            loading: false,
            generation: 0,
            upload_seq: 0,
            analysis_seq: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn profile(&self, mode: Mode) -> &Profile {
        match mode {
            Mode::Individual => &self.individual,
            Mode::Business => &self.business,
        }
    }

    fn profile_mut(&mut self, mode: Mode) -> &mut Profile {
        match mode {
            Mode::Individual => &mut self.individual,
            Mode::Business => &mut self.business,
        }
    }

    pub fn active_profile(&self) -> &Profile {
        self.profile(self.mode)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Clears result, error and upload state and abandons in-flight work.
    fn clear_ephemeral(&mut self) {
        self.result = None;
        self.error = None;
        self.upload = UploadState::default();
        self.loading = false;
        self.generation += 1;
    }

    pub fn set_field(&mut self, mode: Mode, field: &str, value: String) -> Result<(), FieldError> {
        self.profile_mut(mode).set_field(field, value)?;
        self.touch();
        Ok(())
    }

    /// Changes the active mode. Field data of both profiles is kept.
    pub fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.clear_ephemeral();
        self.touch();
    }

    /// Empties every field of `mode`'s profile; the other profile is untouched.
    pub fn reset(&mut self, mode: Mode) {
        *self.profile_mut(mode) = Profile::empty(mode);
        self.clear_ephemeral();
        self.touch();
    }

    /// Forgets the selected file and empties the active profile's content.
    pub fn remove_file(&mut self) {
        self.upload = UploadState::default();
        self.upload_seq += 1;
        self.profile_mut(self.mode).content.clear();
        self.touch();
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        let latest = match ticket.kind {
            OperationKind::Extraction => self.upload_seq,
            OperationKind::Analysis => self.analysis_seq,
        };
        ticket.mode == self.mode && ticket.generation == self.generation && ticket.seq == latest
    }

    pub fn begin_extraction(&mut self, file_name: &str) -> Ticket {
        self.error = None;
        self.upload = UploadState {
            file_name: Some(file_name.to_string()),
            parsing: true,
        };
        self.upload_seq += 1;
        self.touch();
        Ticket {
            kind: OperationKind::Extraction,
            mode: self.mode,
            generation: self.generation,
            seq: self.upload_seq,
        }
    }

    /// Writes extracted text into the ticket's profile, or records the error.
    /// `content` is left alone on failure.
    pub fn finish_extraction(
        &mut self,
        ticket: Ticket,
        outcome: Result<String, String>,
    ) -> Applied {
        if !self.is_current(&ticket) {
            debug!("Discarding stale extraction result for {} profile", ticket.mode);
            return Applied::Discarded;
        }
        match outcome {
            Ok(text) => self.profile_mut(ticket.mode).content = text,
            Err(message) => self.error = Some(message),
        }
        self.upload.parsing = false;
        self.touch();
        Applied::Applied
    }

    /// Starts an analysis of the active profile, returning its ticket and a
    /// copy of the profile to analyze.
    pub fn begin_analysis(&mut self) -> Result<(Ticket, Profile), Rejected> {
        if self.loading || self.upload.parsing {
            return Err(Rejected::Busy);
        }
        if self.active_profile().content.trim().is_empty() {
            self.error = Some(NO_INPUT_MESSAGE.to_string());
            self.touch();
            return Err(Rejected::NoInput);
        }

        self.error = None;
        self.loading = true;
        self.analysis_seq += 1;
        self.touch();
        let ticket = Ticket {
            kind: OperationKind::Analysis,
            mode: self.mode,
            generation: self.generation,
            seq: self.analysis_seq,
        };
        Ok((ticket, self.active_profile().clone()))
    }

    /// Replaces the result on success; on failure records the error and keeps
    /// the previous result.
    pub fn finish_analysis(
        &mut self,
        ticket: Ticket,
        outcome: Result<AnalysisResult, String>,
    ) -> Applied {
        if !self.is_current(&ticket) {
            debug!("Discarding stale analysis result for {} profile", ticket.mode);
            return Applied::Discarded;
        }
        match outcome {
            Ok(result) => self.result = Some(result),
            Err(message) => self.error = Some(message),
        }
        self.loading = false;
        self.touch();
        Applied::Applied
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            mode: self.mode,
            individual: self.individual.clone(),
            business: self.business.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
            upload: self.upload.clone(),
            loading: self.loading,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

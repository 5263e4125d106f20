use crate::error::ConfigError;
use duet_core::{MemberId, Phase, RoomId};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

const CREDENTIAL_VAR_PREFIX: &str = "DUET_CREDENTIAL_";

/// Per-room settings, resolved before the room view is opened.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub room_id: RoomId,
    /// Member id of the local participant; compared against the host flag of the directory.
    pub local_member: MemberId,
    /// Total participant capacity, split evenly between the two categories.
    pub capacity: usize,
    pub entry_phase: Phase,
    pub timer_duration: Duration,
}

impl RoomConfig {
    pub fn new(room_id: RoomId, local_member: MemberId) -> Self {
        Self {
            room_id,
            local_member,
            capacity: 4,
            entry_phase: Phase::End,
            timer_duration: Duration::from_secs(15 * 60),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_entry_phase(mut self, phase: Phase) -> Self {
        self.entry_phase = phase;
        self
    }

    pub fn with_timer_duration(mut self, duration: Duration) -> Self {
        self.timer_duration = duration;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.capacity % 2 != 0 {
            return Err(ConfigError::OddCapacity(self.capacity));
        }
        Ok(())
    }

    pub fn slots_per_category(&self) -> usize {
        self.capacity / 2
    }
}

/// Bearer credential presented to the broker at connect time.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Maps a deployment discriminator (a port, a stage name) to its credential.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: HashMap<String, Credential>,
}

impl CredentialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, discriminator: impl Into<String>, credential: Credential) {
        self.entries
            .insert(discriminator.into().to_ascii_lowercase(), credential);
    }

    pub fn with(mut self, discriminator: impl Into<String>, credential: Credential) -> Self {
        self.insert(discriminator, credential);
        self
    }

    /// Builds a table from `DUET_CREDENTIAL_<DISCRIMINATOR>=<token>` pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (key, value) in vars {
            if let Some(discriminator) = key.as_ref().strip_prefix(CREDENTIAL_VAR_PREFIX) {
                table.insert(discriminator, Credential::new(value));
            }
        }
        table
    }

    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn resolve(&self, discriminator: &str) -> Result<Credential, ConfigError> {
        self.entries
            .get(&discriminator.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ConfigError::UnknownDeployment(discriminator.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn parse_millis(name: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        })
}

//! Case entity - a community-conflict case file

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::core::case_number::CaseNumber;
use crate::core::entity::Status;
use crate::core::extension::{Extension, ExtensionError, ExtensionState};

/// Prefix used when rendering case ids
pub const CASE_ID_PREFIX: &str = "CASE";

/// Internal identifier of a case, independent of its public case number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId(Ulid);

impl CaseId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    pub fn ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", CASE_ID_PREFIX, self.0)
    }
}

impl std::str::FromStr for CaseId {
    type Err = String;

    /// Accepts `CASE-<ulid>` or a bare ULID
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let raw = s
            .strip_prefix(CASE_ID_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(s);
        Ulid::from_string(raw)
            .map(CaseId)
            .map_err(|e| format!("Invalid case id '{}': {}", s, e))
    }
}

impl Serialize for CaseId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CaseId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Conflict categories handled by community judges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Vecinal,
    Individual,
    Comunitario,
    /// Contravention without deprivation of liberty
    Contravencion,
    /// Patrimonial obligation up to five basic salaries
    ObligacionPatrimonial,
    Otro,
}

impl ConflictType {
    pub const ALL: [ConflictType; 6] = [
        ConflictType::Vecinal,
        ConflictType::Individual,
        ConflictType::Comunitario,
        ConflictType::Contravencion,
        ConflictType::ObligacionPatrimonial,
        ConflictType::Otro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Vecinal => "vecinal",
            ConflictType::Individual => "individual",
            ConflictType::Comunitario => "comunitario",
            ConflictType::Contravencion => "contravencion",
            ConflictType::ObligacionPatrimonial => "obligacion_patrimonial",
            ConflictType::Otro => "otro",
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConflictType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        ConflictType::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| format!("Unknown conflict type: {}", s))
    }
}

/// Residential blocks served by the community court
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResidentialBlock {
    #[serde(rename = "BLOQUE_15")]
    Bloque15,
    #[serde(rename = "BLOQUE_16")]
    Bloque16,
    #[serde(rename = "BLOQUE_17")]
    Bloque17,
    #[serde(rename = "BLOQUE_18")]
    Bloque18,
    #[serde(rename = "BLOQUE_19")]
    Bloque19,
    #[serde(rename = "BLOQUE_20")]
    Bloque20,
    #[serde(rename = "BLOQUE_21")]
    Bloque21,
    #[serde(rename = "BLOQUE_22P")]
    Bloque22P,
    #[serde(rename = "BLOQUE_23P")]
    Bloque23P,
    #[serde(rename = "BLOQUE_24P")]
    Bloque24P,
    #[serde(rename = "BLOQUE_25P")]
    Bloque25P,
}

impl ResidentialBlock {
    pub const ALL: [ResidentialBlock; 11] = [
        ResidentialBlock::Bloque15,
        ResidentialBlock::Bloque16,
        ResidentialBlock::Bloque17,
        ResidentialBlock::Bloque18,
        ResidentialBlock::Bloque19,
        ResidentialBlock::Bloque20,
        ResidentialBlock::Bloque21,
        ResidentialBlock::Bloque22P,
        ResidentialBlock::Bloque23P,
        ResidentialBlock::Bloque24P,
        ResidentialBlock::Bloque25P,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResidentialBlock::Bloque15 => "BLOQUE_15",
            ResidentialBlock::Bloque16 => "BLOQUE_16",
            ResidentialBlock::Bloque17 => "BLOQUE_17",
            ResidentialBlock::Bloque18 => "BLOQUE_18",
            ResidentialBlock::Bloque19 => "BLOQUE_19",
            ResidentialBlock::Bloque20 => "BLOQUE_20",
            ResidentialBlock::Bloque21 => "BLOQUE_21",
            ResidentialBlock::Bloque22P => "BLOQUE_22P",
            ResidentialBlock::Bloque23P => "BLOQUE_23P",
            ResidentialBlock::Bloque24P => "BLOQUE_24P",
            ResidentialBlock::Bloque25P => "BLOQUE_25P",
        }
    }
}

impl std::fmt::Display for ResidentialBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResidentialBlock {
    type Err = String;

    /// Accepts `BLOQUE_15`, `bloque-15` or just `15` / `22p`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase().replace('-', "_");
        let key = if upper.starts_with("BLOQUE_") {
            upper
        } else {
            format!("BLOQUE_{}", upper)
        };
        ResidentialBlock::ALL
            .into_iter()
            .find(|b| b.as_str() == key)
            .ok_or_else(|| format!("Unknown residential block: {}", s))
    }
}

/// How a case was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Conciliacion,
    Mediacion,
    Arbitraje,
    Sentencia,
    Desistimiento,
    Otro,
}

impl ResolutionMethod {
    pub const ALL: [ResolutionMethod; 6] = [
        ResolutionMethod::Conciliacion,
        ResolutionMethod::Mediacion,
        ResolutionMethod::Arbitraje,
        ResolutionMethod::Sentencia,
        ResolutionMethod::Desistimiento,
        ResolutionMethod::Otro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Conciliacion => "conciliacion",
            ResolutionMethod::Mediacion => "mediacion",
            ResolutionMethod::Arbitraje => "arbitraje",
            ResolutionMethod::Sentencia => "sentencia",
            ResolutionMethod::Desistimiento => "desistimiento",
            ResolutionMethod::Otro => "otro",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResolutionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        ResolutionMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| format!("Unknown resolution method: {}", s))
    }
}

/// Resolution details recorded when a case is resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub method: ResolutionMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Filing request: what the caller knows before a number exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCase {
    pub conflict_type: ConflictType,
    pub residential_block: ResidentialBlock,
    pub judge_id: String,
}

/// A tracked case file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,

    pub case_number: CaseNumber,

    /// Anchor for every deadline computation
    pub filed_at: DateTime<Utc>,

    pub status: Status,

    #[serde(default)]
    pub extension: ExtensionState,

    pub conflict_type: ConflictType,

    pub residential_block: ResidentialBlock,

    /// Judge responsible for the case (owned by the user directory)
    pub judge_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// Build a freshly filed case: status `EnTramite`, no extension
    pub fn file(case_number: CaseNumber, request: NewCase, filed_at: DateTime<Utc>) -> Self {
        Self {
            id: CaseId::new(),
            case_number,
            filed_at,
            status: Status::EnTramite,
            extension: ExtensionState::NotExtended,
            conflict_type: request.conflict_type,
            residential_block: request.residential_block,
            judge_id: request.judge_id,
            resolution: None,
            resolved_at: None,
            closed_at: None,
            archived_at: None,
            updated_at: filed_at,
        }
    }

    /// Attach a granted extension; refuses to replace an existing one
    pub fn attach_extension(&mut self, extension: Extension) -> Result<(), ExtensionError> {
        if let ExtensionState::Granted(existing) = &self.extension {
            return Err(ExtensionError::AlreadyExtended {
                case_number: self.case_number,
                granted_at: existing.granted_at,
            });
        }
        self.updated_at = extension.granted_at;
        self.extension = ExtensionState::Granted(extension);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.status == Status::EnTramite
    }
}

//! Case status - the closed set of lifecycle states

/// Lifecycle status of a case file
///
/// `Cerrado` and `Archivado` are terminal. Legal moves are listed by
/// [`crate::core::workflow::CaseStateMachine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Filed and awaiting resolution (initial state)
    #[default]
    EnTramite,
    /// A resolution has been reached
    Resuelto,
    /// Definitively closed
    Cerrado,
    /// Administratively archived
    Archivado,
}

impl Status {
    /// All statuses in lifecycle order
    pub const ALL: [Status; 4] = [
        Status::EnTramite,
        Status::Resuelto,
        Status::Cerrado,
        Status::Archivado,
    ];

    /// Stable storage key for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::EnTramite => "en_tramite",
            Status::Resuelto => "resuelto",
            Status::Cerrado => "cerrado",
            Status::Archivado => "archivado",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Status::EnTramite => "En Trámite",
            Status::Resuelto => "Resuelto",
            Status::Cerrado => "Cerrado",
            Status::Archivado => "Archivado",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Cerrado | Status::Archivado)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "en_tramite" | "entramite" => Ok(Status::EnTramite),
            "resuelto" => Ok(Status::Resuelto),
            "cerrado" => Ok(Status::Cerrado),
            "archivado" => Ok(Status::Archivado),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

//! Filter enums for list commands

use clap::ValueEnum;

use crate::core::deadline::Tier;
use crate::core::entity::Status;

/// Status filter for `jpc list`
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// en_tramite only
    EnTramite,
    /// resuelto only
    Resuelto,
    /// cerrado only
    Cerrado,
    /// archivado only
    Archivado,
    /// Non-terminal statuses (en_tramite, resuelto)
    Open,
    /// Everything - default
    #[default]
    All,
}

impl StatusFilter {
    /// Exact status to push down to the store, if the filter names one
    pub fn as_status(&self) -> Option<Status> {
        match self {
            StatusFilter::EnTramite => Some(Status::EnTramite),
            StatusFilter::Resuelto => Some(Status::Resuelto),
            StatusFilter::Cerrado => Some(Status::Cerrado),
            StatusFilter::Archivado => Some(Status::Archivado),
            StatusFilter::Open | StatusFilter::All => None,
        }
    }

    pub fn matches(&self, status: &Status) -> bool {
        match self {
            StatusFilter::Open => !status.is_terminal(),
            StatusFilter::All => true,
            exact => exact.as_status() == Some(*status),
        }
    }
}

/// Deadline tier filter; only open (`en_tramite`) cases have a meaningful tier
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TierFilter {
    EnTiempo,
    Urgente,
    Vencido,
    /// Urgente or vencido
    Alert,
}

impl TierFilter {
    pub fn matches(&self, tier: Tier) -> bool {
        match self {
            TierFilter::EnTiempo => tier == Tier::EnTiempo,
            TierFilter::Urgente => tier == Tier::Urgente,
            TierFilter::Vencido => tier == Tier::Vencido,
            TierFilter::Alert => tier != Tier::EnTiempo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_open() {
        assert!(StatusFilter::Open.matches(&Status::EnTramite));
        assert!(StatusFilter::Open.matches(&Status::Resuelto));
        assert!(!StatusFilter::Open.matches(&Status::Cerrado));
        assert!(!StatusFilter::Open.matches(&Status::Archivado));
    }

    #[test]
    fn test_status_filter_exact() {
        assert_eq!(StatusFilter::Cerrado.as_status(), Some(Status::Cerrado));
        assert!(StatusFilter::Cerrado.matches(&Status::Cerrado));
        assert!(!StatusFilter::Cerrado.matches(&Status::Resuelto));
        assert!(StatusFilter::All.matches(&Status::Archivado));
        assert_eq!(StatusFilter::All.as_status(), None);
    }

    #[test]
    fn test_tier_filter_alert() {
        assert!(TierFilter::Alert.matches(Tier::Urgente));
        assert!(TierFilter::Alert.matches(Tier::Vencido));
        assert!(!TierFilter::Alert.matches(Tier::EnTiempo));
    }
}

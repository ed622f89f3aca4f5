//! Crowdsale lifecycle states as reported by the contract's `getState()`.

use std::fmt;

use crate::errors::OpsError;

/// The contract's state machine, in on-chain numbering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrowdsaleState {
    Unknown,
    Preparing,
    PreFunding,
    Funding,
    Success,
    Failure,
    Finalized,
    Refunding,
}

impl CrowdsaleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrowdsaleState::Unknown => "Unknown",
            CrowdsaleState::Preparing => "Preparing",
            CrowdsaleState::PreFunding => "PreFunding",
            CrowdsaleState::Funding => "Funding",
            CrowdsaleState::Success => "Success",
            CrowdsaleState::Failure => "Failure",
            CrowdsaleState::Finalized => "Finalized",
            CrowdsaleState::Refunding => "Refunding",
        }
    }
}

impl TryFrom<u64> for CrowdsaleState {
    type Error = OpsError;

    fn try_from(code: u64) -> Result<CrowdsaleState, OpsError> {
        match code {
            0 => Ok(CrowdsaleState::Unknown),
            1 => Ok(CrowdsaleState::Preparing),
            2 => Ok(CrowdsaleState::PreFunding),
            3 => Ok(CrowdsaleState::Funding),
            4 => Ok(CrowdsaleState::Success),
            5 => Ok(CrowdsaleState::Failure),
            6 => Ok(CrowdsaleState::Finalized),
            7 => Ok(CrowdsaleState::Refunding),
            other => Err(OpsError::UnknownState(other)),
        }
    }
}

impl fmt::Display for CrowdsaleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_maps_to_its_name() {
        let expected = [
            "Unknown",
            "Preparing",
            "PreFunding",
            "Funding",
            "Success",
            "Failure",
            "Finalized",
            "Refunding",
        ];
        for (code, name) in expected.iter().enumerate() {
            let state = CrowdsaleState::try_from(code as u64).unwrap();
            assert_eq!(state.as_str(), *name);
            assert_eq!(state.to_string(), *name);
        }
    }

    #[test]
    fn out_of_range_codes_are_rejected() {
        match CrowdsaleState::try_from(8) {
            Err(OpsError::UnknownState(8)) => {}
            other => panic!("expected UnknownState(8), got {other:?}"),
        }
        assert!(CrowdsaleState::try_from(u64::MAX).is_err());
    }
}

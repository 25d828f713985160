//! Plan variables: the decision points the rollout simulator walks.
//!
//! A [`Variable`] is keyed by `(satellite, second)`. Its [`Domain`] is an
//! ordered list of [`Command`] choices, built once from the satellite's
//! per-second access/ground-contact/gap input and then narrowed as the
//! simulator runs ([`crate::simulator`]).

mod builder;
mod gp_index;

pub use builder::{build_plan_variables, PlanVariableTables, SecondInput};
pub use gp_index::GpIndex;

use std::fmt;

/// A decision point: a satellite at a particular second of the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub satellite: String,
    pub second: i64,
}

impl Variable {
    pub fn new(satellite: impl Into<String>, second: i64) -> Self {
        Self {
            satellite: satellite.into(),
            second,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.satellite, self.second)
    }
}

/// A single command choice available at a [`Variable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Observe a set of ground points, producing one image. The list is
    /// always kept sorted and deduplicated, and is stored parsed rather than
    /// as a csv string so stripping observed ground points is an integer
    /// filter, never a textual substring replace (SPEC_FULL §9).
    Raw(Vec<u32>),
    /// Downlink one second's worth of image bits to the named ground station.
    Dnl(String),
    /// Idle: no storage effect, sensor and idle power still consumed.
    Idl,
    /// No opportunity this second. Gap variables are never part of the
    /// active set and never reach the simulator.
    Gap,
}

impl Command {
    pub fn is_raw(&self) -> bool {
        matches!(self, Command::Raw(_))
    }

    pub fn is_dnl(&self) -> bool {
        matches!(self, Command::Dnl(_))
    }

    pub fn is_idl(&self) -> bool {
        matches!(self, Command::Idl)
    }

    pub fn raw_gps(&self) -> Option<&[u32]> {
        match self {
            Command::Raw(gps) => Some(gps),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Raw(gps) => {
                let csv = gps
                    .iter()
                    .map(|g| g.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "RAW.{csv}")
            }
            Command::Dnl(gs) => write!(f, "DNL.{gs}"),
            Command::Idl => write!(f, "IDL"),
            Command::Gap => write!(f, "***"),
        }
    }
}

/// Ordered sequence of choices available at a [`Variable`].
pub type Domain = Vec<Command>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_display() {
        let v = Variable::new("S1", 42);
        assert_eq!(v.to_string(), "S1.42");
    }

    #[test]
    fn command_display() {
        assert_eq!(Command::Raw(vec![1, 2, 42]).to_string(), "RAW.1,2,42");
        assert_eq!(Command::Dnl("G1".into()).to_string(), "DNL.G1");
        assert_eq!(Command::Idl.to_string(), "IDL");
        assert_eq!(Command::Gap.to_string(), "***");
    }
}

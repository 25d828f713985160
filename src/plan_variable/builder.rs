//! Builds the initial plan-variable tables from per-satellite window input.

use std::collections::HashMap;

use super::{Command, Domain, GpIndex, Variable};

/// What a satellite's access/ground-contact/gap tables say is available at
/// one second, before it has been turned into a [`Domain`].
#[derive(Debug, Clone)]
pub enum SecondInput {
    /// One or more access-window entries at this second, each naming a
    /// source and the ground points it can see. Flattened, sorted, and
    /// deduplicated into a single `RAW` choice.
    Access(Vec<(String, Vec<u32>)>),
    /// A ground-contact window to the named ground station.
    Downlink(String),
    /// No opportunity this second.
    Gap,
}

/// The plan-variable tables a rollout simulator is driven from.
#[derive(Debug, Clone, Default)]
pub struct PlanVariableTables {
    /// Every variable's domain, including single-choice ones pruned from
    /// `active_order`. Retained for plan reassembly (SPEC_FULL §4.1).
    pub all: HashMap<Variable, Domain>,
    /// Multi-choice variables only, in chronological order (ties broken by
    /// satellite registration order).
    pub active_order: Vec<Variable>,
    pub gp_index: GpIndex,
}

/// Builds the plan-variable tables for a set of satellites.
///
/// `satellites` is `(satellite name, per-second input)` in registration
/// order; that order breaks ties when two satellites share a second.
pub fn build_plan_variables(satellites: &[(String, Vec<(i64, SecondInput)>)]) -> PlanVariableTables {
    let mut tables = PlanVariableTables::default();
    let mut active: Vec<(i64, usize, Variable)> = Vec::new();

    for (sat_index, (satellite, seconds)) in satellites.iter().enumerate() {
        for (second, input) in seconds {
            let variable = Variable::new(satellite.clone(), *second);
            let domain = domain_for(input);

            if domain.len() > 1 {
                active.push((*second, sat_index, variable.clone()));
                if let Some(Command::Raw(gps)) = domain.first() {
                    for gp in gps {
                        tables.gp_index.register(*gp, variable.clone());
                    }
                }
            }
            tables.all.insert(variable, domain);
        }
    }

    active.sort_by_key(|(second, sat_index, _)| (*second, *sat_index));
    tables.active_order = active.into_iter().map(|(_, _, v)| v).collect();
    tables
}

fn domain_for(input: &SecondInput) -> Domain {
    match input {
        SecondInput::Access(sources) => {
            let mut gps: Vec<u32> = sources.iter().flat_map(|(_, gp)| gp.iter().copied()).collect();
            gps.sort_unstable();
            gps.dedup();
            vec![Command::Raw(gps), Command::Idl]
        }
        SecondInput::Downlink(gs) => vec![Command::Dnl(gs.clone()), Command::Idl],
        SecondInput::Gap => vec![Command::Gap],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_gps_are_flattened_sorted_deduped() {
        let satellites = vec![(
            "S1".to_string(),
            vec![(
                10,
                SecondInput::Access(vec![
                    ("src1".to_string(), vec![5, 3]),
                    ("src2".to_string(), vec![3, 1]),
                ]),
            )],
        )];
        let tables = build_plan_variables(&satellites);
        let v = Variable::new("S1", 10);
        assert_eq!(tables.all[&v], vec![Command::Raw(vec![1, 3, 5]), Command::Idl]);
        assert_eq!(tables.active_order, vec![v]);
    }

    #[test]
    fn gap_variables_are_excluded_from_active_set() {
        let satellites = vec![("S1".to_string(), vec![(1, SecondInput::Gap)])];
        let tables = build_plan_variables(&satellites);
        assert!(tables.active_order.is_empty());
        assert_eq!(tables.all[&Variable::new("S1", 1)], vec![Command::Gap]);
    }

    #[test]
    fn ties_broken_by_registration_order_not_lexical_order() {
        let satellites = vec![
            ("Zeta".to_string(), vec![(5, SecondInput::Downlink("G1".into()))]),
            ("Alpha".to_string(), vec![(5, SecondInput::Downlink("G1".into()))]),
        ];
        let tables = build_plan_variables(&satellites);
        assert_eq!(
            tables.active_order,
            vec![Variable::new("Zeta", 5), Variable::new("Alpha", 5)]
        );
    }

    #[test]
    fn gp_index_covers_every_satellite_sharing_a_ground_point() {
        let satellites = vec![
            ("S1".to_string(), vec![(1, SecondInput::Access(vec![("a".into(), vec![42])]))]),
            ("S2".to_string(), vec![(1, SecondInput::Access(vec![("a".into(), vec![42])]))]),
        ];
        let tables = build_plan_variables(&satellites);
        let s1 = Variable::new("S1", 1);
        let covering: Vec<_> = tables.gp_index.variables_covering(42, &s1).collect();
        assert_eq!(covering, vec![&Variable::new("S2", 1)]);
    }
}

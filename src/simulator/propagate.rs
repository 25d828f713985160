//! The three narrowing actions of `propagateChoice` (SPEC_FULL §4.2).

use std::collections::{HashMap, VecDeque};

use tracing::warn;

use crate::error::PlannerError;
use crate::plan_variable::{Command, Domain, GpIndex, Variable};

/// Strips `RAW.*` (when `raw_full` is true) or `DNL.*` (when `raw_full` is
/// false) from `satellite`'s still-active upcoming variables, stopping
/// inclusively at the first variable offering the opposite opportunity
/// (SPEC_FULL §4.2 rules 1/2, §9's inclusive-stop reading).
///
/// Variables whose domain collapses to `{IDL}` are dropped from the active
/// set (`domains`/`remaining`). A collapse to anything else is reported as a
/// domain-invariant violation and the variable is left untouched.
pub(super) fn strip_until_opportunity(
    domains: &mut HashMap<Variable, Domain>,
    remaining: &mut VecDeque<Variable>,
    satellite: &str,
    raw_full: bool,
) {
    let future: Vec<Variable> = remaining.iter().filter(|v| v.satellite == satellite).cloned().collect();

    for var in future {
        let Some(domain) = domains.get_mut(&var) else {
            continue;
        };
        let has_opposite = if raw_full {
            domain.iter().any(Command::is_dnl)
        } else {
            domain.iter().any(Command::is_raw)
        };

        let had_strip_target = if raw_full {
            domain.iter().any(Command::is_raw)
        } else {
            domain.iter().any(Command::is_dnl)
        };
        if had_strip_target {
            if raw_full {
                domain.retain(|c| !c.is_raw());
            } else {
                domain.retain(|c| !c.is_dnl());
            }
            collapse_or_flag(domains, remaining, &var);
        }

        if has_opposite {
            break;
        }
    }
}

/// Removes `gp` from every other still-active variable's `RAW.<csv>` list
/// (consulting the immutable [`GpIndex`]), dropping the `RAW` choice if the
/// list becomes empty and dropping the variable entirely if that leaves only
/// `IDL` (SPEC_FULL §4.2 rule 3). Always operates on a parsed `Vec<u32>`,
/// never a textual substring replace (SPEC_FULL §9).
pub(super) fn strip_observed_gp(
    domains: &mut HashMap<Variable, Domain>,
    remaining: &mut VecDeque<Variable>,
    gp_index: &GpIndex,
    observed_in: &Variable,
    gp: u32,
) {
    let others: Vec<Variable> = gp_index.variables_covering(gp, observed_in).cloned().collect();
    for var in others {
        let Some(domain) = domains.get_mut(&var) else {
            continue;
        };
        let mut became_empty = false;
        for cmd in domain.iter_mut() {
            if let Command::Raw(gps) = cmd {
                gps.retain(|g| *g != gp);
                if gps.is_empty() {
                    became_empty = true;
                }
            }
        }
        if became_empty {
            domain.retain(|c| !matches!(c, Command::Raw(gps) if gps.is_empty()));
            collapse_or_flag(domains, remaining, &var);
        }
    }
}

fn collapse_or_flag(domains: &mut HashMap<Variable, Domain>, remaining: &mut VecDeque<Variable>, var: &Variable) {
    let Some(domain) = domains.get(var) else { return };
    match domain.as_slice() {
        [Command::Idl] => {
            domains.remove(var);
            remaining.retain(|v| v != var);
        }
        [] => {
            let err = PlannerError::DomainInvariantViolation {
                variable: var.clone(),
                detail: "narrowing left an empty domain".to_string(),
            };
            warn!(%err, "domain invariant violation");
        }
        [only] => {
            let err = PlannerError::DomainInvariantViolation {
                variable: var.clone(),
                detail: format!("narrowing collapsed to a non-IDL singleton: {only}"),
            };
            warn!(%err, "domain invariant violation");
        }
        _ => {}
    }
}

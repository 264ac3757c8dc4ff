//! Roster construction

use rand::Rng;

use crate::catalog::{ORIGINS, names_for};
use crate::config::AgentCounts;
use crate::types::{AgentIdentity, Gender};

/// Build one identity per catalog name, up to the per-gender counts
///
/// Names are taken partition by partition (origins in catalog order), males
/// first. Each age is drawn once from `[min_age, max_age]`. The origin is
/// only used to pick names and is not kept.
pub fn build_roster<R: Rng + ?Sized>(counts: &AgentCounts, rng: &mut R) -> Vec<AgentIdentity> {
    let mut roster = Vec::with_capacity(counts.male + counts.female);
    for (gender, wanted) in [(Gender::Male, counts.male), (Gender::Female, counts.female)] {
        let names = ORIGINS
            .into_iter()
            .flat_map(|origin| names_for(origin, gender).iter())
            .take(wanted);
        for name in names {
            let age = rng.gen_range(counts.min_age..=counts.max_age.max(counts.min_age));
            roster.push(AgentIdentity::new(*name, gender, age));
        }
    }
    roster
}

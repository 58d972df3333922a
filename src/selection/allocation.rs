//! Per-source quota allocation for one role.

use crate::catalog::SourceRole;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Compute how many clips each source contributes.
///
/// Every source gets the floor; remaining capacity up to `cap` is split
/// proportionally to each source's remaining availability using the
/// largest remainder method (ties broken by source name). `cap: None`
/// means no artificial cap: floors plus full availability.
pub(crate) fn allocate(
    available: &BTreeMap<String, usize>,
    floor: usize,
    cap: Option<usize>,
    role: SourceRole,
) -> Result<BTreeMap<String, usize>> {
    if available.is_empty() {
        return Err(Error::NoEligibleSources { role });
    }

    for (name, &count) in available {
        if count < floor {
            return Err(Error::FloorViolation {
                name: name.clone(),
                available: count,
                floor,
            });
        }
    }

    let floor_total = floor * available.len();
    if let Some(cap) = cap
        && floor_total > cap
    {
        return Err(Error::ContradictoryQuota {
            role,
            floor_total,
            cap,
        });
    }

    let extras: BTreeMap<&str, usize> = available
        .iter()
        .map(|(name, &count)| (name.as_str(), count - floor))
        .collect();
    let total_extra: usize = extras.values().sum();
    let remaining = cap.map_or(total_extra, |cap| (cap - floor_total).min(total_extra));

    let mut shares: BTreeMap<&str, usize> = BTreeMap::new();
    let mut remainders: Vec<(usize, &str)> = Vec::new();
    let mut assigned = 0;

    for (&name, &extra) in &extras {
        let (share, remainder) = if total_extra == 0 {
            (0, 0)
        } else {
            (remaining * extra / total_extra, remaining * extra % total_extra)
        };
        shares.insert(name, share);
        assigned += share;
        remainders.push((remainder, name));
    }

    // Hand the rounding leftover to the largest remainders, name order on ties.
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    let mut leftover = remaining - assigned;
    for (_, name) in remainders {
        if leftover == 0 {
            break;
        }
        if shares[name] < extras[name] {
            if let Some(share) = shares.get_mut(name) {
                *share += 1;
            }
            leftover -= 1;
        }
    }

    Ok(available
        .keys()
        .map(|name| (name.clone(), floor + shares[name.as_str()]))
        .collect())
}

//! Proportion estimator (component 5, §4.5).

use crate::types::{BugTicket, ProportionCoefficient, DEFAULT_PROPORTION};

/// Estimate ρ from tickets with complete `(IV, OV, FV)` triples where
/// `FV > OV > 0`: ρᵢ = (FV−IV)/(FV−OV), ρ = median of ρᵢ. Falls back to the
/// default when no ticket qualifies.
pub fn estimate_proportion(tickets: &[BugTicket]) -> ProportionCoefficient {
    let mut ratios: Vec<f64> = tickets
        .iter()
        .filter_map(|t| {
            let iv = t.introduction_version?;
            let ov = t.opening_version?;
            let fv = t.fixed_version?;
            if iv > 0 && ov > 0 && fv > 0 && fv > ov {
                Some((fv - iv) as f64 / (fv - ov) as f64)
            } else {
                None
            }
        })
        .collect();

    if ratios.is_empty() {
        return ProportionCoefficient(DEFAULT_PROPORTION);
    }

    ratios.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ProportionCoefficient(median(&ratios))
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(iv: Option<u32>, ov: Option<u32>, fv: Option<u32>) -> BugTicket {
        BugTicket {
            key: "P-1".to_string(),
            created: Utc::now(),
            resolved: None,
            affected_versions: vec![],
            opening_version: ov,
            fixed_version: fv,
            introduction_version: iv,
            fix_commit: None,
        }
    }

    #[test]
    fn falls_back_to_default_when_no_ticket_qualifies() {
        let tickets = vec![ticket(None, Some(1), Some(2))];
        assert_eq!(estimate_proportion(&tickets).0, DEFAULT_PROPORTION);
    }

    #[test]
    fn computes_median_of_qualifying_ratios() {
        let tickets = vec![
            ticket(Some(1), Some(2), Some(4)), // (4-1)/(4-2) = 1.5
            ticket(Some(2), Some(2), Some(4)), // (4-2)/(4-2) = 1.0
            ticket(Some(3), Some(2), Some(4)), // (4-3)/(4-2) = 0.5
        ];
        let rho = estimate_proportion(&tickets);
        assert_eq!(rho.0, 1.0);
    }

    #[test]
    fn ignores_tickets_with_non_positive_denominator() {
        let tickets = vec![ticket(Some(1), Some(2), Some(2))];
        assert_eq!(estimate_proportion(&tickets).0, DEFAULT_PROPORTION);
    }
}

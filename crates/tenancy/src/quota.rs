//! Quota admission: the pure half of the check-then-act gate.
//!
//! The evaluation itself is trivially a comparison; the correctness burden
//! sits with the storage layer, which must run it against a count read
//! under the tenant-row lock, inside the same transaction as the insert.

use teamspace_core::{DomainError, DomainResult, QuotaKind};

/// Outcome of a quota admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected,
}

impl Admission {
    /// Admit while the used count is strictly below the limit.
    pub fn evaluate(used: i64, limit: i64) -> Self {
        if used < limit {
            Admission::Admitted
        } else {
            Admission::Rejected
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    /// Map a rejection onto the domain error for `kind`.
    pub fn into_result(self, kind: QuotaKind) -> DomainResult<()> {
        match self {
            Admission::Admitted => Ok(()),
            Admission::Rejected => Err(DomainError::quota(kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn last_slot_is_admitted_and_the_next_is_not() {
        assert!(Admission::evaluate(2, 3).is_admitted());
        assert!(!Admission::evaluate(3, 3).is_admitted());
        assert!(!Admission::evaluate(4, 3).is_admitted());
    }

    #[test]
    fn zero_limit_admits_nothing() {
        assert!(!Admission::evaluate(0, 0).is_admitted());
    }

    #[test]
    fn rejection_maps_to_quota_error() {
        let err = Admission::evaluate(5, 5)
            .into_result(QuotaKind::Users)
            .unwrap_err();
        match err {
            DomainError::QuotaExceeded(QuotaKind::Users) => {}
            other => panic!("expected quota error, got {other:?}"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: admission is monotone. Once rejected at a given used
        /// count, every higher count is rejected too.
        #[test]
        fn rejection_is_monotone(used in 0i64..10_000, limit in 0i64..10_000) {
            let here = Admission::evaluate(used, limit);
            let above = Admission::evaluate(used + 1, limit);
            if !here.is_admitted() {
                prop_assert!(!above.is_admitted());
            }
        }

        /// Property: counting admitted increments from zero never exceeds
        /// the limit.
        #[test]
        fn admitted_count_never_exceeds_limit(limit in 0i64..1_000, attempts in 0i64..2_000) {
            let mut used = 0;
            for _ in 0..attempts {
                if Admission::evaluate(used, limit).is_admitted() {
                    used += 1;
                }
            }
            prop_assert!(used <= limit.max(0));
        }
    }
}

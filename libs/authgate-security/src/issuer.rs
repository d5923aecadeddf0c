//! The capability to fill a request's identity slot.
//!
//! Exactly one [`IdentityIssuer`] exists per process. The identity resolver
//! claims it when it starts; every later claim returns `None`, so no other
//! component can store an identity it built from transport input.

use std::sync::atomic::{AtomicBool, Ordering};

static CLAIMED: AtomicBool = AtomicBool::new(false);

/// Proof that the holder is the process's identity resolver.
///
/// Not `Clone`, and only obtainable through [`IdentityIssuer::claim`].
#[derive(Debug)]
pub struct IdentityIssuer {
    _sealed: (),
}

impl IdentityIssuer {
    /// Claim the process-wide issuer. Succeeds exactly once.
    #[must_use]
    pub fn claim() -> Option<Self> {
        CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { _sealed: () })
    }

    /// Whether the issuer has already been handed out.
    #[must_use]
    pub fn is_claimed() -> bool {
        CLAIMED.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn issuer_is_handed_out_once() {
        let _issuer = crate::test_issuer();

        assert!(IdentityIssuer::is_claimed());
        assert!(IdentityIssuer::claim().is_none());
    }
}

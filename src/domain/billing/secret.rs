//! Constant-time comparison of shared secrets and signatures.

use subtle::ConstantTimeEq;

/// Compares two byte strings without short-circuiting on the first
/// differing byte.
///
/// Only the length check is not constant time; lengths of signatures and
/// configured secrets are not sensitive.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_match() {
        assert!(constant_time_eq(b"cron-secret", b"cron-secret"));
    }

    #[test]
    fn different_values_do_not_match() {
        assert!(!constant_time_eq(b"cron-secret", b"cron-secreT"));
    }

    #[test]
    fn different_lengths_do_not_match() {
        assert!(!constant_time_eq(b"cron", b"cron-secret"));
    }

    #[test]
    fn empty_slices_match() {
        assert!(constant_time_eq(b"", b""));
    }
}

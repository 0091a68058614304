//! Runtime CPU capability query.

/// Whether the AVX2-accelerated code paths are safe to run here.
///
/// Requires an x86/x86_64 CPU advertising AVX2 and an OS that has enabled
/// the YMM register state. `is_x86_feature_detected!` checks both (CPUID
/// leaf 7 plus OSXSAVE/XGETBV). Every other architecture reports `false`
/// without probing anything.
pub fn supports_accelerated_path() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        std::is_x86_feature_detected!("avx2")
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_pure() {
        let first = supports_accelerated_path();
        for _ in 0..8 {
            assert_eq!(supports_accelerated_path(), first);
        }
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    #[test]
    fn false_off_x86() {
        assert!(!supports_accelerated_path());
    }
}

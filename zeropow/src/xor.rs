//! 32-byte XOR kernels with one-time backend selection
//!
//! The collision engine XORs whole 32-byte rows even though only the first
//! `n` bits carry meaning, because a straight-line full-width kernel is
//! cheaper than a masked one. Backends are picked once per process from
//! CPU feature detection and dispatched through a small enum, so the hot
//! loops see a predictable branch instead of an indirect call.

use std::sync::OnceLock;

use crate::params::HASH_BYTES;

/// Available XOR kernel implementations
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum XorBackend {
    /// Per-byte loop, available everywhere
    Scalar,
    /// Two 128-bit lanes
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Sse2,
    /// One 256-bit lane
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Avx2,
}

impl XorBackend {
    /// Pick the widest backend this CPU supports.
    ///
    /// Detection runs once and is cached for the lifetime of the process.
    pub fn detect() -> XorBackend {
        static ACTIVE: OnceLock<XorBackend> = OnceLock::new();
        *ACTIVE.get_or_init(|| {
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            {
                if is_x86_feature_detected!("avx2") {
                    return XorBackend::Avx2;
                }
                if is_x86_feature_detected!("sse2") {
                    return XorBackend::Sse2;
                }
            }
            XorBackend::Scalar
        })
    }

    /// Short human-readable backend name
    pub fn name(self) -> &'static str {
        match self {
            XorBackend::Scalar => "scalar",
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            XorBackend::Sse2 => "sse2",
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            XorBackend::Avx2 => "avx2",
        }
    }

    /// Whether the current CPU can execute this backend
    pub fn is_supported(self) -> bool {
        match self {
            XorBackend::Scalar => true,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            XorBackend::Sse2 => is_x86_feature_detected!("sse2"),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            XorBackend::Avx2 => is_x86_feature_detected!("avx2"),
        }
    }

    /// `out = a ^ b` over all 32 bytes.
    #[inline]
    pub(crate) fn xor32(
        self,
        a: &[u8; HASH_BYTES],
        b: &[u8; HASH_BYTES],
        out: &mut [u8; HASH_BYTES],
    ) {
        match self {
            XorBackend::Scalar => xor32_scalar(a, b, out),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            // SAFETY: Sse2 and Avx2 values only come from detect() or from
            //         builders that checked is_supported() first.
            XorBackend::Sse2 => unsafe { xor32_sse2(a, b, out) },
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            XorBackend::Avx2 => unsafe { xor32_avx2(a, b, out) },
        }
    }
}

fn xor32_scalar(a: &[u8; HASH_BYTES], b: &[u8; HASH_BYTES], out: &mut [u8; HASH_BYTES]) {
    for i in 0..HASH_BYTES {
        out[i] = a[i] ^ b[i];
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "sse2")]
unsafe fn xor32_sse2(a: &[u8; HASH_BYTES], b: &[u8; HASH_BYTES], out: &mut [u8; HASH_BYTES]) {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::*;

    // Rows sit at 32-byte offsets inside 64-byte aligned regions, so use
    // unaligned loads.
    let lo = _mm_xor_si128(
        _mm_loadu_si128(a.as_ptr() as *const __m128i),
        _mm_loadu_si128(b.as_ptr() as *const __m128i),
    );
    let hi = _mm_xor_si128(
        _mm_loadu_si128(a.as_ptr().add(16) as *const __m128i),
        _mm_loadu_si128(b.as_ptr().add(16) as *const __m128i),
    );
    _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, lo);
    _mm_storeu_si128(out.as_mut_ptr().add(16) as *mut __m128i, hi);
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "avx2")]
unsafe fn xor32_avx2(a: &[u8; HASH_BYTES], b: &[u8; HASH_BYTES], out: &mut [u8; HASH_BYTES]) {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::*;

    let r = _mm256_xor_si256(
        _mm256_loadu_si256(a.as_ptr() as *const __m256i),
        _mm256_loadu_si256(b.as_ptr() as *const __m256i),
    );
    _mm256_storeu_si256(out.as_mut_ptr() as *mut __m256i, r);
}

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// Generates a fixed-size array of cryptographically secure random bytes.
///
/// The buffer is wiped when the returned wrapper is dropped, so it is safe to
/// use for key entropy.
pub fn secure_random<const N: usize>() -> Zeroizing<[u8; N]> {
    let mut buf = Zeroizing::new([0u8; N]);
    OsRng.fill_bytes(&mut buf[..]);
    buf
}

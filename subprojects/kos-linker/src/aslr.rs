//! ASLR slide selection (§4.6 step 4): amd64 draws a page-aligned base
//! inside a 512 GiB aperture with ~20 bits of entropy; i386 has no aperture
//! to slide within and always loads at a fixed base. Grounded on the
//! teacher's `nx-rand`, which seeds a `ChaCha20Rng` from the kernel's TRNG
//! rather than trusting any host-provided entropy source.

use kos_config::aslr;
use kos_elf::consts::EM_X86_64;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::LinkError;

fn seeded_rng() -> Result<ChaCha20Rng, LinkError> {
    let mut seed = [0u8; 32];
    for chunk in seed.chunks_mut(8) {
        chunk.copy_from_slice(&kos_svc::misc::get_random_u64()?.to_le_bytes());
    }
    Ok(ChaCha20Rng::from_seed(seed))
}

/// Picks a slide (load bias) for one library, distinct each time it is
/// called so that two libraries never collide by construction alone (the
/// caller still dedups by soname before getting here).
pub fn pick_slide(machine: u16) -> Result<u64, LinkError> {
    if machine != EM_X86_64 {
        return Ok(aslr::I386_FIXED_BASE as u64);
    }

    let mut rng = seeded_rng()?;
    let slide_count = aslr::AMD64_APERTURE_SIZE / aslr::AMD64_SLIDE_ALIGN;
    let entropy_mask = (1u64 << aslr::AMD64_SLIDE_ENTROPY_BITS) - 1;
    let index = (rng.next_u64() & entropy_mask) % slide_count as u64;
    Ok(aslr::AMD64_APERTURE_BASE as u64 + index * aslr::AMD64_SLIDE_ALIGN as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kos_elf::consts::EM_386;

    #[test]
    fn i386_always_loads_at_the_fixed_base() {
        assert_eq!(pick_slide(EM_386).unwrap(), aslr::I386_FIXED_BASE as u64);
    }
}

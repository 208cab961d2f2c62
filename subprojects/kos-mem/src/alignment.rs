//! Page-alignment arithmetic, used by the loader to size `PT_LOAD`
//! mappings and by the linker to size library images (§4.5, §4.6).

use kos_config::PAGE_SIZE;

const PAGE_MASK: usize = PAGE_SIZE - 1;

/// Returns `true` if `size` is a multiple of [`PAGE_SIZE`].
#[inline]
pub const fn is_page_aligned(value: usize) -> bool {
    value & PAGE_MASK == 0
}

/// Rounds `value` up to the next page boundary.
#[inline]
pub const fn round_up_to_page(value: usize) -> usize {
    (value.wrapping_add(PAGE_MASK)) & !PAGE_MASK
}

/// Rounds `value` down to the previous page boundary.
#[inline]
pub const fn round_down_to_page(value: usize) -> usize {
    value & !PAGE_MASK
}

/// Number of whole pages needed to cover `size` bytes.
#[inline]
pub const fn pages_needed(size: usize) -> usize {
    round_up_to_page(size) / PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_exact_multiples_unchanged() {
        assert_eq!(round_up_to_page(0x1000), 0x1000);
        assert_eq!(round_down_to_page(0x2000), 0x2000);
    }

    #[test]
    fn rounds_partial_pages_up() {
        assert_eq!(round_up_to_page(1), PAGE_SIZE);
        assert_eq!(round_up_to_page(PAGE_SIZE + 1), 2 * PAGE_SIZE);
        assert_eq!(pages_needed(PAGE_SIZE + 1), 2);
    }

    #[test]
    fn zero_is_page_aligned() {
        assert!(is_page_aligned(0));
        assert!(!is_page_aligned(1));
    }
}

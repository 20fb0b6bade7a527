//! The runtime linked into every compiled program. It is emitted as C
//! source right next to the generated assembly, with every tag
//! constant substituted from [`crate::common::value`] — the compiler
//! and the runtime cannot disagree about the encoding because the
//! numbers only exist in one place.
//!
//! The runtime owns `main` and `runtime_startup`: it maps a dedicated
//! stack with an inaccessible guard page on either side, calls
//! `scheme_entry` with the high end of that region, prints the tagged
//! value that comes back, and tears the region down. Running off
//! either end of the compiled stack faults deterministically.

use std::fmt::Write as _;

use crate::common::value::{
    CHAR_MASK, CHAR_NAMES, CHAR_SHIFT, CHAR_TAG, FALSE_CST, FX_MASK, FX_SHIFT, FX_TAG, NULL_CST,
    TRUE_CST,
};

/// The compiled program gets 16K words of stack, rounded up to whole
/// pages by the runtime.
pub const STACK_WORDS: usize = 16 * 1024;

const TEMPLATE: &str = r##"#include <stdio.h>
#include <stdint.h>
#include <inttypes.h>
#include <stdlib.h>
#include <unistd.h>
#include <sys/mman.h>

typedef uint64_t schptr_t;

/* the compiler-generated entry; receives the base of the scheme stack */
extern schptr_t scheme_entry (uint8_t *);

static void
print_char (unsigned char code)
{
  switch (code)
    {
@CHAR_CASES@    default: printf ("#\\%c", (char) code); break;
    }
}

static int64_t
decode_fixnum (schptr_t x)
{
  /* arithmetic right shift, independent of what the compiler does to
     a signed shift */
  const uint64_t t = -(x >> 63);
  return (int64_t) (((x ^ t) >> @FX_SHIFT@) ^ t);
}

static void
print_value (schptr_t x)
{
  if ((x & @FX_MASK@) == @FX_TAG@)
    printf ("%" PRIi64, decode_fixnum (x));
  else if ((x & @CHAR_MASK@) == @CHAR_TAG@)
    print_char ((unsigned char) (x >> @CHAR_SHIFT@));
  else if (x == @FALSE@)
    printf ("#f");
  else if (x == @TRUE@)
    printf ("#t");
  else if (x == @NULL@)
    printf ("()");
  else
    printf ("#<unknown 0x%08" PRIx64 ">", x);
  printf ("\n");
}

static uint8_t *
allocate_protected_space (size_t size)
{
  size_t page = (size_t) sysconf (_SC_PAGESIZE);
  size_t aligned = ((size + page - 1) / page) * page;

  uint8_t *p = mmap (NULL, aligned + 2 * page,
                     PROT_READ | PROT_WRITE,
                     MAP_ANONYMOUS | MAP_PRIVATE,
                     -1, 0);
  if (p == MAP_FAILED)
    {
      fprintf (stderr, "failed to allocate stack space of size `%zu'\n", size);
      exit (EXIT_FAILURE);
    }

  if (mprotect (p, page, PROT_NONE) != 0
      || mprotect (p + page + aligned, page, PROT_NONE) != 0)
    {
      fprintf (stderr, "failed to protect stack space of size `%zu'\n", size);
      exit (EXIT_FAILURE);
    }

  return p + page;
}

static void
deallocate_protected_space (uint8_t *p, size_t size)
{
  size_t page = (size_t) sysconf (_SC_PAGESIZE);
  size_t aligned = ((size + page - 1) / page) * page;

  if (munmap (p - page, aligned + 2 * page) != 0)
    fprintf (stderr, "warning: failed to deallocate stack space of size `%zu'\n", size);
}

void
runtime_startup (void)
{
  size_t stack_size = @STACK_WORDS@ * sizeof (schptr_t);
  uint8_t *stack_top = allocate_protected_space (stack_size);
  uint8_t *stack_base = stack_top + stack_size;
  print_value (scheme_entry (stack_base));
  deallocate_protected_space (stack_top, stack_size);
}

int
main (void)
{
  runtime_startup ();
  return 0;
}
"##;

/// Renders the runtime with the current encoding constants.
pub fn c_source() -> String {
    let mut char_cases = String::new();
    for (name, code) in CHAR_NAMES {
        let _ = writeln!(
            char_cases,
            "    case 0x{:02x}: printf (\"#\\\\{}\"); break;",
            code, name
        );
    }

    TEMPLATE
        .replace("@CHAR_CASES@", &char_cases)
        .replace("@FX_SHIFT@", &FX_SHIFT.to_string())
        .replace("@FX_MASK@", &const_u64(FX_MASK))
        .replace("@FX_TAG@", &const_u64(FX_TAG))
        .replace("@CHAR_MASK@", &const_u64(CHAR_MASK))
        .replace("@CHAR_SHIFT@", &CHAR_SHIFT.to_string())
        .replace("@CHAR_TAG@", &const_u64(CHAR_TAG))
        .replace("@FALSE@", &const_u64(FALSE_CST))
        .replace("@TRUE@", &const_u64(TRUE_CST))
        .replace("@NULL@", &const_u64(NULL_CST))
        .replace("@STACK_WORDS@", &STACK_WORDS.to_string())
}

fn const_u64(value: u64) -> String {
    format!("UINT64_C({})", value)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn placeholders_are_all_substituted() {
        assert!(!c_source().contains('@'));
    }

    #[test]
    fn constants_are_injected() {
        let source = c_source();
        assert!(source.contains("UINT64_C(17179869188)")); // #t
        assert!(source.contains("UINT64_C(4)")); // #f
        assert!(source.contains("UINT64_C(12)")); // ()
        assert!(source.contains("16384 * sizeof (schptr_t)"));
    }

    #[test]
    fn every_named_character_is_printed_by_name() {
        let source = c_source();
        for (name, _) in CHAR_NAMES {
            assert!(source.contains(&format!("#\\\\{}", name)), "missing {}", name);
        }
    }

    #[test]
    fn entry_points_are_defined() {
        let source = c_source();
        assert!(source.contains("runtime_startup (void)"));
        assert!(source.contains("main (void)"));
        assert!(source.contains("scheme_entry (stack_base)"));
    }
}

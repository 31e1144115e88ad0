//! Default native functions for the lanes expression VM.
//!
//! These are ordinary [`FunctionTable`] entries with no special status in the
//! interpreter; hosts may skip them, replace them, or register their own
//! functions next to them.
//!
//! | Name | Arity | Result |
//! |---|---|---|
//! | `Random` | `(point_index, seed)` | uniform in `[0, 1)` |
//! | `PerlinNoise` | `(x, y, z, octaves)` | fractal gradient noise in `[0, 1]` |

pub mod noise;
pub mod random;

use lanes_vm::{Arity, ExpressionVm, FunctionTable};
use tracing::debug;

pub use noise::{noise3, perlin_fbm, perlin_noise};
pub use random::{random, random_value};

/// Registered name of [`random`].
pub const RANDOM: &str = "Random";
/// Registered name of [`perlin_noise`].
pub const PERLIN_NOISE: &str = "PerlinNoise";

/// Registers `Random` and `PerlinNoise` on `table`, replacing entries of the
/// same name.
pub fn register_default_functions(table: &mut FunctionTable) {
    table.register_function(RANDOM, Arity::Fixed(2), random);
    table.register_function(PERLIN_NOISE, Arity::Fixed(4), perlin_noise);
    debug!(functions = table.len(), "default functions registered");
}

/// Creates an engine with the default functions registered.
pub fn default_vm() -> ExpressionVm {
    let mut table = FunctionTable::new();
    register_default_functions(&mut table);
    ExpressionVm::with_functions(table)
}

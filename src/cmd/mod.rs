//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                       |
//! |-------------|-----------------------------------------|
//! | `targets`   | `ChangedTargets`                       |
//! | `artifacts` | `Artifacts` (list / url)               |
//! | `variants`  | `Variants` (list / show)               |
//! | `cache`     | `Cache` (status / clear)               |
//! | `hash`      | `Hash`                                 |

pub mod artifacts;
pub mod cache;
pub mod hash;
pub mod targets;
pub mod variants;

pub use artifacts::{cmd_artifacts_list, cmd_artifacts_url};
pub use cache::{cmd_cache_clear, cmd_cache_status};
pub use hash::cmd_hash;
pub use targets::cmd_changed_targets;
pub use variants::{cmd_variants_list, cmd_variants_show};

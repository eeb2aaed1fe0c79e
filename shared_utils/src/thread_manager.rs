//! Worker pool sizing
//!
//! Image jobs are short external-process runs that scale with core count, so
//! the default is one worker per logical CPU. `--jobs` or `IMG_WEB_JOBS`
//! override it.

use tracing::warn;

/// Environment variable consulted when no explicit worker count is given.
pub const JOBS_ENV_VAR: &str = "IMG_WEB_JOBS";

/// Number of logical CPUs available to this process (at least 1).
pub fn available_cores() -> usize {
    num_cpus::get().max(1)
}

/// Pick the worker count.
///
/// Precedence: an explicit `requested` value (0 = every core), then a valid
/// non-zero `IMG_WEB_JOBS`, then every available core.
pub fn resolve_worker_count(requested: Option<usize>) -> usize {
    let env_value = std::env::var(JOBS_ENV_VAR).ok();
    resolve_with(requested, env_value.as_deref(), available_cores())
}

fn resolve_with(requested: Option<usize>, env_value: Option<&str>, cores: usize) -> usize {
    match requested {
        Some(0) => return cores.max(1),
        Some(n) => return n,
        None => {}
    }

    if let Some(raw) = env_value {
        match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => return n,
            Ok(_) => {}
            Err(_) => warn!(value = raw, "Ignoring invalid {}", JOBS_ENV_VAR),
        }
    }

    cores.max(1)
}

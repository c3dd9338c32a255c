// SPDX-License-Identifier: MIT

//! Sampler and scheduler vocabularies
//!
//! Unwarp coerces stored names that are not in the base vocabulary to a
//! safe default. [`remap_scheduler`] maps scheduler names added by
//! third-party extensions onto the base set.

/// Sampler used when a stored name is missing or unknown
pub const DEFAULT_SAMPLER: &str = "euler";

/// Scheduler used when a stored name is missing or unknown
pub const DEFAULT_SCHEDULER: &str = "normal";

/// Base sampler vocabulary
pub const SAMPLERS: &[&str] = &[
    "euler",
    "euler_cfg_pp",
    "euler_ancestral",
    "euler_ancestral_cfg_pp",
    "heun",
    "heunpp2",
    "dpm_2",
    "dpm_2_ancestral",
    "lms",
    "dpm_fast",
    "dpm_adaptive",
    "dpmpp_2s_ancestral",
    "dpmpp_2s_ancestral_cfg_pp",
    "dpmpp_sde",
    "dpmpp_sde_gpu",
    "dpmpp_2m",
    "dpmpp_2m_cfg_pp",
    "dpmpp_2m_sde",
    "dpmpp_2m_sde_gpu",
    "dpmpp_3m_sde",
    "dpmpp_3m_sde_gpu",
    "ddpm",
    "lcm",
    "ipndm",
    "ipndm_v",
    "deis",
    "res_multistep",
    "res_multistep_cfg_pp",
    "res_multistep_ancestral",
    "gradient_estimation",
    "er_sde",
    "seeds_2",
    "seeds_3",
    "ddim",
    "uni_pc",
    "uni_pc_bh2",
];

/// Base scheduler vocabulary
pub const SCHEDULERS: &[&str] = &[
    "simple",
    "sgm_uniform",
    "karras",
    "exponential",
    "ddim_uniform",
    "beta",
    "normal",
    "linear_quadratic",
    "kl_optimal",
];

/// Extension scheduler names and their closest base equivalent
const SCHEDULER_EQUIVALENTS: &[(&str, &str)] = &[
    ("AYS SD1", "karras"),
    ("AYS SDXL", "karras"),
    ("AYS SVD", "karras"),
    ("align_your_steps", "karras"),
    ("GITS[coeff=1.2]", "karras"),
    ("gits", "karras"),
    ("polyexponential", "exponential"),
    ("sgm", "sgm_uniform"),
    ("ddim", "ddim_uniform"),
    ("beta57", "beta"),
    ("linear", "linear_quadratic"),
    ("LTXV[default]", "simple"),
    ("OSS FLUX", "simple"),
    ("OSS Wan", "simple"),
];

pub fn is_sampler(name: &str) -> bool {
    SAMPLERS.contains(&name)
}

pub fn is_scheduler(name: &str) -> bool {
    SCHEDULERS.contains(&name)
}

/// Stored sampler name if it is in the base vocabulary, else the default
pub fn coerce_sampler(name: Option<&str>) -> &str {
    coerce(name, is_sampler, DEFAULT_SAMPLER, "sampler")
}

/// Stored scheduler name if it is in the base vocabulary, else the default
pub fn coerce_scheduler(name: Option<&str>) -> &str {
    coerce(name, is_scheduler, DEFAULT_SCHEDULER, "scheduler")
}

fn coerce<'a>(
    name: Option<&'a str>,
    known: fn(&str) -> bool,
    default: &'static str,
    what: &str,
) -> &'a str {
    match name {
        Some(n) if known(n) => n,
        Some(n) => {
            log::warn!("Unknown {} '{}', using '{}'", what, n, default);
            default
        }
        None => default,
    }
}

/// Map any scheduler name onto the base vocabulary.
///
/// Base names map to themselves; known extension names map to their
/// documented equivalent; anything else maps to [`DEFAULT_SCHEDULER`].
pub fn remap_scheduler(name: &str) -> &'static str {
    if let Some(base) = SCHEDULERS.iter().copied().find(|s| *s == name) {
        return base;
    }
    SCHEDULER_EQUIVALENTS
        .iter()
        .find(|(extended, _)| *extended == name)
        .map(|(_, base)| *base)
        .unwrap_or(DEFAULT_SCHEDULER)
}

//! Allocator configuration

use crate::error::{AllocatorError, AllocatorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Accepted absolute deviation of the weight sum from 1.0
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 1e-6;
/// Branch-and-bound node budget
pub const DEFAULT_MAX_NODES: u64 = 200_000;
/// Distance from an integer below which a relaxed share counts as integral
pub const DEFAULT_INTEGRALITY_TOLERANCE: f64 = 1e-9;
/// Bisection steps for the budget multiplier
pub const DEFAULT_BISECTION_ITERATIONS: u32 = 200;

/// Allocator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Accepted deviation of the weight sum from 1.0
    pub weight_tolerance: f64,

    /// Numerical solver settings
    pub solver: SolverConfig,
}

/// Numerical solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Run the exact integer solve before falling back
    pub exact_enabled: bool,

    /// Maximum branch-and-bound nodes
    pub max_nodes: u64,

    /// Optional branch-and-bound wall-clock limit (milliseconds).
    ///
    /// Off by default: with a limit set, the same request can fall back on a
    /// loaded machine and solve exactly on an idle one.
    pub time_limit_ms: Option<u64>,

    /// Integrality tolerance for relaxed shares
    pub integrality_tolerance: f64,

    /// Bisection iterations for the continuous relaxation
    pub bisection_iterations: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
            solver: SolverConfig::default(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            exact_enabled: true,
            max_nodes: DEFAULT_MAX_NODES,
            time_limit_ms: None,
            integrality_tolerance: DEFAULT_INTEGRALITY_TOLERANCE,
            bisection_iterations: DEFAULT_BISECTION_ITERATIONS,
        }
    }
}

impl AllocatorConfig {
    /// Load configuration from `ALLOCATOR_*` environment variables over defaults
    pub fn from_env() -> AllocatorResult<Self> {
        let mut config = Self::default();

        if let Some(tolerance) = env_parse::<f64>("ALLOCATOR_WEIGHT_TOLERANCE")? {
            config.weight_tolerance = tolerance;
        }
        if let Some(enabled) = env_parse::<bool>("ALLOCATOR_EXACT_SOLVER")? {
            config.solver.exact_enabled = enabled;
        }
        if let Some(nodes) = env_parse::<u64>("ALLOCATOR_MAX_NODES")? {
            config.solver.max_nodes = nodes;
        }
        if let Some(limit) = env_parse::<u64>("ALLOCATOR_TIME_LIMIT_MS")? {
            config.solver.time_limit_ms = Some(limit);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> AllocatorResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| AllocatorError::Configuration {
            message: format!("Cannot read {}: {}", path.display(), e),
        })?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|e| AllocatorError::Configuration {
                message: format!("Invalid config in {}: {}", path.display(), e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the solvers cannot work with
    pub fn validate(&self) -> AllocatorResult<()> {
        if !(self.weight_tolerance.is_finite() && self.weight_tolerance >= 0.0) {
            return Err(AllocatorError::Configuration {
                message: format!("weight_tolerance must be >= 0, got {}", self.weight_tolerance),
            });
        }
        if !(self.solver.integrality_tolerance > 0.0 && self.solver.integrality_tolerance < 0.5) {
            return Err(AllocatorError::Configuration {
                message: format!(
                    "integrality_tolerance must be within (0, 0.5), got {}",
                    self.solver.integrality_tolerance
                ),
            });
        }
        if self.solver.max_nodes == 0 {
            return Err(AllocatorError::Configuration {
                message: "max_nodes must be positive".to_string(),
            });
        }
        if self.solver.bisection_iterations == 0 {
            return Err(AllocatorError::Configuration {
                message: "bisection_iterations must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> AllocatorResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AllocatorError::Configuration {
                message: format!("Invalid {}: {}", key, e),
            }),
        Err(_) => Ok(None),
    }
}

//! Engine configuration
//!
//! Defaults are tuned for a typical desktop core (32 KiB L1d, 1 MiB L2,
//! 32 MiB shared L3). `from_env` overlays `COLFUSE_*` variables.

use std::str::FromStr;

/// How the planner treats fusion candidates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FusionPolicy {
    /// Fuse when the estimated speedup reaches `min_fusion_speedup`
    Auto,
    /// Fuse every candidate
    Always,
    /// Never fuse; every operator runs its own pass
    Never,
}

impl FromStr for FusionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(FusionPolicy::Auto),
            "always" => Ok(FusionPolicy::Always),
            "never" => Ok(FusionPolicy::Never),
            other => Err(format!("unknown fusion policy {other:?}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub fusion: FusionPolicy,

    /// Minimum estimated speedup for `FusionPolicy::Auto`
    pub min_fusion_speedup: f64,

    pub l1_bytes: usize,
    pub l2_bytes: usize,
    pub l3_bytes: usize,

    /// Elements at which kernels shard across the rayon pool (0 = never)
    pub parallel_threshold: usize,

    /// Deepest expression tree (operator chain or parenthesis nesting) the
    /// parser accepts; evaluation recurses over the tree
    pub max_expression_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fusion: FusionPolicy::Auto,
            min_fusion_speedup: 1.2,
            l1_bytes: 32 * 1024,
            l2_bytes: 1024 * 1024,
            l3_bytes: 32 * 1024 * 1024,
            parallel_threshold: 1 << 20,
            max_expression_depth: crate::pipeline::parser::DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `COLFUSE_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = EngineConfig::default();
        overlay(&lookup, "COLFUSE_FUSION", &mut config.fusion);
        overlay(&lookup, "COLFUSE_MIN_FUSION_SPEEDUP", &mut config.min_fusion_speedup);
        overlay(&lookup, "COLFUSE_L1_BYTES", &mut config.l1_bytes);
        overlay(&lookup, "COLFUSE_L2_BYTES", &mut config.l2_bytes);
        overlay(&lookup, "COLFUSE_L3_BYTES", &mut config.l3_bytes);
        overlay(&lookup, "COLFUSE_PARALLEL_THRESHOLD", &mut config.parallel_threshold);
        overlay(&lookup, "COLFUSE_MAX_EXPRESSION_DEPTH", &mut config.max_expression_depth);
        config
    }

    pub fn with_fusion(mut self, fusion: FusionPolicy) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn with_parallel_threshold(mut self, elements: usize) -> Self {
        self.parallel_threshold = elements;
        self
    }

    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }
}

fn overlay<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(e) => tracing::warn!(key, value = %raw, error = %e, "ignoring invalid config value"),
    }
}

//! Tunable parameters for the session engine.

/// Engine tuning knobs with defaults calibrated for city-scale maps.
///
/// All distance thresholds are in coordinate degrees, not meters,
/// matching the planar distance used by the proximity filter. The
/// physical size of one degree shrinks east-west with latitude; this is
/// an accepted approximation at the supported city scale (see
/// DESIGN.md).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fixes closer than this to the last evaluated fix are skipped as
    /// GPS jitter. Default `0.00005` (~5 m).
    pub deadband_deg: f64,
    /// Candidate distance below which the fix is treated as inside the
    /// nearest district without an exact containment test. Only valid
    /// because districts are small relative to inter-district spacing.
    /// Default `0.0005`.
    pub near_certain_deg: f64,
    /// Candidate distance beyond which exact containment is never
    /// attempted. Default `0.05`.
    pub cutoff_deg: f64,
    /// Upper bound on the number of candidates exact-tested per fix.
    /// Default `10`.
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deadband_deg: 0.00005,
            near_certain_deg: 0.0005,
            cutoff_deg: 0.05,
            top_k: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_ordered() {
        let config = EngineConfig::default();
        assert!(config.deadband_deg < config.near_certain_deg);
        assert!(config.near_certain_deg < config.cutoff_deg);
        assert_eq!(config.top_k, 10);
    }
}

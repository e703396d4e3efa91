use serde::Deserialize;

/// Options shared by every graph constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// initialize non-fixed vertices to their ground truth
    pub init_vtx: bool,
    /// perturb edge measurements
    pub edge_noise: bool,
    /// full width of the uniform translation noise per axis
    pub tran_noise: [f64; 3],
    /// full width of the uniform noise per quaternion coefficient (x, y, z, w)
    pub quat_noise: [f64; 4],
    pub seed: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            init_vtx: false,
            edge_noise: false,
            tran_noise: [0.1; 3],
            quat_noise: [0.02; 4],
            seed: 0,
        }
    }
}

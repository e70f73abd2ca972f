// gpu.rs
use gfxinfo::active_gpu;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::types::GpuInfo;

const MB: f64 = 1024.0 * 1024.0;

// Read once; FLEETTOP_AGENT_GPU=0 skips probing entirely
pub fn gpu_enabled() -> bool {
    static ON: OnceCell<bool> = OnceCell::new();
    *ON.get_or_init(|| {
        std::env::var("FLEETTOP_AGENT_GPU")
            .map(|v| v != "0")
            .unwrap_or(true)
    })
}

pub fn collect_all_gpus() -> Result<Vec<GpuInfo>, Box<dyn std::error::Error>> {
    let gpu = active_gpu()?;
    let info = gpu.info();

    Ok(vec![GpuInfo {
        name: gpu.model().to_string(),
        utilization: info.load_pct() as f64,
        memory_used: info.used_vram() as f64 / MB,
        memory_total: info.total_vram() as f64 / MB,
    }])
}

/// GPUs on this host, or empty when disabled or none can be read. A host
/// whose first probe finds nothing is not probed again.
pub fn gpus() -> Vec<GpuInfo> {
    static PRESENT: OnceCell<bool> = OnceCell::new();
    if !gpu_enabled() || PRESENT.get() == Some(&false) {
        return Vec::new();
    }
    let v = match collect_all_gpus() {
        Ok(v) => v,
        Err(e) => {
            debug!("gpu collection failed: {e}");
            Vec::new()
        }
    };
    let _ = PRESENT.set(!v.is_empty());
    v
}

//! GPU detection and device selection

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{info, warn};

/// Detected accelerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpuInfo {
    /// Execution provider, e.g. "cuda"
    pub provider: String,
    /// Device name as reported by the driver
    pub name: String,
    /// Highest CUDA version the driver supports, e.g. "12.2"
    pub cuda_version: Option<String>,
}

/// Detect an NVIDIA GPU through `nvidia-smi`.
///
/// Returns `None` when the tool is missing, fails, or lists no device.
pub fn detect_gpu() -> Option<GpuInfo> {
    let output = std::process::Command::new("nvidia-smi")
        .args(["--query-gpu=name", "--format=csv,noheader"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let name = parse_gpu_name(&String::from_utf8_lossy(&output.stdout))?;
    let cuda_version = detect_cuda_version();
    info!(
        "Detected NVIDIA GPU - using CUDA ({}, CUDA {})",
        name,
        cuda_version.as_deref().unwrap_or("unknown")
    );

    Some(GpuInfo {
        provider: "cuda".to_string(),
        name,
        cuda_version,
    })
}

/// CUDA version from the plain `nvidia-smi` banner
fn detect_cuda_version() -> Option<String> {
    let output = std::process::Command::new("nvidia-smi").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_cuda_version(&String::from_utf8_lossy(&output.stdout))
}

/// Token after "CUDA Version:" in the banner
fn parse_cuda_version(stdout: &str) -> Option<String> {
    let (_, rest) = stdout.split_once("CUDA Version:")?;
    rest.split_whitespace()
        .next()
        .map(|v| v.trim_end_matches('|').to_string())
        .filter(|v| !v.is_empty())
}

/// First non-empty line of `nvidia-smi` CSV output
fn parse_gpu_name(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Resolve the configured device against what was detected.
///
/// - `"auto"`: `"cuda"` when a GPU is present, otherwise `"cpu"`
/// - `"cuda"`: falls back to `"cpu"` with a warning when no GPU is present
/// - `"cpu"`: always `"cpu"`
pub fn select_device(requested: &str, gpu: Option<&GpuInfo>) -> Result<String> {
    match requested.trim().to_ascii_lowercase().as_str() {
        "auto" => Ok(gpu.map_or("cpu", |g| g.provider.as_str()).to_string()),
        "cuda" | "gpu" => match gpu {
            Some(g) => Ok(g.provider.clone()),
            None => {
                warn!("⚠️ CUDA requested but no GPU detected, falling back to CPU");
                Ok("cpu".to_string())
            }
        },
        "cpu" => Ok("cpu".to_string()),
        other => bail!("Unknown device '{}': expected auto, cpu or cuda", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu() -> GpuInfo {
        GpuInfo {
            provider: "cuda".to_string(),
            name: "NVIDIA GeForce RTX 4090".to_string(),
            cuda_version: Some("12.2".to_string()),
        }
    }

    #[test]
    fn test_gpu_detection() {
        let detected = detect_gpu();
        println!("Detected GPU: {:?}", detected);
        // Don't assert - GPU availability depends on hardware
    }

    #[test]
    fn test_parse_gpu_name() {
        assert_eq!(
            parse_gpu_name("NVIDIA A100-SXM4-40GB\nNVIDIA A100-SXM4-40GB\n"),
            Some("NVIDIA A100-SXM4-40GB".to_string())
        );
        assert_eq!(parse_gpu_name("\n  \n"), None);
    }

    #[test]
    fn test_parse_cuda_version() {
        let banner = "\
+---------------------------------------------------------------------------------------+
| NVIDIA-SMI 535.104.05             Driver Version: 535.104.05   CUDA Version: 12.2     |
|-----------------------------------------+----------------------+----------------------+
";
        assert_eq!(parse_cuda_version(banner), Some("12.2".to_string()));
        assert_eq!(
            parse_cuda_version("Driver Version: 550.54   CUDA Version: 12.4|"),
            Some("12.4".to_string())
        );
        assert_eq!(parse_cuda_version("NVIDIA-SMI has failed"), None);
        assert_eq!(parse_cuda_version("CUDA Version:   \n"), None);
    }

    #[test]
    fn test_select_device() {
        let g = gpu();
        assert_eq!(select_device("auto", Some(&g)).unwrap(), "cuda");
        assert_eq!(select_device("auto", None).unwrap(), "cpu");
        assert_eq!(select_device("CUDA", Some(&g)).unwrap(), "cuda");
        assert_eq!(select_device("cuda", None).unwrap(), "cpu");
        assert_eq!(select_device("cpu", Some(&g)).unwrap(), "cpu");
        assert!(select_device("tpu", None).is_err());
    }
}

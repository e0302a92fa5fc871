use crate::capture::domain::capture_device::CaptureFormat;

/// Picks the capture format for a device.
///
/// Preferences are tried in priority order; the first device format matching
/// the highest-priority resolution wins. With no match the device's first
/// format is used. `None` only when the device lists no formats at all.
pub fn select_format(
    formats: &[CaptureFormat],
    preferred: &[(u32, u32)],
) -> Option<CaptureFormat> {
    preferred
        .iter()
        .find_map(|&resolution| formats.iter().find(|f| f.matches(resolution)))
        .or_else(|| formats.first())
        .copied()
}

/// Human readable size: `"1.23 GB"`, `"456.78 MB"`, `"789.00 KB"`, `"12 B"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [(&str, u64); 3] = [("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];
    for (unit, threshold) in UNITS {
        if bytes >= threshold {
            return format!("{:.2} {unit}", bytes as f64 / threshold as f64);
        }
    }
    format!("{bytes} B")
}

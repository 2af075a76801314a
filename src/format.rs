//! Human-readable sizes, durations and per-pass tallies for terminal output.

use std::time::Duration;

use crate::media::MediaKind;
use crate::stats::PassStats;

/// Formats a byte count as a human-readable string (B, KB, MB, GB).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Formats a duration as a human-readable string (e.g. "5.0s", "1m 05s", "1h 01m 05s").
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        format!(
            "{}h {:02}m {:02}s",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}.{:01}s", secs, d.subsec_millis() / 100)
    }
}

/// Formats one pass as a summary line, e.g. "photos: 3 transferred, 1 skipped".
#[must_use]
pub fn format_pass(kind: MediaKind, stats: &PassStats) -> String {
    let label = match kind {
        MediaKind::Photo => "photos",
        MediaKind::Video => "videos",
        MediaKind::Document => "documents",
    };
    let mut parts = vec![format!("{} transferred", stats.transferred)];
    if stats.skipped > 0 {
        parts.push(format!("{} skipped", stats.skipped));
    }
    if stats.failed > 0 {
        parts.push(format!("{} failed", stats.failed));
    }
    format!("{label}: {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TransferStatsBuilder;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn format_duration_units() {
        assert_eq!(format_duration(Duration::from_millis(500)), "0.5s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 05s");
        assert_eq!(format_duration(Duration::from_secs(3665)), "1h 01m 05s");
    }

    #[test]
    fn format_pass_omits_zero_counters() {
        let clean = PassStats {
            matched: 2,
            transferred: 2,
            ..PassStats::default()
        };
        assert_eq!(format_pass(MediaKind::Photo, &clean), "photos: 2 transferred");

        let mixed = PassStats {
            matched: 4,
            transferred: 1,
            skipped: 2,
            failed: 1,
        };
        assert_eq!(
            format_pass(MediaKind::Document, &mixed),
            "documents: 1 transferred, 2 skipped, 1 failed"
        );
    }

    #[test]
    fn format_pass_labels_each_kind() {
        let one = PassStats {
            matched: 1,
            transferred: 1,
            ..PassStats::default()
        };
        assert_eq!(format_pass(MediaKind::Photo, &one), "photos: 1 transferred");
        assert_eq!(format_pass(MediaKind::Video, &one), "videos: 1 transferred");
        assert_eq!(format_pass(MediaKind::Document, &one), "documents: 1 transferred");
    }

    #[test]
    fn format_pass_always_shows_transferred() {
        assert_eq!(
            format_pass(MediaKind::Video, &PassStats::default()),
            "videos: 0 transferred"
        );

        let skipped = PassStats {
            matched: 3,
            skipped: 3,
            ..PassStats::default()
        };
        assert_eq!(
            format_pass(MediaKind::Photo, &skipped),
            "photos: 0 transferred, 3 skipped"
        );

        let failed = PassStats {
            matched: 1,
            failed: 1,
            ..PassStats::default()
        };
        assert_eq!(
            format_pass(MediaKind::Video, &failed),
            "videos: 0 transferred, 1 failed"
        );
    }

    #[test]
    fn format_pass_matches_pipeline_stats() {
        let mut builder = TransferStatsBuilder::new();
        builder.start_pass(MediaKind::Document);
        builder.add_matched(MediaKind::Document);
        builder.add_transfer(MediaKind::Document, 1536);
        builder.add_matched(MediaKind::Document);
        builder.add_skipped(MediaKind::Document);

        assert_eq!(
            format_pass(MediaKind::Document, &builder.pass(MediaKind::Document)),
            "documents: 1 transferred, 1 skipped"
        );
        assert_eq!(
            format_pass(MediaKind::Photo, &builder.pass(MediaKind::Photo)),
            "photos: 0 transferred"
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn format_bytes_never_panics(bytes in 0u64..u64::MAX) {
                let _ = format_bytes(bytes);
            }

            #[test]
            fn format_duration_never_panics(millis in 0u64..1_000_000_000) {
                let _ = format_duration(Duration::from_millis(millis));
            }
        }
    }
}

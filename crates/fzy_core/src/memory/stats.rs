//! # Tagged Allocation Stats

use std::fmt::{self, Write as _};

/// Subsystem an allocation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemoryTag {
    /// Unclassified. Allocations under this tag are logged.
    Unknown = 0,
    /// Name tables.
    Hashtable = 1,
    /// Entity slots and the free-entity queue.
    Entity = 2,
    /// Component storages and the free component-type queue.
    Component = 3,
    /// Process slots, membership lists and the free process queue.
    Process = 4,
}

impl MemoryTag {
    /// Number of tags.
    pub const COUNT: usize = 5;

    /// All tags in declaration order.
    pub const ALL: [Self; Self::COUNT] =
        [Self::Unknown, Self::Hashtable, Self::Entity, Self::Component, Self::Process];

    /// Fixed-width label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN    ",
            Self::Hashtable => "HASHTABLE  ",
            Self::Entity => "ENTITY     ",
            Self::Component => "COMPONENT  ",
            Self::Process => "PROCESS    ",
        }
    }
}

impl fmt::Display for MemoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_end())
    }
}

/// Byte counters, total and per [`MemoryTag`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStats {
    total: u64,
    tagged: [u64; MemoryTag::COUNT],
}

impl MemoryStats {
    /// Creates zeroed stats.
    #[must_use]
    pub const fn new() -> Self {
        Self { total: 0, tagged: [0; MemoryTag::COUNT] }
    }

    /// Records `bytes` allocated under `tag`.
    pub fn allocate(&mut self, bytes: usize, tag: MemoryTag) {
        if tag == MemoryTag::Unknown {
            tracing::warn!(bytes, "allocation under MemoryTag::Unknown, re-class this allocation");
        }
        let bytes = bytes as u64;
        self.total += bytes;
        self.tagged[tag as usize] += bytes;
    }

    /// Records `bytes` released under `tag`.
    ///
    /// Releasing more than the tag holds clamps the counter to zero.
    pub fn release(&mut self, bytes: usize, tag: MemoryTag) {
        let bytes = bytes as u64;
        let held = &mut self.tagged[tag as usize];
        if bytes > *held {
            tracing::warn!(bytes, held = *held, %tag, "releasing more memory than allocated");
        }
        *held = held.saturating_sub(bytes);
        self.total = self.total.saturating_sub(bytes);
    }

    /// Total bytes currently held.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Bytes currently held under `tag`.
    #[inline]
    #[must_use]
    pub const fn tagged(&self, tag: MemoryTag) -> u64 {
        self.tagged[tag as usize]
    }

    /// Human-readable usage table, one line per tag.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::from("ECS memory use (tagged):\n");
        for tag in MemoryTag::ALL {
            let _ = writeln!(out, "  {}: {}", tag.label(), format_bytes(self.tagged(tag)));
        }
        let _ = write!(out, "  TOTAL      : {}", format_bytes(self.total));
        out
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    match bytes {
        b if b >= GIB => format!("{:.2} GiB", b as f64 / GIB as f64),
        b if b >= MIB => format!("{:.2} MiB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.2} KiB", b as f64 / KIB as f64),
        b => format!("{b} B"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_release() {
        let mut stats = MemoryStats::new();
        stats.allocate(4096, MemoryTag::Component);
        stats.allocate(100, MemoryTag::Entity);
        assert_eq!(stats.total(), 4196);
        assert_eq!(stats.tagged(MemoryTag::Component), 4096);

        stats.release(4096, MemoryTag::Component);
        assert_eq!(stats.tagged(MemoryTag::Component), 0);
        assert_eq!(stats.total(), 100);
    }

    #[test]
    fn test_over_release_clamps() {
        let mut stats = MemoryStats::new();
        stats.allocate(10, MemoryTag::Process);
        stats.release(50, MemoryTag::Process);
        assert_eq!(stats.tagged(MemoryTag::Process), 0);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_report_format() {
        let mut stats = MemoryStats::new();
        stats.allocate(3 * 1024 * 1024, MemoryTag::Component);
        stats.allocate(512, MemoryTag::Hashtable);

        let report = stats.report();
        assert!(report.contains("COMPONENT  : 3.00 MiB"));
        assert!(report.contains("HASHTABLE  : 512 B"));
        assert!(report.ends_with("TOTAL      : 3.00 MiB"));
    }
}

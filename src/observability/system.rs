//! Process resource usage for the health snapshot.
//!
//! Read from procfs on Linux. Other platforms report `None`.

use serde::Serialize;
use std::fs;

/// Kernel clock ticks per second for `/proc/<pid>/stat` times (USER_HZ).
const CLOCK_TICKS_PER_SEC: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuUsage {
    pub user_micros: u64,
    pub system_micros: u64,
}

pub fn memory_usage() -> Option<MemoryUsage> {
    fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| parse_status(&status))
}

pub fn cpu_usage() -> Option<CpuUsage> {
    fs::read_to_string("/proc/self/stat")
        .ok()
        .and_then(|stat| parse_stat(&stat))
}

fn parse_status(status: &str) -> Option<MemoryUsage> {
    let field_kb = |name: &str| {
        status
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|kb| kb.parse::<u64>().ok())
    };

    Some(MemoryUsage {
        rss_bytes: field_kb("VmRSS:")? * 1024,
        virtual_bytes: field_kb("VmSize:")? * 1024,
    })
}

fn parse_stat(stat: &str) -> Option<CpuUsage> {
    // The command name may contain spaces; fields resume after its closing ')'.
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // utime and stime are fields 14 and 15; `rest` starts at field 3.
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;

    let to_micros = |ticks: u64| ticks * 1_000_000 / CLOCK_TICKS_PER_SEC;
    Some(CpuUsage {
        user_micros: to_micros(utime),
        system_micros: to_micros(stime),
    })
}

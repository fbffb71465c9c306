//! Folding of the daemon's typed-parameter lists into stat bundles.
//!
//! The batched stats call reports every value as a `(field, value)` pair with
//! dotted field names: scalars like `state.state` or `cpu.time`, and indexed
//! entries like `net.0.rx.bytes` or `block.1.path`. This module turns one
//! such list into a [`DomainStats`] bundle.
//!
//! Unknown fields are skipped, and a category only becomes present in the
//! bundle once one of its known fields actually appears — a domain that
//! reported nothing for a category keeps it `None`.

use super::stats::{
    BalloonStats, BlockDeviceStats, CpuStats, DomainStats, NetInterfaceStats, StateStats,
    VcpuStats,
};

/// A single typed value as reported by the daemon.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    UInt(u64),
    Double(f64),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    fn as_u64(&self) -> Option<u64> {
        match *self {
            ParamValue::UInt(v) => Some(v),
            ParamValue::Int(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    fn as_i32(&self) -> Option<i32> {
        match *self {
            ParamValue::Int(v) => i32::try_from(v).ok(),
            ParamValue::UInt(v) => i32::try_from(v).ok(),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Grows `entries` so that `idx` is valid and returns the entry.
fn entry<T: Default>(entries: &mut Vec<T>, idx: usize) -> &mut T {
    if entries.len() <= idx {
        entries.resize_with(idx + 1, T::default);
    }
    &mut entries[idx]
}

/// Folds one domain's typed-parameter list into a stats bundle.
pub fn fold_params(params: &[(String, ParamValue)]) -> DomainStats {
    let mut stats = DomainStats::default();

    for (field, value) in params {
        let mut parts = field.splitn(3, '.');
        let (Some(group), Some(second)) = (parts.next(), parts.next()) else {
            continue;
        };
        let attr = parts.next();

        match group {
            "state" => fold_state(&mut stats, second, value),
            "cpu" => fold_cpu(&mut stats, second, value),
            "balloon" => fold_balloon(&mut stats, second, value),
            "vcpu" => {
                // Skips the scalar `vcpu.current` / `vcpu.maximum` entries.
                if let (Ok(idx), Some(attr)) = (second.parse(), attr) {
                    fold_vcpu(entry(&mut stats.vcpus, idx), attr, value);
                }
            }
            "net" => {
                if let (Ok(idx), Some(attr)) = (second.parse(), attr) {
                    fold_net(entry(&mut stats.nets, idx), attr, value);
                }
            }
            "block" => {
                if let (Ok(idx), Some(attr)) = (second.parse(), attr) {
                    fold_block(entry(&mut stats.blocks, idx), attr, value);
                }
            }
            _ => {}
        }
    }

    stats
}

fn fold_state(stats: &mut DomainStats, attr: &str, value: &ParamValue) {
    let Some(v) = value.as_i32() else { return };
    match attr {
        "state" => stats.state.get_or_insert_with(StateStats::default).state = v,
        "reason" => stats.state.get_or_insert_with(StateStats::default).reason = v,
        _ => {}
    }
}

fn fold_cpu(stats: &mut DomainStats, attr: &str, value: &ParamValue) {
    let Some(v) = value.as_u64() else { return };
    match attr {
        "time" => stats.cpu.get_or_insert_with(CpuStats::default).time = v,
        "user" => stats.cpu.get_or_insert_with(CpuStats::default).user = v,
        "system" => stats.cpu.get_or_insert_with(CpuStats::default).system = v,
        _ => {}
    }
}

fn fold_balloon(stats: &mut DomainStats, attr: &str, value: &ParamValue) {
    let Some(v) = value.as_u64() else { return };
    match attr {
        "current" => stats.balloon.get_or_insert_with(BalloonStats::default).current = v,
        "maximum" => stats.balloon.get_or_insert_with(BalloonStats::default).maximum = v,
        _ => {}
    }
}

fn fold_vcpu(vcpu: &mut VcpuStats, attr: &str, value: &ParamValue) {
    match attr {
        "state" => {
            if let Some(v) = value.as_i32() {
                vcpu.state = v;
            }
        }
        "time" => {
            if let Some(v) = value.as_u64() {
                vcpu.time = v;
            }
        }
        _ => {}
    }
}

fn fold_net(net: &mut NetInterfaceStats, attr: &str, value: &ParamValue) {
    if attr == "name" {
        if let Some(v) = value.as_str() {
            net.name = v.to_owned();
        }
        return;
    }
    let Some(v) = value.as_u64() else { return };
    match attr {
        "rx.bytes" => net.rx_bytes = v,
        "rx.pkts" => net.rx_packets = v,
        "rx.errs" => net.rx_errs = v,
        "rx.drop" => net.rx_drop = v,
        "tx.bytes" => net.tx_bytes = v,
        "tx.pkts" => net.tx_packets = v,
        "tx.errs" => net.tx_errs = v,
        "tx.drop" => net.tx_drop = v,
        _ => {}
    }
}

fn fold_block(block: &mut BlockDeviceStats, attr: &str, value: &ParamValue) {
    if attr == "path" {
        if let Some(v) = value.as_str() {
            block.path = v.to_owned();
        }
        return;
    }
    let Some(v) = value.as_u64() else { return };
    match attr {
        "rd.reqs" => block.rd_reqs = v,
        "rd.bytes" => block.rd_bytes = v,
        "rd.times" => block.rd_times = v,
        "wr.reqs" => block.wr_reqs = v,
        "wr.bytes" => block.wr_bytes = v,
        "wr.times" => block.wr_times = v,
        "fl.reqs" => block.fl_reqs = v,
        "fl.times" => block.fl_times = v,
        "allocation" => block.allocation = v,
        "capacity" => block.capacity = v,
        "physical" => block.physical = v,
        _ => {}
    }
}

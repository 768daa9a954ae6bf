//! Mach host statistics: CPU tick counters and VM page counts.

use std::io;

use libc::{c_int, c_void};

use crate::core::kernel::{CpuTicks, MemoryStats};
use crate::error::Result;

type MachPortT = u32;
type KernReturnT = i32;
type NaturalT = u32;
type IntegerT = i32;
type MachMsgTypeNumberT = u32;

const KERN_SUCCESS: KernReturnT = 0;
const HOST_CPU_LOAD_INFO: c_int = 3;
const HOST_VM_INFO64: c_int = 4;

const CPU_STATE_USER: usize = 0;
const CPU_STATE_SYSTEM: usize = 1;
const CPU_STATE_IDLE: usize = 2;
const CPU_STATE_NICE: usize = 3;
const CPU_STATE_MAX: usize = 4;

#[repr(C)]
#[derive(Default)]
struct HostCpuLoadInfo {
    cpu_ticks: [NaturalT; CPU_STATE_MAX],
}

/// Layout of `struct vm_statistics64` from <mach/vm_statistics.h>; the
/// field mix of 32- and 64-bit counters must match exactly or the count
/// check below fails.
#[repr(C)]
#[derive(Default)]
struct VmStatistics64 {
    free_count: NaturalT,
    active_count: NaturalT,
    inactive_count: NaturalT,
    wire_count: NaturalT,
    zero_fill_count: u64,
    reactivations: u64,
    pageins: u64,
    pageouts: u64,
    faults: u64,
    cow_faults: u64,
    lookups: u64,
    hits: u64,
    purges: u64,
    purgeable_count: NaturalT,
    speculative_count: NaturalT,
    decompressions: u64,
    compressions: u64,
    swapins: u64,
    swapouts: u64,
    compressor_page_count: NaturalT,
    throttled_count: NaturalT,
    external_page_count: NaturalT,
    internal_page_count: NaturalT,
    total_uncompressed_pages_in_compressor: u64,
}

extern "C" {
    fn mach_host_self() -> MachPortT;
    fn host_statistics(
        host: MachPortT,
        flavor: c_int,
        info: *mut IntegerT,
        count: *mut MachMsgTypeNumberT,
    ) -> KernReturnT;
    fn host_statistics64(
        host: MachPortT,
        flavor: c_int,
        info: *mut IntegerT,
        count: *mut MachMsgTypeNumberT,
    ) -> KernReturnT;
}

fn kern_err(call: &str, result: KernReturnT) -> crate::MacPerfError {
    io::Error::other(format!("{} returned {:#x}", call, result)).into()
}

/// One opaque snapshot of the host-wide CPU tick counters.
pub fn cpu_ticks() -> Result<CpuTicks> {
    let mut info = HostCpuLoadInfo::default();
    let mut count =
        (std::mem::size_of::<HostCpuLoadInfo>() / std::mem::size_of::<IntegerT>()) as u32;
    let result = unsafe {
        host_statistics(
            mach_host_self(),
            HOST_CPU_LOAD_INFO,
            &mut info as *mut HostCpuLoadInfo as *mut IntegerT,
            &mut count,
        )
    };
    if result != KERN_SUCCESS {
        return Err(kern_err("host_statistics", result));
    }
    Ok(CpuTicks {
        user: u64::from(info.cpu_ticks[CPU_STATE_USER]),
        system: u64::from(info.cpu_ticks[CPU_STATE_SYSTEM]),
        idle: u64::from(info.cpu_ticks[CPU_STATE_IDLE]),
        nice: u64::from(info.cpu_ticks[CPU_STATE_NICE]),
    })
}

/// Active/wired page counts scaled to bytes, plus physical memory size.
pub fn memory() -> Result<MemoryStats> {
    let mut stats = VmStatistics64::default();
    let mut count =
        (std::mem::size_of::<VmStatistics64>() / std::mem::size_of::<IntegerT>()) as u32;
    let result = unsafe {
        host_statistics64(
            mach_host_self(),
            HOST_VM_INFO64,
            &mut stats as *mut VmStatistics64 as *mut IntegerT,
            &mut count,
        )
    };
    if result != KERN_SUCCESS {
        return Err(kern_err("host_statistics64", result));
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) }.max(0) as u64;
    Ok(MemoryStats {
        active_bytes: u64::from(stats.active_count) * page_size,
        wired_bytes: u64::from(stats.wire_count) * page_size,
        total_bytes: physical_memory()?,
    })
}

fn physical_memory() -> Result<u64> {
    let mut memsize: u64 = 0;
    let mut len = std::mem::size_of::<u64>();
    let name = b"hw.memsize\0";
    let result = unsafe {
        libc::sysctlbyname(
            name.as_ptr() as *const libc::c_char,
            &mut memsize as *mut u64 as *mut c_void,
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    if result != 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(memsize)
}

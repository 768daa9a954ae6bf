//! Raw IOKit/CoreFoundation bindings for the SMC user client and the
//! registry walks (block-storage byte counters, accelerator utilization).
//!
//! Only the handful of calls this crate needs are declared; everything
//! stays behind safe wrappers that release what they retain.

use std::ffi::CString;
use std::io;

use libc::{c_char, c_void};

use crate::core::kernel::DiskCounters;
use crate::core::smc::codec::{KERNEL_INDEX_SMC, STRUCT_SIZE};
use crate::core::smc::SmcPort;
use crate::error::{MacPerfError, Result};

type MachPortT = u32;
type KernReturnT = i32;
type IoObjectT = u32;
type IoConnectT = u32;
type IoIteratorT = u32;
type CFTypeRef = *const c_void;
type CFDictionaryRef = *const c_void;
type CFMutableDictionaryRef = *mut c_void;
type CFStringRef = *const c_void;
type CFAllocatorRef = *const c_void;
type CFTypeId = usize;
type CFIndex = isize;

const KERN_SUCCESS: KernReturnT = 0;
const CF_STRING_ENCODING_UTF8: u32 = 0x0800_0100;
const CF_NUMBER_SINT64_TYPE: CFIndex = 4;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOServiceMatching(name: *const c_char) -> CFMutableDictionaryRef;
    fn IOServiceGetMatchingService(main_port: MachPortT, matching: CFMutableDictionaryRef)
        -> IoObjectT;
    fn IOServiceGetMatchingServices(
        main_port: MachPortT,
        matching: CFMutableDictionaryRef,
        existing: *mut IoIteratorT,
    ) -> KernReturnT;
    fn IOIteratorNext(iterator: IoIteratorT) -> IoObjectT;
    fn IOObjectRelease(object: IoObjectT) -> KernReturnT;
    fn IOServiceOpen(
        service: IoObjectT,
        owning_task: MachPortT,
        connect_type: u32,
        connect: *mut IoConnectT,
    ) -> KernReturnT;
    fn IOServiceClose(connect: IoConnectT) -> KernReturnT;
    fn IOConnectCallStructMethod(
        connection: IoConnectT,
        selector: u32,
        input_struct: *const c_void,
        input_struct_cnt: usize,
        output_struct: *mut c_void,
        output_struct_cnt: *mut usize,
    ) -> KernReturnT;
    fn IORegistryEntryCreateCFProperties(
        entry: IoObjectT,
        properties: *mut CFMutableDictionaryRef,
        allocator: CFAllocatorRef,
        options: u32,
    ) -> KernReturnT;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFStringCreateWithCString(
        alloc: CFAllocatorRef,
        c_str: *const c_char,
        encoding: u32,
    ) -> CFStringRef;
    fn CFDictionaryGetValue(dict: CFDictionaryRef, key: *const c_void) -> *const c_void;
    fn CFNumberGetValue(number: CFTypeRef, number_type: CFIndex, value: *mut c_void) -> bool;
    fn CFRelease(cf: CFTypeRef);
    fn CFGetTypeID(cf: CFTypeRef) -> CFTypeId;
    fn CFDictionaryGetTypeID() -> CFTypeId;
    fn CFNumberGetTypeID() -> CFTypeId;
}

extern "C" {
    static mach_task_self_: MachPortT;
}

/// Owned CFString key, released on drop.
struct CfString(CFStringRef);

impl CfString {
    fn new(s: &str) -> Option<Self> {
        let c = CString::new(s).ok()?;
        let raw = unsafe {
            CFStringCreateWithCString(std::ptr::null(), c.as_ptr(), CF_STRING_ENCODING_UTF8)
        };
        if raw.is_null() {
            None
        } else {
            Some(Self(raw))
        }
    }
}

impl Drop for CfString {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) };
    }
}

/// Registry-entry property dictionary, released on drop.
struct Properties(CFMutableDictionaryRef);

impl Properties {
    fn of(entry: IoObjectT) -> Option<Self> {
        let mut props: CFMutableDictionaryRef = std::ptr::null_mut();
        let result = unsafe {
            IORegistryEntryCreateCFProperties(entry, &mut props, std::ptr::null(), 0)
        };
        if result == KERN_SUCCESS && !props.is_null() {
            Some(Self(props))
        } else {
            None
        }
    }
}

impl Drop for Properties {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) };
    }
}

fn dict_get_number(dict: CFDictionaryRef, key: &str) -> Option<i64> {
    let key = CfString::new(key)?;
    let value = unsafe { CFDictionaryGetValue(dict, key.0) };
    if value.is_null() || unsafe { CFGetTypeID(value) != CFNumberGetTypeID() } {
        return None;
    }
    let mut out: i64 = 0;
    let ok = unsafe {
        CFNumberGetValue(value, CF_NUMBER_SINT64_TYPE, &mut out as *mut i64 as *mut c_void)
    };
    ok.then_some(out)
}

fn dict_get_dict(dict: CFDictionaryRef, key: &str) -> Option<CFDictionaryRef> {
    let key = CfString::new(key)?;
    let value = unsafe { CFDictionaryGetValue(dict, key.0) };
    if value.is_null() || unsafe { CFGetTypeID(value) != CFDictionaryGetTypeID() } {
        return None;
    }
    Some(value)
}

/// Walk every registry service matching `class_name`, handing each entry's
/// property dictionary to `visit`. Services and iterators are released
/// unconditionally.
fn for_each_service(class_name: &str, mut visit: impl FnMut(CFDictionaryRef)) -> Result<()> {
    let name = CString::new(class_name).map_err(|e| MacPerfError::other(e.to_string()))?;
    unsafe {
        let matching = IOServiceMatching(name.as_ptr());
        if matching.is_null() {
            return Err(MacPerfError::connection(format!(
                "no matching dictionary for {}",
                class_name
            )));
        }
        let mut iterator: IoIteratorT = 0;
        // The matching dictionary is consumed by this call.
        let result = IOServiceGetMatchingServices(0, matching, &mut iterator);
        if result != KERN_SUCCESS {
            return Err(io::Error::other(format!(
                "IOServiceGetMatchingServices({}) returned {:#x}",
                class_name, result
            ))
            .into());
        }
        loop {
            let service = IOIteratorNext(iterator);
            if service == 0 {
                break;
            }
            if let Some(props) = Properties::of(service) {
                visit(props.0);
            }
            IOObjectRelease(service);
        }
        IOObjectRelease(iterator);
    }
    Ok(())
}

/// Cumulative read/write bytes summed over all block-storage drivers
/// enumerated at call time.
pub fn disk_counters() -> Result<DiskCounters> {
    let mut counters = DiskCounters::default();
    for_each_service("IOBlockStorageDriver", |props| {
        if let Some(stats) = dict_get_dict(props, "Statistics") {
            if let Some(read) = dict_get_number(stats, "Bytes (Read)") {
                counters.read_bytes += read.max(0) as u64;
            }
            if let Some(write) = dict_get_number(stats, "Bytes (Write)") {
                counters.write_bytes += write.max(0) as u64;
            }
        }
    })?;
    Ok(counters)
}

/// Peak utilization percent across IOAccelerator services. Driver families
/// disagree on the key name, so two are tried.
pub fn gpu_usage() -> Result<f64> {
    let mut max_usage = 0.0f64;
    for_each_service("IOAccelerator", |props| {
        if let Some(perf) = dict_get_dict(props, "PerformanceStatistics") {
            let utilization = dict_get_number(perf, "Device Utilization %")
                .or_else(|| dict_get_number(perf, "GPU Activity"));
            if let Some(value) = utilization {
                max_usage = max_usage.max(value as f64);
            }
        }
    })?;
    Ok(max_usage)
}

/// Open connection to the AppleSMC user client.
///
/// Opened once and reused for all reads and writes. Not safe for concurrent
/// use; the monitor calls it only from the fast-tick task.
pub struct SmcIoPort {
    connection: IoConnectT,
}

impl SmcIoPort {
    pub fn open() -> Result<Self> {
        unsafe {
            let matching = IOServiceMatching(b"AppleSMC\0".as_ptr() as *const c_char);
            let service = IOServiceGetMatchingService(0, matching);
            if service == 0 {
                return Err(MacPerfError::connection("AppleSMC service not found"));
            }
            let mut connection: IoConnectT = 0;
            let result = IOServiceOpen(service, mach_task_self_, 0, &mut connection);
            IOObjectRelease(service);
            if result != KERN_SUCCESS {
                return Err(MacPerfError::connection(format!(
                    "IOServiceOpen(AppleSMC) returned {:#x}",
                    result
                )));
            }
            Ok(Self { connection })
        }
    }
}

impl SmcPort for SmcIoPort {
    fn call(&mut self, input: &[u8; STRUCT_SIZE]) -> Result<[u8; STRUCT_SIZE]> {
        let mut output = [0u8; STRUCT_SIZE];
        let mut output_size = STRUCT_SIZE;
        let result = unsafe {
            IOConnectCallStructMethod(
                self.connection,
                KERNEL_INDEX_SMC,
                input.as_ptr() as *const c_void,
                STRUCT_SIZE,
                output.as_mut_ptr() as *mut c_void,
                &mut output_size,
            )
        };
        if result != KERN_SUCCESS {
            return Err(io::Error::other(format!("SMC call returned {:#x}", result)).into());
        }
        Ok(output)
    }
}

impl Drop for SmcIoPort {
    fn drop(&mut self) {
        unsafe {
            IOServiceClose(self.connection);
        }
    }
}

//! Host and process queries.
//!
//! The platform layer the reactor sits on also answers a handful of simple
//! OS questions: monotonic time, uptime, memory, load, interfaces, and the
//! process title. None of them have algorithmic content; they are thin
//! syscall wrappers in the same style as the reactor's own OS seams.
//!
//! Facilities the platform does not provide report
//! [`io::ErrorKind::Unsupported`] instead of silently succeeding with empty
//! data.

use std::ffi::CStr;
use std::io;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;
use std::time::Duration;

pub use crate::reactor::clock::hrtime;

static PROCESS_TITLE: OnceLock<String> = OnceLock::new();

/// One address reported by a network interface that is up and running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Interface name, e.g. `lo` or `eth0`.
    pub name: String,

    /// The interface's IPv4 or IPv6 address.
    pub address: IpAddr,

    /// Whether the interface is a loopback device.
    pub is_internal: bool,
}

/// Per-CPU model and time accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuInfo {
    /// CPU model string.
    pub model: String,

    /// Clock speed in MHz.
    pub speed_mhz: u64,

    /// Cumulative time the CPU spent in each state, in milliseconds.
    pub times: CpuTimes,
}

/// Cumulative per-CPU time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub sys: u64,
    pub idle: u64,
    pub irq: u64,
}

/// Time since the host booted.
pub fn uptime() -> io::Result<Duration> {
    #[cfg(target_os = "linux")]
    {
        let info = sys_info()?;
        Ok(Duration::from_secs(info.uptime.max(0) as u64))
    }

    #[cfg(not(target_os = "linux"))]
    {
        Err(unsupported())
    }
}

/// Free physical memory, in bytes.
pub fn free_memory() -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        let info = sys_info()?;
        Ok(info.freeram as u64 * info.mem_unit as u64)
    }

    #[cfg(not(target_os = "linux"))]
    {
        Err(unsupported())
    }
}

/// Total physical memory, in bytes.
pub fn total_memory() -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        let info = sys_info()?;
        Ok(info.totalram as u64 * info.mem_unit as u64)
    }

    #[cfg(not(target_os = "linux"))]
    {
        Err(unsupported())
    }
}

/// 1-, 5-, and 15-minute load averages.
pub fn loadavg() -> io::Result<[f64; 3]> {
    let mut avg = [0f64; 3];

    let rc = unsafe { libc::getloadavg(avg.as_mut_ptr(), 3) };
    if rc != 3 {
        return Err(unsupported());
    }

    Ok(avg)
}

/// Peak resident set size of the calling process, in bytes.
pub fn resident_set_memory() -> io::Result<u64> {
    let mut usage = unsafe { mem::zeroed::<libc::rusage>() };

    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    // ru_maxrss is kibibytes on Linux, bytes on macOS.
    #[cfg(target_os = "macos")]
    let rss = usage.ru_maxrss as u64;
    #[cfg(not(target_os = "macos"))]
    let rss = usage.ru_maxrss as u64 * 1024;

    Ok(rss)
}

/// Per-CPU information.
///
/// The platform reports no per-CPU data; this always fails with
/// [`io::ErrorKind::Unsupported`].
pub fn cpu_info() -> io::Result<Vec<CpuInfo>> {
    Err(unsupported())
}

/// Enumerates the addresses of interfaces that are up and running.
pub fn interface_addresses() -> io::Result<Vec<InterfaceAddress>> {
    let mut addrs: *mut libc::ifaddrs = std::ptr::null_mut();

    if unsafe { libc::getifaddrs(&mut addrs) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let mut out = Vec::new();
    let mut ent = addrs;
    while !ent.is_null() {
        let ifa = unsafe { &*ent };
        ent = ifa.ifa_next;

        let flags = ifa.ifa_flags;
        if flags & libc::IFF_UP as u32 == 0 || flags & libc::IFF_RUNNING as u32 == 0 {
            continue;
        }
        if ifa.ifa_addr.is_null() {
            continue;
        }

        // Non-INET families (packet sockets and the like) are skipped.
        let Some(address) = sockaddr_to_ip(ifa.ifa_addr) else {
            continue;
        };

        let name = unsafe { CStr::from_ptr(ifa.ifa_name) }
            .to_string_lossy()
            .into_owned();

        out.push(InterfaceAddress {
            name,
            address,
            is_internal: flags & libc::IFF_LOOPBACK as u32 != 0,
        });
    }

    unsafe { libc::freeifaddrs(addrs) };

    Ok(out)
}

/// Captures the process arguments for later title queries.
///
/// Call once at startup; returns the arguments unchanged.
pub fn setup_args(args: Vec<String>) -> Vec<String> {
    if let Some(first) = args.first() {
        let _ = PROCESS_TITLE.set(first.clone());
    }

    args
}

/// The captured process title, or an empty string before
/// [`setup_args`] runs.
pub fn process_title() -> String {
    PROCESS_TITLE.get().cloned().unwrap_or_default()
}

/// Changes the process title.
///
/// Not provided by the platform; always fails with
/// [`io::ErrorKind::Unsupported`].
pub fn set_process_title(_title: &str) -> io::Result<()> {
    Err(unsupported())
}

#[cfg(target_os = "linux")]
fn sys_info() -> io::Result<libc::sysinfo> {
    let mut info = unsafe { mem::zeroed::<libc::sysinfo>() };

    let rc = unsafe { libc::sysinfo(&mut info) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(info)
}

fn sockaddr_to_ip(sa: *const libc::sockaddr) -> Option<IpAddr> {
    match unsafe { (*sa).sa_family } as libc::c_int {
        libc::AF_INET => {
            let sin = unsafe { &*(sa as *const libc::sockaddr_in) };
            Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))))
        }

        libc::AF_INET6 => {
            let sin6 = unsafe { &*(sa as *const libc::sockaddr_in6) };
            Some(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)))
        }

        _ => None,
    }
}

fn unsupported() -> io::Error {
    io::Error::from(io::ErrorKind::Unsupported)
}
